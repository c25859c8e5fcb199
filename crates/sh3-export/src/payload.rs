//! MessagePack payloads for the conversion tools
//!
//! Every struct packs as a map keyed by field name, so field order here is
//! the order on the wire.

use serde::Serialize;
use sh3_core::{Error, Result, Transform};
use sh3_vfs::PathInfo;

use crate::geometry::{MeshInfo, Vertex};
use crate::material::{DiffuseUsage, MaterialInfo};

/// Something that can be handed to a conversion tool
pub trait Payload: Serialize {
    /// Short name used in logs and errors
    fn kind(&self) -> &'static str;

    /// Pack as a named-field MessagePack map
    fn pack(&self) -> Result<Vec<u8>> {
        rmp_serde::to_vec_named(self).map_err(|e| Error::Pack {
            format: self.kind(),
            message: e.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TransformPayload {
    pub position: [f32; 3],
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
}

impl From<&Transform> for TransformPayload {
    fn from(t: &Transform) -> Self {
        Self {
            position: t.position.to_array(),
            rotation: t.rotation.to_array(),
            scale: t.scale.to_array(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshPayload {
    pub material_info: MaterialInfo,
    pub vertex_data: Vec<Vertex>,
}

impl From<MeshInfo> for MeshPayload {
    fn from(mesh: MeshInfo) -> Self {
        Self {
            material_info: mesh.material,
            vertex_data: mesh.vertices,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectPayload {
    pub name: String,
    /// Tool object type (`MESH`, `EMPTY`, `CAMERA`)
    #[serde(rename = "type")]
    pub kind: String,
    pub transform: TransformPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mesh: Option<MeshPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenePayload {
    /// Scene virtual name
    pub name: String,
    pub objects: Vec<ObjectPayload>,
}

/// Everything exported in one run, for the scene tool
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScenesPayload {
    pub scenes: Vec<ScenePayload>,
    pub use_compression: bool,
}

impl Payload for ScenesPayload {
    fn kind(&self) -> &'static str {
        "scenes"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkTextureInfo {
    pub path: PathInfo,
    pub size: [i32; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkMaterialInfo {
    pub name: String,
    pub diffuse: ChunkTextureInfo,
    pub diffuse_usage: Option<DiffuseUsage>,
}

impl ChunkMaterialInfo {
    /// Legacy material layout with the full texture path breakdown
    pub fn from_material(material: &MaterialInfo) -> Result<Self> {
        let path = material.diffuse.source.clone().ok_or_else(|| {
            Error::internal(format!("material {} has no texture source path", material.name))
        })?;

        Ok(Self {
            name: material.name.clone(),
            diffuse: ChunkTextureInfo {
                path,
                size: material.diffuse.size,
            },
            diffuse_usage: material.diffuse_usage,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkMesh {
    pub name: String,
    pub material_info: ChunkMaterialInfo,
    pub vertex_data: Vec<Vertex>,
}

/// One collection's meshes, for the legacy mesh tool
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderChunkPayload {
    pub path: PathInfo,
    pub meshes: Vec<ChunkMesh>,
}

impl RenderChunkPayload {
    pub fn new(path: PathInfo) -> Self {
        Self {
            path,
            meshes: Vec::new(),
        }
    }

    pub fn push_mesh(&mut self, name: &str, mesh: &MeshInfo) -> Result<()> {
        self.meshes.push(ChunkMesh {
            name: name.to_string(),
            material_info: ChunkMaterialInfo::from_material(&mesh.material)?,
            vertex_data: mesh.vertices.clone(),
        });
        Ok(())
    }
}

impl Payload for RenderChunkPayload {
    fn kind(&self) -> &'static str {
        "render chunk"
    }
}
