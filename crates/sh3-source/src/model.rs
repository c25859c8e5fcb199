//! Scene model
//!
//! A read-only snapshot of what the authoring tool exposes: collections of
//! objects, their local transforms, mesh topology and materials. Field names
//! follow the tool's own vocabulary so dumps map one to one.

use std::path::{Path, PathBuf};

use glam::{Mat4, Quat as GQuat};
use serde::{Deserialize, Serialize};
use sh3_core::{Error, Quat, Result, Transform, Vec3};

use crate::graph::NodeTree;

/// Object type as reported by the authoring tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ObjectKind {
    Mesh,
    Empty,
    Camera,
    Light,
    Curve,
    Armature,
    #[serde(other)]
    Other,
}

impl ObjectKind {
    /// Kinds that become entities
    pub fn is_renderable(self) -> bool {
        matches!(self, ObjectKind::Mesh | ObjectKind::Empty | ObjectKind::Camera)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ObjectKind::Mesh => "MESH",
            ObjectKind::Empty => "EMPTY",
            ObjectKind::Camera => "CAMERA",
            ObjectKind::Light => "LIGHT",
            ObjectKind::Curve => "CURVE",
            ObjectKind::Armature => "ARMATURE",
            ObjectKind::Other => "OTHER",
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Euler rotation order; `XYZ` applies X first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EulerOrder {
    XYZ,
    XZY,
    YXZ,
    YZX,
    ZXY,
    ZYX,
}

impl EulerOrder {
    fn axes(self) -> [usize; 3] {
        match self {
            EulerOrder::XYZ => [0, 1, 2],
            EulerOrder::XZY => [0, 2, 1],
            EulerOrder::YXZ => [1, 0, 2],
            EulerOrder::YZX => [1, 2, 0],
            EulerOrder::ZXY => [2, 0, 1],
            EulerOrder::ZYX => [2, 1, 0],
        }
    }
}

/// Local rotation in whichever mode the object uses
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Rotation {
    Quaternion { value: Quat },
    /// Angles in radians, indexed by axis (x, y, z)
    Euler { order: EulerOrder, angles: [f32; 3] },
    AxisAngle { axis: [f32; 3], angle: f32 },
}

impl Default for Rotation {
    fn default() -> Self {
        Rotation::Quaternion {
            value: Quat::IDENTITY,
        }
    }
}

impl Rotation {
    /// Convert to a normalized quaternion
    pub fn to_quat(&self) -> Quat {
        let q = match *self {
            Rotation::Quaternion { value } => GQuat::from(value),
            Rotation::Euler { order, angles } => {
                order.axes().iter().fold(GQuat::IDENTITY, |acc, &axis| {
                    let step = match axis {
                        0 => GQuat::from_rotation_x(angles[0]),
                        1 => GQuat::from_rotation_y(angles[1]),
                        _ => GQuat::from_rotation_z(angles[2]),
                    };
                    step * acc
                })
            }
            Rotation::AxisAngle { axis, angle } => {
                let axis = glam::Vec3::from(axis);
                if axis.length_squared() == 0.0 {
                    GQuat::IDENTITY
                } else {
                    GQuat::from_axis_angle(axis.normalize(), angle)
                }
            }
        };

        if q.length_squared() == 0.0 {
            Quat::IDENTITY
        } else {
            q.normalize().into()
        }
    }
}

fn unit_scale() -> Vec3 {
    Vec3::ONE
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MeshVertex {
    pub co: [f32; 3],
    #[serde(default)]
    pub normal: Option<[f32; 3]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MeshLoop {
    pub vertex: u32,
    /// Custom split normal
    #[serde(default)]
    pub normal: Option<[f32; 3]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MeshPolygon {
    pub loop_start: u32,
    pub loop_total: u32,
}

impl MeshPolygon {
    pub fn loop_range(&self) -> std::ops::Range<usize> {
        let start = self.loop_start as usize;
        start..start + self.loop_total as usize
    }
}

/// Per-loop UV coordinates
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UvLayer {
    pub name: String,
    pub data: Vec<[f32; 2]>,
}

/// Mesh topology: vertices, loops (face corners) and polygons
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MeshData {
    pub name: String,
    #[serde(default)]
    pub vertices: Vec<MeshVertex>,
    #[serde(default)]
    pub loops: Vec<MeshLoop>,
    #[serde(default)]
    pub polygons: Vec<MeshPolygon>,
    #[serde(default)]
    pub uv_layers: Vec<UvLayer>,
    #[serde(default)]
    pub active_uv: Option<usize>,
}

impl MeshData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Active UV layer, or the first one if none is marked active
    pub fn active_uv_layer(&self) -> Option<&UvLayer> {
        match self.active_uv {
            Some(index) => self.uv_layers.get(index),
            None => self.uv_layers.first(),
        }
    }

    /// Check that every index points inside its array
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| Error::InvalidMesh {
            mesh: self.name.clone(),
            message,
        };

        if let Some((i, l)) = self
            .loops
            .iter()
            .enumerate()
            .find(|(_, l)| l.vertex as usize >= self.vertices.len())
        {
            return Err(invalid(format!("loop {i} references vertex {}", l.vertex)));
        }

        if let Some((i, _)) = self
            .polygons
            .iter()
            .enumerate()
            .find(|(_, p)| p.loop_range().end > self.loops.len())
        {
            return Err(invalid(format!("polygon {i} loop range out of bounds")));
        }

        if let Some(layer) = self
            .uv_layers
            .iter()
            .find(|layer| layer.data.len() != self.loops.len())
        {
            return Err(invalid(format!(
                "uv layer {} has {} entries for {} loops",
                layer.name,
                layer.data.len(),
                self.loops.len()
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ObjectKind,
    #[serde(default)]
    pub hide_render: bool,
    #[serde(default)]
    pub location: Vec3,
    #[serde(default)]
    pub rotation: Rotation,
    #[serde(default = "unit_scale")]
    pub scale: Vec3,
    /// Column-major object to world matrix, if the tool evaluated one
    #[serde(default)]
    pub matrix_world: Option<[[f32; 4]; 4]>,
    #[serde(default)]
    pub mesh: Option<MeshData>,
    #[serde(default)]
    pub active_material: Option<String>,
}

impl SceneObject {
    pub fn new(name: impl Into<String>, kind: ObjectKind) -> Self {
        Self {
            name: name.into(),
            kind,
            hide_render: false,
            location: Vec3::ZERO,
            rotation: Rotation::default(),
            scale: Vec3::ONE,
            matrix_world: None,
            mesh: None,
            active_material: None,
        }
    }

    /// Local transform with the rotation converted to a quaternion
    pub fn local_transform(&self) -> Transform {
        Transform::new(self.location, self.rotation.to_quat(), self.scale)
    }

    /// World matrix, composed from the local transform when none was recorded
    pub fn world_matrix(&self) -> Mat4 {
        match self.matrix_world {
            Some(cols) => Mat4::from_cols_array_2d(&cols),
            None => self.local_transform().to_matrix(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Collection {
    pub name: String,
    #[serde(default)]
    pub hide_render: bool,
    #[serde(default)]
    pub objects: Vec<SceneObject>,
}

impl Collection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Objects that will become entities
    pub fn renderable_objects(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects
            .iter()
            .filter(|object| object.kind.is_renderable() && !object.hide_render)
    }
}

/// Material as exposed by the tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    /// Raw blend method (`OPAQUE`, `BLEND`, `HASHED`, `CLIP`, ...)
    #[serde(default = "default_blend_method")]
    pub blend_method: String,
    /// `None` when the material does not use nodes
    #[serde(default)]
    pub node_tree: Option<NodeTree>,
}

fn default_blend_method() -> String {
    "OPAQUE".to_string()
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            blend_method: default_blend_method(),
            node_tree: None,
        }
    }
}

/// An open authoring file
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Project {
    /// Location of the saved scene file, `None` if never saved
    #[serde(default)]
    pub file_path: Option<PathBuf>,
    #[serde(default)]
    pub collections: Vec<Collection>,
    #[serde(default)]
    pub materials: Vec<Material>,
}

impl Project {
    pub fn new(file_path: Option<PathBuf>) -> Self {
        Self {
            file_path,
            ..Default::default()
        }
    }

    /// Directory holding the scene file
    pub fn directory(&self) -> Option<&Path> {
        self.file_path.as_deref().and_then(Path::parent)
    }

    /// Validate every mesh and node tree
    pub fn validate(&self) -> Result<()> {
        for object in self.collections.iter().flat_map(|c| &c.objects) {
            if let Some(mesh) = &object.mesh {
                mesh.validate()?;
            }
        }

        for material in &self.materials {
            if let Some(tree) = &material.node_tree {
                tree.validate()
                    .map_err(|e| e.with_context(format!("material {}", material.name)))?;
            }
        }

        Ok(())
    }
}
