//! Mesh geometry extraction
//!
//! Produces a flat, non-indexed triangle list: three [`Vertex`] entries per
//! face in face/loop order. Positions stay in object space; the object's
//! transform travels separately.

use glam::{Mat4, Vec3};
use serde::{Serialize, Serializer};
use sh3_core::{Error, Result};
use sh3_source::{MeshData, MeshLoop, MeshPolygon, SceneObject};

use crate::material::MaterialInfo;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    /// `v` already flipped to `1 - v`
    pub uv: [f32; 2],
}

// Packed as `[position, normal, uv]`
impl Serialize for Vertex {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        (self.position, self.normal, self.uv).serialize(serializer)
    }
}

/// Geometry and material of one mesh object
#[derive(Debug, Clone, PartialEq)]
pub struct MeshInfo {
    pub material: MaterialInfo,
    pub vertices: Vec<Vertex>,
}

/// Fan-triangulate every polygon with more than three loops.
///
/// Loops and UV data are rebuilt so each triangle owns its three corners.
/// Running it twice changes nothing.
pub fn triangulate(mesh: &mut MeshData) {
    if mesh.polygons.iter().all(|p| p.loop_total <= 3) {
        return;
    }

    let mut loops: Vec<MeshLoop> = Vec::with_capacity(mesh.loops.len() * 2);
    let mut uvs: Vec<Vec<[f32; 2]>> = vec![Vec::new(); mesh.uv_layers.len()];
    let mut polygons: Vec<MeshPolygon> = Vec::with_capacity(mesh.polygons.len() * 2);

    let mut push_face = |corners: &[usize], loops: &mut Vec<MeshLoop>| {
        let loop_start = loops.len() as u32;
        for &corner in corners {
            loops.push(mesh.loops.get(corner).copied().unwrap_or_default());
            for (layer, out) in mesh.uv_layers.iter().zip(uvs.iter_mut()) {
                out.push(layer.data.get(corner).copied().unwrap_or_default());
            }
        }
        polygons.push(MeshPolygon {
            loop_start,
            loop_total: corners.len() as u32,
        });
    };

    for polygon in &mesh.polygons {
        let corners: Vec<usize> = polygon.loop_range().collect();
        if corners.len() <= 3 {
            push_face(&corners, &mut loops);
            continue;
        }
        for i in 1..corners.len() - 1 {
            push_face(&[corners[0], corners[i], corners[i + 1]], &mut loops);
        }
    }

    let before = mesh.polygons.len();
    mesh.loops = loops;
    mesh.polygons = polygons;
    for (layer, data) in mesh.uv_layers.iter_mut().zip(uvs) {
        layer.data = data;
    }

    tracing::trace!(mesh = %mesh.name, before, after = mesh.polygons.len(), "Triangulated");
}

/// Extract per-loop vertex data from a triangulated mesh.
///
/// Every face must be a triangle. When the world matrix mirrors geometry
/// (negative determinant) all normals are negated.
pub fn extract(mesh: &MeshData, world: &Mat4) -> Result<Vec<Vertex>> {
    let flip = world.determinant() < 0.0;
    let uv_layer = mesh.active_uv_layer();
    let invalid = |message: String| Error::InvalidMesh {
        mesh: mesh.name.clone(),
        message,
    };

    let mut vertices = Vec::with_capacity(mesh.polygons.len() * 3);

    for (face, polygon) in mesh.polygons.iter().enumerate() {
        if polygon.loop_total != 3 {
            return Err(Error::NonTriangularFace {
                mesh: mesh.name.clone(),
                face,
                loops: polygon.loop_total as usize,
            });
        }

        let range = polygon.loop_range();
        let corners = mesh
            .loops
            .get(range.clone())
            .ok_or_else(|| invalid(format!("face {face} loop range out of bounds")))?;

        let mut points = [Vec3::ZERO; 3];
        let mut source = [None; 3];
        for (k, corner) in corners.iter().enumerate() {
            let vertex = mesh
                .vertices
                .get(corner.vertex as usize)
                .ok_or_else(|| invalid(format!("loop references vertex {}", corner.vertex)))?;
            points[k] = Vec3::from(vertex.co);
            source[k] = Some(vertex);
        }

        let face_normal = (points[1] - points[0])
            .cross(points[2] - points[0])
            .normalize_or_zero();

        for (k, (loop_index, corner)) in range.zip(corners).enumerate() {
            let vertex_normal = source[k].and_then(|v| v.normal);
            let mut normal = corner
                .normal
                .or(vertex_normal)
                .map(Vec3::from)
                .unwrap_or(face_normal);
            if flip {
                normal = -normal;
            }

            let [u, v] = uv_layer
                .and_then(|layer| layer.data.get(loop_index))
                .copied()
                .unwrap_or([0.0, 0.0]);

            vertices.push(Vertex {
                position: points[k].to_array(),
                normal: normal.to_array(),
                uv: [u, 1.0 - v],
            });
        }
    }

    Ok(vertices)
}

/// Vertex data of a mesh object, taken from a triangulated copy of its mesh
pub fn mesh_info(object: &SceneObject, material: MaterialInfo) -> Result<MeshInfo> {
    let mesh = object.mesh.as_ref().ok_or_else(|| Error::MissingMeshData {
        object: object.name.clone(),
    })?;

    let mut copy = mesh.clone();
    triangulate(&mut copy);
    let vertices = extract(&copy, &object.world_matrix())?;

    if vertices.is_empty() {
        return Err(Error::EmptyMesh {
            object: object.name.clone(),
        });
    }

    tracing::debug!(object = %object.name, vertices = vertices.len(), "Extracted mesh");
    Ok(MeshInfo { material, vertices })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sh3_source::{MeshVertex, ObjectKind, UvLayer};

    fn quad() -> MeshData {
        let mut mesh = MeshData::new("quad");
        mesh.vertices = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]]
            .into_iter()
            .map(|co| MeshVertex { co, normal: Some([0.0, 0.0, 1.0]) })
            .collect();
        mesh.loops = (0..4).map(|vertex| MeshLoop { vertex, normal: None }).collect();
        mesh.polygons = vec![MeshPolygon { loop_start: 0, loop_total: 4 }];
        mesh.uv_layers.push(UvLayer {
            name: "UVMap".into(),
            data: vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
        });
        mesh
    }

    fn two_triangles() -> MeshData {
        let mut mesh = quad();
        mesh.loops = [0, 1, 2, 0, 2, 3]
            .into_iter()
            .map(|vertex| MeshLoop { vertex, normal: None })
            .collect();
        mesh.polygons = vec![
            MeshPolygon { loop_start: 0, loop_total: 3 },
            MeshPolygon { loop_start: 3, loop_total: 3 },
        ];
        mesh.uv_layers[0].data = vec![
            [0.0, 0.0],
            [1.0, 0.0],
            [1.0, 1.0],
            [0.0, 0.0],
            [1.0, 1.0],
            [0.0, 0.25],
        ];
        mesh
    }

    #[test]
    fn test_quad_is_rejected() {
        let err = extract(&quad(), &Mat4::IDENTITY).unwrap_err();
        assert!(matches!(err, Error::NonTriangularFace { face: 0, loops: 4, .. }));
    }

    #[test]
    fn test_two_triangles() {
        let vertices = extract(&two_triangles(), &Mat4::IDENTITY).unwrap();
        assert_eq!(vertices.len(), 6);

        let positions: Vec<[f32; 3]> = vertices.iter().map(|v| v.position).collect();
        assert_eq!(
            positions,
            vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ]
        );
        assert_eq!(vertices[0].uv, [0.0, 1.0]);
        assert_eq!(vertices[2].uv, [1.0, 0.0]);
        assert_eq!(vertices[5].uv, [0.0, 0.75]);
        assert!(vertices.iter().all(|v| v.normal == [0.0, 0.0, 1.0]));
    }

    #[test]
    fn test_negative_determinant_flips_normals() {
        let mirror = Mat4::from_scale(glam::Vec3::new(-1.0, 1.0, 1.0));
        let plain = extract(&two_triangles(), &Mat4::IDENTITY).unwrap();
        let flipped = extract(&two_triangles(), &mirror).unwrap();

        for (a, b) in plain.iter().zip(&flipped) {
            assert_eq!(a.position, b.position);
            assert_eq!(b.normal, [-a.normal[0], -a.normal[1], -a.normal[2]]);
        }
    }

    #[test]
    fn test_triangulate_is_idempotent() {
        let mut mesh = quad();
        triangulate(&mut mesh);
        assert_eq!(mesh.polygons.len(), 2);
        assert_eq!(mesh.loops.len(), 6);
        assert_eq!(mesh.uv_layers[0].data.len(), 6);
        assert!(mesh.validate().is_ok());

        let once = mesh.clone();
        triangulate(&mut mesh);
        assert_eq!(mesh, once);

        let vertices = extract(&mesh, &Mat4::IDENTITY).unwrap();
        assert_eq!(vertices.len(), 6);
        assert_eq!(vertices[3].position, [0.0, 0.0, 0.0]);
        assert_eq!(vertices[5].position, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_normal_precedence() {
        let mut mesh = two_triangles();
        mesh.uv_layers.clear();
        mesh.loops[0].normal = Some([1.0, 0.0, 0.0]);
        for vertex in &mut mesh.vertices[1..] {
            vertex.normal = None;
        }
        mesh.vertices[1].normal = Some([0.0, 1.0, 0.0]);

        let vertices = extract(&mesh, &Mat4::IDENTITY).unwrap();
        assert_eq!(vertices[0].normal, [1.0, 0.0, 0.0]);
        assert_eq!(vertices[1].normal, [0.0, 1.0, 0.0]);
        assert_eq!(vertices[2].normal, [0.0, 0.0, 1.0]);
        assert_eq!(vertices[0].uv, [0.0, 1.0]);
    }

    #[test]
    fn test_vertex_serializes_as_array() {
        let vertex = Vertex {
            position: [1.0, 2.0, 3.0],
            normal: [0.0, 0.0, 1.0],
            uv: [0.5, 0.25],
        };
        let json = serde_json::to_string(&vertex).unwrap();
        assert_eq!(json, "[[1.0,2.0,3.0],[0.0,0.0,1.0],[0.5,0.25]]");
    }

    #[test]
    fn test_mesh_info_errors() {
        let material = crate::material::MaterialInfo {
            name: "m".into(),
            diffuse: crate::material::TextureInfo {
                path: "tex/a.png".into(),
                size: [1, 1],
                source: None,
            },
            diffuse_usage: None,
        };

        let object = SceneObject::new("empty", ObjectKind::Mesh);
        assert!(matches!(
            mesh_info(&object, material.clone()),
            Err(Error::MissingMeshData { .. })
        ));

        let mut object = SceneObject::new("nothing", ObjectKind::Mesh);
        object.mesh = Some(MeshData::new("nothing"));
        assert!(matches!(mesh_info(&object, material.clone()), Err(Error::EmptyMesh { .. })));

        let mut object = SceneObject::new("quad", ObjectKind::Mesh);
        object.mesh = Some(quad());
        let info = mesh_info(&object, material).unwrap();
        assert_eq!(info.vertices.len(), 6);
        assert_eq!(object.mesh.as_ref().unwrap().polygons.len(), 1);
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        fn ngon(sides: u32) -> MeshData {
            let mut mesh = MeshData::new("ngon");
            mesh.vertices = (0..sides)
                .map(|i| {
                    let angle = i as f32 / sides as f32 * std::f32::consts::TAU;
                    MeshVertex {
                        co: [angle.cos(), angle.sin(), 0.0],
                        normal: Some([0.0, 0.0, 1.0]),
                    }
                })
                .collect();
            mesh.loops = (0..sides).map(|vertex| MeshLoop { vertex, normal: None }).collect();
            mesh.polygons = vec![MeshPolygon { loop_start: 0, loop_total: sides }];
            mesh
        }

        proptest! {
            #[test]
            fn fan_triangulation_covers_polygon(sides in 3u32..32) {
                let mut mesh = ngon(sides);
                triangulate(&mut mesh);

                prop_assert_eq!(mesh.polygons.len() as u32, sides - 2);
                prop_assert!(mesh.polygons.iter().all(|p| p.loop_total == 3));
                prop_assert!(mesh.polygons.iter().all(|p| mesh.loops[p.loop_start as usize].vertex == 0));

                let vertices = extract(&mesh, &Mat4::IDENTITY).unwrap();
                prop_assert_eq!(vertices.len() as u32, (sides - 2) * 3);
            }
        }
    }
}
