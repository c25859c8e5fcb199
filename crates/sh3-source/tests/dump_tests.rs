//! Integration tests for scene dump loading
//!
//! These tests cover:
//! - Loading dumps from disk
//! - Missing and malformed files
//! - Round-tripping a project built in code

use std::path::Path;

use sh3_core::Error;
use sh3_source::{
    load_scene_dump, Collection, ImageRef, Material, MeshData, MeshLoop, MeshPolygon,
    MeshVertex, NodeKind, NodeTree, ObjectKind, Project, SceneLoader, SceneObject, SceneSource,
    JsonDumpLoader,
};
use tempfile::TempDir;

/// Helper to build a one-collection project with a textured triangle
fn make_project() -> Project {
    let mut mesh = MeshData::new("tri");
    mesh.vertices = vec![
        MeshVertex { co: [0.0, 0.0, 0.0], normal: Some([0.0, 0.0, 1.0]) },
        MeshVertex { co: [1.0, 0.0, 0.0], normal: Some([0.0, 0.0, 1.0]) },
        MeshVertex { co: [0.0, 1.0, 0.0], normal: Some([0.0, 0.0, 1.0]) },
    ];
    mesh.loops = (0..3).map(|vertex| MeshLoop { vertex, normal: None }).collect();
    mesh.polygons = vec![MeshPolygon { loop_start: 0, loop_total: 3 }];

    let mut object = SceneObject::new("tri", ObjectKind::Mesh);
    object.mesh = Some(mesh);
    object.active_material = Some("paint".into());

    let mut collection = Collection::new("main");
    collection.objects.push(object);

    let mut tree = NodeTree::new();
    let out = tree.add_node("Material Output", NodeKind::OutputMaterial);
    let bsdf = tree.add_node("Principled BSDF", NodeKind::PrincipledBsdf);
    let tex = tree.add_node(
        "Image Texture",
        NodeKind::ImageTexture(ImageRef::new("//tex/paint.png", [128, 128])),
    );
    tree.link(bsdf, out, "Surface");
    tree.link(tex, bsdf, "Base Color");

    let mut material = Material::new("paint");
    material.node_tree = Some(tree);

    let mut project = Project::new(Some("/res/maps/test.blend".into()));
    project.collections.push(collection);
    project.materials.push(material);
    project
}

mod file_tests {
    use super::*;

    #[test]
    fn test_roundtrip_through_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.json");
        let project = make_project();
        std::fs::write(&path, serde_json::to_string_pretty(&project).unwrap()).unwrap();

        let loaded = load_scene_dump(&path).unwrap();
        assert_eq!(loaded, project);
        assert_eq!(loaded.file_path(), Some(Path::new("/res/maps/test.blend")));
        assert!(loaded.material("paint").unwrap().node_tree.is_some());
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = JsonDumpLoader.load_file(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
    }

    #[test]
    fn test_malformed_json_has_context() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ \"collections\": [").unwrap();

        let err = load_scene_dump(&path).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
        assert!(matches!(err.root_cause(), Error::Json(_)));
    }
}

mod model_tests {
    use super::*;

    #[test]
    fn test_unsaved_project() {
        let project: Project = serde_json::from_str(r#"{ "collections": [] }"#).unwrap();
        assert!(project.file_path().is_none());
        assert!(project.directory().is_none());
    }

    #[test]
    fn test_dangling_graph_link_rejected() {
        let mut project = make_project();
        if let Some(tree) = project.materials[0].node_tree.as_mut() {
            tree.nodes[0].inputs[0].links[0] = sh3_source::NodeId(42);
        }
        let json = serde_json::to_string(&project).unwrap();

        let err = JsonDumpLoader.load(json.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("material paint"));
    }
}
