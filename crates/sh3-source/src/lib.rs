//! sh3-source
//!
//! Read-only model of an authoring-tool scene as seen by the exporter.
//!
//! | Item | Description |
//! |------|-------------|
//! | [`Project`] | saved scene file, its collections and materials |
//! | [`SceneObject`] | object with local transform, optional mesh and material |
//! | [`MeshData`] | vertices, loops, polygons and UV layers |
//! | [`NodeTree`] | material shader graph |
//! | [`SceneSource`] | what the exporter reads through |
//!
//! # Example
//!
//! ```rust,ignore
//! use sh3_source::{load_scene_dump, SceneSource};
//!
//! let project = load_scene_dump(Path::new("mall.scene-dump.json"))?;
//! for collection in project.collections() {
//!     println!("{}: {} objects", collection.name, collection.objects.len());
//! }
//! ```

pub mod dump;
pub mod graph;
pub mod model;
pub mod traits;

pub use dump::{load_scene_dump, JsonDumpLoader};
pub use graph::{ImageRef, Node, NodeId, NodeInput, NodeKind, NodeTree};
pub use model::{
    Collection, EulerOrder, Material, MeshData, MeshLoop, MeshPolygon, MeshVertex, ObjectKind,
    Project, Rotation, SceneObject, UvLayer,
};
pub use traits::{SceneLoader, SceneSource};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
