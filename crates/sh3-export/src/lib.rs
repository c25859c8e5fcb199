//! sh3 Export Pipeline
//!
//! Converts an authoring scene into engine data:
//! - MessagePack mesh/material payloads for the conversion tools
//! - JSON entity/component scene descriptions, one per collection
//!
//! # Example
//!
//! ```rust,ignore
//! use sh3_export::{Exporter, ExportOptions, PostprocessRegistry};
//!
//! let config = ExportConfig::from_env()?;
//! let project = sh3_source::load_scene_dump(&dump_path)?;
//! let exporter = Exporter::new(&config, ExportOptions::default(), PostprocessRegistry::builtin());
//! let summary = exporter.run(&project, None)?;
//! ```

pub mod geometry;
pub mod json;
pub mod logging;
pub mod material;
pub mod payload;
pub mod pipeline;
pub mod postprocess;
pub mod scene;
pub mod tool;

pub use geometry::{extract, mesh_info, triangulate, MeshInfo, Vertex};
pub use json::{SceneDocument, SceneJsonWriter};
pub use material::{
    describe_graph, find_node, DiffuseUsage, MaterialInfo, MaterialIssue, MaterialResolver,
    TextureInfo, DIFFUSE_PATH,
};
pub use payload::{Payload, RenderChunkPayload, ScenesPayload};
pub use pipeline::{
    ExportOptions, ExportPhase, ExportProgress, ExportSummary, Exporter, MaterialPolicy,
    ProgressCallback, ScenePaths,
};
pub use postprocess::{PostprocessRegistry, DEFAULT_KEY};
pub use scene::{
    Component, ComponentBuilder, ComponentData, ComponentKind, DefaultFreeFlyCameraComponent,
    Entity, FreeFlyCameraComponent, PreparedObject, RenderMeshComponent, Scene,
    TransformComponent,
};
pub use tool::{Invocation, ToolInvoker, ToolKind};
