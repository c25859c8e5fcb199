//! JSON scene dumps
//!
//! The authoring tool side serializes its open scene to JSON with the same
//! field names as [`Project`]. Loading validates every index so the exporter
//! can walk meshes and graphs without bounds checks failing later.

use std::io::Read;
use std::path::Path;

use sh3_core::{Result, ResultExt};

use crate::model::Project;
use crate::traits::SceneLoader;

/// Loader for `.json` scene dumps
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonDumpLoader;

impl JsonDumpLoader {
    pub fn new() -> Self {
        Self
    }
}

impl SceneLoader for JsonDumpLoader {
    fn name(&self) -> &str {
        "JSON scene dump"
    }

    fn extensions(&self) -> &[&str] {
        &["json"]
    }

    fn load<R: Read>(&self, reader: R) -> Result<Project> {
        let project: Project = serde_json::from_reader(reader)?;
        project.validate()?;

        tracing::debug!(
            collections = project.collections.len(),
            materials = project.materials.len(),
            saved = project.file_path.is_some(),
            "Loaded scene dump"
        );

        Ok(project)
    }
}

/// Load and validate a scene dump from disk
pub fn load_scene_dump(path: &Path) -> Result<Project> {
    JsonDumpLoader
        .load_file(path)
        .with_context(|| format!("loading scene dump {}", path.display()))
}
