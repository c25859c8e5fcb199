//! Scene description output
//!
//! Writes the per-collection entity/component file read by the engine's
//! scene loader.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use sh3_core::{Result, StringId};

use crate::scene::{ObjectDocument, Scene};

/// Contents of a `.scene.json` file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneDocument {
    pub objects: Vec<ObjectDocument>,
    pub render_chunks: Vec<StringId>,
}

impl SceneDocument {
    /// Serialize a scene that references the given render chunks
    pub fn from_scene(scene: &Scene, render_chunks: Vec<StringId>) -> Self {
        Self {
            objects: scene.serialize(),
            render_chunks,
        }
    }
}

/// Scene document writer options
#[derive(Debug, Clone)]
pub struct JsonWriteOptions {
    /// Use pretty-print formatting
    pub pretty: bool,
}

impl Default for JsonWriteOptions {
    fn default() -> Self {
        Self { pretty: true }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SceneJsonWriter {
    options: JsonWriteOptions,
}

impl SceneJsonWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: JsonWriteOptions) -> Self {
        Self { options }
    }

    /// Write `document` to `output_path`, creating parent directories
    pub fn write(&self, document: &SceneDocument, output_path: impl AsRef<Path>) -> Result<()> {
        let output_path = output_path.as_ref();
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = File::create(output_path)?;
        let mut writer = BufWriter::new(file);

        if self.options.pretty {
            serde_json::to_writer_pretty(&mut writer, document)?;
        } else {
            serde_json::to_writer(&mut writer, document)?;
        }
        writer.flush()?;

        tracing::info!(
            path = %output_path.display(),
            objects = document.objects.len(),
            "Wrote scene description"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::DefaultFreeFlyCameraComponent;
    use tempfile::TempDir;

    #[test]
    fn test_write_scene_document() {
        let mut scene = Scene::new("maps/x0/room");
        scene
            .add_custom_entity("debug-free-fly")
            .add_component(&DefaultFreeFlyCameraComponent)
            .unwrap();
        let chunk = StringId::new("maps/x0/room.chunk");
        let document = SceneDocument::from_scene(&scene, vec![chunk]);

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("maps/x0/room.scene.json");
        SceneJsonWriter::new().write(&document, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("{\n  \"objects\": ["));
        assert!(text.find("\"objects\"").unwrap() < text.find("\"render_chunks\"").unwrap());

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["render_chunks"][0], chunk.value());
        assert_eq!(value["objects"][0]["id"], StringId::new("debug-free-fly").value());
        assert_eq!(
            value["objects"][0]["components"][0]["type"],
            16698278480017516018u64
        );
    }

    #[test]
    fn test_compact_output() {
        let document = SceneDocument {
            objects: Vec::new(),
            render_chunks: Vec::new(),
        };
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.scene.json");
        SceneJsonWriter::with_options(JsonWriteOptions { pretty: false })
            .write(&document, &path)
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            r#"{"objects":[],"render_chunks":[]}"#
        );
    }
}
