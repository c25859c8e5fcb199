//! Interfaces between the exporter and wherever scenes come from.
//!
//! The exporter only ever reads through [`SceneSource`]. Scene files on disk
//! are turned into a [`Project`] by a [`SceneLoader`].

use std::io::Read;
use std::path::Path;

use sh3_core::Result;

use crate::model::{Collection, Material, Project};

/// Read-only access to an open authoring scene
pub trait SceneSource {
    /// Location of the saved scene file, `None` if it was never saved
    fn file_path(&self) -> Option<&Path>;

    /// Top-level collections in tool order
    fn collections(&self) -> &[Collection];

    /// Material by name
    fn material(&self, name: &str) -> Option<&Material>;
}

impl SceneSource for Project {
    fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    fn collections(&self) -> &[Collection] {
        &self.collections
    }

    fn material(&self, name: &str) -> Option<&Material> {
        self.materials.iter().find(|m| m.name == name)
    }
}

/// Turns a serialized scene into a [`Project`]
pub trait SceneLoader: Send + Sync {
    /// Human-readable loader name
    fn name(&self) -> &str;

    /// File extensions handled by this loader (e.g. `["json"]`)
    fn extensions(&self) -> &[&str];

    /// Load from a reader
    fn load<R: Read>(&self, reader: R) -> Result<Project>
    where
        Self: Sized;

    /// Load from a file path
    fn load_file(&self, path: &Path) -> Result<Project>
    where
        Self: Sized,
    {
        if !path.exists() {
            return Err(sh3_core::Error::FileNotFound(path.to_path_buf()));
        }
        let file = std::fs::File::open(path)?;
        self.load(std::io::BufReader::new(file))
    }

    /// Check the extension against [`SceneLoader::extensions`]
    fn can_load(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| self.extensions().iter().any(|e| e.eq_ignore_ascii_case(&ext)))
    }
}
