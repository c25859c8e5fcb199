//! Per-scene postprocessing
//!
//! Actions are keyed by a scene's virtual path. [`PostprocessRegistry::apply`]
//! runs the action registered for the exact path, then always the
//! [`DEFAULT_KEY`] action.

use std::collections::HashMap;

use sh3_core::Result;

use crate::scene::Scene;

pub mod maps;

/// Key of the action that runs after every scene
pub const DEFAULT_KEY: &str = "default";

/// Postprocess action
pub type PostprocessAction = Box<dyn Fn(&mut Scene) -> Result<()> + Send + Sync>;

/// Scene-path keyed postprocess actions
#[derive(Default)]
pub struct PostprocessRegistry {
    actions: HashMap<String, PostprocessAction>,
}

impl PostprocessRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in map action
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        maps::register_all(&mut registry);
        registry
    }

    /// Register an action for a scene path, replacing any previous one
    pub fn register<F>(&mut self, path: impl Into<String>, action: F)
    where
        F: Fn(&mut Scene) -> Result<()> + Send + Sync + 'static,
    {
        let path = path.into();
        if self.actions.insert(path.clone(), Box::new(action)).is_some() {
            tracing::warn!(path = %path, "Replaced postprocess action");
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.actions.contains_key(path)
    }

    /// Registered scene paths, sorted
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.actions.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }

    /// Run the scene's own action (if any) followed by the default action
    pub fn apply(&self, scene: &mut Scene) -> Result<()> {
        let path = scene.virtual_path().to_string();

        match self.actions.get(&path) {
            Some(action) if path != DEFAULT_KEY => {
                tracing::debug!(scene = %path, "Running postprocess");
                action(scene)?;
            }
            Some(_) => {}
            None => tracing::warn!(scene = %path, "Postprocess for scene not found"),
        }

        if let Some(default) = self.actions.get(DEFAULT_KEY) {
            default(scene)?;
        }

        Ok(())
    }
}

impl std::fmt::Debug for PostprocessRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostprocessRegistry")
            .field("actions", &self.paths())
            .finish()
    }
}
