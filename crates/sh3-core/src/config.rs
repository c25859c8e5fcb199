//! Process-wide export configuration
//!
//! Built once at startup, validated here, then passed by reference to every
//! entry point. Nothing below this module reads the environment.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Environment variable holding the resources (authoring) root
pub const ENV_RESOURCES: &str = "SH3_RESOURCES";
/// Environment variable holding the engine game-data (output) root
pub const ENV_GAME_DATA: &str = "SH3_GAME_DATA";
/// Environment variable holding the project root (where the tools are built)
pub const ENV_PROJECT: &str = "SH3_PROJECT";

/// Name of the project marker file searched by [`find_game_data_root`]
pub const PROJECT_CONFIG_FILE: &str = "project-config.json";

const PROJECT_CONFIG_MAX_DEPTH: usize = 6;
const SCENE_TOOL_RELATIVE: &str = "bin/debug/scene-tool";
const MESH_TOOL_RELATIVE: &str = "bin/debug/mesh-tool";

/// Validated roots used by the exporter
#[derive(Debug, Clone)]
pub struct ExportConfig {
    resources_root: PathBuf,
    game_data_root: PathBuf,
    project_root: PathBuf,
    tool_override: Option<PathBuf>,
}

impl ExportConfig {
    /// Create a configuration from explicit roots.
    ///
    /// Relative roots are resolved against the working directory. The
    /// resources root must be an existing directory since every source path
    /// is virtualized against it. The other roots only need to be set.
    pub fn new(
        resources_root: impl Into<PathBuf>,
        game_data_root: impl Into<PathBuf>,
        project_root: impl Into<PathBuf>,
    ) -> Result<Self> {
        let resources_root = resolve_root(ENV_RESOURCES, resources_root.into())?;
        let game_data_root = resolve_root(ENV_GAME_DATA, game_data_root.into())?;
        let project_root = resolve_root(ENV_PROJECT, project_root.into())?;

        if !resources_root.is_dir() {
            return Err(Error::invalid_config(format!(
                "{ENV_RESOURCES} is not a directory: {}",
                resources_root.display()
            )));
        }

        Ok(Self {
            resources_root,
            game_data_root,
            project_root,
            tool_override: None,
        })
    }

    /// Read the three roots from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var_os(key))
    }

    /// Read the three roots through an arbitrary lookup function
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let get = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .ok_or_else(|| Error::missing_config(key))
        };

        Self::new(get(ENV_RESOURCES)?, get(ENV_GAME_DATA)?, get(ENV_PROJECT)?)
    }

    /// Use an explicit conversion tool instead of the one under the project root
    pub fn with_tool(mut self, tool: impl Into<PathBuf>) -> Self {
        self.tool_override = Some(tool.into());
        self
    }

    pub fn resources_root(&self) -> &Path {
        &self.resources_root
    }

    pub fn game_data_root(&self) -> &Path {
        &self.game_data_root
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Scene tool executable (`<project>/bin/debug/scene-tool`)
    pub fn scene_tool(&self) -> PathBuf {
        self.tool_or(SCENE_TOOL_RELATIVE)
    }

    /// Legacy per-chunk mesh tool executable (`<project>/bin/debug/mesh-tool`)
    pub fn mesh_tool(&self) -> PathBuf {
        self.tool_or(MESH_TOOL_RELATIVE)
    }

    /// Absolute output path for a game-data relative path
    pub fn game_data_path(&self, relative: &str) -> PathBuf {
        self.game_data_root.join(relative)
    }

    fn tool_or(&self, relative: &str) -> PathBuf {
        match &self.tool_override {
            Some(tool) => tool.clone(),
            None => self
                .project_root
                .join(format!("{relative}{}", std::env::consts::EXE_SUFFIX)),
        }
    }
}

/// Reject an empty root and make the rest absolute against the working directory
fn resolve_root(key: &str, path: PathBuf) -> Result<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(Error::missing_config(key));
    }
    Ok(std::path::absolute(&path)?)
}

#[derive(Deserialize)]
struct ProjectConfigFile {
    #[serde(rename = "gameData")]
    game_data: PathBuf,
}

/// Locate the game-data root by walking up from `start` to the nearest
/// `project-config.json` and reading its `gameData` entry.
///
/// The search gives up after a handful of ancestors.
pub fn find_game_data_root(start: &Path) -> Result<PathBuf> {
    let mut dir = Some(start);

    for _ in 0..PROJECT_CONFIG_MAX_DEPTH {
        let Some(current) = dir else { break };

        let candidate = current.join(PROJECT_CONFIG_FILE);
        if candidate.is_file() {
            let text = std::fs::read_to_string(&candidate)?;
            let config: ProjectConfigFile = serde_json::from_str(&text)?;
            tracing::debug!(path = %candidate.display(), "Found project config");
            return Ok(current.join(config.game_data));
        }

        dir = current.parent();
    }

    Err(Error::missing_config(PROJECT_CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup_from(map: HashMap<&'static str, OsString>) -> impl Fn(&str) -> Option<OsString> {
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_variable_is_fatal() {
        let dir = TempDir::new().unwrap();
        let mut vars = HashMap::new();
        vars.insert(ENV_RESOURCES, dir.path().as_os_str().to_owned());
        vars.insert(ENV_GAME_DATA, OsString::from("/tmp/game-data"));

        let err = ExportConfig::from_lookup(lookup_from(vars)).unwrap_err();
        assert!(matches!(err, Error::MissingConfig { ref key } if key == ENV_PROJECT));
        assert!(err.is_fatal_startup());
    }

    #[test]
    fn test_empty_variable_counts_as_missing() {
        let mut vars = HashMap::new();
        vars.insert(ENV_RESOURCES, OsString::new());

        let err = ExportConfig::from_lookup(lookup_from(vars)).unwrap_err();
        assert!(matches!(err, Error::MissingConfig { ref key } if key == ENV_RESOURCES));
    }

    #[test]
    fn test_resources_root_must_exist() {
        let err = ExportConfig::new("/definitely/not/here", "/out", "/project").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }

    #[test]
    fn test_tool_paths() {
        let dir = TempDir::new().unwrap();
        let config = ExportConfig::new(dir.path(), "/out", "/project").unwrap();

        let tool = config.scene_tool();
        assert!(tool.starts_with("/project/bin/debug"));
        assert!(tool.to_string_lossy().contains("scene-tool"));

        let config = config.with_tool("/usr/local/bin/custom-tool");
        assert_eq!(config.scene_tool(), PathBuf::from("/usr/local/bin/custom-tool"));
        assert_eq!(config.mesh_tool(), PathBuf::from("/usr/local/bin/custom-tool"));
    }

    #[test]
    fn test_relative_roots_are_resolved() {
        let dir = tempfile::Builder::new().tempdir_in(".").unwrap();
        let name = dir.path().file_name().unwrap();
        let relative = PathBuf::from(name);
        assert!(relative.is_relative());

        let config = ExportConfig::new(&relative, "out", "project").unwrap();
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(config.resources_root(), cwd.join(name));
        assert_eq!(config.game_data_root(), cwd.join("out"));
        assert_eq!(config.project_root(), cwd.join("project"));
        assert_eq!(config.game_data_path("maps/a.scene.json"), cwd.join("out/maps/a.scene.json"));
    }

    #[test]
    fn test_find_game_data_root_walks_up() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(PROJECT_CONFIG_FILE),
            r#"{ "gameData": "game/data" }"#,
        )
        .unwrap();
        let nested = dir.path().join("a/b/c");
        std::fs::create_dir_all(&nested).unwrap();

        let root = find_game_data_root(&nested).unwrap();
        assert_eq!(root, dir.path().join("game/data"));
    }

    #[test]
    fn test_find_game_data_root_gives_up() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("1/2/3/4/5/6/7");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(
            dir.path().join(PROJECT_CONFIG_FILE),
            r#"{ "gameData": "data" }"#,
        )
        .unwrap();

        assert!(find_game_data_root(&nested).is_err());
    }
}
