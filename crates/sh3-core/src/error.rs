//! Unified error handling for the sh3 exporter
//!
//! Every crate in the workspace reports failures through this type so the
//! export pipeline can abort a run with a single, readable diagnostic.

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for all exporter operations
#[derive(Error, Debug)]
pub enum Error {
    // ==================== I/O Errors ====================

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// JSON (de)serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Binary payload packing failure
    #[error("Failed to pack {format} payload: {message}")]
    Pack {
        format: &'static str,
        message: String,
    },

    // ==================== Path Errors ====================

    /// A `..` segment ascends above the project root
    #[error("Path escapes the project root: {path}")]
    PathEscape {
        path: String,
    },

    /// Path does not live under the configured root at all
    #[error("Path {path} is not inside root {root}")]
    PathOutsideRoot {
        path: PathBuf,
        root: PathBuf,
    },

    /// Path cannot be represented as a virtual path (non UTF-8, empty, ...)
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    // ==================== Geometry Errors ====================

    /// A face reached extraction with a loop count other than three
    #[error("Mesh {mesh}: face {face} has {loops} loops, expected a triangle")]
    NonTriangularFace {
        mesh: String,
        face: usize,
        loops: usize,
    },

    /// Mesh produced no vertices
    #[error("Mesh {object} has no vertices")]
    EmptyMesh {
        object: String,
    },

    /// A mesh object carries no geometry
    #[error("Object {object} is a mesh but has no mesh data")]
    MissingMeshData {
        object: String,
    },

    /// Mesh data references something that does not exist
    #[error("Mesh {mesh}: {message}")]
    InvalidMesh {
        mesh: String,
        message: String,
    },

    /// Object material cannot be exported
    #[error("Object {object} has bad material: {reason}")]
    BadMaterial {
        object: String,
        reason: String,
    },

    // ==================== Entity Errors ====================

    /// Component lookup on an entity failed
    #[error("Component with type {type_id} not found on entity {entity}")]
    ComponentNotFound {
        entity: String,
        type_id: u64,
    },

    /// Entity lookup on a scene failed
    #[error("Entity with name {name} not found in scene {scene}")]
    EntityNotFound {
        scene: String,
        name: String,
    },

    /// Builder needs a source object but the entity was created from scratch
    #[error("Component {component} requires a source object, entity {entity} has none")]
    MissingSourceObject {
        entity: String,
        component: &'static str,
    },

    /// Builder requires a specific object kind
    #[error("Component {component} expects a {expected} object, {entity} is {found}")]
    UnexpectedObjectKind {
        entity: String,
        component: &'static str,
        expected: &'static str,
        found: String,
    },

    // ==================== Tool Errors ====================

    /// External conversion tool could not be started
    #[error("Failed to launch {tool}: {source}")]
    ToolLaunch {
        tool: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// External conversion tool exited with a non-zero status
    #[error("{tool} failed with exit code {}", exit_code_label(.code))]
    ToolInvocation {
        tool: PathBuf,
        code: Option<i32>,
    },

    // ==================== Configuration Errors ====================

    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        message: String,
    },

    /// Missing configuration
    #[error("Missing configuration: {key}")]
    MissingConfig {
        key: String,
    },

    /// The authoring scene has never been saved, so it has no virtual location
    #[error("Scene is not saved; save it somewhere under the resources root first")]
    SceneNotSaved,

    // ==================== General Errors ====================

    /// Internal error (should not happen)
    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },

    /// Custom error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

fn exit_code_label(code: &Option<i32>) -> String {
    code.map_or_else(|| "<signal>".to_string(), |c| c.to_string())
}

/// Result type using the unified Error
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an error with additional context
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Error::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Error::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a missing configuration error
    pub fn missing_config(key: impl Into<String>) -> Self {
        Error::MissingConfig { key: key.into() }
    }

    /// Strip any context wrappers
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::WithContext { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Errors raised before any scene is processed
    pub fn is_fatal_startup(&self) -> bool {
        matches!(
            self.root_cause(),
            Error::MissingConfig { .. } | Error::InvalidConfig { .. } | Error::SceneNotSaved
        )
    }

    /// Errors caused by malformed geometry
    pub fn is_geometry_error(&self) -> bool {
        matches!(
            self.root_cause(),
            Error::NonTriangularFace { .. }
                | Error::EmptyMesh { .. }
                | Error::MissingMeshData { .. }
                | Error::InvalidMesh { .. }
        )
    }

    /// Errors produced while resolving virtual paths
    pub fn is_path_error(&self) -> bool {
        matches!(
            self.root_cause(),
            Error::PathEscape { .. } | Error::PathOutsideRoot { .. } | Error::InvalidPath(_)
        )
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
