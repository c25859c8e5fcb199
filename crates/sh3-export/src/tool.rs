//! External conversion tool invocation
//!
//! A payload is packed into a temporary file whose path is passed as the only
//! argument. The call blocks until the tool exits.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use sh3_core::{Error, ExportConfig, Result};

use crate::payload::Payload;

/// Which conversion tool to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolKind {
    /// One run for every scene of the export
    #[default]
    SceneTool,
    /// Legacy tool, one run per render chunk
    MeshTool,
}

impl ToolKind {
    pub fn path(self, config: &ExportConfig) -> PathBuf {
        match self {
            ToolKind::SceneTool => config.scene_tool(),
            ToolKind::MeshTool => config.mesh_tool(),
        }
    }
}

/// Result of a successful tool run
#[derive(Debug, Clone)]
pub struct Invocation {
    pub tool: PathBuf,
    pub payload_bytes: usize,
    /// Location of the payload when it was kept
    pub kept_payload: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ToolInvoker {
    tool: PathBuf,
    keep_data: bool,
}

impl ToolInvoker {
    pub fn new(tool: impl Into<PathBuf>, keep_data: bool) -> Self {
        Self {
            tool: tool.into(),
            keep_data,
        }
    }

    pub fn tool(&self) -> &Path {
        &self.tool
    }

    /// Pack `payload`, run the tool on it and wait.
    ///
    /// The temporary file is removed afterwards, whatever the outcome, unless
    /// the invoker was created with `keep_data`.
    pub fn invoke<P: Payload>(&self, payload: &P) -> Result<Invocation> {
        let bytes = payload.pack()?;

        let mut file = tempfile::Builder::new()
            .prefix("sh3-export-")
            .suffix(".msgpack")
            .tempfile()?;
        file.write_all(&bytes)?;
        file.flush()?;
        let temp_path = file.into_temp_path();

        tracing::info!(
            tool = %self.tool.display(),
            payload = payload.kind(),
            bytes = bytes.len(),
            data = %temp_path.display(),
            "Running conversion tool"
        );

        if self.keep_data {
            let path = temp_path.keep().map_err(|e| Error::Io(e.error))?;
            tracing::info!(path = %path.display(), "Payload data kept");
            self.run(&path)?;
            Ok(Invocation {
                tool: self.tool.clone(),
                payload_bytes: bytes.len(),
                kept_payload: Some(path),
            })
        } else {
            let outcome = self.run(&temp_path);
            let data = temp_path.to_path_buf();
            if let Err(err) = temp_path.close() {
                match &outcome {
                    Ok(()) => return Err(err.into()),
                    Err(_) => tracing::warn!(
                        path = %data.display(),
                        error = %err,
                        "Could not remove payload file"
                    ),
                }
            }
            outcome?;
            Ok(Invocation {
                tool: self.tool.clone(),
                payload_bytes: bytes.len(),
                kept_payload: None,
            })
        }
    }

    fn run(&self, data: &Path) -> Result<()> {
        let status = Command::new(&self.tool)
            .arg(data)
            .status()
            .map_err(|source| Error::ToolLaunch {
                tool: self.tool.clone(),
                source,
            })?;

        if status.success() {
            tracing::debug!(tool = %self.tool.display(), "Conversion tool finished");
            Ok(())
        } else {
            Err(Error::ToolInvocation {
                tool: self.tool.clone(),
                code: status.code(),
            })
        }
    }
}
