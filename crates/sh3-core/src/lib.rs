//! sh3 core library
//!
//! This crate provides the error type, value types, string identifiers and
//! export configuration shared across all exporter crates.

pub mod config;
pub mod error;
pub mod string_id;
pub mod types;

pub use config::ExportConfig;
pub use error::{Error, Result, ResultExt};
pub use string_id::{string_hash, StringId};
pub use types::*;

/// Re-export commonly used items
pub mod prelude {
    pub use crate::config::ExportConfig;
    pub use crate::error::{Error, Result, ResultExt};
    pub use crate::string_id::{string_hash, StringId};
    pub use crate::types::*;
}
