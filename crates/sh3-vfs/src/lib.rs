//! sh3 virtual paths
//!
//! Every path the exporter emits or hashes is first made relative to the
//! resources root:
//! - separators are normalized to `/`
//! - `.` and `..` segments are resolved
//! - paths that climb above the root are rejected
//!
//! # Example
//! ```no_run
//! use sh3_vfs::PathVirtualizer;
//!
//! let vfs = PathVirtualizer::new("/home/me/sh3/resources");
//! let info = vfs.virtualize("/home/me/sh3/resources/maps/x0/tex.png").unwrap();
//! assert_eq!(info.relative, "maps/x0/tex.png");
//! ```

pub mod path;

pub use path::{
    normalize_relative, render_chunk_name, resolve_source_path, scene_json_name,
    scene_virtual_name, strip_extension, virtualize, PathInfo, PathVirtualizer,
};
