//! Virtual path utilities
//!
//! A virtual path is relative to the resources root, uses `/` separators and
//! never contains `.` or `..` segments. It is what gets hashed into ids, so two
//! spellings of the same file must virtualize to the same string.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use sh3_core::{Error, Result};

/// Prefix the authoring tool uses for paths relative to the open scene file
pub const SCENE_RELATIVE_PREFIX: &str = "//";

/// A source path split into root, absolute and virtual forms
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathInfo {
    /// Resolved root the path was made relative to
    pub base: String,
    /// Absolute source path
    pub full: String,
    /// Root-relative, dot-free path
    #[serde(rename = "path")]
    pub relative: String,
}

/// Turns absolute authoring paths into virtual paths under one root
#[derive(Debug, Clone)]
pub struct PathVirtualizer {
    root: PathBuf,
}

impl PathVirtualizer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Virtualize a path against this root
    pub fn virtualize(&self, path: impl AsRef<Path>) -> Result<PathInfo> {
        virtualize(path.as_ref(), &self.root)
    }
}

/// Virtualize `path` against `root`.
///
/// Relative inputs are taken as relative to the root. Fails with
/// [`Error::PathEscape`] when `..` segments climb above the root and with
/// [`Error::PathOutsideRoot`] when the path is not under the root at all.
pub fn virtualize(path: &Path, root: &Path) -> Result<PathInfo> {
    let full = if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    };

    let remainder = full.strip_prefix(root).map_err(|_| Error::PathOutsideRoot {
        path: full.clone(),
        root: root.to_path_buf(),
    })?;

    let relative = normalize_components(remainder)?;
    tracing::trace!(path = %full.display(), virtual_path = %relative, "Virtualized path");

    Ok(PathInfo {
        base: to_posix(root),
        full: to_posix(&full),
        relative,
    })
}

/// Resolve `.` and `..` in an already relative `/` or `\` separated path.
///
/// Idempotent on dot-free relative paths.
pub fn normalize_relative(path: &str) -> Result<String> {
    let path = path.replace('\\', "/");
    let mut stack: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                if stack.pop().is_none() {
                    return Err(Error::PathEscape { path: path.clone() });
                }
            }
            _ => stack.push(segment),
        }
    }

    Ok(stack.join("/"))
}

fn normalize_components(path: &Path) -> Result<String> {
    let mut stack: Vec<&str> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => continue,
            Component::ParentDir => {
                if stack.pop().is_none() {
                    return Err(Error::PathEscape {
                        path: to_posix(path),
                    });
                }
            }
            Component::Normal(segment) => {
                let segment = segment
                    .to_str()
                    .ok_or_else(|| Error::InvalidPath(path.to_string_lossy().into_owned()))?;
                stack.push(segment);
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(Error::InvalidPath(to_posix(path)));
            }
        }
    }

    Ok(stack.join("/"))
}

/// Render a path with forward slashes
pub fn to_posix(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Resolve a path as stored by the authoring tool.
///
/// Paths starting with `//` are relative to the directory of the scene file.
pub fn resolve_source_path(raw: &str, scene_dir: Option<&Path>) -> PathBuf {
    match (raw.strip_prefix(SCENE_RELATIVE_PREFIX), scene_dir) {
        (Some(rest), Some(dir)) => dir.join(rest.replace('\\', "/")),
        _ => PathBuf::from(raw),
    }
}

/// Get filename from path
pub fn filename(path: &str) -> &str {
    let path = path.trim_end_matches('/');

    if let Some(pos) = path.rfind('/') {
        &path[pos + 1..]
    } else {
        path
    }
}

/// Get file extension from path
pub fn get_extension(path: &str) -> Option<&str> {
    let filename = filename(path);

    if let Some(pos) = filename.rfind('.') {
        if pos > 0 && pos < filename.len() - 1 {
            return Some(&filename[pos + 1..]);
        }
    }

    None
}

/// Drop the last extension of the final segment (`a/b.tar.gz` -> `a/b.tar`)
pub fn strip_extension(path: &str) -> String {
    match get_extension(path) {
        Some(ext) => path[..path.len() - ext.len() - 1].to_string(),
        None => path.to_string(),
    }
}

/// Cross-reference key of a collection: extension-stripped scene path joined
/// with the collection name
pub fn scene_virtual_name(scene_relative: &str, collection: &str) -> String {
    let dirname = strip_extension(scene_relative);
    if dirname.is_empty() {
        collection.to_string()
    } else {
        format!("{dirname}/{collection}")
    }
}

/// Game-data relative path of the render chunk built for a scene
pub fn render_chunk_name(virtual_name: &str) -> String {
    format!("{virtual_name}.chunk")
}

/// Game-data relative path of the entity/component scene file
pub fn scene_json_name(virtual_name: &str) -> String {
    format!("{virtual_name}.scene.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_virtualize_under_root() {
        let info = virtualize(Path::new("/res/maps/x0/tex.png"), Path::new("/res")).unwrap();
        assert_eq!(info.base, "/res");
        assert_eq!(info.full, "/res/maps/x0/tex.png");
        assert_eq!(info.relative, "maps/x0/tex.png");
    }

    #[test]
    fn test_virtualize_resolves_dots() {
        let info =
            virtualize(Path::new("/res/maps/./x0/../x1/tex.png"), Path::new("/res")).unwrap();
        assert_eq!(info.relative, "maps/x1/tex.png");
    }

    #[test]
    fn test_virtualize_escape_fails() {
        let err = virtualize(Path::new("a/../../b"), Path::new("/res")).unwrap_err();
        assert!(matches!(err, Error::PathEscape { .. }));
    }

    #[test]
    fn test_virtualize_outside_root() {
        let err = virtualize(Path::new("/elsewhere/tex.png"), Path::new("/res")).unwrap_err();
        assert!(matches!(err, Error::PathOutsideRoot { .. }));
    }

    #[test]
    fn test_virtualize_relative_input_is_unchanged() {
        let info = virtualize(Path::new("tex/diffuse.png"), Path::new("/res")).unwrap();
        assert_eq!(info.relative, "tex/diffuse.png");
    }

    #[test]
    fn test_normalize_relative() {
        assert_eq!(normalize_relative("foo/bar").unwrap(), "foo/bar");
        assert_eq!(normalize_relative("foo\\bar").unwrap(), "foo/bar");
        assert_eq!(normalize_relative("foo//bar").unwrap(), "foo/bar");
        assert_eq!(normalize_relative("foo/./bar").unwrap(), "foo/bar");
        assert_eq!(normalize_relative("foo/baz/../bar").unwrap(), "foo/bar");
        assert_eq!(normalize_relative("a/..").unwrap(), "");
        assert!(normalize_relative("a/../../b").is_err());
        assert!(normalize_relative("../b").is_err());
    }

    #[test]
    fn test_resolve_source_path() {
        let dir = Path::new("/res/maps");
        assert_eq!(
            resolve_source_path("//textures/a.png", Some(dir)),
            PathBuf::from("/res/maps/textures/a.png")
        );
        assert_eq!(
            resolve_source_path("/abs/a.png", Some(dir)),
            PathBuf::from("/abs/a.png")
        );
        assert_eq!(resolve_source_path("//a.png", None), PathBuf::from("//a.png"));
    }

    #[test]
    fn test_strip_extension() {
        assert_eq!(strip_extension("tex/diffuse.png"), "tex/diffuse");
        assert_eq!(strip_extension("maps/mall.blend"), "maps/mall");
        assert_eq!(strip_extension("a.b/c"), "a.b/c");
        assert_eq!(strip_extension("archive.tar.gz"), "archive.tar");
        assert_eq!(strip_extension(".hidden"), ".hidden");
    }

    #[test]
    fn test_scene_virtual_name() {
        assert_eq!(
            scene_virtual_name("maps/mall-real/mall-real-split.blend", "mref"),
            "maps/mall-real/mall-real-split/mref"
        );
        assert_eq!(scene_virtual_name("", "root"), "root");
    }

    #[test]
    fn test_output_names() {
        assert_eq!(render_chunk_name("maps/a/b"), "maps/a/b.chunk");
        assert_eq!(scene_json_name("maps/a/b"), "maps/a/b.scene.json");
    }

    #[test]
    fn test_get_extension() {
        assert_eq!(get_extension("/path/file.txt"), Some("txt"));
        assert_eq!(get_extension("file.PNG"), Some("PNG"));
        assert_eq!(get_extension("no_extension"), None);
        assert_eq!(get_extension(".hidden"), None);
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent_on_dot_free_paths(
            segments in proptest::collection::vec("[a-zA-Z0-9_-][a-zA-Z0-9_.-]{0,7}", 0..6)
        ) {
            let segments: Vec<String> = segments
                .into_iter()
                .filter(|s| s != "." && s != "..")
                .collect();
            let path = segments.join("/");
            let once = normalize_relative(&path).unwrap();
            prop_assert_eq!(&once, &path);
            prop_assert_eq!(normalize_relative(&once).unwrap(), once);
        }
    }
}
