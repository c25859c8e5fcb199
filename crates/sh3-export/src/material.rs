//! Material export
//!
//! Walks a material's shader graph from the active output to the image that
//! feeds the base color and packages it with the blend mode.

use std::fmt::Write as _;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sh3_core::Error;
use sh3_source::{Material, NodeId, NodeKind, NodeTree};
use sh3_vfs::{path::strip_extension, resolve_source_path, PathInfo, PathVirtualizer};
use thiserror::Error;

/// How the diffuse texture is used by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiffuseUsage {
    Opaque,
    Transparent,
    Perforating,
}

impl DiffuseUsage {
    /// Map the tool's blend method
    pub fn from_blend_method(method: &str) -> Option<Self> {
        match method {
            "OPAQUE" => Some(DiffuseUsage::Opaque),
            "HASHED" | "CLIP" => Some(DiffuseUsage::Perforating),
            "BLEND" => Some(DiffuseUsage::Transparent),
            _ => None,
        }
    }
}

/// Texture reference as sent to the conversion tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureInfo {
    /// Virtual path, extension kept
    pub path: String,
    pub size: [i32; 2],
    /// Full path breakdown, only sent in the legacy chunk payload
    #[serde(skip)]
    pub source: Option<PathInfo>,
}

impl TextureInfo {
    /// Extension-free virtual path; this is what texture ids are hashed from
    pub fn id_path(&self) -> String {
        strip_extension(&self.path)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialInfo {
    pub name: String,
    pub diffuse: TextureInfo,
    pub diffuse_usage: Option<DiffuseUsage>,
}

/// One hop of a graph search: the node must be of `kind`, continue through
/// the links of its `input` socket
#[derive(Debug, Clone, PartialEq)]
pub struct PathStep {
    pub kind: NodeKind,
    pub input: &'static str,
}

/// Output -> Surface -> Principled BSDF -> Base Color
pub const DIFFUSE_PATH: [PathStep; 2] = [
    PathStep {
        kind: NodeKind::OutputMaterial,
        input: "Surface",
    },
    PathStep {
        kind: NodeKind::PrincipledBsdf,
        input: "Base Color",
    },
];

/// Depth-first search along `steps` starting at `start`.
///
/// Every link of a matching socket is tried in order and a dead end falls back
/// to the next link. Returns the node reached after the last step.
pub fn find_node(tree: &NodeTree, start: NodeId, steps: &[PathStep]) -> Option<NodeId> {
    let Some((step, rest)) = steps.split_first() else {
        return Some(start);
    };

    let node = tree.node(start)?;
    if !node.kind.same_kind(&step.kind) {
        return None;
    }

    node.inputs
        .iter()
        .filter(|input| input.name == step.input)
        .flat_map(|input| input.links.iter())
        .find_map(|&from| find_node(tree, from, rest))
}

const DESCRIBE_MAX_DEPTH: usize = 8;

/// Indented dump of the graph feeding `start`
pub fn describe_graph(tree: &NodeTree, start: NodeId) -> String {
    let mut out = String::new();
    describe_node(tree, start, 0, &mut out);
    out
}

fn describe_node(tree: &NodeTree, id: NodeId, depth: usize, out: &mut String) {
    let prefix = "  ".repeat(depth);
    let Some(node) = tree.node(id) else {
        let _ = writeln!(out, "{prefix}<missing node {}>", id.0);
        return;
    };

    let _ = writeln!(out, "{prefix}{} [{}]", node.name, node.kind.type_name());
    if depth >= DESCRIBE_MAX_DEPTH {
        return;
    }

    for input in &node.inputs {
        let _ = writeln!(out, "{prefix}> {}", input.name);
        for &from in &input.links {
            describe_node(tree, from, depth + 1, out);
        }
    }
}

/// Reasons a material cannot be exported
#[derive(Error, Debug)]
pub enum MaterialIssue {
    #[error("no active material")]
    NoMaterial,

    #[error("material {0} has no nodes")]
    NoNodes(String),

    #[error("material {0}: color node not found")]
    ColorNodeNotFound(String),

    #[error("material {material}: color node {node} is {kind}, not an image texture")]
    ColorNodeNotImage {
        material: String,
        node: String,
        kind: String,
    },

    #[error("material {material}: bad texture path")]
    TexturePath {
        material: String,
        #[source]
        source: Error,
    },
}

impl MaterialIssue {
    /// Short error code as reported by the engine's importer
    pub fn code(&self) -> &'static str {
        match self {
            MaterialIssue::NoMaterial => "MaterialMissing",
            MaterialIssue::NoNodes(_) => "MaterialNoNodes",
            MaterialIssue::ColorNodeNotFound(_) => "MaterialNoColorNode",
            MaterialIssue::ColorNodeNotImage { .. } => "MaterialColorNodeBadType",
            MaterialIssue::TexturePath { .. } => "MaterialTexturePath",
        }
    }
}

/// Resolves materials of one scene file against the resources root
#[derive(Debug, Clone)]
pub struct MaterialResolver {
    virtualizer: PathVirtualizer,
    scene_dir: Option<PathBuf>,
}

impl MaterialResolver {
    pub fn new(virtualizer: PathVirtualizer, scene_dir: Option<PathBuf>) -> Self {
        Self {
            virtualizer,
            scene_dir,
        }
    }

    /// Resolve a material, reporting why it cannot be exported
    pub fn try_resolve(&self, material: Option<&Material>) -> Result<MaterialInfo, MaterialIssue> {
        let material = material.ok_or(MaterialIssue::NoMaterial)?;
        let tree = material
            .node_tree
            .as_ref()
            .filter(|tree| !tree.is_empty())
            .ok_or_else(|| MaterialIssue::NoNodes(material.name.clone()))?;

        let color = tree
            .active_output()
            .and_then(|output| find_node(tree, output, &DIFFUSE_PATH))
            .and_then(|id| tree.node(id))
            .ok_or_else(|| MaterialIssue::ColorNodeNotFound(material.name.clone()))?;

        let NodeKind::ImageTexture(image) = &color.kind else {
            return Err(MaterialIssue::ColorNodeNotImage {
                material: material.name.clone(),
                node: color.name.clone(),
                kind: color.kind.type_name().to_string(),
            });
        };

        let source = resolve_source_path(&image.filepath, self.scene_dir.as_deref());
        let info = self
            .virtualizer
            .virtualize(&source)
            .map_err(|source| MaterialIssue::TexturePath {
                material: material.name.clone(),
                source,
            })?;

        let diffuse_usage = DiffuseUsage::from_blend_method(&material.blend_method);
        if diffuse_usage.is_none() {
            tracing::warn!(
                material = %material.name,
                blend_method = %material.blend_method,
                "Material has no known blend method"
            );
        }

        Ok(MaterialInfo {
            name: material.name.clone(),
            diffuse: TextureInfo {
                path: info.relative.clone(),
                size: image.size,
                source: Some(info),
            },
            diffuse_usage,
        })
    }

    /// Resolve a material, logging a warning and the graph instead of failing
    pub fn resolve(&self, material: Option<&Material>) -> Option<MaterialInfo> {
        match self.try_resolve(material) {
            Ok(info) => Some(info),
            Err(issue) => {
                tracing::warn!(code = issue.code(), "{issue}");
                if let Some(tree) = material.and_then(|m| m.node_tree.as_ref()) {
                    if let Some(output) = tree.active_output() {
                        tracing::debug!("Material graph:\n{}", describe_graph(tree, output));
                    }
                }
                None
            }
        }
    }
}
