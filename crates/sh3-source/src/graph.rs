//! Material shader node graphs
//!
//! Nodes live in a flat arena and refer to each other by [`NodeId`]. Only the
//! node kinds the exporter understands get their own variant, everything else
//! is carried as [`NodeKind::Other`] with the tool's type name.

use serde::{Deserialize, Serialize};
use sh3_core::{Error, Result};

/// Index of a node inside its [`NodeTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

/// Image referenced by a texture node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Image path as stored by the authoring tool (may start with `//`)
    pub filepath: String,
    /// Pixel dimensions
    #[serde(default)]
    pub size: [i32; 2],
}

impl ImageRef {
    pub fn new(filepath: impl Into<String>, size: [i32; 2]) -> Self {
        Self {
            filepath: filepath.into(),
            size,
        }
    }
}

/// Node type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum NodeKind {
    OutputMaterial,
    PrincipledBsdf,
    ImageTexture(ImageRef),
    Other(String),
}

impl NodeKind {
    /// Tool-side type name, used when dumping graphs
    pub fn type_name(&self) -> &str {
        match self {
            NodeKind::OutputMaterial => "OutputMaterial",
            NodeKind::PrincipledBsdf => "PrincipledBsdf",
            NodeKind::ImageTexture(_) => "ImageTexture",
            NodeKind::Other(name) => name,
        }
    }

    /// Compare kinds ignoring payloads
    pub fn same_kind(&self, other: &NodeKind) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

/// Named input socket and the nodes linked into it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInput {
    pub name: String,
    #[serde(default)]
    pub links: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    #[serde(default)]
    pub inputs: Vec<NodeInput>,
}

impl Node {
    /// Input socket by name
    pub fn input(&self, name: &str) -> Option<&NodeInput> {
        self.inputs.iter().find(|input| input.name == name)
    }
}

/// Shader node graph of one material
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeTree {
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// Active material output, if the tool marked one
    #[serde(default)]
    pub output: Option<NodeId>,
}

impl NodeTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node and return its id
    pub fn add_node(&mut self, name: impl Into<String>, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name: name.into(),
            kind,
            inputs: Vec::new(),
        });
        id
    }

    /// Link `from` into the input socket `input` of `to`, creating the socket
    /// if needed. Unknown ids are ignored.
    pub fn link(&mut self, from: NodeId, to: NodeId, input: &str) {
        if from.0 >= self.nodes.len() {
            return;
        }
        let Some(node) = self.nodes.get_mut(to.0) else {
            return;
        };

        match node.inputs.iter_mut().find(|i| i.name == input) {
            Some(socket) => socket.links.push(from),
            None => node.inputs.push(NodeInput {
                name: input.to_string(),
                links: vec![from],
            }),
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Active output node, falling back to the first material output
    pub fn active_output(&self) -> Option<NodeId> {
        self.output.or_else(|| {
            self.nodes
                .iter()
                .position(|node| node.kind == NodeKind::OutputMaterial)
                .map(NodeId)
        })
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Check that every link and the output id point at an existing node
    pub fn validate(&self) -> Result<()> {
        let count = self.nodes.len();

        if let Some(output) = self.output {
            if output.0 >= count {
                return Err(Error::internal(format!(
                    "node tree output {} out of range ({count} nodes)",
                    output.0
                )));
            }
        }

        for node in &self.nodes {
            for input in &node.inputs {
                if let Some(bad) = input.links.iter().find(|id| id.0 >= count) {
                    return Err(Error::internal(format!(
                        "node {} input {} links to missing node {}",
                        node.name, input.name, bad.0
                    )));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_creates_socket() {
        let mut tree = NodeTree::new();
        let out = tree.add_node("Material Output", NodeKind::OutputMaterial);
        let bsdf = tree.add_node("Principled BSDF", NodeKind::PrincipledBsdf);
        tree.link(bsdf, out, "Surface");
        tree.link(bsdf, out, "Surface");

        let node = tree.node(out).unwrap();
        assert_eq!(node.inputs.len(), 1);
        assert_eq!(node.input("Surface").unwrap().links, vec![bsdf, bsdf]);
        assert!(node.input("Volume").is_none());
    }

    #[test]
    fn test_active_output_fallback() {
        let mut tree = NodeTree::new();
        tree.add_node("Mix", NodeKind::Other("ShaderNodeMix".into()));
        let out = tree.add_node("Material Output", NodeKind::OutputMaterial);
        assert_eq!(tree.active_output(), Some(out));

        tree.output = Some(NodeId(0));
        assert_eq!(tree.active_output(), Some(NodeId(0)));
    }

    #[test]
    fn test_validate_rejects_dangling_links() {
        let mut tree = NodeTree::new();
        let out = tree.add_node("Material Output", NodeKind::OutputMaterial);
        tree.nodes[out.0].inputs.push(NodeInput {
            name: "Surface".into(),
            links: vec![NodeId(7)],
        });
        assert!(tree.validate().is_err());
    }

    #[test]
    fn test_kind_serialization() {
        let kind = NodeKind::ImageTexture(ImageRef::new("//tex/a.png", [64, 32]));
        let json = serde_json::to_value(&kind).unwrap();
        assert_eq!(json["type"], "ImageTexture");
        assert_eq!(json["data"]["filepath"], "//tex/a.png");

        let other: NodeKind =
            serde_json::from_str(r#"{ "type": "Other", "data": "ShaderNodeMix" }"#).unwrap();
        assert_eq!(other.type_name(), "ShaderNodeMix");
        assert!(other.same_kind(&NodeKind::Other("x".into())));
        assert!(!other.same_kind(&NodeKind::PrincipledBsdf));
    }
}
