//! Scene node types.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// The kind of a scene node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Organizational node; may have children.
    Group,
    /// Renderable surface region.
    Mesh,
    /// Anatomical reference marker.
    Landmark,
}

/// An entry in the scene tree.
///
/// Nodes only carry their appearance state. The parent/child structure lives
/// in the owning [`SceneGraph`](super::SceneGraph) and never changes after
/// construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    id: String,
    name: String,
    kind: NodeKind,
    /// Own renderability flag. Not inherited from the parent.
    pub visible: bool,
    /// Base RGB color, components in [0, 1].
    pub color: Vec3,
    /// Opacity in [0, 1].
    pub opacity: f32,
    /// UI disclosure state of the tree row.
    pub expanded: bool,
}

impl SceneNode {
    /// Creates a visible, opaque node.
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: NodeKind, color: Vec3) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            visible: true,
            color,
            opacity: 1.0,
            expanded: false,
        }
    }

    /// Returns the unique id of this node.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the display name of this node.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the kind of this node.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }
}

/// Declarative description of a node and its subtree, used to build a graph.
#[derive(Debug, Clone)]
pub struct NodeSpec {
    /// The node itself.
    pub node: SceneNode,
    /// Ordered children.
    pub children: Vec<NodeSpec>,
}

impl NodeSpec {
    /// Creates a leaf spec.
    #[must_use]
    pub fn leaf(node: SceneNode) -> Self {
        Self {
            node,
            children: Vec::new(),
        }
    }

    /// Creates a spec with children.
    #[must_use]
    pub fn with_children(node: SceneNode, children: Vec<NodeSpec>) -> Self {
        Self { node, children }
    }

    /// Sets the initial opacity.
    #[must_use]
    pub fn opacity(mut self, opacity: f32) -> Self {
        self.node.opacity = opacity;
        self
    }

    /// Sets the initial disclosure state.
    #[must_use]
    pub fn expanded(mut self, expanded: bool) -> Self {
        self.node.expanded = expanded;
        self
    }
}
