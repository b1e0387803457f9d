//! Scene graph for the dental model viewer.
//!
//! The tree is stored as an arena: every node lives in a flat vector and is
//! addressed by a stable [`NodeKey`]; parent/child links are kept in a
//! separate topology table that is fixed after construction. Nodes are held
//! behind [`Arc`] so an edit clones only the touched node and shares every
//! other node with the previous graph.
//!
//! # Visibility
//!
//! Visibility is **not** inherited. Hiding a group flips that group's own
//! flag only; its children keep their flags and render state. Whether hiding
//! a group should cascade is an open product question, and this graph keeps
//! the non-cascading behaviour until it is decided.

pub mod defaults;
mod node;

use std::collections::HashMap;
use std::sync::Arc;

use glam::Vec3;

use crate::error::{DentiscopeError, Result};

pub use node::{NodeKind, NodeSpec, SceneNode};

/// Stable index of a node inside its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(usize);

impl NodeKey {
    /// Returns the raw arena index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Parent/child structure. Shared by every version of a graph.
#[derive(Debug, PartialEq)]
struct Topology {
    roots: Vec<NodeKey>,
    children: Vec<Vec<NodeKey>>,
    parents: Vec<Option<NodeKey>>,
    index: HashMap<String, NodeKey>,
}

/// A single mutation of a node's appearance state.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEdit {
    /// Flip the node's own `visible` flag.
    ToggleVisibility(String),
    /// Replace the node's color.
    SetColor(String, Vec3),
    /// Replace the node's opacity (clamped to [0, 1]).
    SetOpacity(String, f32),
    /// Flip the node's tree disclosure state.
    ToggleExpand(String),
}

impl SceneEdit {
    /// Returns the id of the node this edit targets.
    #[must_use]
    pub fn node_id(&self) -> &str {
        match self {
            Self::ToggleVisibility(id)
            | Self::SetColor(id, _)
            | Self::SetOpacity(id, _)
            | Self::ToggleExpand(id) => id,
        }
    }
}

/// An ordered tree of named, typed scene nodes.
///
/// All editing operations are persistent: they return a new graph and leave
/// `self` untouched. Cloning a graph is cheap.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneGraph {
    topology: Arc<Topology>,
    nodes: Vec<Arc<SceneNode>>,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::dental()
    }
}

impl SceneGraph {
    /// Builds a graph from root specs.
    ///
    /// Fails if two nodes share an id.
    pub fn from_specs(roots: Vec<NodeSpec>) -> Result<Self> {
        let mut topology = Topology {
            roots: Vec::with_capacity(roots.len()),
            children: Vec::new(),
            parents: Vec::new(),
            index: HashMap::new(),
        };
        let mut nodes = Vec::new();

        for spec in roots {
            let key = Self::insert_spec(&mut topology, &mut nodes, spec, None)?;
            topology.roots.push(key);
        }

        Ok(Self {
            topology: Arc::new(topology),
            nodes,
        })
    }

    fn insert_spec(
        topology: &mut Topology,
        nodes: &mut Vec<Arc<SceneNode>>,
        spec: NodeSpec,
        parent: Option<NodeKey>,
    ) -> Result<NodeKey> {
        let key = NodeKey(nodes.len());
        let id = spec.node.id().to_string();
        if topology.index.contains_key(&id) {
            return Err(DentiscopeError::DuplicateNode(id));
        }
        topology.index.insert(id, key);
        topology.children.push(Vec::with_capacity(spec.children.len()));
        topology.parents.push(parent);
        nodes.push(Arc::new(spec.node));

        for child in spec.children {
            let child_key = Self::insert_spec(topology, nodes, child, Some(key))?;
            topology.children[key.0].push(child_key);
        }
        Ok(key)
    }

    /// Builds the fixed default dental hierarchy (see [`defaults`]).
    #[must_use]
    pub fn dental() -> Self {
        match Self::from_specs(defaults::default_hierarchy()) {
            Ok(graph) => graph,
            // The default table is static and has unique ids.
            Err(e) => unreachable!("default hierarchy is invalid: {e}"),
        }
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Looks up the key of a node id.
    #[must_use]
    pub fn key(&self, id: &str) -> Option<NodeKey> {
        self.topology.index.get(id).copied()
    }

    /// Returns the node at a key.
    #[must_use]
    pub fn node(&self, key: NodeKey) -> Option<&SceneNode> {
        self.nodes.get(key.0).map(AsRef::as_ref)
    }

    /// Returns the shared handle of the node at a key.
    ///
    /// Two graph versions hold pointer-equal handles for nodes that were not
    /// edited between them.
    #[must_use]
    pub fn node_handle(&self, key: NodeKey) -> Option<&Arc<SceneNode>> {
        self.nodes.get(key.0)
    }

    /// Finds a node by id, walking the tree in pre-order.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&SceneNode> {
        self.preorder().find(|node| node.id() == id)
    }

    /// Returns the root nodes in display order.
    pub fn roots(&self) -> impl Iterator<Item = &SceneNode> {
        self.topology.roots.iter().map(|k| self.nodes[k.0].as_ref())
    }

    /// Returns the children of a node in order. Unknown ids yield nothing.
    pub fn children(&self, id: &str) -> impl Iterator<Item = &SceneNode> {
        self.key(id)
            .map(|k| self.topology.children[k.0].as_slice())
            .unwrap_or_default()
            .iter()
            .map(|k| self.nodes[k.0].as_ref())
    }

    /// Returns the parent of a node, if it has one.
    #[must_use]
    pub fn parent(&self, id: &str) -> Option<&SceneNode> {
        let key = self.key(id)?;
        let parent = self.topology.parents[key.0]?;
        self.node(parent)
    }

    /// Returns the top-level ancestor of a node (the node itself for roots).
    #[must_use]
    pub fn root_of(&self, id: &str) -> Option<&SceneNode> {
        let mut key = self.key(id)?;
        while let Some(parent) = self.topology.parents[key.0] {
            key = parent;
        }
        self.node(key)
    }

    /// Iterates all nodes in pre-order.
    pub fn preorder(&self) -> impl Iterator<Item = &SceneNode> {
        self.preorder_with_depth().map(|(node, _)| node)
    }

    /// Iterates all nodes in pre-order together with their depth (roots are 0).
    pub fn preorder_with_depth(&self) -> impl Iterator<Item = (&SceneNode, usize)> {
        let mut stack: Vec<(NodeKey, usize)> =
            self.topology.roots.iter().rev().map(|k| (*k, 0)).collect();
        std::iter::from_fn(move || {
            let (key, depth) = stack.pop()?;
            stack.extend(
                self.topology.children[key.0]
                    .iter()
                    .rev()
                    .map(|child| (*child, depth + 1)),
            );
            Some((self.nodes[key.0].as_ref(), depth))
        })
    }

    /// Returns the rows of the tree view: nodes whose ancestors are all expanded.
    #[must_use]
    pub fn visible_rows(&self) -> Vec<(&SceneNode, usize)> {
        let mut rows = Vec::new();
        for key in &self.topology.roots {
            self.collect_rows(*key, 0, &mut rows);
        }
        rows
    }

    fn collect_rows<'a>(&'a self, key: NodeKey, depth: usize, rows: &mut Vec<(&'a SceneNode, usize)>) {
        let node = self.nodes[key.0].as_ref();
        rows.push((node, depth));
        if node.expanded {
            for child in &self.topology.children[key.0] {
                self.collect_rows(*child, depth + 1, rows);
            }
        }
    }

    fn updated(&self, id: &str, edit: impl FnOnce(&mut SceneNode)) -> Result<Self> {
        let key = self
            .key(id)
            .ok_or_else(|| DentiscopeError::NodeNotFound(id.to_string()))?;
        let mut next = self.clone();
        edit(Arc::make_mut(&mut next.nodes[key.0]));
        Ok(next)
    }

    /// Returns a graph with the node's own visibility flag flipped.
    ///
    /// Children are untouched; see the module docs.
    pub fn toggle_visibility(&self, id: &str) -> Result<Self> {
        self.updated(id, |node| node.visible = !node.visible)
    }

    /// Returns a graph with the node's color replaced.
    pub fn set_color(&self, id: &str, color: Vec3) -> Result<Self> {
        let color = color.clamp(Vec3::ZERO, Vec3::ONE);
        self.updated(id, |node| node.color = color)
    }

    /// Returns a graph with the node's opacity replaced, clamped to [0, 1].
    ///
    /// A NaN opacity leaves the node unchanged.
    pub fn set_opacity(&self, id: &str, opacity: f32) -> Result<Self> {
        self.updated(id, |node| {
            if opacity.is_nan() {
                log::warn!("ignoring NaN opacity for node '{}'", node.id());
            } else {
                node.opacity = opacity.clamp(0.0, 1.0);
            }
        })
    }

    /// Returns a graph with the node's disclosure state flipped.
    pub fn toggle_expand(&self, id: &str) -> Result<Self> {
        self.updated(id, |node| node.expanded = !node.expanded)
    }

    /// Applies a [`SceneEdit`].
    pub fn apply(&self, edit: &SceneEdit) -> Result<Self> {
        match edit {
            SceneEdit::ToggleVisibility(id) => self.toggle_visibility(id),
            SceneEdit::SetColor(id, color) => self.set_color(id, *color),
            SceneEdit::SetOpacity(id, opacity) => self.set_opacity(id, *opacity),
            SceneEdit::ToggleExpand(id) => self.toggle_expand(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::defaults::*;
    use super::*;

    #[test]
    fn test_default_hierarchy_shape() {
        let scene = SceneGraph::dental();
        let roots: Vec<&str> = scene.roots().map(SceneNode::id).collect();
        assert_eq!(roots, [UPPER_JAW, LOWER_JAW, TEETH, ANATOMY, LANDMARKS]);
        assert_eq!(scene.children(UPPER_JAW).count(), 0);
        assert_eq!(scene.children(LOWER_JAW).count(), 0);
        assert_eq!(scene.children(TEETH).count(), 4);
        assert_eq!(scene.children(ANATOMY).count(), 8);
        assert_eq!(scene.children(LANDMARKS).count(), 2);
        assert_eq!(scene.len(), 19);
        assert!(scene
            .children(LANDMARKS)
            .all(|n| n.kind() == NodeKind::Landmark));
    }

    #[test]
    fn test_preorder_order() {
        let scene = SceneGraph::dental();
        let ids: Vec<&str> = scene.preorder().map(SceneNode::id).take(5).collect();
        assert_eq!(ids, [UPPER_JAW, LOWER_JAW, TEETH, UPPER_CROWN, LOWER_CROWN]);
    }

    #[test]
    fn test_find() {
        let scene = SceneGraph::dental();
        assert_eq!(scene.find(SINUS).map(SceneNode::name), Some("Sinus"));
        assert!(scene.find("nonexistent").is_none());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let a = NodeSpec::leaf(SceneNode::new("a", "A", NodeKind::Mesh, Vec3::ONE));
        let result = SceneGraph::from_specs(vec![a.clone(), a]);
        assert!(matches!(result, Err(DentiscopeError::DuplicateNode(id)) if id == "a"));
    }

    #[test]
    fn test_toggle_does_not_cascade() {
        let scene = SceneGraph::dental();
        let hidden = scene.toggle_visibility(ANATOMY).expect("known id");
        assert!(!hidden.find(ANATOMY).map_or(true, |n| n.visible));
        assert!(hidden.children(ANATOMY).all(|n| n.visible));
    }

    #[test]
    fn test_sibling_untouched() {
        let scene = SceneGraph::dental();
        let next = scene.toggle_visibility(SINUS).expect("known id");
        assert_eq!(next.find(MANDIBLE).map(|n| n.visible), Some(true));
        let sinus = next.key(SINUS).expect("key");
        let mandible = next.key(MANDIBLE).expect("key");
        assert!(!Arc::ptr_eq(
            scene.node_handle(sinus).expect("node"),
            next.node_handle(sinus).expect("node")
        ));
        assert!(Arc::ptr_eq(
            scene.node_handle(mandible).expect("node"),
            next.node_handle(mandible).expect("node")
        ));
    }

    #[test]
    fn test_unknown_id_is_error() {
        let scene = SceneGraph::dental();
        let err = scene.toggle_visibility("molar-99").expect_err("unknown id");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_opacity_clamped() {
        let scene = SceneGraph::dental();
        let next = scene.set_opacity(TEETH, 1.7).expect("known id");
        assert_eq!(next.find(TEETH).map(|n| n.opacity), Some(1.0));
        let next = next.set_opacity(TEETH, -0.5).expect("known id");
        assert_eq!(next.find(TEETH).map(|n| n.opacity), Some(0.0));
        let unchanged = next.set_opacity(TEETH, f32::NAN).expect("known id");
        assert_eq!(unchanged, next);
    }

    #[test]
    fn test_visible_rows_follow_expansion() {
        let scene = SceneGraph::dental();
        // Only teeth is expanded by default: 5 roots + 4 teeth children.
        assert_eq!(scene.visible_rows().len(), 9);
        let expanded = scene.toggle_expand(ANATOMY).expect("known id");
        assert_eq!(expanded.visible_rows().len(), 17);
    }

    #[test]
    fn test_root_of_and_parent() {
        let scene = SceneGraph::dental();
        assert_eq!(scene.root_of(AIRWAYS).map(SceneNode::id), Some(ANATOMY));
        assert_eq!(scene.root_of(TEETH).map(SceneNode::id), Some(TEETH));
        assert_eq!(scene.parent(MIDLINE).map(SceneNode::id), Some(LANDMARKS));
        assert!(scene.parent(UPPER_JAW).is_none());
    }
}
