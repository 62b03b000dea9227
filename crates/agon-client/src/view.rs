//! The rendering-ready graph projection.
//!
//! [`GraphView`] is what a rendering engine consumes: flat node and edge
//! lists plus the root id. Nodes carry the judge-assigned text and proof
//! state alongside client-only layout metadata — an optional [`Pin`] set
//! when the user drags a node, absent by default. The view is only ever
//! replaced wholesale by reconciliation or touched through the pin
//! accessors; both run on the same task, so pin updates are merged forward
//! by reconciliation rather than overwritten by it.

use serde::Serialize;

use agon_core::ids::StatementId;
use agon_core::statement::StatementState;

/// Fixed layout coordinates for a node the user has dragged.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Pin {
    /// Fixed x coordinate.
    pub x: f64,
    /// Fixed y coordinate.
    pub y: f64,
    /// Fixed z coordinate (zero for planar renderers).
    pub z: f64,
}

impl Pin {
    /// A pin at planar coordinates `(x, y)`.
    #[must_use]
    pub const fn planar(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }
}

/// One renderable statement node.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RenderNode {
    /// Judge-assigned id.
    pub id: StatementId,
    /// The claim text.
    pub statement: String,
    /// Judge-assigned proof status.
    pub state: StatementState,
    /// Client-only pinned coordinates; `None` means the layout engine is
    /// free to position the node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pin: Option<Pin>,
}

impl RenderNode {
    /// Canonical string key (`"seq,gen"`) for renderers that index nodes
    /// by string id.
    #[must_use]
    pub fn key(&self) -> String {
        self.id.to_string()
    }
}

/// One renderable implication edge, pointing child (conclusion) → parent
/// (premise), matching the direction snapshots encode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RenderEdge {
    /// The conclusion-side node.
    pub source: StatementId,
    /// The premise-side node.
    pub target: StatementId,
}

/// The client-held projection of the statement graph.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GraphView {
    nodes: Vec<RenderNode>,
    edges: Vec<RenderEdge>,
    root: StatementId,
}

impl Default for GraphView {
    /// An empty view rooted at [`StatementId::ROOT`].
    fn default() -> Self {
        Self::new(StatementId::ROOT)
    }
}

impl GraphView {
    /// An empty view with the given root id.
    #[must_use]
    pub fn new(root: StatementId) -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            root,
        }
    }

    /// Assemble a view from parts (used by reconciliation).
    #[must_use]
    pub fn from_parts(nodes: Vec<RenderNode>, edges: Vec<RenderEdge>, root: StatementId) -> Self {
        Self { nodes, edges, root }
    }

    /// The designated root statement.
    #[must_use]
    pub fn root(&self) -> StatementId {
        self.root
    }

    /// All nodes, in snapshot order.
    #[must_use]
    pub fn nodes(&self) -> &[RenderNode] {
        &self.nodes
    }

    /// All edges, child → parent.
    #[must_use]
    pub fn edges(&self) -> &[RenderEdge] {
        &self.edges
    }

    /// Look up a node by id.
    #[must_use]
    pub fn node(&self, id: StatementId) -> Option<&RenderNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Whether the view contains a node with this id.
    #[must_use]
    pub fn contains(&self, id: StatementId) -> bool {
        self.node(id).is_some()
    }

    /// Whether the view has no nodes yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Pin a node at fixed coordinates (user drag-end).
    ///
    /// Returns `false` when the id is not in the view.
    pub fn set_pin(&mut self, id: StatementId, pin: Pin) -> bool {
        match self.nodes.iter_mut().find(|n| n.id == id) {
            Some(node) => {
                node.pin = Some(pin);
                true
            }
            None => false,
        }
    }

    /// Release a node back to the layout engine.
    ///
    /// Returns `false` when the id is not in the view.
    pub fn clear_pin(&mut self, id: StatementId) -> bool {
        match self.nodes.iter_mut().find(|n| n.id == id) {
            Some(node) => {
                node.pin = None;
                true
            }
            None => false,
        }
    }
}
