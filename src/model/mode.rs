use serde::{Deserialize, Serialize};

use super::dependency::DependencyGraph;
use super::hierarchy::{EdgeId, LeafId};

/// Interaction mode of the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Order,
    Dependency,
    Inspect,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Order, Mode::Dependency, Mode::Inspect];

    pub fn label(self) -> &'static str {
        match self {
            Mode::Order => "Order",
            Mode::Dependency => "Dependencies",
            Mode::Inspect => "Inspect",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Group,
    Unit,
    Leaf,
}

/// Edges around the inspected leaf, split by direction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InspectHighlight {
    pub leaf: Option<LeafId>,
    pub incoming: Vec<EdgeId>,
    pub outgoing: Vec<EdgeId>,
}

/// `order | dependency | inspect` with the selection state owned by each mode.
#[derive(Debug, Clone, Default)]
pub struct ModeController {
    mode: Mode,
    selected_edge: Option<EdgeId>,
    connect_from: Option<LeafId>,
    highlight: InspectHighlight,
}

impl ModeController {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Switch modes. Leaving dependency or inspect mode clears their selection.
    pub fn set_mode(&mut self, mode: Mode) {
        if mode == self.mode {
            return;
        }
        match self.mode {
            Mode::Dependency => {
                self.selected_edge = None;
                self.connect_from = None;
            }
            Mode::Inspect => self.highlight = InspectHighlight::default(),
            Mode::Order => {}
        }
        tracing::debug!(from = ?self.mode, to = ?mode, "mode change");
        self.mode = mode;
    }

    pub fn can_drag(&self, kind: NodeKind) -> bool {
        match self.mode {
            Mode::Order => true,
            Mode::Dependency => kind == NodeKind::Leaf,
            Mode::Inspect => false,
        }
    }

    /// Whether the node takes pointer input at all. In dependency mode lanes
    /// and rows let clicks through to the edges beneath them.
    pub fn is_interactive(&self, kind: NodeKind) -> bool {
        match self.mode {
            Mode::Dependency => kind == NodeKind::Leaf,
            Mode::Order | Mode::Inspect => true,
        }
    }

    pub fn can_connect(&self) -> bool {
        self.mode == Mode::Dependency
    }

    pub fn selected_edge(&self) -> Option<EdgeId> {
        self.selected_edge
    }

    /// Select an edge for deletion. Only valid in dependency mode.
    pub fn select_edge(&mut self, edge: EdgeId) -> bool {
        if self.mode != Mode::Dependency {
            return false;
        }
        self.selected_edge = Some(edge);
        true
    }

    pub fn clear_edge_selection(&mut self) {
        self.selected_edge = None;
    }

    /// Start a connection gesture from a leaf's output handle.
    pub fn begin_connection(&mut self, from: LeafId) -> bool {
        if !self.can_connect() {
            return false;
        }
        self.connect_from = Some(from);
        true
    }

    pub fn connection_source(&self) -> Option<LeafId> {
        self.connect_from
    }

    /// Finish on a leaf's input handle, yielding `(predecessor, successor)`.
    pub fn finish_connection(&mut self, to: LeafId) -> Option<(LeafId, LeafId)> {
        let from = self.connect_from.take()?;
        Some((from, to))
    }

    pub fn cancel_connection(&mut self) {
        self.connect_from = None;
    }

    /// Highlight incoming and outgoing edges of `leaf`. Only valid in inspect mode.
    pub fn inspect_leaf(&mut self, leaf: LeafId, graph: &DependencyGraph) -> bool {
        if self.mode != Mode::Inspect {
            return false;
        }
        self.highlight = InspectHighlight {
            leaf: Some(leaf),
            incoming: graph.incoming(leaf).map(|e| e.id).collect(),
            outgoing: graph.outgoing(leaf).map(|e| e.id).collect(),
        };
        true
    }

    pub fn clear_highlight(&mut self) {
        self.highlight = InspectHighlight::default();
    }

    pub fn highlight(&self) -> &InspectHighlight {
        &self.highlight
    }

    /// Forget references to an edge that no longer exists.
    pub fn forget_edge(&mut self, edge: EdgeId) {
        if self.selected_edge == Some(edge) {
            self.selected_edge = None;
        }
        self.highlight.incoming.retain(|e| *e != edge);
        self.highlight.outgoing.retain(|e| *e != edge);
    }
}
