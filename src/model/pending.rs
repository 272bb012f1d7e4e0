//! Collaborator mutations in flight.
//!
//! Slot updates are applied locally before they are queued, edge changes are
//! queued first and applied when confirmed. Either way the outcome stays
//! inspectable here instead of being fired and forgotten.

use std::fmt;
use uuid::Uuid;

use super::hierarchy::{DayIndex, EdgeId, GroupId, LeafId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpId(pub Uuid);

impl OpId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OpId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingKind {
    SlotUpdate {
        leaf: LeafId,
        slot: DayIndex,
        previous: DayIndex,
    },
    CreateEdge {
        predecessor: LeafId,
        successor: LeafId,
    },
    DeleteEdge {
        edge: EdgeId,
    },
    GroupOrder {
        order: Vec<GroupId>,
    },
}

impl PendingKind {
    pub fn describe(&self) -> String {
        match self {
            PendingKind::SlotUpdate { leaf, slot, .. } => format!("move {leaf} to slot {slot}"),
            PendingKind::CreateEdge { predecessor, successor } => {
                format!("link {predecessor} -> {successor}")
            }
            PendingKind::DeleteEdge { edge } => format!("remove {edge}"),
            PendingKind::GroupOrder { order } => format!("reorder {} teams", order.len()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpStatus {
    Pending,
    Applied,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOp {
    pub id: OpId,
    pub kind: PendingKind,
    pub status: OpStatus,
    sent: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PendingQueue {
    ops: Vec<PendingOp>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit(&mut self, kind: PendingKind) -> OpId {
        let id = OpId::new();
        tracing::debug!(op = %id, what = %kind.describe(), "queued");
        self.ops.push(PendingOp {
            id,
            kind,
            status: OpStatus::Pending,
            sent: false,
        });
        id
    }

    /// Ops not handed to the collaborator yet, marked as sent.
    pub fn take_unsent(&mut self) -> Vec<(OpId, PendingKind)> {
        self.ops
            .iter_mut()
            .filter(|op| !op.sent)
            .map(|op| {
                op.sent = true;
                (op.id, op.kind.clone())
            })
            .collect()
    }

    /// Record the collaborator's answer. Unknown ids are ignored.
    pub fn resolve(&mut self, id: OpId, status: OpStatus) -> Option<&PendingOp> {
        let Some(op) = self.ops.iter_mut().find(|op| op.id == id) else {
            tracing::warn!(op = %id, "result for unknown operation ignored");
            return None;
        };
        op.status = status;
        Some(op)
    }

    pub fn get(&self, id: OpId) -> Option<&PendingOp> {
        self.ops.iter().find(|op| op.id == id)
    }

    pub fn ops(&self) -> &[PendingOp] {
        &self.ops
    }

    pub fn in_flight(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| op.status == OpStatus::Pending)
            .count()
    }

    pub fn is_edge_request_in_flight(&self, predecessor: LeafId, successor: LeafId) -> bool {
        self.ops.iter().any(|op| {
            op.status == OpStatus::Pending
                && op.kind
                    == PendingKind::CreateEdge {
                        predecessor,
                        successor,
                    }
        })
    }

    pub fn is_delete_in_flight(&self, edge: EdgeId) -> bool {
        self.ops.iter().any(|op| {
            op.status == OpStatus::Pending && op.kind == PendingKind::DeleteEdge { edge }
        })
    }

    /// Links asked for and not answered yet, as `(predecessor, successor)`.
    pub fn requested_edges(&self) -> Vec<(LeafId, LeafId)> {
        self.ops
            .iter()
            .filter(|op| op.status == OpStatus::Pending)
            .filter_map(|op| match op.kind {
                PendingKind::CreateEdge { predecessor, successor } => Some((predecessor, successor)),
                _ => None,
            })
            .collect()
    }

    /// Slot updates the collaborator refused after the local commit.
    pub fn drift(&self) -> impl Iterator<Item = &PendingOp> {
        self.ops.iter().filter(|op| {
            matches!(op.status, OpStatus::Failed(_))
                && matches!(op.kind, PendingKind::SlotUpdate { .. })
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = &PendingOp> {
        self.ops
            .iter()
            .filter(|op| matches!(op.status, OpStatus::Failed(_)))
    }

    /// Give up on everything still pending, e.g. when the collaborator is
    /// replaced and its answers will never arrive. Nothing abandoned is sent again.
    pub fn abandon(&mut self, reason: &str) -> usize {
        let mut count = 0;
        for op in self.ops.iter_mut().filter(|op| op.status == OpStatus::Pending) {
            op.status = OpStatus::Failed(reason.to_string());
            op.sent = true;
            count += 1;
        }
        count
    }

    /// Forget applied ops. Failures stay until `clear_settled`.
    pub fn prune(&mut self) {
        self.ops.retain(|op| op.status != OpStatus::Applied);
    }

    /// Drop everything that is no longer pending, used after a full reload.
    pub fn clear_settled(&mut self) -> usize {
        let before = self.ops.len();
        self.ops.retain(|op| op.status == OpStatus::Pending);
        before - self.ops.len()
    }
}
