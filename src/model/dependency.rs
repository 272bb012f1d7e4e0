use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::hierarchy::{DayIndex, EdgeId, LeafId};

/// Directed ordering constraint: `predecessor` must sit in an earlier slot than `successor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub id: EdgeId,
    pub predecessor: LeafId,
    pub successor: LeafId,
}

/// Result of checking a proposed slot against every edge touching a leaf.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderingCheck {
    /// Every edge that would be broken, in graph order.
    pub conflicting: Vec<EdgeId>,
    /// Some predecessor would no longer be strictly earlier.
    pub blocked_by_predecessor: bool,
    /// Some successor would no longer be strictly later.
    pub blocked_by_successor: bool,
    /// Requested links, not confirmed yet, that would be broken.
    pub requested: Vec<(LeafId, LeafId)>,
}

impl OrderingCheck {
    pub fn violated(&self) -> bool {
        !self.conflicting.is_empty() || !self.requested.is_empty()
    }

    /// User-facing explanation, `None` when nothing is violated.
    pub fn message(&self) -> Option<&'static str> {
        match (self.blocked_by_predecessor, self.blocked_by_successor) {
            (true, true) => Some("Cannot move: must be after all dependencies and before all dependents"),
            (true, false) => Some("Cannot move: must be after all dependencies"),
            (false, true) => Some("Cannot move: all dependents must be after this"),
            (false, false) => None,
        }
    }
}

/// Why an edge request was refused before reaching the collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeRequestError {
    SelfLoop,
    Duplicate(EdgeId),
    AlreadyRequested,
    UnknownLeaf(LeafId),
    OrderingViolation {
        predecessor_slot: DayIndex,
        successor_slot: DayIndex,
    },
    WrongMode,
}

impl std::fmt::Display for EdgeRequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EdgeRequestError::SelfLoop => write!(f, "An attempt cannot depend on itself"),
            EdgeRequestError::Duplicate(id) => write!(f, "Dependency already exists ({id})"),
            EdgeRequestError::AlreadyRequested => write!(f, "Dependency is already being created"),
            EdgeRequestError::UnknownLeaf(id) => write!(f, "Unknown attempt {id}"),
            EdgeRequestError::OrderingViolation {
                predecessor_slot,
                successor_slot,
            } => write!(
                f,
                "Predecessor at slot {predecessor_slot} must be before successor at slot {successor_slot}"
            ),
            EdgeRequestError::WrongMode => write!(f, "Switch to dependency mode to link attempts"),
        }
    }
}

/// Counts shown in the statistics panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphStats {
    pub leaves: usize,
    pub edges: usize,
    pub average_fan_out: f32,
    /// Leaves with no predecessor.
    pub roots: usize,
    /// Leaves with no successor.
    pub sinks: usize,
}

/// Edge set over leaf ids. Mutated only with collaborator-confirmed edges.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    edges: Vec<DependencyEdge>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from fetched edges, dropping repeated ids.
    pub fn from_edges(edges: impl IntoIterator<Item = DependencyEdge>) -> Self {
        let mut graph = Self::new();
        for edge in edges {
            graph.insert_confirmed(edge);
        }
        graph
    }

    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn get(&self, id: EdgeId) -> Option<&DependencyEdge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn contains(&self, id: EdgeId) -> bool {
        self.get(id).is_some()
    }

    pub fn find_link(&self, predecessor: LeafId, successor: LeafId) -> Option<&DependencyEdge> {
        self.edges
            .iter()
            .find(|e| e.predecessor == predecessor && e.successor == successor)
    }

    /// Append a confirmed edge. Returns false when that id is already present.
    pub fn insert_confirmed(&mut self, edge: DependencyEdge) -> bool {
        if self.contains(edge.id) {
            tracing::debug!(edge = %edge.id, "confirmed edge already present");
            return false;
        }
        self.edges.push(edge);
        true
    }

    pub fn remove_confirmed(&mut self, id: EdgeId) -> Option<DependencyEdge> {
        let pos = self.edges.iter().position(|e| e.id == id)?;
        Some(self.edges.remove(pos))
    }

    /// Edges where `leaf` is the successor.
    pub fn incoming(&self, leaf: LeafId) -> impl Iterator<Item = &DependencyEdge> {
        self.edges.iter().filter(move |e| e.successor == leaf)
    }

    /// Edges where `leaf` is the predecessor.
    pub fn outgoing(&self, leaf: LeafId) -> impl Iterator<Item = &DependencyEdge> {
        self.edges.iter().filter(move |e| e.predecessor == leaf)
    }

    /// Would moving `leaf` to `proposed` break any edge touching it?
    ///
    /// Equal slots count as a violation on both sides. Edges whose other end
    /// cannot be resolved by `slot_of` are skipped.
    pub fn violates_ordering<F>(&self, leaf: LeafId, proposed: DayIndex, slot_of: F) -> OrderingCheck
    where
        F: Fn(LeafId) -> Option<DayIndex>,
    {
        let mut check = OrderingCheck::default();
        for edge in &self.edges {
            if edge.successor == leaf {
                if let Some(pred_slot) = slot_of(edge.predecessor) {
                    if pred_slot >= proposed {
                        check.blocked_by_predecessor = true;
                        check.conflicting.push(edge.id);
                        continue;
                    }
                }
            }
            if edge.predecessor == leaf {
                if let Some(succ_slot) = slot_of(edge.successor) {
                    if succ_slot <= proposed {
                        check.blocked_by_successor = true;
                        check.conflicting.push(edge.id);
                    }
                }
            }
        }
        check
    }

    /// `violates_ordering` that also honours links still waiting for the
    /// collaborator, so a confirmation can never land on a broken pair.
    pub fn check_move<F>(
        &self,
        leaf: LeafId,
        proposed: DayIndex,
        requested: &[(LeafId, LeafId)],
        slot_of: F,
    ) -> OrderingCheck
    where
        F: Fn(LeafId) -> Option<DayIndex>,
    {
        let mut check = self.violates_ordering(leaf, proposed, &slot_of);
        for &(predecessor, successor) in requested {
            if successor == leaf && slot_of(predecessor).is_some_and(|p| p >= proposed) {
                check.blocked_by_predecessor = true;
                check.requested.push((predecessor, successor));
            } else if predecessor == leaf && slot_of(successor).is_some_and(|s| s <= proposed) {
                check.blocked_by_successor = true;
                check.requested.push((predecessor, successor));
            }
        }
        check
    }

    /// Local validation before asking the collaborator for a new edge.
    pub fn validate_request<F>(
        &self,
        predecessor: LeafId,
        successor: LeafId,
        slot_of: F,
    ) -> Result<(), EdgeRequestError>
    where
        F: Fn(LeafId) -> Option<DayIndex>,
    {
        if predecessor == successor {
            return Err(EdgeRequestError::SelfLoop);
        }
        if let Some(existing) = self.find_link(predecessor, successor) {
            return Err(EdgeRequestError::Duplicate(existing.id));
        }
        let predecessor_slot = slot_of(predecessor).ok_or(EdgeRequestError::UnknownLeaf(predecessor))?;
        let successor_slot = slot_of(successor).ok_or(EdgeRequestError::UnknownLeaf(successor))?;
        if predecessor_slot >= successor_slot {
            return Err(EdgeRequestError::OrderingViolation {
                predecessor_slot,
                successor_slot,
            });
        }
        Ok(())
    }

    /// Drop edges touching leaves that no longer exist.
    pub fn retain_leaves<F>(&mut self, exists: F) -> usize
    where
        F: Fn(LeafId) -> bool,
    {
        let before = self.edges.len();
        self.edges
            .retain(|e| exists(e.predecessor) && exists(e.successor));
        before - self.edges.len()
    }

    pub fn stats(&self, leaves: impl IntoIterator<Item = LeafId>) -> GraphStats {
        let leaves: Vec<LeafId> = leaves.into_iter().collect();
        let with_pred: HashSet<LeafId> = self.edges.iter().map(|e| e.successor).collect();
        let with_succ: HashSet<LeafId> = self.edges.iter().map(|e| e.predecessor).collect();
        let average_fan_out = if leaves.is_empty() {
            0.0
        } else {
            self.edges.len() as f32 / leaves.len() as f32
        };
        GraphStats {
            leaves: leaves.len(),
            edges: self.edges.len(),
            average_fan_out,
            roots: leaves.iter().filter(|l| !with_pred.contains(*l)).count(),
            sinks: leaves.iter().filter(|l| !with_succ.contains(*l)).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn edge(id: u64, p: u64, s: u64) -> DependencyEdge {
        DependencyEdge {
            id: EdgeId(id),
            predecessor: LeafId(p),
            successor: LeafId(s),
        }
    }

    fn slots(pairs: &[(u64, DayIndex)]) -> HashMap<LeafId, DayIndex> {
        pairs.iter().map(|&(l, s)| (LeafId(l), s)).collect()
    }

    #[test]
    fn moving_predecessor_past_successor_is_rejected() {
        let graph = DependencyGraph::from_edges([edge(1, 1, 2)]);
        let s = slots(&[(1, 5), (2, 8)]);
        let check = graph.violates_ordering(LeafId(1), 9, |l| s.get(&l).copied());
        assert!(check.violated());
        assert_eq!(check.conflicting, vec![EdgeId(1)]);
        assert_eq!(check.message(), Some("Cannot move: all dependents must be after this"));
    }

    #[test]
    fn successor_may_move_while_still_after_predecessor() {
        let graph = DependencyGraph::from_edges([edge(1, 1, 2)]);
        let s = slots(&[(1, 5), (2, 8)]);
        assert!(!graph.violates_ordering(LeafId(2), 6, |l| s.get(&l).copied()).violated());
        let check = graph.violates_ordering(LeafId(2), 4, |l| s.get(&l).copied());
        assert!(check.blocked_by_predecessor);
        assert_eq!(check.message(), Some("Cannot move: must be after all dependencies"));
    }

    #[test]
    fn equal_slots_violate_in_both_directions() {
        let graph = DependencyGraph::from_edges([edge(1, 1, 2)]);
        let s = slots(&[(1, 5), (2, 8)]);
        assert!(graph.violates_ordering(LeafId(2), 5, |l| s.get(&l).copied()).violated());
        assert!(graph.violates_ordering(LeafId(1), 8, |l| s.get(&l).copied()).violated());
    }

    #[test]
    fn reports_every_conflicting_edge() {
        let graph = DependencyGraph::from_edges([edge(1, 1, 3), edge(2, 2, 3), edge(3, 3, 4), edge(4, 5, 6)]);
        let s = slots(&[(1, 2), (2, 4), (3, 6), (4, 7), (5, 1), (6, 9)]);
        let check = graph.violates_ordering(LeafId(3), 7, |l| s.get(&l).copied());
        assert_eq!(check.conflicting, vec![EdgeId(3)]);
        let check = graph.violates_ordering(LeafId(3), 3, |l| s.get(&l).copied());
        assert_eq!(check.conflicting, vec![EdgeId(2)]);
        let check = graph.violates_ordering(LeafId(3), 1, |l| s.get(&l).copied());
        assert_eq!(check.conflicting, vec![EdgeId(1), EdgeId(2)]);
    }

    #[test]
    fn unresolvable_neighbours_are_skipped() {
        let graph = DependencyGraph::from_edges([edge(1, 1, 2)]);
        let s = slots(&[(2, 3)]);
        assert!(!graph.violates_ordering(LeafId(2), 1, |l| s.get(&l).copied()).violated());
    }

    #[test]
    fn requested_links_block_moves_like_confirmed_ones() {
        let graph = DependencyGraph::new();
        let s = slots(&[(1, 5), (2, 8)]);
        let requested = [(LeafId(1), LeafId(2))];

        let check = graph.check_move(LeafId(1), 12, &requested, |l| s.get(&l).copied());
        assert!(check.violated());
        assert!(check.conflicting.is_empty());
        assert_eq!(check.requested, vec![(LeafId(1), LeafId(2))]);
        assert_eq!(check.message(), Some("Cannot move: all dependents must be after this"));

        let check = graph.check_move(LeafId(2), 5, &requested, |l| s.get(&l).copied());
        assert!(check.blocked_by_predecessor);
        assert!(!graph.check_move(LeafId(2), 6, &requested, |l| s.get(&l).copied()).violated());
    }

    #[test]
    fn confirmed_inserts_are_deduplicated_by_id() {
        let mut graph = DependencyGraph::new();
        assert!(graph.insert_confirmed(edge(42, 1, 2)));
        assert!(!graph.insert_confirmed(edge(42, 1, 2)));
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.remove_confirmed(EdgeId(42)).map(|e| e.id), Some(EdgeId(42)));
        assert!(graph.remove_confirmed(EdgeId(42)).is_none());
    }

    #[test]
    fn validate_request_rejects_bad_links() {
        let graph = DependencyGraph::from_edges([edge(1, 1, 2)]);
        let s = slots(&[(1, 5), (2, 8), (3, 8)]);
        let lookup = |l: LeafId| s.get(&l).copied();
        assert_eq!(graph.validate_request(LeafId(1), LeafId(1), lookup), Err(EdgeRequestError::SelfLoop));
        assert_eq!(
            graph.validate_request(LeafId(1), LeafId(2), lookup),
            Err(EdgeRequestError::Duplicate(EdgeId(1)))
        );
        assert_eq!(
            graph.validate_request(LeafId(1), LeafId(9), lookup),
            Err(EdgeRequestError::UnknownLeaf(LeafId(9)))
        );
        assert!(matches!(
            graph.validate_request(LeafId(3), LeafId(2), lookup),
            Err(EdgeRequestError::OrderingViolation { .. })
        ));
        assert_eq!(graph.validate_request(LeafId(1), LeafId(3), lookup), Ok(()));
    }

    #[test]
    fn stats_count_roots_and_sinks() {
        let graph = DependencyGraph::from_edges([edge(1, 1, 2), edge(2, 2, 3)]);
        let stats = graph.stats([LeafId(1), LeafId(2), LeafId(3), LeafId(4)]);
        assert_eq!(stats.edges, 2);
        assert_eq!(stats.roots, 2);
        assert_eq!(stats.sinks, 2);
        assert!((stats.average_fan_out - 0.5).abs() < f32::EPSILON);
    }
}
