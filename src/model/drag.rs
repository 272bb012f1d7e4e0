//! Leaf drag gestures: `Idle -> Dragging -> {Committed | Reverted}`.
//!
//! The controller only decides. Applying a commit (local slot, persistence
//! request) and showing rejection feedback is done by the caller.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::dependency::{DependencyGraph, OrderingCheck};
use super::geometry::SlotGeometry;
use super::hierarchy::{DayIndex, EdgeId, LeafId};
use super::mode::{ModeController, NodeKind};

/// How long each kind of rejection feedback stays visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackTimings {
    pub shake_ms: u64,
    pub highlight_ms: u64,
    pub message_ms: u64,
}

impl Default for FeedbackTimings {
    fn default() -> Self {
        Self {
            shake_ms: 250,
            highlight_ms: 3000,
            message_ms: 3000,
        }
    }
}

/// Pre-move snapshot recorded when a drag starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSnapshot {
    pub leaf: LeafId,
    pub origin_slot: DayIndex,
    /// Left edge of the leaf in grid coordinates when the drag began.
    pub origin_x: f32,
    /// Pointer distance from the leaf's left edge.
    pub grab_offset: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragSnapshot),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RevertReason {
    Ordering(OrderingCheck),
    CollapsedDay(DayIndex),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
    Committed {
        leaf: LeafId,
        from: DayIndex,
        to: DayIndex,
    },
    /// Dropped back onto its own slot; nothing to persist.
    Unchanged { leaf: LeafId, slot: DayIndex },
    Reverted {
        leaf: LeafId,
        slot: DayIndex,
        origin_x: f32,
        reason: RevertReason,
    },
    NotDragging,
}

#[derive(Debug, Clone, Default)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn snapshot(&self) -> Option<&DragSnapshot> {
        match &self.state {
            DragState::Dragging(snapshot) => Some(snapshot),
            DragState::Idle => None,
        }
    }

    pub fn is_dragging(&self, leaf: LeafId) -> bool {
        self.snapshot().is_some_and(|s| s.leaf == leaf)
    }

    /// Start dragging a leaf. Blocked when the mode does not allow leaf drags.
    pub fn begin(
        &mut self,
        mode: &ModeController,
        leaf: LeafId,
        origin_slot: DayIndex,
        origin_x: f32,
        pointer_x: f32,
    ) -> bool {
        if !mode.can_drag(NodeKind::Leaf) {
            tracing::debug!(leaf = %leaf, mode = ?mode.mode(), "leaf drag blocked by mode");
            return false;
        }
        self.state = DragState::Dragging(DragSnapshot {
            leaf,
            origin_slot,
            origin_x,
            grab_offset: pointer_x - origin_x,
        });
        true
    }

    /// Where the leaf's left edge is drawn while following the pointer.
    pub fn preview_x(&self, pointer_x: f32) -> Option<f32> {
        self.snapshot().map(|s| pointer_x - s.grab_offset)
    }

    pub fn cancel(&mut self) -> Option<DragSnapshot> {
        match std::mem::take(&mut self.state) {
            DragState::Dragging(snapshot) => Some(snapshot),
            DragState::Idle => None,
        }
    }

    /// Finish the gesture at `pointer_x` (grid coordinates).
    ///
    /// Checks run in order and stop at the first failure: dependency ordering,
    /// then the collapsed state of the target day.
    pub fn drop<F>(
        &mut self,
        pointer_x: f32,
        geometry: &SlotGeometry<'_>,
        graph: &DependencyGraph,
        requested: &[(LeafId, LeafId)],
        slot_of: F,
    ) -> DropOutcome
    where
        F: Fn(LeafId) -> Option<DayIndex>,
    {
        let Some(snapshot) = self.cancel() else {
            return DropOutcome::NotDragging;
        };
        let left_edge = pointer_x - snapshot.grab_offset;
        let proposed = geometry.slot_from_pixel(left_edge);

        if proposed == snapshot.origin_slot {
            return DropOutcome::Unchanged {
                leaf: snapshot.leaf,
                slot: proposed,
            };
        }

        let check = graph.check_move(snapshot.leaf, proposed, requested, slot_of);
        if check.violated() {
            return DropOutcome::Reverted {
                leaf: snapshot.leaf,
                slot: snapshot.origin_slot,
                origin_x: snapshot.origin_x,
                reason: RevertReason::Ordering(check),
            };
        }

        if geometry.is_collapsed(proposed) {
            return DropOutcome::Reverted {
                leaf: snapshot.leaf,
                slot: snapshot.origin_slot,
                origin_x: snapshot.origin_x,
                reason: RevertReason::CollapsedDay(proposed),
            };
        }

        DropOutcome::Committed {
            leaf: snapshot.leaf,
            from: snapshot.origin_slot,
            to: proposed,
        }
    }
}

/// Transient visual state after a rejected drop.
#[derive(Debug, Clone, Default)]
pub struct Feedback {
    timings: FeedbackTimings,
    shaking: HashMap<LeafId, Instant>,
    flagged_edges: Vec<EdgeId>,
    flagged_until: Option<Instant>,
    message: Option<(String, Instant)>,
}

impl Feedback {
    pub fn new(timings: FeedbackTimings) -> Self {
        Self {
            timings,
            ..Self::default()
        }
    }

    /// Shake the leaf and, for ordering failures, flag the edges and explain why.
    pub fn reject(&mut self, leaf: LeafId, reason: &RevertReason, now: Instant) {
        self.shake(leaf, now);
        if let RevertReason::Ordering(check) = reason {
            self.flag_edges(check.conflicting.clone(), now);
            if let Some(message) = check.message() {
                self.notify(message, now);
            }
        }
    }

    pub fn shake(&mut self, leaf: LeafId, now: Instant) {
        self.shaking
            .insert(leaf, now + Duration::from_millis(self.timings.shake_ms));
    }

    pub fn flag_edges(&mut self, edges: Vec<EdgeId>, now: Instant) {
        self.flagged_edges = edges;
        self.flagged_until = Some(now + Duration::from_millis(self.timings.highlight_ms));
    }

    pub fn notify(&mut self, message: impl Into<String>, now: Instant) {
        self.message = Some((
            message.into(),
            now + Duration::from_millis(self.timings.message_ms),
        ));
    }

    /// Shake progress in `0.0..1.0`, `None` once it is over.
    pub fn shake_progress(&self, leaf: LeafId, now: Instant) -> Option<f32> {
        let until = *self.shaking.get(&leaf)?;
        if now >= until {
            return None;
        }
        let total = self.timings.shake_ms.max(1) as f32;
        let left = (until - now).as_millis() as f32;
        Some(1.0 - left / total)
    }

    /// A shake is running and needs per-frame repaints.
    pub fn is_animating(&self, now: Instant) -> bool {
        self.shaking.values().any(|until| now < *until)
    }

    pub fn is_edge_flagged(&self, edge: EdgeId, now: Instant) -> bool {
        self.flagged_until.is_some_and(|until| now < until) && self.flagged_edges.contains(&edge)
    }

    pub fn message(&self, now: Instant) -> Option<&str> {
        self.message
            .as_ref()
            .filter(|(_, until)| now < *until)
            .map(|(text, _)| text.as_str())
    }

    /// Drop everything that has timed out.
    pub fn expire(&mut self, now: Instant) {
        self.shaking.retain(|_, until| now < *until);
        if self.flagged_until.is_some_and(|until| now >= until) {
            self.flagged_edges.clear();
            self.flagged_until = None;
        }
        if self.message.as_ref().is_some_and(|(_, until)| now >= *until) {
            self.message = None;
        }
    }

    /// Earliest pending expiry, for scheduling a repaint.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.shaking
            .values()
            .copied()
            .chain(self.flagged_until)
            .chain(self.message.as_ref().map(|(_, until)| *until))
            .min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::dependency::DependencyEdge;
    use crate::model::geometry::ColumnWidths;
    use crate::model::mode::Mode;
    use std::collections::BTreeMap;

    fn graph() -> DependencyGraph {
        DependencyGraph::from_edges([DependencyEdge {
            id: EdgeId(1),
            predecessor: LeafId(1),
            successor: LeafId(2),
        }])
    }

    fn lookup(leaf: LeafId) -> Option<DayIndex> {
        match leaf.0 {
            1 => Some(5),
            2 => Some(8),
            _ => None,
        }
    }

    fn start(controller: &mut DragController, leaf: u64, slot: DayIndex, geo: &SlotGeometry<'_>) {
        let mode = ModeController::new(Mode::Order);
        let x = geo.pixel_range(slot).start;
        assert!(controller.begin(&mode, LeafId(leaf), slot, x, x + 10.0));
    }

    fn drop_on(controller: &mut DragController, slot: DayIndex, geo: &SlotGeometry<'_>) -> DropOutcome {
        let x = geo.pixel_range(slot).midpoint() + 10.0;
        controller.drop(x, geo, &graph(), &[], lookup)
    }

    #[test]
    fn inspect_mode_blocks_drags() {
        let mut c = DragController::new();
        let mode = ModeController::new(Mode::Inspect);
        assert!(!c.begin(&mode, LeafId(1), 5, 240.0, 250.0));
        assert_eq!(c.state(), DragState::Idle);
    }

    #[test]
    fn predecessor_cannot_pass_its_successor() {
        let map = BTreeMap::new();
        let geo = SlotGeometry::new(ColumnWidths::default(), &map, 25);
        let mut c = DragController::new();
        start(&mut c, 1, 5, &geo);
        match drop_on(&mut c, 9, &geo) {
            DropOutcome::Reverted { slot, reason: RevertReason::Ordering(check), .. } => {
                assert_eq!(slot, 5);
                assert_eq!(check.conflicting, vec![EdgeId(1)]);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(c.state(), DragState::Idle);
    }

    #[test]
    fn ordering_is_reported_before_collapsed_day() {
        let map: BTreeMap<DayIndex, bool> = [(3, true)].into_iter().collect();
        let geo = SlotGeometry::new(ColumnWidths::default(), &map, 25);
        let mut c = DragController::new();
        start(&mut c, 2, 8, &geo);
        let x = geo.pixel_range(3).midpoint() + 10.0;
        match c.drop(x, &geo, &graph(), &[], lookup) {
            DropOutcome::Reverted { reason, .. } => assert!(matches!(reason, RevertReason::Ordering(_))),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn collapsed_target_reverts_silently() {
        let map: BTreeMap<DayIndex, bool> = [(12, true)].into_iter().collect();
        let geo = SlotGeometry::new(ColumnWidths::default(), &map, 25);
        let mut c = DragController::new();
        start(&mut c, 2, 8, &geo);
        let x = geo.pixel_range(12).midpoint() + 10.0;
        assert!(matches!(
            c.drop(x, &geo, &graph(), &[], lookup),
            DropOutcome::Reverted { slot: 8, reason: RevertReason::CollapsedDay(12), .. }
        ));
    }

    #[test]
    fn legal_move_commits() {
        let map = BTreeMap::new();
        let geo = SlotGeometry::new(ColumnWidths::default(), &map, 25);
        let mut c = DragController::new();
        start(&mut c, 2, 8, &geo);
        assert!(c.is_dragging(LeafId(2)));
        assert!(!c.is_dragging(LeafId(1)));
        assert_eq!(drop_on(&mut c, 6, &geo), DropOutcome::Committed { leaf: LeafId(2), from: 8, to: 6 });
        assert_eq!(c.drop(0.0, &geo, &graph(), &[], lookup), DropOutcome::NotDragging);
    }

    #[test]
    fn feedback_expires_on_its_own_clock() {
        let t0 = Instant::now();
        let mut f = Feedback::new(FeedbackTimings::default());
        let check = OrderingCheck {
            conflicting: vec![EdgeId(1)],
            blocked_by_predecessor: false,
            blocked_by_successor: true,
            ..OrderingCheck::default()
        };
        f.reject(LeafId(1), &RevertReason::Ordering(check), t0);

        let soon = t0 + Duration::from_millis(100);
        assert!(f.shake_progress(LeafId(1), soon).is_some());
        assert!(f.is_edge_flagged(EdgeId(1), soon));
        assert_eq!(f.message(soon), Some("Cannot move: all dependents must be after this"));

        let later = t0 + Duration::from_millis(400);
        assert!(f.shake_progress(LeafId(1), later).is_none());
        assert!(f.is_edge_flagged(EdgeId(1), later));

        let done = t0 + Duration::from_millis(3_100);
        f.expire(done);
        assert!(!f.is_edge_flagged(EdgeId(1), done));
        assert_eq!(f.message(done), None);
        assert_eq!(f.next_deadline(), None);
    }

    #[test]
    fn collapsed_rejection_only_shakes() {
        let t0 = Instant::now();
        let mut f = Feedback::new(FeedbackTimings::default());
        f.reject(LeafId(4), &RevertReason::CollapsedDay(3), t0);
        assert!(f.shake_progress(LeafId(4), t0).is_some());
        assert_eq!(f.message(t0), None);
    }
}
