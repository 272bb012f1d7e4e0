use chrono::{Duration as ChronoDuration, NaiveDate};
use std::time::Instant;

use super::collapse::{CollapseKind, CollapseState};
use super::dependency::{DependencyEdge, DependencyGraph, EdgeRequestError, GraphStats};
use super::drag::{DragController, DropOutcome, Feedback, FeedbackTimings};
use super::geometry::SlotGeometry;
use super::hierarchy::{DayIndex, EdgeId, GroupId, Hierarchy, LeafId, UnitId};
use super::layout::{layout_pass, Layout, LayoutMetrics};
use super::mode::{Mode, ModeController, NodeKind};
use super::pending::{OpId, OpStatus, PendingKind, PendingQueue};
use super::reorder::{insertion_index, GroupOrder};

/// Inclusive date range of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectSpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ProjectSpan {
    /// Number of day columns, `None` when the range is inverted.
    pub fn day_count(&self) -> Option<DayIndex> {
        let days = (self.end - self.start).num_days() + 1;
        DayIndex::try_from(days).ok().filter(|d| *d > 0)
    }

    pub fn date_of(&self, slot: DayIndex) -> NaiveDate {
        self.start + ChronoDuration::days(i64::from(slot.saturating_sub(1)))
    }
}

/// Everything one fetch of the collaborator returns.
#[derive(Debug, Clone, Default)]
pub struct LoadedProject {
    pub project_id: u64,
    pub name: String,
    pub span: Option<ProjectSpan>,
    pub hierarchy: Hierarchy,
    pub edges: Vec<DependencyEdge>,
}

/// The collaborator's answer to one queued operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpResult {
    Done,
    EdgeCreated(DependencyEdge),
    Failed(String),
}

/// The scheduler aggregate: loaded project, view state and in-flight work.
///
/// Every mutating operation recomputes the layout before returning.
#[derive(Debug, Clone)]
pub struct Schedule {
    project_id: u64,
    name: String,
    span: Option<ProjectSpan>,
    default_day_count: DayIndex,
    day_count: DayIndex,
    hierarchy: Hierarchy,
    collapse: CollapseState,
    graph: DependencyGraph,
    order: GroupOrder,
    metrics: LayoutMetrics,
    layout: Layout,
    mode: ModeController,
    drag: DragController,
    feedback: Feedback,
    pending: PendingQueue,
}

impl Default for Schedule {
    fn default() -> Self {
        Self::new(LayoutMetrics::default(), FeedbackTimings::default(), 25)
    }
}

impl Schedule {
    pub fn new(metrics: LayoutMetrics, timings: FeedbackTimings, default_day_count: DayIndex) -> Self {
        let default_day_count = default_day_count.max(1);
        Self {
            project_id: 0,
            name: String::new(),
            span: None,
            default_day_count,
            day_count: default_day_count,
            hierarchy: Hierarchy::new(),
            collapse: CollapseState::new(),
            graph: DependencyGraph::new(),
            order: GroupOrder::default(),
            metrics,
            layout: Layout::default(),
            mode: ModeController::default(),
            drag: DragController::new(),
            feedback: Feedback::new(timings),
            pending: PendingQueue::new(),
        }
    }

    /// Install a freshly fetched project. On a reload view state is kept and
    /// reconciled against the new ids.
    pub fn load(&mut self, project: LoadedProject) {
        let LoadedProject {
            project_id,
            name,
            span,
            mut hierarchy,
            edges,
        } = project;

        self.day_count = span
            .and_then(|s| s.day_count())
            .unwrap_or(self.default_day_count);
        let clamped = hierarchy.clamp_slots(self.day_count);
        if clamped > 0 {
            tracing::warn!(clamped, day_count = self.day_count, "slot indices clamped into range");
        }

        let mut graph = DependencyGraph::from_edges(edges);
        let dangling = graph.retain_leaves(|leaf| hierarchy.contains_leaf(leaf));
        if dangling > 0 {
            tracing::warn!(dangling, "dropped edges referencing unknown attempts");
        }

        if project_id != self.project_id {
            self.collapse = CollapseState::new();
            self.order = GroupOrder::default();
            self.mode = ModeController::new(self.mode.mode());
        }
        self.collapse.retain_known(&hierarchy, self.day_count);
        self.order.reconcile(&hierarchy);
        if let Some(edge) = self.mode.selected_edge() {
            if !graph.contains(edge) {
                self.mode.clear_edge_selection();
            }
        }
        self.mode.clear_highlight();
        self.mode.cancel_connection();
        self.drag.cancel();
        let settled = self.pending.clear_settled();

        tracing::info!(
            project = project_id,
            groups = hierarchy.group_count(),
            units = hierarchy.unit_count(),
            leaves = hierarchy.leaf_count(),
            edges = graph.len(),
            day_count = self.day_count,
            settled,
            "project loaded"
        );

        self.project_id = project_id;
        self.name = name;
        self.span = span;
        self.hierarchy = hierarchy;
        self.graph = graph;
        self.relayout();
    }

    pub fn relayout(&mut self) {
        self.layout = layout_pass(&self.hierarchy, &self.collapse, self.order.ids(), &self.metrics);
    }

    pub fn project_id(&self) -> u64 {
        self.project_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn span(&self) -> Option<ProjectSpan> {
        self.span
    }

    pub fn day_count(&self) -> DayIndex {
        self.day_count
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    pub fn collapse(&self) -> &CollapseState {
        &self.collapse
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn order(&self) -> &GroupOrder {
        &self.order
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn metrics(&self) -> &LayoutMetrics {
        &self.metrics
    }

    pub fn set_metrics(&mut self, metrics: LayoutMetrics) {
        self.metrics = metrics;
        self.relayout();
    }

    pub fn mode(&self) -> &ModeController {
        &self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode.set_mode(mode);
        self.drag.cancel();
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    pub fn feedback(&self) -> &Feedback {
        &self.feedback
    }

    pub fn pending(&self) -> &PendingQueue {
        &self.pending
    }

    pub fn geometry(&self) -> SlotGeometry<'_> {
        SlotGeometry::new(self.metrics.columns(), self.collapse.day_map(), self.day_count)
    }

    pub fn slot_date(&self, slot: DayIndex) -> Option<NaiveDate> {
        self.span.map(|s| s.date_of(slot))
    }

    /// Left edge of a leaf in grid coordinates.
    pub fn leaf_x(&self, leaf: LeafId) -> Option<f32> {
        let slot = self.hierarchy.leaf_slot(leaf)?;
        Some(self.geometry().pixel_range(slot).start)
    }

    pub fn is_leaf_hidden(&self, leaf: LeafId) -> bool {
        self.collapse.is_leaf_hidden(&self.hierarchy, leaf)
    }

    pub fn stats(&self) -> GraphStats {
        self.graph.stats(self.hierarchy.leaves().map(|l| l.id))
    }

    // --- collapse ---

    pub fn toggle_group(&mut self, id: GroupId) -> bool {
        let changed = self.collapse.toggle_group(&self.hierarchy, id);
        self.relayout();
        changed
    }

    pub fn toggle_unit(&mut self, id: UnitId) -> bool {
        let changed = self.collapse.toggle_unit(&self.hierarchy, id);
        self.relayout();
        changed
    }

    pub fn toggle_day(&mut self, day: DayIndex) -> bool {
        let changed = self.collapse.toggle_day(day, self.day_count);
        self.relayout();
        changed
    }

    pub fn collapse_all(&mut self, kind: CollapseKind) {
        self.collapse.collapse_all(kind, &self.hierarchy, self.day_count);
        self.relayout();
    }

    pub fn expand_all(&mut self, kind: CollapseKind) {
        self.collapse.expand_all(kind, &self.hierarchy, self.day_count);
        self.relayout();
    }

    // --- leaf drag ---

    /// Start dragging `leaf` with the pointer at `pointer_x` (grid coordinates).
    pub fn begin_leaf_drag(&mut self, leaf: LeafId, pointer_x: f32) -> bool {
        let Some(slot) = self.hierarchy.leaf_slot(leaf) else {
            tracing::warn!(leaf = %leaf, "drag on unknown attempt ignored");
            return false;
        };
        let origin_x = self.geometry().pixel_range(slot).start;
        self.drag.begin(&self.mode, leaf, slot, origin_x, pointer_x)
    }

    pub fn cancel_leaf_drag(&mut self) {
        self.drag.cancel();
    }

    /// Finish a leaf drag. A commit moves the leaf locally and queues the
    /// slot update; a revert leaves every slot untouched.
    pub fn drop_leaf(&mut self, pointer_x: f32, now: Instant) -> DropOutcome {
        let geometry = SlotGeometry::new(self.metrics.columns(), self.collapse.day_map(), self.day_count);
        let requested = self.pending.requested_edges();
        let hierarchy = &self.hierarchy;
        let outcome = self
            .drag
            .drop(pointer_x, &geometry, &self.graph, &requested, |leaf| hierarchy.leaf_slot(leaf));

        match &outcome {
            DropOutcome::Committed { leaf, from, to } => {
                self.hierarchy.set_leaf_slot(*leaf, *to);
                self.pending.submit(PendingKind::SlotUpdate {
                    leaf: *leaf,
                    slot: *to,
                    previous: *from,
                });
                tracing::info!(leaf = %leaf, from, to, "attempt moved");
            }
            DropOutcome::Reverted { leaf, slot, reason, .. } => {
                tracing::warn!(leaf = %leaf, slot, ?reason, "drop rejected");
                self.feedback.reject(*leaf, reason, now);
            }
            DropOutcome::Unchanged { .. } | DropOutcome::NotDragging => {}
        }
        outcome
    }

    // --- group reorder ---

    /// Drop a dragged group at canvas `drop_y`. Returns true if the order changed.
    pub fn drop_group(&mut self, group: GroupId, drop_y: f32) -> bool {
        if !self.mode.can_drag(NodeKind::Group) {
            return false;
        }
        let index = insertion_index(&self.order, &self.layout, drop_y);
        if !self.order.move_to(group, index) {
            return false;
        }
        self.pending.submit(PendingKind::GroupOrder {
            order: self.order.ids().to_vec(),
        });
        tracing::info!(group = %group, index, "team order changed");
        self.relayout();
        true
    }

    /// Dragging a unit row moves its owning group. Units keep their order.
    pub fn drop_unit(&mut self, unit: UnitId, drop_y: f32) -> bool {
        if !self.mode.can_drag(NodeKind::Unit) {
            return false;
        }
        match self.hierarchy.owner_of_unit(unit) {
            Some(group) => self.drop_group(group, drop_y),
            None => {
                tracing::warn!(unit = %unit, "drop of unknown task ignored");
                false
            }
        }
    }

    // --- dependency edges ---

    /// Validate and queue a new edge. The graph changes only once the
    /// collaborator confirms it.
    pub fn request_edge(&mut self, predecessor: LeafId, successor: LeafId) -> Result<OpId, EdgeRequestError> {
        if !self.mode.can_connect() {
            return Err(EdgeRequestError::WrongMode);
        }
        if self.pending.is_edge_request_in_flight(predecessor, successor) {
            return Err(EdgeRequestError::AlreadyRequested);
        }
        let hierarchy = &self.hierarchy;
        self.graph
            .validate_request(predecessor, successor, |leaf| hierarchy.leaf_slot(leaf))?;
        Ok(self.pending.submit(PendingKind::CreateEdge {
            predecessor,
            successor,
        }))
    }

    pub fn begin_connection(&mut self, from: LeafId) -> bool {
        self.mode.begin_connection(from)
    }

    pub fn cancel_connection(&mut self) {
        self.mode.cancel_connection();
    }

    /// Complete a connection gesture on `target`. Rejections are shown as a message.
    pub fn finish_connection(&mut self, target: LeafId, now: Instant) -> Option<Result<OpId, EdgeRequestError>> {
        let (predecessor, successor) = self.mode.finish_connection(target)?;
        let result = self.request_edge(predecessor, successor);
        if let Err(err) = &result {
            tracing::warn!(%predecessor, %successor, %err, "dependency request refused");
            self.feedback.notify(err.to_string(), now);
        }
        Some(result)
    }

    pub fn select_edge(&mut self, edge: EdgeId) -> bool {
        self.graph.contains(edge) && self.mode.select_edge(edge)
    }

    pub fn clear_edge_selection(&mut self) {
        self.mode.clear_edge_selection();
    }

    /// Queue deletion of the selected edge. It stays in the graph until confirmed.
    pub fn delete_selected_edge(&mut self) -> Option<OpId> {
        let edge = self.mode.selected_edge()?;
        if !self.graph.contains(edge) || self.pending.is_delete_in_flight(edge) {
            return None;
        }
        Some(self.pending.submit(PendingKind::DeleteEdge { edge }))
    }

    pub fn inspect_leaf(&mut self, leaf: LeafId) -> bool {
        if !self.hierarchy.contains_leaf(leaf) {
            return false;
        }
        self.mode.inspect_leaf(leaf, &self.graph)
    }

    pub fn clear_highlight(&mut self) {
        self.mode.clear_highlight();
    }

    // --- collaborator round trips ---

    pub fn take_unsent(&mut self) -> Vec<(OpId, PendingKind)> {
        self.pending.take_unsent()
    }

    /// Apply the collaborator's answer to a queued op.
    ///
    /// Slot updates are never rolled back on failure; the op stays listed as
    /// drift until the next reload.
    pub fn apply_result(&mut self, id: OpId, result: OpResult, now: Instant) {
        let Some(kind) = self.pending.get(id).map(|op| op.kind.clone()) else {
            tracing::warn!(op = %id, "result for unknown operation ignored");
            return;
        };

        let status = match (kind, result) {
            (_, OpResult::Failed(reason)) => {
                tracing::warn!(op = %id, %reason, "collaborator call failed");
                self.feedback.notify(format!("Could not save: {reason}"), now);
                OpStatus::Failed(reason)
            }
            (PendingKind::CreateEdge { .. }, OpResult::EdgeCreated(edge)) => {
                if self.graph.insert_confirmed(edge) {
                    tracing::info!(edge = %edge.id, predecessor = %edge.predecessor, successor = %edge.successor, "dependency created");
                }
                OpStatus::Applied
            }
            (PendingKind::DeleteEdge { edge }, OpResult::Done) => {
                if self.graph.remove_confirmed(edge).is_some() {
                    tracing::info!(edge = %edge, "dependency removed");
                }
                self.mode.forget_edge(edge);
                OpStatus::Applied
            }
            (PendingKind::GroupOrder { order }, OpResult::Done) => {
                tracing::info!(teams = order.len(), "team order saved");
                OpStatus::Applied
            }
            (PendingKind::SlotUpdate { .. }, OpResult::Done) => OpStatus::Applied,
            (kind, result) => {
                let reason = format!("unexpected reply {result:?} to {}", kind.describe());
                tracing::warn!(op = %id, %reason, "collaborator reply mismatch");
                OpStatus::Failed(reason)
            }
        };
        self.pending.resolve(id, status);
        self.pending.prune();
    }

    /// The collaborator went away with calls in flight. They count as failed:
    /// slot moves show up as drift, edge requests may be asked for again.
    pub fn abandon_pending(&mut self, reason: &str) -> usize {
        let abandoned = self.pending.abandon(reason);
        if abandoned > 0 {
            tracing::warn!(abandoned, reason, "in-flight operations abandoned");
        }
        abandoned
    }

    /// Expire transient feedback.
    pub fn tick(&mut self, now: Instant) {
        self.feedback.expire(now);
    }
}
