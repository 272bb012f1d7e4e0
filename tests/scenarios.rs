//! End-to-end scheduling scenarios: a `Schedule` driven against the offline
//! snapshot backend, the way the app drives it against the HTTP one.

use std::time::Instant;

use chrono::NaiveDate;
use team_timeline::io::records::{AttemptRecord, EdgeRecord, ProjectRecord, TaskRecord, TaskRef, TeamRecord};
use team_timeline::io::{ProjectSnapshot, SchedulerBackend, SnapshotBackend};
use team_timeline::model::{
    CollapseKind, DayIndex, DependencyEdge, DropOutcome, EdgeId, EdgeRequestError, GroupId, LeafId, Mode, OpResult,
    PendingKind, RevertReason, Schedule, UnitId,
};

const PROJECT: u64 = 7;
const X: LeafId = LeafId(100);
const Y: LeafId = LeafId(101);
const Z: LeafId = LeafId(102);
const W: LeafId = LeafId(200);

fn attempt(id: u64, task: u64, slot: i64) -> AttemptRecord {
    AttemptRecord {
        id,
        name: format!("attempt {id}"),
        number: Some(1),
        slot_index: Some(slot),
        task: TaskRef::Nested { id: task },
    }
}

/// Ops: Deploy (X@5, Y@8), Verify (Z@2), Docs (empty). Dev: Build (W@3).
/// Edge 1: X -> Y. The span covers 25 days.
fn snapshot() -> ProjectSnapshot {
    let task = |id: u64, name: &str| TaskRecord { id, name: name.into() };
    ProjectSnapshot {
        project: ProjectRecord {
            id: PROJECT,
            name: "Launch".into(),
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            end_date: NaiveDate::from_ymd_opt(2024, 3, 25),
        },
        teams: vec![
            TeamRecord {
                id: 1,
                name: "Ops".into(),
                color: Some("#3366cc".into()),
                tasks: vec![task(10, "Deploy"), task(11, "Verify"), task(12, "Docs")],
            },
            TeamRecord {
                id: 2,
                name: "Dev".into(),
                color: None,
                tasks: vec![task(20, "Build")],
            },
        ],
        attempts: vec![attempt(100, 10, 5), attempt(101, 10, 8), attempt(102, 11, 2), attempt(200, 20, 3)],
        dependencies: vec![EdgeRecord {
            id: 1,
            predecessor: 100,
            successor: 101,
        }],
    }
}

struct Harness {
    schedule: Schedule,
    backend: SnapshotBackend,
}

impl Harness {
    fn new() -> Self {
        Self::with_backend(SnapshotBackend::in_memory(snapshot()))
    }

    fn with_backend(mut backend: SnapshotBackend) -> Self {
        let mut schedule = Schedule::default();
        schedule.load(backend.load(PROJECT).unwrap());
        Self { schedule, backend }
    }

    /// Send every queued mutation and apply the answers.
    fn sync(&mut self) {
        self.sync_as(PROJECT);
    }

    fn sync_as(&mut self, project_id: u64) {
        for (op, kind) in self.schedule.take_unsent() {
            let result = self.backend.execute(project_id, &kind);
            self.schedule.apply_result(op, result, Instant::now());
        }
    }

    fn reload(&mut self) {
        let project = self.backend.load(PROJECT).unwrap();
        self.schedule.load(project);
    }

    /// Grab `leaf` 10px in from its left edge and release it with the left edge on `slot`.
    fn drag(&mut self, leaf: LeafId, slot: DayIndex) -> DropOutcome {
        let grab = 10.0;
        let start = self.schedule.leaf_x(leaf).unwrap();
        assert!(self.schedule.begin_leaf_drag(leaf, start + grab));
        let target = self.schedule.geometry().pixel_range(slot).start;
        self.schedule.drop_leaf(target + grab, Instant::now())
    }

    fn slot(&self, leaf: LeafId) -> DayIndex {
        self.schedule.hierarchy().leaf_slot(leaf).unwrap()
    }

    fn stored_slot(&self, leaf: LeafId) -> Option<i64> {
        self.backend
            .snapshot()
            .attempts
            .iter()
            .find(|a| a.id == leaf.0)
            .and_then(|a| a.slot_index)
    }
}

#[test]
fn load_builds_hierarchy_span_and_graph() {
    let h = Harness::new();
    let schedule = &h.schedule;
    assert_eq!(schedule.name(), "Launch");
    assert_eq!(schedule.day_count(), 25);
    assert_eq!(schedule.slot_date(5), NaiveDate::from_ymd_opt(2024, 3, 5));
    assert_eq!(schedule.hierarchy().group_count(), 2);
    assert_eq!(schedule.hierarchy().unit_count(), 4);
    assert_eq!(schedule.hierarchy().leaf_count(), 4);
    assert_eq!(schedule.graph().len(), 1);
    assert_eq!(schedule.order().ids(), &[GroupId(1), GroupId(2)]);
}

#[test]
fn scenario_a_predecessor_cannot_pass_its_successor() {
    let mut h = Harness::new();
    let outcome = h.drag(X, 9);

    match outcome {
        DropOutcome::Reverted {
            leaf,
            slot,
            reason: RevertReason::Ordering(check),
            ..
        } => {
            assert_eq!((leaf, slot), (X, 5));
            assert_eq!(check.conflicting, vec![EdgeId(1)]);
        }
        other => panic!("expected an ordering revert, got {other:?}"),
    }
    assert_eq!(h.slot(X), 5);
    assert!(h.schedule.feedback().is_edge_flagged(EdgeId(1), Instant::now()));
    assert!(h.schedule.feedback().message(Instant::now()).is_some());
    assert!(h.schedule.pending().ops().is_empty());
}

#[test]
fn scenario_b_successor_moves_only_after_its_predecessor() {
    let mut h = Harness::new();

    assert!(matches!(h.drag(Y, 4), DropOutcome::Reverted { slot: 8, .. }));
    assert_eq!(h.slot(Y), 8);

    assert_eq!(h.drag(Y, 6), DropOutcome::Committed { leaf: Y, from: 8, to: 6 });
    assert_eq!(h.slot(Y), 6);
    assert_eq!(h.schedule.pending().in_flight(), 1);

    h.sync();
    assert_eq!(h.stored_slot(Y), Some(6));
    assert!(h.schedule.pending().ops().is_empty());
}

#[test]
fn scenario_c_collapsed_day_rejects_the_drop_without_a_backend_call() {
    let mut h = Harness::new();
    assert!(h.schedule.toggle_day(4));

    let outcome = h.drag(Z, 4);
    assert!(matches!(
        outcome,
        DropOutcome::Reverted {
            leaf: Z,
            slot: 2,
            reason: RevertReason::CollapsedDay(4),
            ..
        }
    ));
    assert_eq!(h.slot(Z), 2);
    assert!(h
        .schedule
        .pending()
        .ops()
        .iter()
        .all(|op| !matches!(op.kind, PendingKind::SlotUpdate { .. })));
    assert!(h.schedule.take_unsent().is_empty());
    assert_eq!(h.stored_slot(Z), Some(2));
}

#[test]
fn scenario_d_group_collapse_round_trip_restores_unit_heights() {
    let mut h = Harness::new();
    let ops = GroupId(1);
    let unit_height = h.schedule.metrics().unit_height;
    assert!(h.schedule.toggle_unit(UnitId(11)));

    assert!(h.schedule.toggle_group(ops));
    let collapsed = *h.schedule.layout().group(ops).unwrap();
    assert!(collapsed.collapsed);
    assert_eq!(collapsed.height, h.schedule.metrics().group_collapsed_height);

    assert!(h.schedule.toggle_group(ops));
    for unit in [UnitId(10), UnitId(11), UnitId(12)] {
        assert!(!h.schedule.collapse().is_unit_collapsed(unit));
    }
    let group = *h.schedule.layout().group(ops).unwrap();
    assert_eq!(group.height, 3.0 * unit_height);

    let dev = h.schedule.layout().group(GroupId(2)).unwrap();
    assert_eq!(dev.y, group.y + group.height + h.schedule.metrics().group_gap);
}

#[test]
fn scenario_e_confirmed_edge_is_inserted_once() {
    let mut h = Harness::new();
    h.schedule.set_mode(Mode::Dependency);

    let op = h.schedule.request_edge(Z, W).unwrap();
    assert_eq!(h.schedule.request_edge(Z, W), Err(EdgeRequestError::AlreadyRequested));
    // confirm-first: nothing local until the reply arrives
    assert_eq!(h.schedule.graph().len(), 1);

    let sent = h.schedule.take_unsent();
    assert_eq!(sent.len(), 1);
    let confirmed = DependencyEdge {
        id: EdgeId(42),
        predecessor: Z,
        successor: W,
    };
    h.schedule.apply_result(op, OpResult::EdgeCreated(confirmed), Instant::now());

    let matching = h.schedule.graph().edges().iter().filter(|e| e.id == EdgeId(42)).count();
    assert_eq!(matching, 1);
    assert_eq!(h.schedule.graph().len(), 2);
    assert_eq!(h.schedule.request_edge(Z, W), Err(EdgeRequestError::Duplicate(EdgeId(42))));
}

#[test]
fn edges_are_created_and_deleted_through_the_backend() {
    let mut h = Harness::new();
    h.schedule.set_mode(Mode::Dependency);

    assert!(h.schedule.begin_connection(Z));
    assert!(matches!(h.schedule.finish_connection(W, Instant::now()), Some(Ok(_))));
    h.sync();
    let created = h.schedule.graph().find_link(Z, W).copied().unwrap();
    assert_eq!(created.id, EdgeId(2));
    assert_eq!(h.backend.snapshot().dependencies.len(), 2);

    assert!(h.schedule.select_edge(created.id));
    assert!(h.schedule.delete_selected_edge().is_some());
    // still drawn until confirmed
    assert!(h.schedule.graph().contains(created.id));
    assert!(h.schedule.delete_selected_edge().is_none());
    h.sync();
    assert!(!h.schedule.graph().contains(created.id));
    assert_eq!(h.schedule.mode().selected_edge(), None);
    assert_eq!(h.backend.snapshot().dependencies.len(), 1);
}

#[test]
fn drag_cannot_outrun_an_unconfirmed_edge() {
    let mut h = Harness::new();
    h.schedule.set_mode(Mode::Dependency);
    h.schedule.request_edge(Z, W).unwrap();
    h.schedule.set_mode(Mode::Order);

    // Z (slot 2) may not pass W (slot 3) while Z -> W is in flight
    let outcome = h.drag(Z, 10);
    assert!(matches!(outcome, DropOutcome::Reverted { reason: RevertReason::Ordering(_), .. }));
    assert_eq!(h.slot(Z), 2);

    h.sync();
    let edge = h.schedule.graph().find_link(Z, W).copied().unwrap();
    assert!(h.slot(edge.predecessor) < h.slot(edge.successor));
    assert_eq!(h.stored_slot(Z), Some(2));
}

#[test]
fn refused_connection_never_reaches_the_backend() {
    let mut h = Harness::new();
    h.schedule.set_mode(Mode::Dependency);

    // W (slot 3) cannot come before Z (slot 2)
    assert!(h.schedule.begin_connection(W));
    let refused = h.schedule.finish_connection(Z, Instant::now());
    assert!(matches!(refused, Some(Err(EdgeRequestError::OrderingViolation { .. }))));
    assert!(h.schedule.take_unsent().is_empty());
    assert!(h.schedule.feedback().message(Instant::now()).is_some());
}

#[test]
fn group_drag_persists_the_new_team_order() {
    let mut h = Harness::new();
    assert!(h.schedule.drop_group(GroupId(2), 0.0));
    assert_eq!(h.schedule.order().ids(), &[GroupId(2), GroupId(1)]);
    h.sync();
    let stored: Vec<u64> = h.backend.snapshot().teams.iter().map(|t| t.id).collect();
    assert_eq!(stored, vec![2, 1]);

    // a unit drag moves its owner
    let bottom = h.schedule.layout().total_height + 10.0;
    assert!(h.schedule.drop_unit(UnitId(20), bottom));
    assert_eq!(h.schedule.order().ids(), &[GroupId(1), GroupId(2)]);
}

#[test]
fn group_drag_is_refused_outside_order_mode() {
    let mut h = Harness::new();
    h.schedule.set_mode(Mode::Inspect);
    assert!(!h.schedule.drop_group(GroupId(2), 0.0));
    assert!(!h.schedule.begin_leaf_drag(X, 0.0));
    assert!(h.schedule.take_unsent().is_empty());
}

#[test]
fn failed_slot_update_is_drift_until_reload() {
    let mut h = Harness::new();
    assert!(matches!(h.drag(W, 10), DropOutcome::Committed { .. }));

    // the backend refuses: wrong project
    h.sync_as(PROJECT + 1);
    assert_eq!(h.slot(W), 10, "no rollback on a failed save");
    assert_eq!(h.schedule.pending().drift().count(), 1);
    assert_eq!(h.stored_slot(W), Some(3));

    h.reload();
    assert_eq!(h.slot(W), 3);
    assert_eq!(h.schedule.pending().drift().count(), 0);
}

#[test]
fn reload_keeps_view_state_for_the_same_project() {
    let mut h = Harness::new();
    h.schedule.collapse_all(CollapseKind::Day);
    h.schedule.expand_all(CollapseKind::Day);
    assert!(h.schedule.toggle_day(7));
    assert!(h.schedule.drop_group(GroupId(2), 0.0));
    h.sync();
    h.schedule.set_mode(Mode::Inspect);
    assert!(h.schedule.inspect_leaf(X));

    h.reload();
    assert!(h.schedule.collapse().is_day_collapsed(7));
    assert_eq!(h.schedule.order().ids(), &[GroupId(2), GroupId(1)]);
    assert_eq!(h.schedule.mode().mode(), Mode::Inspect);
}

#[test]
fn snapshot_file_is_written_through() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("launch.json");
    team_timeline::io::snapshot::save_snapshot(&snapshot(), &path).unwrap();

    let mut h = Harness::with_backend(SnapshotBackend::open(&path).unwrap());
    assert!(matches!(h.drag(Z, 4), DropOutcome::Committed { .. }));
    h.sync();

    let mut reopened = SnapshotBackend::open(&path).unwrap();
    let project = reopened.load(PROJECT).unwrap();
    assert_eq!(project.hierarchy.leaf_slot(Z), Some(4));
}

#[test]
fn csv_export_lists_every_attempt_with_its_date() {
    let h = Harness::new();
    let mut out = Vec::new();
    let rows = team_timeline::io::csv_export::write_csv(&h.schedule, &mut out).unwrap();
    assert_eq!(rows, 4);
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Ops;Deploy;attempt 100;1;5;05/03/2024"));
    assert!(text.contains("Dev;Build;attempt 200;1;3;03/03/2024"));
}
