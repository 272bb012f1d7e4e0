use crate::error::Result;
use crate::model::{DayIndex, DependencyEdge, EdgeId, GroupId, LeafId, LoadedProject, OpResult, PendingKind};

use super::records::{AttemptRecord, EdgeRecord, ProjectRecord, ProjectSnapshot, TeamRecord};

/// The project backend the scheduler talks to.
///
/// Implementations block; callers run them off the UI thread.
pub trait SchedulerBackend: Send {
    /// Short name for logs and the status bar.
    fn describe(&self) -> String;

    fn fetch_project(&mut self, project_id: u64) -> Result<ProjectRecord>;
    fn fetch_teams(&mut self, project_id: u64) -> Result<Vec<TeamRecord>>;
    fn fetch_attempts(&mut self, project_id: u64) -> Result<Vec<AttemptRecord>>;
    fn fetch_edges(&mut self, project_id: u64) -> Result<Vec<EdgeRecord>>;

    fn create_edge(&mut self, project_id: u64, predecessor: LeafId, successor: LeafId) -> Result<DependencyEdge>;
    fn delete_edge(&mut self, project_id: u64, edge: EdgeId) -> Result<()>;
    fn update_slot(&mut self, project_id: u64, leaf: LeafId, slot: DayIndex) -> Result<()>;
    fn persist_group_order(&mut self, project_id: u64, order: &[GroupId]) -> Result<()>;

    /// Fetch everything the timeline needs in one go.
    fn load(&mut self, project_id: u64) -> Result<LoadedProject> {
        let snapshot = ProjectSnapshot {
            project: self.fetch_project(project_id)?,
            teams: self.fetch_teams(project_id)?,
            attempts: self.fetch_attempts(project_id)?,
            dependencies: self.fetch_edges(project_id)?,
        };
        snapshot.into_loaded(&self.describe())
    }

    /// Run one queued mutation and translate the outcome.
    fn execute(&mut self, project_id: u64, kind: &PendingKind) -> OpResult {
        let result = match kind {
            PendingKind::SlotUpdate { leaf, slot, .. } => self
                .update_slot(project_id, *leaf, *slot)
                .map(|()| OpResult::Done),
            PendingKind::CreateEdge {
                predecessor,
                successor,
            } => self
                .create_edge(project_id, *predecessor, *successor)
                .map(OpResult::EdgeCreated),
            PendingKind::DeleteEdge { edge } => self
                .delete_edge(project_id, *edge)
                .map(|()| OpResult::Done),
            PendingKind::GroupOrder { order } => self
                .persist_group_order(project_id, order)
                .map(|()| OpResult::Done),
        };
        result.unwrap_or_else(|err| OpResult::Failed(err.to_string()))
    }
}
