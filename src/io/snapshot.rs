use std::path::{Path, PathBuf};

use crate::error::{Result, SchedulerError};
use crate::model::{DayIndex, DependencyEdge, EdgeId, GroupId, LeafId};

use super::backend::SchedulerBackend;
use super::records::{AttemptRecord, EdgeRecord, ProjectRecord, ProjectSnapshot, TeamRecord};

/// Read a project snapshot from a JSON file.
pub fn load_snapshot(path: &Path) -> Result<ProjectSnapshot> {
    let json = std::fs::read_to_string(path).map_err(|e| SchedulerError::io(path, e))?;
    serde_json::from_str(&json).map_err(|e| SchedulerError::Malformed {
        endpoint: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Write a project snapshot as pretty JSON.
pub fn save_snapshot(snapshot: &ProjectSnapshot, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(snapshot)?;
    std::fs::write(path, json).map_err(|e| SchedulerError::io(path, e))
}

/// Offline backend over one project held in memory.
///
/// Validates mutations the way the server does and, when opened from a
/// file, writes the file back after every accepted change.
#[derive(Debug, Clone)]
pub struct SnapshotBackend {
    snapshot: ProjectSnapshot,
    path: Option<PathBuf>,
}

impl SnapshotBackend {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let snapshot = load_snapshot(&path)?;
        tracing::info!(path = %path.display(), project = snapshot.project.id, "snapshot opened");
        Ok(Self {
            snapshot,
            path: Some(path),
        })
    }

    pub fn in_memory(snapshot: ProjectSnapshot) -> Self {
        Self { snapshot, path: None }
    }

    pub fn project_id(&self) -> u64 {
        self.snapshot.project.id
    }

    pub fn snapshot(&self) -> &ProjectSnapshot {
        &self.snapshot
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn check_project(&self, project_id: u64) -> Result<()> {
        if project_id != self.snapshot.project.id {
            return Err(SchedulerError::Rejected(format!(
                "snapshot holds project {}, not {project_id}",
                self.snapshot.project.id
            )));
        }
        Ok(())
    }

    fn attempt(&self, leaf: LeafId) -> Result<&AttemptRecord> {
        self.snapshot
            .attempts
            .iter()
            .find(|a| a.id == leaf.0)
            .ok_or_else(|| SchedulerError::Rejected(format!("unknown attempt {}", leaf.0)))
    }

    /// Apply `change` to a copy and keep it only once the file write succeeded,
    /// so a failed write leaves memory and disk in agreement.
    fn commit<T>(&mut self, change: impl FnOnce(&mut ProjectSnapshot) -> Result<T>) -> Result<T> {
        let mut next = self.snapshot.clone();
        let out = change(&mut next)?;
        if let Some(path) = &self.path {
            save_snapshot(&next, path)?;
        }
        self.snapshot = next;
        Ok(out)
    }
}

impl SchedulerBackend for SnapshotBackend {
    fn describe(&self) -> String {
        match &self.path {
            Some(path) => path.display().to_string(),
            None => "in-memory snapshot".to_string(),
        }
    }

    fn fetch_project(&mut self, project_id: u64) -> Result<ProjectRecord> {
        self.check_project(project_id)?;
        Ok(self.snapshot.project.clone())
    }

    fn fetch_teams(&mut self, project_id: u64) -> Result<Vec<TeamRecord>> {
        self.check_project(project_id)?;
        Ok(self.snapshot.teams.clone())
    }

    fn fetch_attempts(&mut self, project_id: u64) -> Result<Vec<AttemptRecord>> {
        self.check_project(project_id)?;
        Ok(self.snapshot.attempts.clone())
    }

    fn fetch_edges(&mut self, project_id: u64) -> Result<Vec<EdgeRecord>> {
        self.check_project(project_id)?;
        Ok(self.snapshot.dependencies.clone())
    }

    fn create_edge(&mut self, project_id: u64, predecessor: LeafId, successor: LeafId) -> Result<DependencyEdge> {
        self.check_project(project_id)?;
        if predecessor == successor {
            return Err(SchedulerError::Rejected("an attempt cannot depend on itself".to_string()));
        }
        let before = self.attempt(predecessor)?.slot();
        let after = self.attempt(successor)?.slot();
        if before >= after {
            return Err(SchedulerError::Rejected(format!(
                "slot {before} is not before slot {after}"
            )));
        }
        if self
            .snapshot
            .dependencies
            .iter()
            .any(|d| d.predecessor == predecessor.0 && d.successor == successor.0)
        {
            return Err(SchedulerError::Rejected("dependency already exists".to_string()));
        }

        let id = self.snapshot.dependencies.iter().map(|d| d.id).max().unwrap_or(0) + 1;
        let record = EdgeRecord {
            id,
            predecessor: predecessor.0,
            successor: successor.0,
        };
        self.commit(|snapshot| {
            snapshot.dependencies.push(record);
            Ok(record.into())
        })
    }

    fn delete_edge(&mut self, project_id: u64, edge: EdgeId) -> Result<()> {
        self.check_project(project_id)?;
        if !self.snapshot.dependencies.iter().any(|d| d.id == edge.0) {
            return Err(SchedulerError::Rejected(format!("unknown dependency {}", edge.0)));
        }
        self.commit(|snapshot| {
            snapshot.dependencies.retain(|d| d.id != edge.0);
            Ok(())
        })
    }

    fn update_slot(&mut self, project_id: u64, leaf: LeafId, slot: DayIndex) -> Result<()> {
        self.check_project(project_id)?;
        self.commit(|snapshot| {
            let attempt = snapshot
                .attempts
                .iter_mut()
                .find(|a| a.id == leaf.0)
                .ok_or_else(|| SchedulerError::Rejected(format!("unknown attempt {}", leaf.0)))?;
            attempt.slot_index = Some(i64::from(slot));
            Ok(())
        })
    }

    fn persist_group_order(&mut self, project_id: u64, order: &[GroupId]) -> Result<()> {
        self.check_project(project_id)?;
        if let Some(unknown) = order
            .iter()
            .find(|g| !self.snapshot.teams.iter().any(|t| t.id == g.0))
        {
            return Err(SchedulerError::Rejected(format!("unknown team {}", unknown.0)));
        }
        // Teams missing from `order` keep their relative order after the listed ones.
        self.commit(|snapshot| {
            snapshot.teams.sort_by_key(|t| {
                order
                    .iter()
                    .position(|g| g.0 == t.id)
                    .unwrap_or(order.len())
            });
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::records::{TaskRef, TaskRecord};

    fn snapshot() -> ProjectSnapshot {
        let attempt = |id: u64, slot: i64| AttemptRecord {
            id,
            name: format!("a{id}"),
            number: Some(1),
            slot_index: Some(slot),
            task: TaskRef::Id(10),
        };
        ProjectSnapshot {
            project: ProjectRecord {
                id: 1,
                name: "Offline".into(),
                ..ProjectRecord::default()
            },
            teams: vec![
                TeamRecord {
                    id: 1,
                    name: "Ops".into(),
                    color: None,
                    tasks: vec![TaskRecord { id: 10, name: "Deploy".into() }],
                },
                TeamRecord { id: 2, name: "Dev".into(), color: None, tasks: vec![] },
            ],
            attempts: vec![attempt(100, 5), attempt(101, 8)],
            dependencies: vec![],
        }
    }

    #[test]
    fn edges_get_fresh_ids_and_invalid_ones_are_rejected() {
        let mut backend = SnapshotBackend::in_memory(snapshot());
        let edge = backend.create_edge(1, LeafId(100), LeafId(101)).unwrap();
        assert_eq!(edge.id, EdgeId(1));
        assert!(backend.create_edge(1, LeafId(100), LeafId(101)).is_err());
        assert!(backend.create_edge(1, LeafId(101), LeafId(100)).is_err());
        assert!(backend.create_edge(1, LeafId(100), LeafId(555)).is_err());
        assert!(backend.create_edge(2, LeafId(100), LeafId(101)).is_err());

        backend.delete_edge(1, edge.id).unwrap();
        assert!(backend.delete_edge(1, edge.id).is_err());
    }

    #[test]
    fn mutations_are_written_back_to_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.json");
        save_snapshot(&snapshot(), &path).unwrap();

        let mut backend = SnapshotBackend::open(&path).unwrap();
        backend.update_slot(1, LeafId(100), 3).unwrap();
        backend.persist_group_order(1, &[GroupId(2), GroupId(1)]).unwrap();

        let reread = load_snapshot(&path).unwrap();
        assert_eq!(reread.attempts[0].slot_index, Some(3));
        assert_eq!(reread.teams[0].id, 2);
        assert!(backend.persist_group_order(1, &[GroupId(9)]).is_err());
    }

    #[test]
    fn failed_write_keeps_nothing_in_memory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.json");
        save_snapshot(&snapshot(), &path).unwrap();
        let mut backend = SnapshotBackend::open(&path).unwrap();

        // a directory in the file's place makes every write fail
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();
        assert!(matches!(
            backend.create_edge(1, LeafId(100), LeafId(101)),
            Err(SchedulerError::Io { .. })
        ));
        assert!(backend.update_slot(1, LeafId(100), 2).is_err());
        assert!(backend.persist_group_order(1, &[GroupId(2), GroupId(1)]).is_err());
        assert!(backend.snapshot().dependencies.is_empty());
        assert_eq!(backend.snapshot().attempts[0].slot_index, Some(5));
        assert_eq!(backend.snapshot().teams[0].id, 1);

        std::fs::remove_dir(&path).unwrap();
        let edge = backend.create_edge(1, LeafId(100), LeafId(101)).unwrap();
        assert_eq!(edge.id, EdgeId(1));
        assert_eq!(load_snapshot(&path).unwrap().dependencies.len(), 1);
    }

    #[test]
    fn load_builds_project_through_the_trait() {
        let mut backend = SnapshotBackend::in_memory(snapshot());
        let loaded = backend.load(1).unwrap();
        assert_eq!(loaded.hierarchy.leaf_count(), 2);
        assert_eq!(loaded.span, None);
    }

    #[test]
    fn garbage_file_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{\"teams\": 3}").unwrap();
        assert!(matches!(load_snapshot(&path), Err(SchedulerError::Malformed { .. })));
        assert!(matches!(
            load_snapshot(&dir.path().join("missing.json")),
            Err(SchedulerError::Io { .. })
        ));
    }
}
