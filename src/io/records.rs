//! Wire records exchanged with the project backend, also used as the
//! offline snapshot format.

use chrono::NaiveDate;
use egui::Color32;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SchedulerError};
use crate::model::{
    DayIndex, DependencyEdge, EdgeId, GroupId, Hierarchy, LeafId, LoadedProject, ProjectSpan, UnitId,
};

/// Team colors used when the backend sends none or an unparsable one.
const PALETTE: [Color32; 6] = [
    Color32::from_rgb(100, 149, 237),
    Color32::from_rgb(60, 179, 113),
    Color32::from_rgb(255, 165, 0),
    Color32::from_rgb(186, 85, 211),
    Color32::from_rgb(220, 20, 60),
    Color32::from_rgb(0, 206, 209),
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

impl ProjectRecord {
    pub fn span(&self) -> Option<ProjectSpan> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => Some(ProjectSpan { start, end }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub tasks: Vec<TaskRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: u64,
    pub name: String,
}

/// An attempt points at its task either by id or by an embedded object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskRef {
    Id(u64),
    Nested { id: u64 },
}

impl TaskRef {
    pub fn id(&self) -> u64 {
        match self {
            TaskRef::Id(id) | TaskRef::Nested { id } => *id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub number: Option<u32>,
    /// Missing or non-positive values place the attempt on the first day.
    #[serde(default)]
    pub slot_index: Option<i64>,
    #[serde(alias = "task_id")]
    pub task: TaskRef,
}

impl AttemptRecord {
    pub fn slot(&self) -> DayIndex {
        self.slot_index
            .and_then(|s| DayIndex::try_from(s).ok())
            .filter(|s| *s > 0)
            .unwrap_or(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub id: u64,
    #[serde(rename = "vortakt_attempt_id", alias = "predecessor_leaf_id")]
    pub predecessor: u64,
    #[serde(rename = "nachtakt_attempt_id", alias = "successor_leaf_id")]
    pub successor: u64,
}

impl From<EdgeRecord> for DependencyEdge {
    fn from(record: EdgeRecord) -> Self {
        DependencyEdge {
            id: EdgeId(record.id),
            predecessor: LeafId(record.predecessor),
            successor: LeafId(record.successor),
        }
    }
}

/// Attempt lists come back either bare or wrapped in `{"attempts": [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum AttemptList {
    Bare(Vec<AttemptRecord>),
    Wrapped {
        #[serde(default)]
        attempts: Vec<AttemptRecord>,
    },
}

impl AttemptList {
    pub fn into_vec(self) -> Vec<AttemptRecord> {
        match self {
            AttemptList::Bare(list) | AttemptList::Wrapped { attempts: list } => list,
        }
    }
}

/// Team lists likewise, `{"teams": [...]}` from the expanded endpoint.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TeamList {
    Bare(Vec<TeamRecord>),
    Wrapped {
        #[serde(default)]
        teams: Vec<TeamRecord>,
    },
}

impl TeamList {
    pub fn into_vec(self) -> Vec<TeamRecord> {
        match self {
            TeamList::Bare(list) | TeamList::Wrapped { teams: list } => list,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateEdgeBody {
    pub vortakt_attempt_id: u64,
    pub nachtakt_attempt_id: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteEdgeBody {
    pub dependency_id: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SlotIndexBody {
    pub attempt_id: u64,
    pub slot_index: DayIndex,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamOrderBody {
    pub order: Vec<u64>,
}

/// A whole project as the backend describes it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    pub project: ProjectRecord,
    #[serde(default)]
    pub teams: Vec<TeamRecord>,
    #[serde(default)]
    pub attempts: Vec<AttemptRecord>,
    #[serde(default)]
    pub dependencies: Vec<EdgeRecord>,
}

impl ProjectSnapshot {
    /// Build the typed hierarchy. Attempts pointing at unknown tasks are
    /// skipped with a warning, duplicate ids are an error.
    pub fn into_loaded(self, source: &str) -> Result<LoadedProject> {
        let mut hierarchy = Hierarchy::new();

        for (index, team) in self.teams.iter().enumerate() {
            let color = team_color(team.color.as_deref(), index);
            if !hierarchy.insert_group(GroupId(team.id), team.name.clone(), color) {
                return Err(malformed(source, format!("duplicate team id {}", team.id)));
            }
            for task in &team.tasks {
                if !hierarchy.insert_unit(GroupId(team.id), UnitId(task.id), task.name.clone()) {
                    return Err(malformed(source, format!("duplicate task id {}", task.id)));
                }
            }
        }

        let mut skipped = 0usize;
        for attempt in &self.attempts {
            let unit = UnitId(attempt.task.id());
            if !hierarchy.contains_unit(unit) {
                skipped += 1;
                continue;
            }
            let label = if attempt.name.is_empty() {
                format!("Attempt {}", attempt.id)
            } else {
                attempt.name.clone()
            };
            let number = attempt.number.unwrap_or(0);
            if !hierarchy.insert_leaf(unit, LeafId(attempt.id), label, number, attempt.slot()) {
                return Err(malformed(source, format!("duplicate attempt id {}", attempt.id)));
            }
        }
        if skipped > 0 {
            tracing::warn!(skipped, source, "attempts reference unknown tasks");
        }

        Ok(LoadedProject {
            project_id: self.project.id,
            name: self.project.name.clone(),
            span: self.project.span(),
            hierarchy,
            edges: self.dependencies.into_iter().map(DependencyEdge::from).collect(),
        })
    }
}

fn malformed(endpoint: &str, message: String) -> SchedulerError {
    SchedulerError::Malformed {
        endpoint: endpoint.to_string(),
        message,
    }
}

fn team_color(raw: Option<&str>, index: usize) -> Color32 {
    let fallback = PALETTE[index % PALETTE.len()];
    match raw {
        Some(hex) => parse_hex_color(hex).unwrap_or_else(|err| {
            tracing::warn!(%err, "team color ignored");
            fallback
        }),
        None => fallback,
    }
}

/// Parse `#RRGGBB` or `#RRGGBBAA`.
pub fn parse_hex_color(s: &str) -> std::result::Result<Color32, String> {
    let s = s.trim().trim_start_matches('#');
    let byte = |i: usize| {
        s.get(i..i + 2)
            .ok_or_else(|| format!("Invalid hex color '{s}'"))
            .and_then(|part| u8::from_str_radix(part, 16).map_err(|e| e.to_string()))
    };
    match s.len() {
        6 => Ok(Color32::from_rgb(byte(0)?, byte(2)?, byte(4)?)),
        8 => Ok(Color32::from_rgba_unmultiplied(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
        _ => Err(format!("Invalid hex color '{s}': expected 6 or 8 hex digits")),
    }
}
