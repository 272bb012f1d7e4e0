use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::BackendSettings;
use crate::error::{Result, SchedulerError};
use crate::model::{DayIndex, DependencyEdge, EdgeId, GroupId, LeafId};

use super::backend::SchedulerBackend;
use super::records::{
    AttemptList, AttemptRecord, CreateEdgeBody, DeleteEdgeBody, EdgeRecord, ProjectRecord, SlotIndexBody,
    TeamList, TeamOrderBody, TeamRecord,
};

const ADD_EDGE: &str = "add_attempt_dependency/";
const ALL_EDGES: &str = "all_attempt_dependencies/";
const DELETE_EDGE: &str = "delete_attempt_dependency/";
const UPDATE_SLOT: &str = "update_attempt_slot_index/";

fn project_path(project_id: u64, rest: &str) -> String {
    format!("projects/{project_id}/{rest}")
}

/// The create endpoint may echo only the new id.
#[derive(Debug, Deserialize)]
struct CreatedEdge {
    id: u64,
}

/// REST client for the project backend.
pub struct HttpBackend {
    client: reqwest::blocking::Client,
    base: String,
    token: Option<String>,
}

impl HttpBackend {
    pub fn new(settings: &BackendSettings) -> Result<Self> {
        if settings.base_url.trim().is_empty() {
            return Err(SchedulerError::Config("backend base_url is empty".to_string()));
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs.max(1)))
            .build()
            .map_err(|source| SchedulerError::Http {
                endpoint: settings.base_url.clone(),
                source,
            })?;
        let base = format!(
            "{}/{}",
            settings.base_url.trim_end_matches('/'),
            settings.api_prefix.trim_matches('/')
        );
        Ok(Self {
            client,
            base,
            token: settings.token.clone().filter(|t| !t.is_empty()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path)
    }

    fn send(&self, endpoint: &str, req: reqwest::blocking::RequestBuilder) -> Result<String> {
        let req = match self.token.as_deref() {
            Some(token) => req.bearer_auth(token),
            None => req,
        };
        let res = req.send().map_err(|source| SchedulerError::Http {
            endpoint: endpoint.to_string(),
            source,
        })?;
        let status = res.status();
        let body = res.text().map_err(|source| SchedulerError::Http {
            endpoint: endpoint.to_string(),
            source,
        })?;
        if !status.is_success() {
            return Err(SchedulerError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        let body = self.send(&url, self.client.get(&url))?;
        decode(&url, &body)
    }

    fn post<B: Serialize>(&self, path: &str, payload: &B) -> Result<String> {
        let url = self.url(path);
        self.send(&url, self.client.post(&url).json(payload))
    }

    fn patch<B: Serialize>(&self, path: &str, payload: &B) -> Result<String> {
        let url = self.url(path);
        self.send(&url, self.client.patch(&url).json(payload))
    }
}

fn decode<T: DeserializeOwned>(endpoint: &str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|err| SchedulerError::Malformed {
        endpoint: endpoint.to_string(),
        message: err.to_string(),
    })
}

impl SchedulerBackend for HttpBackend {
    fn describe(&self) -> String {
        self.base.clone()
    }

    fn fetch_project(&mut self, project_id: u64) -> Result<ProjectRecord> {
        self.get(&project_path(project_id, ""))
    }

    fn fetch_teams(&mut self, project_id: u64) -> Result<Vec<TeamRecord>> {
        let list: TeamList = self.get(&project_path(project_id, "project_teams_expanded/"))?;
        Ok(list.into_vec())
    }

    fn fetch_attempts(&mut self, project_id: u64) -> Result<Vec<AttemptRecord>> {
        let list: AttemptList = self.get(&project_path(project_id, "all_attempts_for_this_project/"))?;
        Ok(list.into_vec())
    }

    /// The backend lists every dependency it knows; edges to attempts of other
    /// projects are dropped when the project is loaded.
    fn fetch_edges(&mut self, _project_id: u64) -> Result<Vec<EdgeRecord>> {
        self.get(ALL_EDGES)
    }

    fn create_edge(&mut self, _project_id: u64, predecessor: LeafId, successor: LeafId) -> Result<DependencyEdge> {
        let body = self.post(
            ADD_EDGE,
            &CreateEdgeBody {
                vortakt_attempt_id: predecessor.0,
                nachtakt_attempt_id: successor.0,
            },
        )?;
        let created: CreatedEdge = decode(ADD_EDGE, &body)?;
        Ok(DependencyEdge {
            id: EdgeId(created.id),
            predecessor,
            successor,
        })
    }

    fn delete_edge(&mut self, _project_id: u64, edge: EdgeId) -> Result<()> {
        self.post(DELETE_EDGE, &DeleteEdgeBody { dependency_id: edge.0 })?;
        Ok(())
    }

    fn update_slot(&mut self, _project_id: u64, leaf: LeafId, slot: DayIndex) -> Result<()> {
        self.post(
            UPDATE_SLOT,
            &SlotIndexBody {
                attempt_id: leaf.0,
                slot_index: slot,
            },
        )?;
        Ok(())
    }

    fn persist_group_order(&mut self, project_id: u64, order: &[GroupId]) -> Result<()> {
        self.patch(
            &project_path(project_id, "teams/reorder/"),
            &TeamOrderBody {
                order: order.iter().map(|g| g.0).collect(),
            },
        )?;
        Ok(())
    }
}
