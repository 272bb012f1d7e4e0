use std::path::PathBuf;

/// Failures from the collaborator adapters, snapshot files and settings.
///
/// Local scheduling rejections (ordering, collapsed targets, stale ids) are
/// not errors; they come back as typed outcomes from the model.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("request to {endpoint} failed: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} returned status {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },
    #[error("malformed response from {endpoint}: {message}")]
    Malformed { endpoint: String, message: String },
    #[error("backend rejected the change: {0}")]
    Rejected(String),
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl SchedulerError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, SchedulerError>;

#[cfg(test)]
mod tests {
    use super::SchedulerError;

    #[test]
    fn malformed_message_names_the_endpoint() {
        let err = SchedulerError::Malformed {
            endpoint: "attempt_dependencies".to_string(),
            message: "missing field `id`".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "malformed response from attempt_dependencies: missing field `id`"
        );
    }
}
