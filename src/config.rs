//! Persisted settings, layered as CLI > environment > settings file > defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, SchedulerError};
use crate::model::{DayIndex, FeedbackTimings, LayoutMetrics};

pub const ENV_BACKEND_URL: &str = "TEAM_TIMELINE_BACKEND_URL";
pub const ENV_TOKEN: &str = "TEAM_TIMELINE_TOKEN";
pub const ENV_PROJECT: &str = "TEAM_TIMELINE_PROJECT";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    pub base_url: String,
    pub api_prefix: String,
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".into(),
            api_prefix: "/api/orgarhythmus".into(),
            token: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutProfile {
    #[default]
    Standard,
    Compact,
}

impl LayoutProfile {
    pub fn metrics(self) -> LayoutMetrics {
        match self {
            LayoutProfile::Standard => LayoutMetrics::default(),
            LayoutProfile::Compact => LayoutMetrics::compact(),
        }
    }
}

/// Persisted user settings (lives in the OS config directory).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub backend: BackendSettings,
    pub project_id: u64,
    pub layout_profile: LayoutProfile,
    pub default_day_count: DayIndex,
    pub feedback: FeedbackTimings,
    /// Work offline against this snapshot file instead of the backend.
    pub snapshot_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: BackendSettings::default(),
            project_id: 1,
            layout_profile: LayoutProfile::Standard,
            default_day_count: 25,
            feedback: FeedbackTimings::default(),
            snapshot_path: None,
        }
    }
}

impl Settings {
    pub fn config_path() -> PathBuf {
        match directories::ProjectDirs::from("", "", "TeamTimeline") {
            Some(dirs) => dirs.config_dir().join("settings.json"),
            None => PathBuf::from(".").join("settings.json"),
        }
    }

    /// Settings file, then environment. Problems are logged and defaults used.
    pub fn load() -> Self {
        let path = Self::config_path();
        let mut settings = Self::load_from(&path).unwrap_or_else(|err| {
            tracing::warn!(path = %path.display(), %err, "settings ignored");
            Self::default()
        });
        settings.apply_env(|key| std::env::var(key).ok());
        settings
    }

    /// A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(SchedulerError::io(path, err)),
        };
        serde_json::from_str(&json)
            .map_err(|err| SchedulerError::Config(format!("{}: {err}", path.display())))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| SchedulerError::io(dir, e))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| SchedulerError::io(path, e))
    }

    pub fn save(&self) {
        let path = Self::config_path();
        if let Err(err) = self.save_to(&path) {
            tracing::warn!(path = %path.display(), %err, "could not save settings");
        }
    }

    /// Overlay values from the environment. `lookup` is `std::env::var` in production.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BACKEND_URL).filter(|v| !v.is_empty()) {
            self.backend.base_url = url;
        }
        if let Some(token) = lookup(ENV_TOKEN).filter(|v| !v.is_empty()) {
            self.backend.token = Some(token);
        }
        if let Some(raw) = lookup(ENV_PROJECT) {
            match raw.trim().parse() {
                Ok(id) => self.project_id = id,
                Err(_) => tracing::warn!(var = ENV_PROJECT, value = %raw, "not a project id"),
            }
        }
    }

    pub fn metrics(&self) -> LayoutMetrics {
        self.layout_profile.metrics()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"layout_profile": "compact", "backend": {"timeout_secs": 5}}"#).unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.layout_profile, LayoutProfile::Compact);
        assert_eq!(settings.backend.timeout_secs, 5);
        assert_eq!(settings.backend.api_prefix, "/api/orgarhythmus");
        assert_eq!(settings.default_day_count, 25);
        assert_eq!(settings.feedback.shake_ms, 250);
        assert_eq!(settings.metrics().unit_height, 45.0);
    }

    #[test]
    fn missing_file_is_default_and_garbage_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Settings::load_from(&dir.path().join("none.json")).unwrap(), Settings::default());

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "not json").unwrap();
        assert!(matches!(Settings::load_from(&bad), Err(SchedulerError::Config(_))));
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let mut settings = Settings::default();
        settings.snapshot_path = Some(PathBuf::from("demo.json"));
        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path).unwrap(), settings);
    }

    #[test]
    fn environment_overrides_file_values() {
        let env: HashMap<&str, &str> = [
            (ENV_BACKEND_URL, "https://plan.example.org"),
            (ENV_TOKEN, "secret"),
            (ENV_PROJECT, "not-a-number"),
        ]
        .into_iter()
        .collect();
        let mut settings = Settings::default();
        settings.apply_env(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(settings.backend.base_url, "https://plan.example.org");
        assert_eq!(settings.backend.token.as_deref(), Some("secret"));
        assert_eq!(settings.project_id, 1);

        settings.apply_env(|key| (key == ENV_PROJECT).then(|| " 12 ".to_string()));
        assert_eq!(settings.project_id, 12);
    }
}
