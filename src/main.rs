#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use team_timeline::app::SchedulerApp;
use team_timeline::config::{LayoutProfile, Settings};

/// Launch overrides. Anything not given falls back to the environment, then the settings file.
#[derive(Debug, Parser)]
#[command(name = "team-timeline", version, about)]
struct Args {
    /// Project to open.
    #[arg(long)]
    project: Option<u64>,

    /// Backend root, e.g. https://plan.example.org
    #[arg(long)]
    backend_url: Option<String>,

    /// Bearer token for the backend.
    #[arg(long)]
    token: Option<String>,

    /// Work offline against a JSON snapshot file.
    #[arg(long, value_name = "FILE")]
    snapshot: Option<PathBuf>,

    /// Narrow-screen metrics.
    #[arg(long)]
    compact: bool,
}

impl Args {
    fn apply(self, settings: &mut Settings) {
        if let Some(project) = self.project {
            settings.project_id = project;
        }
        if let Some(url) = self.backend_url {
            settings.backend.base_url = url;
        }
        if let Some(token) = self.token {
            settings.backend.token = Some(token);
        }
        if self.snapshot.is_some() {
            settings.snapshot_path = self.snapshot;
        }
        if self.compact {
            settings.layout_profile = LayoutProfile::Compact;
        }
    }
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("team_timeline=info")),
        )
        .init();

    let mut settings = Settings::load();
    Args::parse().apply(&mut settings);
    tracing::info!(
        project = settings.project_id,
        snapshot = ?settings.snapshot_path,
        backend = %settings.backend.base_url,
        "starting"
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([800.0, 400.0])
            .with_title("Team Timeline"),
        ..Default::default()
    };

    eframe::run_native(
        "Team Timeline",
        options,
        Box::new(|cc| Ok(Box::new(SchedulerApp::new(cc, settings)))),
    )
}
