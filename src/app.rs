use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::config::{LayoutProfile, Settings};
use crate::error::Result;
use crate::io::{csv_export, HttpBackend, SchedulerBackend, SnapshotBackend, Worker, WorkerEvent};
use crate::model::{DropOutcome, EdgeId, Mode, RevertReason, Schedule};
use crate::ui;
use crate::ui::timeline::TimelineInteraction;

/// Main application state.
pub struct SchedulerApp {
    pub schedule: Schedule,
    pub settings: Settings,
    worker: Option<Worker>,
    /// Project the worker loads and mutates. Comes from the snapshot file in offline mode.
    project_id: u64,
    pub loading: bool,
    pub load_error: Option<String>,

    // Dialog state
    pub show_about: bool,
    pub show_details: bool,
    pub confirm_delete: Option<EdgeId>,

    pub status_message: String,
}

impl SchedulerApp {
    pub fn new(cc: &eframe::CreationContext<'_>, settings: Settings) -> Self {
        // Phosphor as a fallback font so icons render inline with text
        let mut fonts = egui::FontDefinitions::default();
        egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
        cc.egui_ctx.set_fonts(fonts);
        ui::theme::apply_theme(&cc.egui_ctx);

        let schedule = Schedule::new(settings.metrics(), settings.feedback, settings.default_day_count);
        let mut app = Self {
            schedule,
            project_id: settings.project_id,
            settings,
            worker: None,
            loading: false,
            load_error: None,
            show_about: false,
            show_details: false,
            confirm_delete: None,
            status_message: "Ready".to_string(),
        };
        app.connect(&cc.egui_ctx);
        app
    }

    /// (Re)build the backend from the settings and fetch the project.
    pub fn connect(&mut self, ctx: &egui::Context) {
        if let Some(old) = self.worker.take() {
            retire_worker(&mut self.schedule, old, Instant::now());
        }
        match self.make_backend() {
            Ok((backend, project_id)) => {
                let repaint = ctx.clone();
                self.project_id = project_id;
                self.worker = Some(Worker::spawn(backend, move || repaint.request_repaint()));
                self.reload();
            }
            Err(err) => {
                tracing::error!(%err, "backend unavailable");
                self.load_error = Some(err.to_string());
                self.loading = false;
            }
        }
    }

    fn make_backend(&self) -> Result<(Box<dyn SchedulerBackend>, u64)> {
        match &self.settings.snapshot_path {
            Some(path) => {
                let backend = SnapshotBackend::open(path.clone())?;
                let project_id = backend.project_id();
                Ok((Box::new(backend), project_id))
            }
            None => {
                let backend = HttpBackend::new(&self.settings.backend)?;
                Ok((Box::new(backend), self.settings.project_id))
            }
        }
    }

    pub fn backend_label(&self) -> &str {
        self.worker.as_ref().map_or("disconnected", |w| w.label())
    }

    pub fn reload(&mut self) {
        let Some(worker) = &self.worker else {
            return;
        };
        self.loading = true;
        worker.load(self.project_id);
        self.status_message = format!("Loading project {}…", self.project_id);
    }

    pub fn open_snapshot(&mut self, ctx: &egui::Context) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Timeline snapshot", &["json"])
            .pick_file()
        {
            self.use_snapshot(Some(path), ctx);
        }
    }

    /// `None` switches back to the HTTP backend.
    pub fn use_snapshot(&mut self, path: Option<PathBuf>, ctx: &egui::Context) {
        self.settings.snapshot_path = path;
        self.settings.save();
        self.connect(ctx);
    }

    pub fn export_csv(&mut self) {
        if self.schedule.hierarchy().leaf_count() == 0 {
            self.status_message = "Nothing to export, the project has no attempts".to_string();
            return;
        }
        let default_name = format!("{}.csv", self.schedule.name().replace(['/', '\\'], "_"));
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV", &["csv"])
            .set_file_name(default_name)
            .save_file()
        {
            match csv_export::export_csv(&self.schedule, &path) {
                Ok(count) => self.status_message = format!("Exported {count} attempts to CSV"),
                Err(err) => self.status_message = format!("CSV export failed: {err}"),
            }
        }
    }

    pub fn set_layout_profile(&mut self, profile: LayoutProfile) {
        if self.settings.layout_profile == profile {
            return;
        }
        self.settings.layout_profile = profile;
        self.schedule.set_metrics(profile.metrics());
        self.settings.save();
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.schedule.set_mode(mode);
        self.status_message = format!("{} mode", mode.label());
    }

    /// Delete the edge the confirm dialog was opened for.
    pub fn confirm_edge_deletion(&mut self) {
        let Some(edge) = self.confirm_delete.take() else {
            return;
        };
        if self.schedule.mode().selected_edge() != Some(edge) && !self.schedule.select_edge(edge) {
            return;
        }
        if self.schedule.delete_selected_edge().is_some() {
            self.status_message = format!("Removing dependency {edge}…");
        }
    }

    /// Apply everything the worker finished since the last frame.
    fn drain_worker(&mut self, now: Instant) {
        let Some(worker) = &self.worker else {
            return;
        };
        for event in worker.drain() {
            match event {
                WorkerEvent::Loaded(Ok(project)) => {
                    self.loading = false;
                    self.load_error = None;
                    self.status_message = format!("Loaded '{}'", project.name);
                    self.schedule.load(project);
                }
                WorkerEvent::Loaded(Err(err)) => {
                    self.loading = false;
                    self.load_error = Some(err.to_string());
                    self.status_message = "Load failed".to_string();
                }
                WorkerEvent::Finished { op, result } => self.schedule.apply_result(op, result, now),
            }
        }
    }

    /// Hand newly queued mutations to the worker.
    fn flush_pending(&mut self) {
        let Some(worker) = &self.worker else {
            return;
        };
        for (op, kind) in self.schedule.take_unsent() {
            worker.execute(self.project_id, op, kind);
        }
    }

    fn handle_timeline(&mut self, interaction: TimelineInteraction) {
        match interaction.drop {
            Some(DropOutcome::Committed { leaf, from, to }) => {
                self.status_message = format!("Moved attempt {leaf} from slot {from} to {to}");
            }
            Some(DropOutcome::Reverted {
                reason: RevertReason::CollapsedDay(day),
                ..
            }) => {
                self.status_message = format!("Day {day} is collapsed, expand it to drop there");
            }
            _ => {}
        }
        if let Some(Ok(_)) = interaction.edge_request {
            self.status_message = "Creating dependency…".to_string();
        }
        if let Some(edge) = interaction.delete_requested {
            self.confirm_delete = Some(edge);
        }
    }
}

impl eframe::App for SchedulerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.drain_worker(now);
        self.schedule.tick(now);

        // Keyboard shortcuts outside closures to avoid borrow issues
        let (should_reload, should_export) = ctx.input(|i| {
            (
                i.modifiers.command && i.key_pressed(egui::Key::R),
                i.modifiers.command && i.key_pressed(egui::Key::E),
            )
        });
        let mode_key = ctx.input(|i| {
            if !i.modifiers.command {
                return None;
            }
            [egui::Key::Num1, egui::Key::Num2, egui::Key::Num3]
                .into_iter()
                .zip(Mode::ALL)
                .find(|(key, _)| i.key_pressed(*key))
                .map(|(_, mode)| mode)
        });
        if should_reload {
            self.reload();
        }
        if should_export {
            self.export_csv();
        }
        if let Some(mode) = mode_key {
            self.set_mode(mode);
        }

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui::toolbar::show_toolbar(self, ui);
        });

        egui::TopBottomPanel::bottom("status_bar")
            .exact_height(ui::theme::STATUS_BAR_HEIGHT)
            .frame(
                egui::Frame::default()
                    .fill(ui::theme::BG_STATUS)
                    .inner_margin(egui::Margin::symmetric(10.0, 0.0)),
            )
            .show(ctx, |ui| {
                ui::toolbar::show_status_bar(self, ui, now);
            });

        if self.show_details {
            egui::SidePanel::right("details_panel")
                .default_width(240.0)
                .resizable(true)
                .frame(
                    egui::Frame::default()
                        .fill(ui::theme::BG_PANEL)
                        .inner_margin(egui::Margin::same(10.0))
                        .stroke(egui::Stroke::new(1.0, ui::theme::BORDER_SUBTLE)),
                )
                .show(ctx, |ui| {
                    ui::details::show_details(&self.schedule, ui);
                });
        }

        let chart_frame = egui::Frame::default()
            .fill(ui::theme::BG_DARK)
            .inner_margin(egui::Margin::ZERO);
        let interaction = egui::CentralPanel::default()
            .frame(chart_frame)
            .show(ctx, |ui| {
                if self.loading && self.schedule.hierarchy().group_count() == 0 {
                    ui.centered_and_justified(|ui| ui.spinner());
                    return TimelineInteraction::default();
                }
                ui::timeline::show_timeline(&mut self.schedule, ui, now)
            })
            .inner;
        self.handle_timeline(interaction);

        if self.show_about {
            ui::dialogs::show_about_dialog(self, ctx);
        }
        if self.confirm_delete.is_some() {
            ui::dialogs::show_delete_edge_dialog(self, ctx);
        }
        if self.load_error.is_some() {
            ui::dialogs::show_load_error_dialog(self, ctx);
        }

        self.flush_pending();

        let now = Instant::now();
        if self.schedule.feedback().is_animating(now) || self.schedule.drag().snapshot().is_some() {
            ctx.request_repaint();
        } else if let Some(deadline) = self.schedule.feedback().next_deadline() {
            ctx.request_repaint_after(deadline.saturating_duration_since(now) + Duration::from_millis(5));
        }
    }
}

/// Settle what the outgoing worker already answered and abandon the rest; its
/// other replies would land in a channel nobody drains. A late load is
/// ignored, the new backend fetches its own.
fn retire_worker(schedule: &mut Schedule, worker: Worker, now: Instant) -> usize {
    for event in worker.drain() {
        if let WorkerEvent::Finished { op, result } = event {
            schedule.apply_result(op, result, now);
        }
    }
    schedule.abandon_pending("backend replaced")
}
