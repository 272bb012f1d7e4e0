use std::time::Instant;

use egui::{menu, RichText, Ui};
use egui_phosphor::regular as icons;

use crate::app::SchedulerApp;
use crate::config::LayoutProfile;
use crate::model::{CollapseKind, Mode};
use crate::ui::theme;

fn mode_icon(mode: Mode) -> &'static str {
    match mode {
        Mode::Order => icons::ARROWS_OUT_CARDINAL,
        Mode::Dependency => icons::FLOW_ARROW,
        Mode::Inspect => icons::MAGNIFYING_GLASS,
    }
}

/// Render the top toolbar / menu bar.
pub fn show_toolbar(app: &mut SchedulerApp, ui: &mut Ui) {
    let ctx = ui.ctx().clone();
    menu::bar(ui, |ui| {
        ui.menu_button(RichText::new("  File  ").font(theme::font_menu()), |ui| {
            if ui.button(format!("{}  Reload          Ctrl+R", icons::ARROW_CLOCKWISE)).clicked() {
                app.reload();
                ui.close_menu();
            }
            ui.separator();
            if ui.button(format!("{}  Open Snapshot...", icons::FOLDER_OPEN)).clicked() {
                app.open_snapshot(&ctx);
                ui.close_menu();
            }
            let online = app.settings.snapshot_path.is_none();
            if ui
                .add_enabled(!online, egui::Button::new(format!("{}  Use Backend", icons::CLOUD)))
                .clicked()
            {
                app.use_snapshot(None, &ctx);
                ui.close_menu();
            }
            ui.separator();
            if ui.button(format!("{}  Export CSV...    Ctrl+E", icons::EXPORT)).clicked() {
                app.export_csv();
                ui.close_menu();
            }
        });

        ui.menu_button(RichText::new("  View  ").font(theme::font_menu()), |ui| {
            for (kind, name) in [
                (CollapseKind::Group, "Teams"),
                (CollapseKind::Unit, "Tasks"),
                (CollapseKind::Day, "Days"),
            ] {
                ui.horizontal(|ui| {
                    ui.label(RichText::new(name).color(theme::TEXT_SECONDARY));
                    if ui.small_button("Collapse all").clicked() {
                        app.schedule.collapse_all(kind);
                        ui.close_menu();
                    }
                    if ui.small_button("Expand all").clicked() {
                        app.schedule.expand_all(kind);
                        ui.close_menu();
                    }
                });
            }
            ui.separator();
            ui.label(RichText::new("Layout").small().weak());
            let mut profile = app.settings.layout_profile;
            let standard = ui.radio_value(&mut profile, LayoutProfile::Standard, "Standard");
            let compact = ui.radio_value(&mut profile, LayoutProfile::Compact, "Compact");
            if standard.clicked() || compact.clicked() {
                app.set_layout_profile(profile);
                ui.close_menu();
            }
            ui.separator();
            if ui.checkbox(&mut app.show_details, "Dependency details").clicked() {
                ui.close_menu();
            }
        });

        ui.menu_button(RichText::new("  Help  ").font(theme::font_menu()), |ui| {
            if ui.button("About").clicked() {
                app.show_about = true;
                ui.close_menu();
            }
        });

        ui.separator();

        let current = app.schedule.mode().mode();
        for (index, mode) in Mode::ALL.into_iter().enumerate() {
            let label = format!("{} {}", mode_icon(mode), mode.label());
            if ui
                .selectable_label(current == mode, label)
                .on_hover_text(format!("Ctrl+{}", index + 1))
                .clicked()
            {
                app.set_mode(mode);
            }
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let name = if app.schedule.name().is_empty() {
                format!("Project {}", app.schedule.project_id())
            } else {
                app.schedule.name().to_string()
            };
            ui.label(RichText::new(name).size(11.0).weak());
        });
    });
}

/// Status line: transient feedback, sync state and backend.
pub fn show_status_bar(app: &SchedulerApp, ui: &mut Ui, now: Instant) {
    ui.horizontal_centered(|ui| {
        match app.schedule.feedback().message(now) {
            Some(message) => ui.label(
                RichText::new(format!("{} {message}", icons::WARNING))
                    .font(theme::font_status())
                    .color(theme::TEXT_WARNING),
            ),
            None => ui.label(
                RichText::new(&app.status_message)
                    .font(theme::font_status())
                    .color(theme::TEXT_SECONDARY),
            ),
        };

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let dim = |text: String| RichText::new(text).size(10.5).color(theme::TEXT_DIM);
            ui.label(dim(app.backend_label().to_string()));
            ui.label(dim(" · ".into()));

            let pending = app.schedule.pending();
            let drift: Vec<String> = pending
                .drift()
                .map(|op| op.kind.describe())
                .collect();
            if !drift.is_empty() {
                ui.label(
                    RichText::new(format!("{} {} unsaved", icons::WARNING_CIRCLE, drift.len()))
                        .size(10.5)
                        .color(theme::TEXT_WARNING),
                )
                .on_hover_text(format!("Not saved, reload to resync:\n{}", drift.join("\n")));
                ui.label(dim(" · ".into()));
            }
            if pending.in_flight() > 0 {
                ui.spinner();
                ui.label(dim(format!("Saving {}", pending.in_flight())));
                ui.label(dim(" · ".into()));
            }

            let h = app.schedule.hierarchy();
            ui.label(dim(format!(
                "Teams: {} · Tasks: {} · Attempts: {} · Dependencies: {}",
                h.group_count(),
                h.unit_count(),
                h.leaf_count(),
                app.schedule.graph().len()
            )));
        });
    });
}
