use egui::{Color32, Context, RichText, Window};

use crate::app::SchedulerApp;
use crate::model::LeafId;
use crate::ui::theme;

const DIALOG_WIDTH: f32 = 320.0;

fn accent_button(text: &str) -> egui::Button<'_> {
    egui::Button::new(RichText::new(text).color(Color32::WHITE))
        .fill(theme::ACCENT)
        .rounding(egui::Rounding::same(4.0))
}

/// Render the "About" dialog.
pub fn show_about_dialog(app: &mut SchedulerApp, ctx: &Context) {
    let mut should_close = false;
    Window::new("About")
        .resizable(false)
        .collapsible(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .fixed_size([DIALOG_WIDTH, 180.0])
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(12.0);
                ui.heading(RichText::new("Team Timeline").strong());
                ui.add_space(2.0);
                ui.label(RichText::new(format!("Version {}", env!("CARGO_PKG_VERSION"))).color(theme::TEXT_SECONDARY));
                ui.add_space(10.0);
                ui.label("Plan team attempts on a shared day grid");
                ui.label("with dependency-aware dragging.");
                ui.add_space(14.0);
                if ui.add_sized([100.0, 28.0], egui::Button::new("Close")).clicked() {
                    should_close = true;
                }
            });
        });
    if should_close || ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
        app.show_about = false;
    }
}

/// Confirm before a dependency is deleted through the backend.
pub fn show_delete_edge_dialog(app: &mut SchedulerApp, ctx: &Context) {
    let Some(edge_id) = app.confirm_delete else {
        return;
    };
    let Some(edge) = app.schedule.graph().get(edge_id).copied() else {
        // already gone, e.g. removed by a reload
        app.confirm_delete = None;
        return;
    };
    let name = |leaf: LeafId| {
        app.schedule
            .hierarchy()
            .leaf(leaf)
            .map(|l| format!("{} (#{})", l.label, l.number))
            .unwrap_or_else(|| leaf.to_string())
    };
    let (from, to) = (name(edge.predecessor), name(edge.successor));

    let mut confirmed = false;
    let mut cancelled = false;
    Window::new(RichText::new("Delete Dependency").strong().size(14.0))
        .resizable(false)
        .collapsible(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .fixed_size([DIALOG_WIDTH, 0.0])
        .show(ctx, |ui| {
            ui.add_space(4.0);
            ui.label(RichText::new(&from).strong());
            ui.label(RichText::new("must finish before").color(theme::TEXT_SECONDARY));
            ui.label(RichText::new(&to).strong());
            ui.add_space(6.0);
            ui.separator();
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                if ui.add_sized([80.0, 28.0], accent_button("Delete")).clicked() {
                    confirmed = true;
                }
                if ui.add_sized([80.0, 28.0], egui::Button::new("Cancel")).clicked() {
                    cancelled = true;
                }
            });
            ui.add_space(2.0);
        });

    if confirmed {
        app.confirm_edge_deletion();
    } else if cancelled || ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
        app.confirm_delete = None;
    }
}

/// Shown when the project could not be fetched.
pub fn show_load_error_dialog(app: &mut SchedulerApp, ctx: &Context) {
    let Some(error) = app.load_error.clone() else {
        return;
    };
    let mut retry = false;
    let mut open_snapshot = false;
    let mut dismissed = false;
    Window::new(RichText::new("Could not load project").strong().size(14.0))
        .resizable(false)
        .collapsible(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .fixed_size([DIALOG_WIDTH + 80.0, 0.0])
        .show(ctx, |ui| {
            ui.add_space(4.0);
            ui.label(RichText::new(&error).color(theme::TEXT_WARNING));
            ui.add_space(4.0);
            ui.label(
                RichText::new(format!("Backend: {}", app.backend_label()))
                    .small()
                    .color(theme::TEXT_DIM),
            );
            ui.add_space(6.0);
            ui.separator();
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                if ui.add_sized([80.0, 28.0], accent_button("Retry")).clicked() {
                    retry = true;
                }
                if ui.add_sized([120.0, 28.0], egui::Button::new("Open Snapshot...")).clicked() {
                    open_snapshot = true;
                }
                if ui.add_sized([80.0, 28.0], egui::Button::new("Dismiss")).clicked() {
                    dismissed = true;
                }
            });
            ui.add_space(2.0);
        });

    if retry {
        app.load_error = None;
        app.connect(ctx);
    } else if open_snapshot {
        app.load_error = None;
        app.open_snapshot(ctx);
    } else if dismissed || ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
        app.load_error = None;
    }
}
