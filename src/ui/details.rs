use egui::{RichText, Ui};

use crate::model::{LeafId, Schedule};
use crate::ui::theme;

fn leaf_name(schedule: &Schedule, leaf: LeafId) -> String {
    schedule
        .hierarchy()
        .leaf(leaf)
        .map(|l| format!("{} (#{}, slot {})", l.label, l.number, l.slot))
        .unwrap_or_else(|| leaf.to_string())
}

/// Side panel with graph statistics and the inspected attempt's links.
pub fn show_details(schedule: &Schedule, ui: &mut Ui) {
    ui.label(RichText::new("Dependencies").strong().size(14.0));
    ui.add_space(4.0);

    let stats = schedule.stats();
    egui::Grid::new("graph_stats")
        .num_columns(2)
        .spacing([12.0, 4.0])
        .show(ui, |ui| {
            let row = |ui: &mut Ui, name: &str, value: String| {
                ui.label(RichText::new(name).color(theme::TEXT_SECONDARY));
                ui.label(value);
                ui.end_row();
            };
            row(ui, "Attempts", stats.leaves.to_string());
            row(ui, "Dependencies", stats.edges.to_string());
            row(ui, "Avg. fan-out", format!("{:.2}", stats.average_fan_out));
            row(ui, "Without predecessor", stats.roots.to_string());
            row(ui, "Without successor", stats.sinks.to_string());
        });

    ui.add_space(8.0);
    ui.separator();

    let highlight = schedule.mode().highlight();
    let Some(leaf) = highlight.leaf else {
        ui.label(RichText::new("Click an attempt in Inspect mode to see its links.").color(theme::TEXT_DIM));
        return;
    };
    ui.label(RichText::new(leaf_name(schedule, leaf)).strong());
    if let Some(date) = schedule.hierarchy().leaf_slot(leaf).and_then(|s| schedule.slot_date(s)) {
        ui.label(RichText::new(date.format("%A %d/%m/%Y").to_string()).color(theme::TEXT_SECONDARY));
    }
    ui.add_space(4.0);

    let graph = schedule.graph();
    ui.label(RichText::new(format!("Predecessors ({})", highlight.incoming.len())).color(theme::EDGE_INCOMING));
    for edge in highlight.incoming.iter().filter_map(|id| graph.get(*id)) {
        ui.label(format!("  {}", leaf_name(schedule, edge.predecessor)));
    }
    ui.add_space(4.0);
    ui.label(RichText::new(format!("Successors ({})", highlight.outgoing.len())).color(theme::EDGE_OUTGOING));
    for edge in highlight.outgoing.iter().filter_map(|id| graph.get(*id)) {
        ui.label(format!("  {}", leaf_name(schedule, edge.successor)));
    }
}
