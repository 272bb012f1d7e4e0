use std::collections::HashMap;
use std::f32::consts::PI;
use std::time::Instant;

use egui::epaint::CubicBezierShape;
use egui::{Align2, Color32, CursorIcon, Key, Pos2, Rect, Rounding, Sense, Stroke, Ui, Vec2};
use egui_phosphor::regular as icons;

use crate::model::reorder::insertion_index;
use crate::model::{
    DayIndex, DropOutcome, EdgeId, EdgeRequestError, GroupId, LeafId, Mode, NodeKind, OpId, Schedule, UnitId,
};
use crate::ui::theme;

/// Result details from interactions in the timeline.
#[derive(Debug, Default)]
pub struct TimelineInteraction {
    /// Local state changed (collapse, order, committed drop).
    pub changed: bool,
    pub drop: Option<DropOutcome>,
    pub edge_request: Option<Result<OpId, EdgeRequestError>>,
    /// The user pressed Delete with an edge selected.
    pub delete_requested: Option<EdgeId>,
}

/// Collected while painting, applied once the frame's borrows are released.
#[derive(Debug, Clone, Copy)]
enum Action {
    ToggleDay(DayIndex),
    ToggleGroup(GroupId),
    ToggleUnit(UnitId),
    BeginLeafDrag { leaf: LeafId, grid_x: f32 },
    DropLeaf { grid_x: f32 },
    DropGroup { group: GroupId, y: f32 },
    DropUnit { unit: UnitId, y: f32 },
    BeginConnection(LeafId),
    FinishConnection(Option<LeafId>),
    InspectLeaf(LeafId),
    SelectEdge(EdgeId),
    ClearSelection,
}

/// Render the timeline canvas (central panel).
pub fn show_timeline(schedule: &mut Schedule, ui: &mut Ui, now: Instant) -> TimelineInteraction {
    let mut interaction = TimelineInteraction::default();
    let mut actions = Vec::new();

    egui::ScrollArea::both()
        .auto_shrink([false, false])
        .drag_to_scroll(false)
        .show(ui, |ui| {
            paint(schedule, ui, now, &mut actions);
        });

    if let Some(edge) = schedule.mode().selected_edge() {
        if ui.input(|i| i.key_pressed(Key::Delete) || i.key_pressed(Key::Backspace)) {
            interaction.delete_requested = Some(edge);
        }
    }
    if ui.input(|i| i.key_pressed(Key::Escape)) {
        schedule.cancel_leaf_drag();
        schedule.cancel_connection();
    }

    for action in actions {
        apply(schedule, action, now, &mut interaction);
    }
    interaction
}

fn apply(schedule: &mut Schedule, action: Action, now: Instant, interaction: &mut TimelineInteraction) {
    match action {
        Action::ToggleDay(day) => interaction.changed |= schedule.toggle_day(day),
        Action::ToggleGroup(group) => interaction.changed |= schedule.toggle_group(group),
        Action::ToggleUnit(unit) => interaction.changed |= schedule.toggle_unit(unit),
        Action::BeginLeafDrag { leaf, grid_x } => {
            schedule.begin_leaf_drag(leaf, grid_x);
        }
        Action::DropLeaf { grid_x } => {
            let outcome = schedule.drop_leaf(grid_x, now);
            interaction.changed |= matches!(outcome, DropOutcome::Committed { .. });
            interaction.drop = Some(outcome);
        }
        Action::DropGroup { group, y } => interaction.changed |= schedule.drop_group(group, y),
        Action::DropUnit { unit, y } => interaction.changed |= schedule.drop_unit(unit, y),
        Action::BeginConnection(leaf) => {
            schedule.begin_connection(leaf);
        }
        Action::FinishConnection(Some(target)) => {
            interaction.edge_request = schedule.finish_connection(target, now);
        }
        Action::FinishConnection(None) => schedule.cancel_connection(),
        Action::InspectLeaf(leaf) => {
            schedule.inspect_leaf(leaf);
        }
        Action::SelectEdge(edge) => {
            schedule.select_edge(edge);
        }
        Action::ClearSelection => {
            schedule.clear_edge_selection();
            schedule.clear_highlight();
        }
    }
}

fn paint(schedule: &Schedule, ui: &mut Ui, now: Instant, actions: &mut Vec<Action>) {
    let metrics = *schedule.metrics();
    let geometry = schedule.geometry();
    let layout = schedule.layout();
    let hierarchy = schedule.hierarchy();
    let mode = schedule.mode();

    let available = ui.available_size();
    let width = (metrics.grid_offset() + geometry.total_width()).max(available.x);
    let height = (layout.total_height + 40.0).max(available.y);

    let (response, painter) = ui.allocate_painter(Vec2::new(width, height), Sense::click());
    let origin = response.rect.min;
    let grid_x0 = origin.x + metrics.grid_offset();
    let body_top = origin.y + metrics.body_top();
    let pointer = ui.input(|i| i.pointer.latest_pos());

    painter.rect_filled(response.rect, 0.0, theme::BG_DARK);

    // ── Group lanes ─────────────────────────────────────────────
    let group_w = metrics.group_sidebar_width;
    let unit_w = metrics.unit_sidebar_width;
    let mut dragged_row_y = None;

    for placement in &layout.groups {
        let Some(group) = hierarchy.group(placement.id) else {
            continue;
        };
        let top = origin.y + placement.y;
        let band = Rect::from_min_size(Pos2::new(origin.x, top), Vec2::new(width, placement.height));
        painter.rect_filled(band, 0.0, group.color.gamma_multiply(0.08));
        painter.line_segment(
            [band.left_bottom(), band.right_bottom()],
            Stroke::new(1.0, theme::BORDER_SUBTLE),
        );

        let sidebar = Rect::from_min_size(band.min, Vec2::new(group_w, placement.height));
        painter.rect_filled(sidebar.shrink(1.0), Rounding::same(4.0), group.color.gamma_multiply(0.6));
        let caret = if placement.collapsed {
            icons::CARET_RIGHT
        } else {
            icons::CARET_DOWN
        };
        painter.with_clip_rect(sidebar).text(
            sidebar.left_top() + Vec2::new(6.0, 5.0),
            Align2::LEFT_TOP,
            format!("{caret} {}", group.label),
            theme::font_bar(),
            theme::TEXT_ON_BAR,
        );

        if mode.is_interactive(NodeKind::Group) {
            let sense = if mode.can_drag(NodeKind::Group) {
                Sense::click_and_drag()
            } else {
                Sense::click()
            };
            let resp = ui.interact(sidebar, ui.make_persistent_id(("group", group.id.0)), sense);
            if resp.clicked() {
                actions.push(Action::ToggleGroup(group.id));
            }
            if resp.dragged() {
                ui.ctx().set_cursor_icon(CursorIcon::Grabbing);
                dragged_row_y = pointer.map(|p| p.y - origin.y);
            }
            if resp.drag_stopped() {
                if let Some(p) = pointer {
                    actions.push(Action::DropGroup {
                        group: group.id,
                        y: p.y - origin.y,
                    });
                }
            }
        }
    }

    // ── Unit rows ───────────────────────────────────────────────
    for placement in layout.units.iter().filter(|u| !u.hidden) {
        let Some(unit) = hierarchy.unit(placement.id) else {
            continue;
        };
        let top = origin.y + placement.y;
        let row = Rect::from_min_size(
            Pos2::new(origin.x + group_w, top),
            Vec2::new(width - group_w, placement.height),
        );
        painter.line_segment(
            [row.left_bottom(), row.right_bottom()],
            Stroke::new(0.5, theme::BORDER_SUBTLE),
        );

        let sidebar = Rect::from_min_size(row.min, Vec2::new(unit_w, placement.height));
        painter.rect_filled(sidebar.shrink(1.0), Rounding::same(3.0), theme::BG_SIDEBAR);
        let caret = if placement.collapsed {
            icons::CARET_RIGHT
        } else {
            icons::CARET_DOWN
        };
        painter.with_clip_rect(sidebar).text(
            Pos2::new(sidebar.left() + 6.0, sidebar.center().y),
            Align2::LEFT_CENTER,
            format!("{caret} {}", unit.label),
            theme::font_sub(),
            theme::TEXT_SECONDARY,
        );

        if mode.is_interactive(NodeKind::Unit) {
            let sense = if mode.can_drag(NodeKind::Unit) {
                Sense::click_and_drag()
            } else {
                Sense::click()
            };
            let resp = ui.interact(sidebar, ui.make_persistent_id(("unit", unit.id.0)), sense);
            if resp.clicked() {
                actions.push(Action::ToggleUnit(unit.id));
            }
            if resp.dragged() {
                ui.ctx().set_cursor_icon(CursorIcon::Grabbing);
                dragged_row_y = pointer.map(|p| p.y - origin.y);
            }
            if resp.drag_stopped() {
                if let Some(p) = pointer {
                    actions.push(Action::DropUnit {
                        unit: unit.id,
                        y: p.y - origin.y,
                    });
                }
            }
        }
    }

    // ── Day columns ─────────────────────────────────────────────
    let header = Rect::from_min_size(origin, Vec2::new(width, metrics.header_height));
    painter.rect_filled(header, 0.0, theme::BG_HEADER);
    painter.line_segment(
        [header.left_bottom(), header.right_bottom()],
        Stroke::new(1.0, theme::BORDER_SUBTLE),
    );
    painter.with_clip_rect(Rect::from_min_size(origin, Vec2::new(metrics.grid_offset(), metrics.header_height)))
        .text(
            Pos2::new(origin.x + 8.0, header.center().y),
            Align2::LEFT_CENTER,
            schedule.name(),
            theme::font_header(),
            theme::TEXT_PRIMARY,
        );

    for (day, range) in geometry.columns() {
        let cell = Rect::from_min_max(
            Pos2::new(grid_x0 + range.start, origin.y),
            Pos2::new(grid_x0 + range.end, origin.y + metrics.header_height),
        );
        let collapsed = geometry.is_collapsed(day);
        painter.line_segment(
            [cell.left_top(), Pos2::new(cell.left(), origin.y + height)],
            Stroke::new(0.5, theme::GRID_LINE),
        );
        if collapsed {
            painter.rect_filled(cell, 0.0, theme::BG_COLLAPSED_DAY);
            painter.rect_filled(
                Rect::from_min_max(Pos2::new(cell.left(), body_top), Pos2::new(cell.right(), origin.y + height)),
                0.0,
                theme::BG_COLLAPSED_DAY.gamma_multiply(0.6),
            );
        } else {
            painter.text(
                Pos2::new(cell.center().x, cell.top() + 18.0),
                Align2::CENTER_CENTER,
                day.to_string(),
                theme::font_header(),
                theme::TEXT_PRIMARY,
            );
            if let Some(date) = schedule.slot_date(day) {
                painter.text(
                    Pos2::new(cell.center().x, cell.top() + 38.0),
                    Align2::CENTER_CENTER,
                    date.format("%d.%m").to_string(),
                    theme::font_sub(),
                    theme::TEXT_SECONDARY,
                );
            }
        }
    }
    let day_strip = Rect::from_min_max(
        Pos2::new(grid_x0, origin.y),
        Pos2::new(grid_x0 + geometry.total_width(), origin.y + metrics.header_height),
    );
    let resp = ui.interact(day_strip, ui.make_persistent_id("day-header"), Sense::click());
    if resp.clicked() {
        if let Some(p) = resp.interact_pointer_pos() {
            actions.push(Action::ToggleDay(geometry.slot_containing(p.x - grid_x0)));
        }
    }
    if let Some(p) = resp.hover_pos() {
        let day = geometry.slot_containing(p.x - grid_x0);
        resp.on_hover_text(if geometry.is_collapsed(day) { "Expand day" } else { "Collapse day" });
    }

    // ── Leaf placement ──────────────────────────────────────────
    let dragging = schedule.drag().snapshot().is_some();
    let mut leaves: Vec<(LeafId, Rect)> = Vec::new();
    for placement in layout.units.iter().filter(|u| !u.hidden && !u.collapsed) {
        for &leaf in hierarchy.leaves_of(placement.id) {
            if schedule.is_leaf_hidden(leaf) {
                continue;
            }
            let Some(slot) = hierarchy.leaf_slot(leaf) else {
                continue;
            };
            let range = geometry.pixel_range(slot);
            let mut x = range.start;
            if schedule.drag().is_dragging(leaf) {
                if let Some(preview) = pointer.and_then(|p| schedule.drag().preview_x(p.x - grid_x0)) {
                    x = preview;
                }
            }
            if let Some(progress) = schedule.feedback().shake_progress(leaf, now) {
                x += shake_offset(progress);
            }
            let rect = Rect::from_min_size(
                Pos2::new(grid_x0 + x + 2.0, origin.y + placement.y + theme::LEAF_INSET),
                Vec2::new(range.width() - 4.0, placement.height - 2.0 * theme::LEAF_INSET),
            );
            leaves.push((leaf, rect));
        }
    }
    // the dragged leaf is painted last so it stays on top
    leaves.sort_by_key(|(leaf, _)| schedule.drag().is_dragging(*leaf));
    let leaf_rects: HashMap<LeafId, Rect> = leaves.iter().copied().collect();

    // ── Dependency edges ────────────────────────────────────────
    let highlight = mode.highlight();
    let mut edge_paths: Vec<(EdgeId, Vec<Pos2>)> = Vec::new();
    for edge in schedule.graph().edges() {
        let flagged = schedule.feedback().is_edge_flagged(edge.id, now);
        // flagged edges stay visible, drawn to the row that hides their end
        let endpoint = |leaf: LeafId| {
            leaf_rects.get(&leaf).copied().or_else(|| {
                flagged
                    .then(|| hidden_leaf_anchor(schedule, leaf))
                    .flatten()
                    .map(|r| r.translate(origin.to_vec2()))
            })
        };
        let (Some(from), Some(to)) = (endpoint(edge.predecessor), endpoint(edge.successor)) else {
            continue;
        };
        let (color, width) = if flagged {
            (theme::EDGE_CONFLICT, 2.5)
        } else if highlight.incoming.contains(&edge.id) {
            (theme::EDGE_INCOMING, 2.5)
        } else if highlight.outgoing.contains(&edge.id) {
            (theme::EDGE_OUTGOING, 2.5)
        } else if mode.selected_edge() == Some(edge.id) {
            (theme::EDGE_SELECTED, 2.5)
        } else {
            (theme::EDGE, theme::EDGE_WIDTH)
        };
        let start = from.right_center();
        let end = to.left_center();
        let bend = ((end.x - start.x).abs() * 0.5).max(30.0);
        let curve = CubicBezierShape::from_points_stroke(
            [start, start + Vec2::new(bend, 0.0), end - Vec2::new(bend, 0.0), end],
            false,
            Color32::TRANSPARENT,
            Stroke::new(width, color),
        );
        edge_paths.push((edge.id, curve.flatten(Some(1.0))));
        painter.add(curve);
        painter.add(egui::Shape::convex_polygon(
            vec![end, end + Vec2::new(-8.0, -4.0), end + Vec2::new(-8.0, 4.0)],
            color,
            Stroke::NONE,
        ));
    }

    // ── Leaves ──────────────────────────────────────────────────
    let leaf_sense = if mode.can_drag(NodeKind::Leaf) {
        Sense::click_and_drag()
    } else {
        Sense::click()
    };
    let rounding = Rounding::same(theme::LEAF_ROUNDING);
    for &(leaf_id, rect) in &leaves {
        let Some(leaf) = hierarchy.leaf(leaf_id) else {
            continue;
        };
        let color = hierarchy
            .group_of_leaf(leaf_id)
            .and_then(|g| hierarchy.group(g))
            .map(|g| g.color)
            .unwrap_or(theme::ACCENT);

        painter.rect_filled(rect.translate(Vec2::new(1.0, 2.0)), rounding, Color32::from_black_alpha(35));
        painter.rect_filled(rect, rounding, color);
        if highlight.leaf == Some(leaf_id) {
            painter.rect_stroke(rect.expand(1.5), rounding, Stroke::new(2.0, theme::BORDER_ACCENT));
        }
        painter.with_clip_rect(rect).text(
            Pos2::new(rect.left() + 5.0, rect.center().y),
            Align2::LEFT_CENTER,
            format!("#{} {}", leaf.number, leaf.label),
            theme::font_small(),
            theme::TEXT_ON_BAR,
        );

        let resp = ui.interact(rect, ui.make_persistent_id(("leaf", leaf_id.0)), leaf_sense);
        if resp.drag_started() {
            if let Some(p) = pointer {
                actions.push(Action::BeginLeafDrag {
                    leaf: leaf_id,
                    grid_x: p.x - grid_x0,
                });
            }
        }
        if resp.dragged() {
            ui.ctx().set_cursor_icon(CursorIcon::Grabbing);
        }
        if resp.drag_stopped() {
            if let Some(p) = pointer {
                actions.push(Action::DropLeaf { grid_x: p.x - grid_x0 });
            }
        }
        if resp.clicked() && mode.mode() == Mode::Inspect {
            actions.push(Action::InspectLeaf(leaf_id));
        }
        if resp.hovered() && !dragging {
            egui::show_tooltip_at_pointer(
                ui.ctx(),
                ui.layer_id(),
                egui::Id::new(("leaf-tip", leaf_id.0)),
                |ui| {
                    ui.strong(&leaf.label);
                    ui.label(format!("#{} · slot {}", leaf.number, leaf.slot));
                    if let Some(date) = schedule.slot_date(leaf.slot) {
                        ui.label(date.format("%d/%m/%Y").to_string());
                    }
                },
            );
        }

        if mode.can_connect() {
            let input = rect.left_center();
            let output = rect.right_center();
            painter.circle_stroke(input, theme::HANDLE_RADIUS, Stroke::new(1.5, theme::HANDLE_COLOR));
            painter.circle_filled(output, theme::HANDLE_RADIUS, theme::HANDLE_COLOR);
            let handle = Rect::from_center_size(output, Vec2::splat(theme::HANDLE_RADIUS * 3.0));
            let handle_resp = ui.interact(handle, ui.make_persistent_id(("leaf-out", leaf_id.0)), Sense::drag());
            if handle_resp.drag_started() {
                actions.push(Action::BeginConnection(leaf_id));
            }
            if handle_resp.drag_stopped() {
                let target = pointer.and_then(|p| leaf_at(&leaves, p));
                actions.push(Action::FinishConnection(target));
            }
        }
    }

    // ── Overlays ────────────────────────────────────────────────
    if let (Some(source), Some(p)) = (mode.connection_source(), pointer) {
        if let Some(rect) = leaf_rects.get(&source) {
            painter.line_segment([rect.right_center(), p], Stroke::new(1.5, theme::EDGE_SELECTED));
        }
    }

    if let Some(y) = dragged_row_y {
        let line_y = origin.y + insertion_line_y(schedule, y);
        painter.line_segment(
            [Pos2::new(origin.x, line_y), Pos2::new(origin.x + width, line_y)],
            Stroke::new(2.0, theme::ACCENT),
        );
    }

    if response.clicked() {
        if let Some(p) = response.interact_pointer_pos() {
            match mode.mode() {
                Mode::Dependency => match nearest_edge(&edge_paths, p) {
                    Some(edge) => actions.push(Action::SelectEdge(edge)),
                    None => actions.push(Action::ClearSelection),
                },
                Mode::Inspect => actions.push(Action::ClearSelection),
                Mode::Order => {}
            }
        }
    }
}

/// Horizontal jitter for a rejected leaf, decaying to zero.
fn shake_offset(progress: f32) -> f32 {
    (progress * PI * 6.0).sin() * theme::SHAKE_AMPLITUDE * (1.0 - progress)
}

/// Canvas-relative stand-in for a leaf that is not drawn: its slot on the
/// unit row, or on the group lane when the whole group is collapsed.
fn hidden_leaf_anchor(schedule: &Schedule, leaf: LeafId) -> Option<Rect> {
    let leaf = schedule.hierarchy().leaf(leaf)?;
    let layout = schedule.layout();
    let unit = layout.unit(leaf.unit)?;
    let (y, height) = if unit.hidden {
        let group = layout.group(unit.group)?;
        (group.y, group.height)
    } else {
        (unit.y, unit.height)
    };
    let range = schedule.geometry().pixel_range(leaf.slot);
    Some(Rect::from_min_size(
        Pos2::new(schedule.metrics().grid_offset() + range.start, y),
        Vec2::new(range.width(), height),
    ))
}

fn leaf_at(leaves: &[(LeafId, Rect)], p: Pos2) -> Option<LeafId> {
    leaves
        .iter()
        .find(|(_, rect)| rect.expand(theme::HANDLE_RADIUS).contains(p))
        .map(|(leaf, _)| *leaf)
}

/// Y (canvas) of the gap a dragged group would drop into.
fn insertion_line_y(schedule: &Schedule, drop_y: f32) -> f32 {
    let layout = schedule.layout();
    let order = schedule.order();
    let gap = schedule.metrics().group_gap;
    let index = insertion_index(order, layout, drop_y);
    order.ids()[index.min(order.ids().len())..]
        .iter()
        .find_map(|id| layout.group(*id))
        .map(|g| g.y - gap / 2.0)
        .unwrap_or(layout.total_height - gap / 2.0)
}

fn nearest_edge(paths: &[(EdgeId, Vec<Pos2>)], p: Pos2) -> Option<EdgeId> {
    paths
        .iter()
        .filter_map(|(id, points)| distance_to_polyline(p, points).map(|d| (*id, d)))
        .filter(|(_, d)| *d <= theme::EDGE_HIT_DISTANCE)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id)
}

fn distance_to_polyline(p: Pos2, points: &[Pos2]) -> Option<f32> {
    points
        .windows(2)
        .map(|w| distance_to_segment(p, w[0], w[1]))
        .min_by(f32::total_cmp)
}

fn distance_to_segment(p: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_sq();
    if len_sq <= f32::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DependencyEdge, Hierarchy, LoadedProject};

    #[test]
    fn edge_hit_testing_picks_the_closest_path() {
        let paths = vec![
            (EdgeId(1), vec![Pos2::new(0.0, 0.0), Pos2::new(100.0, 0.0)]),
            (EdgeId(2), vec![Pos2::new(0.0, 10.0), Pos2::new(100.0, 10.0)]),
        ];
        assert_eq!(nearest_edge(&paths, Pos2::new(50.0, 2.0)), Some(EdgeId(1)));
        assert_eq!(nearest_edge(&paths, Pos2::new(50.0, 8.0)), Some(EdgeId(2)));
        assert_eq!(nearest_edge(&paths, Pos2::new(50.0, 40.0)), None);
    }

    fn schedule() -> Schedule {
        let mut h = Hierarchy::new();
        h.insert_group(GroupId(1), "Ops", Color32::GRAY);
        h.insert_unit(GroupId(1), UnitId(10), "Deploy");
        h.insert_leaf(UnitId(10), LeafId(1), "x", 1, 3);
        h.insert_group(GroupId(2), "Dev", Color32::GRAY);
        h.insert_unit(GroupId(2), UnitId(20), "Build");
        h.insert_unit(GroupId(2), UnitId(21), "Test");
        h.insert_leaf(UnitId(21), LeafId(2), "y", 1, 6);
        let mut s = Schedule::default();
        s.load(LoadedProject {
            project_id: 1,
            name: "demo".into(),
            span: None,
            hierarchy: h,
            edges: vec![DependencyEdge { id: EdgeId(1), predecessor: LeafId(1), successor: LeafId(2) }],
        });
        s
    }

    #[test]
    fn hidden_ends_anchor_to_the_row_that_hides_them() {
        let mut s = schedule();
        let column = s.geometry().pixel_range(6);
        let x = s.metrics().grid_offset() + column.start;

        s.toggle_unit(UnitId(21));
        let row = *s.layout().unit(UnitId(21)).unwrap();
        let anchor = hidden_leaf_anchor(&s, LeafId(2)).unwrap();
        assert_eq!(anchor.left(), x);
        assert_eq!(anchor.top(), row.y);
        assert_eq!(anchor.height(), row.height);

        s.toggle_group(GroupId(2));
        let lane = *s.layout().group(GroupId(2)).unwrap();
        let anchor = hidden_leaf_anchor(&s, LeafId(2)).unwrap();
        assert_eq!(anchor.top(), lane.y);
        assert_eq!(anchor.height(), lane.height);
        assert_eq!(anchor.width(), column.width());
    }

    #[test]
    fn rejected_drop_flags_an_edge_to_a_collapsed_leaf() {
        let mut s = schedule();
        s.toggle_unit(UnitId(21));
        assert!(s.is_leaf_hidden(LeafId(2)));

        let now = Instant::now();
        let x = s.leaf_x(LeafId(1)).unwrap();
        assert!(s.begin_leaf_drag(LeafId(1), x));
        let target = s.geometry().pixel_range(9).start;
        assert!(matches!(s.drop_leaf(target, now), DropOutcome::Reverted { .. }));
        assert!(s.feedback().is_edge_flagged(EdgeId(1), now));
        assert!(hidden_leaf_anchor(&s, LeafId(2)).is_some());
    }

    #[test]
    fn shake_settles() {
        assert_eq!(shake_offset(0.0), 0.0);
        assert!(shake_offset(1.0).abs() < 1e-4);
        assert!(shake_offset(1.0 / 12.0).abs() > 1.0);
    }
}
