use egui::{Color32, FontId, Rounding, Stroke, Visuals};

// ── Palette ──────────────────────────────────────────────────────────────────

pub const BG_DARK: Color32 = Color32::from_rgb(24, 24, 32);
pub const BG_PANEL: Color32 = Color32::from_rgb(30, 30, 40);
pub const BG_HEADER: Color32 = Color32::from_rgb(34, 37, 48);
pub const BG_SIDEBAR: Color32 = Color32::from_rgb(28, 29, 38);
pub const BG_COLLAPSED_DAY: Color32 = Color32::from_rgb(40, 40, 52);
pub const BG_SELECTED: Color32 = Color32::from_rgba_premultiplied(80, 140, 220, 45);
pub const BG_STATUS: Color32 = Color32::from_rgb(22, 22, 30);

pub const BORDER_SUBTLE: Color32 = Color32::from_rgb(50, 52, 64);
pub const BORDER_ACCENT: Color32 = Color32::from_rgb(90, 140, 220);

pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(230, 232, 240);
pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(155, 160, 178);
pub const TEXT_DIM: Color32 = Color32::from_rgb(100, 105, 120);
pub const TEXT_ON_BAR: Color32 = Color32::from_rgb(255, 255, 255);
pub const TEXT_WARNING: Color32 = Color32::from_rgb(240, 180, 80);

pub const ACCENT: Color32 = Color32::from_rgb(80, 140, 220);
pub const GRID_LINE: Color32 = Color32::from_rgb(44, 46, 58);
pub const HANDLE_COLOR: Color32 = Color32::from_rgb(255, 255, 255);

pub const EDGE: Color32 = Color32::from_rgb(130, 135, 155);
pub const EDGE_SELECTED: Color32 = Color32::from_rgb(90, 140, 220);
pub const EDGE_CONFLICT: Color32 = Color32::from_rgb(240, 75, 75);
pub const EDGE_INCOMING: Color32 = Color32::from_rgb(52, 168, 83);
pub const EDGE_OUTGOING: Color32 = Color32::from_rgb(251, 140, 0);

// ── Sizes ────────────────────────────────────────────────────────────────────

pub const HANDLE_RADIUS: f32 = 4.0;
pub const LEAF_ROUNDING: f32 = 5.0;
pub const LEAF_INSET: f32 = 6.0; // keeps leaves off the row edges
pub const EDGE_WIDTH: f32 = 1.5;
pub const EDGE_HIT_DISTANCE: f32 = 6.0;
pub const SHAKE_AMPLITUDE: f32 = 6.0;
pub const STATUS_BAR_HEIGHT: f32 = 24.0;

// ── Fonts ────────────────────────────────────────────────────────────────────

pub fn font_header() -> FontId {
    FontId::proportional(12.0)
}

pub fn font_sub() -> FontId {
    FontId::proportional(10.5)
}

pub fn font_bar() -> FontId {
    FontId::proportional(11.5)
}

pub fn font_small() -> FontId {
    FontId::proportional(9.5)
}

pub fn font_menu() -> FontId {
    FontId::proportional(13.0)
}

pub fn font_status() -> FontId {
    FontId::proportional(11.0)
}

// ── Visuals ──────────────────────────────────────────────────────────────────

const BG_WIDGET: Color32 = Color32::from_rgb(42, 44, 56);
const BG_WIDGET_HOVER: Color32 = Color32::from_rgb(54, 57, 72);

/// Dark chrome for the menus, the mode selector, the status bar and dialogs.
/// The timeline canvas paints its own colors.
pub fn apply_theme(ctx: &egui::Context) {
    let mut visuals = Visuals::dark();
    visuals.override_text_color = Some(TEXT_PRIMARY);
    visuals.panel_fill = BG_PANEL;
    visuals.window_fill = BG_PANEL;
    visuals.window_stroke = Stroke::new(1.0, BORDER_SUBTLE);
    visuals.window_rounding = Rounding::same(8.0);
    visuals.menu_rounding = Rounding::same(6.0);

    let widgets = &mut visuals.widgets;
    for (state, fill, border) in [
        (&mut widgets.inactive, BG_WIDGET, BORDER_SUBTLE),
        (&mut widgets.hovered, BG_WIDGET_HOVER, ACCENT),
        (&mut widgets.active, BG_WIDGET_HOVER, ACCENT),
    ] {
        state.weak_bg_fill = fill;
        state.bg_fill = fill;
        state.bg_stroke = Stroke::new(1.0, border);
        state.rounding = Rounding::same(4.0);
    }
    widgets.noninteractive.bg_stroke = Stroke::new(1.0, BORDER_SUBTLE);
    widgets.noninteractive.fg_stroke = Stroke::new(1.0, TEXT_SECONDARY);

    // highlights the active mode in the toolbar
    visuals.selection.bg_fill = BG_SELECTED;
    visuals.selection.stroke = Stroke::new(1.0, ACCENT);

    ctx.set_visuals(visuals);
    ctx.style_mut(|style| {
        style.spacing.item_spacing = egui::vec2(8.0, 4.0);
        style.spacing.menu_margin = egui::Margin::same(6.0);
    });
}
