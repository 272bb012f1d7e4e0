use serde::{Deserialize, Serialize};

use super::collapse::CollapseState;
use super::geometry::ColumnWidths;
use super::hierarchy::{GroupId, Hierarchy, UnitId};

/// Pixel metrics for one layout profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutMetrics {
    pub unit_height: f32,
    pub unit_collapsed_height: f32,
    pub group_collapsed_height: f32,
    pub group_gap: f32,
    pub header_height: f32,
    pub header_body_gap: f32,
    pub group_sidebar_width: f32,
    pub unit_sidebar_width: f32,
    pub day_width: f32,
    pub day_collapsed_width: f32,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            unit_height: 60.0,
            unit_collapsed_height: 20.0,
            group_collapsed_height: 24.0,
            group_gap: 5.0,
            header_height: 60.0,
            header_body_gap: 10.0,
            group_sidebar_width: 80.0,
            unit_sidebar_width: 100.0,
            day_width: 60.0,
            day_collapsed_width: 14.0,
        }
    }
}

impl LayoutMetrics {
    /// Narrow-screen profile.
    pub fn compact() -> Self {
        Self {
            unit_height: 45.0,
            day_width: 45.0,
            header_height: 45.0,
            group_sidebar_width: 70.0,
            unit_sidebar_width: 70.0,
            ..Self::default()
        }
    }

    pub fn columns(&self) -> ColumnWidths {
        ColumnWidths {
            day: self.day_width,
            collapsed: self.day_collapsed_width,
        }
    }

    /// Where the day grid starts, left of it are both sidebars.
    pub fn grid_offset(&self) -> f32 {
        self.group_sidebar_width + self.unit_sidebar_width
    }

    /// First Y below the header.
    pub fn body_top(&self) -> f32 {
        self.header_height + self.header_body_gap
    }
}

/// Effective height of a unit: collapsed if it or its group is collapsed.
pub fn unit_height(metrics: &LayoutMetrics, hierarchy: &Hierarchy, collapse: &CollapseState, unit: UnitId) -> f32 {
    if collapse.is_unit_effectively_collapsed(hierarchy, unit) {
        metrics.unit_collapsed_height
    } else {
        metrics.unit_height
    }
}

/// Effective height of a group: a constant when collapsed, else the sum of its units.
pub fn group_height(metrics: &LayoutMetrics, hierarchy: &Hierarchy, collapse: &CollapseState, group: GroupId) -> f32 {
    if hierarchy.units_of(group).is_empty() {
        return 0.0;
    }
    if collapse.is_group_collapsed(group) {
        return metrics.group_collapsed_height;
    }
    hierarchy
        .units_of(group)
        .iter()
        .map(|&u| unit_height(metrics, hierarchy, collapse, u))
        .sum()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupPlacement {
    pub id: GroupId,
    pub y: f32,
    pub height: f32,
    pub collapsed: bool,
}

impl GroupPlacement {
    pub fn midpoint(&self) -> f32 {
        self.y + self.height / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitPlacement {
    pub id: UnitId,
    pub group: GroupId,
    /// Absolute canvas Y.
    pub y: f32,
    pub height: f32,
    pub collapsed: bool,
    /// True when the owning group is collapsed and the row is not drawn.
    pub hidden: bool,
}

/// Vertical positions of every group and unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    pub groups: Vec<GroupPlacement>,
    pub units: Vec<UnitPlacement>,
    pub total_height: f32,
}

impl Layout {
    pub fn group(&self, id: GroupId) -> Option<&GroupPlacement> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn unit(&self, id: UnitId) -> Option<&UnitPlacement> {
        self.units.iter().find(|u| u.id == id)
    }
}

/// Recompute every Y offset from scratch.
///
/// Groups are stacked in `order` below the header, units inside each group in
/// their insertion order. Groups without units take no space. Nothing is read
/// back from a previous layout, so repeated passes over the same state are
/// identical.
pub fn layout_pass(
    hierarchy: &Hierarchy,
    collapse: &CollapseState,
    order: &[GroupId],
    metrics: &LayoutMetrics,
) -> Layout {
    let mut layout = Layout::default();
    let mut y = metrics.body_top();

    for &group in order {
        if !hierarchy.contains_group(group) {
            tracing::warn!(group = %group, "group order references unknown group");
            continue;
        }
        let height = group_height(metrics, hierarchy, collapse, group);
        if height <= 0.0 {
            continue;
        }
        let group_collapsed = collapse.is_group_collapsed(group);
        layout.groups.push(GroupPlacement {
            id: group,
            y,
            height,
            collapsed: group_collapsed,
        });

        let mut unit_y = y;
        for &unit in hierarchy.units_of(group) {
            let unit_h = unit_height(metrics, hierarchy, collapse, unit);
            layout.units.push(UnitPlacement {
                id: unit,
                group,
                y: unit_y,
                height: unit_h,
                collapsed: collapse.is_unit_effectively_collapsed(hierarchy, unit),
                hidden: group_collapsed,
            });
            if !group_collapsed {
                unit_y += unit_h;
            }
        }

        y += height + metrics.group_gap;
    }

    layout.total_height = y;
    tracing::debug!(
        groups = layout.groups.len(),
        units = layout.units.len(),
        total_height = layout.total_height,
        "layout pass"
    );
    layout
}
