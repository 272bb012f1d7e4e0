use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::hierarchy::{DayIndex, GroupId, Hierarchy, LeafId, UnitId};

/// Which of the three collapse maps a bulk operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollapseKind {
    Group,
    Unit,
    Day,
}

/// Three orthogonal collapse sources. Visibility is derived from them, the
/// maps never patch each other except for the force-expand rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollapseState {
    groups: HashMap<GroupId, bool>,
    units: HashMap<UnitId, bool>,
    days: BTreeMap<DayIndex, bool>,
}

impl CollapseState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_group_collapsed(&self, id: GroupId) -> bool {
        self.groups.get(&id).copied().unwrap_or(false)
    }

    pub fn is_unit_collapsed(&self, id: UnitId) -> bool {
        self.units.get(&id).copied().unwrap_or(false)
    }

    pub fn is_day_collapsed(&self, day: DayIndex) -> bool {
        self.days.get(&day).copied().unwrap_or(false)
    }

    /// The day map consumed by the slot geometry.
    pub fn day_map(&self) -> &BTreeMap<DayIndex, bool> {
        &self.days
    }

    /// Flip a group. Expanding it also expands every unit it owns.
    pub fn toggle_group(&mut self, hierarchy: &Hierarchy, id: GroupId) -> bool {
        if !hierarchy.contains_group(id) {
            tracing::warn!(group = %id, "toggle on unknown group ignored");
            return false;
        }
        let collapsed = !self.is_group_collapsed(id);
        self.groups.insert(id, collapsed);
        if !collapsed {
            for unit in hierarchy.units_of(id) {
                self.units.insert(*unit, false);
            }
        }
        true
    }

    /// Flip a unit. The owning group is left alone.
    pub fn toggle_unit(&mut self, hierarchy: &Hierarchy, id: UnitId) -> bool {
        if !hierarchy.contains_unit(id) {
            tracing::warn!(unit = %id, "toggle on unknown unit ignored");
            return false;
        }
        let collapsed = !self.is_unit_collapsed(id);
        self.units.insert(id, collapsed);
        true
    }

    pub fn toggle_day(&mut self, day: DayIndex, day_count: DayIndex) -> bool {
        if day == 0 || day > day_count {
            tracing::warn!(day, day_count, "toggle on out-of-range day ignored");
            return false;
        }
        let collapsed = !self.is_day_collapsed(day);
        self.days.insert(day, collapsed);
        true
    }

    pub fn collapse_all(&mut self, kind: CollapseKind, hierarchy: &Hierarchy, day_count: DayIndex) {
        self.set_all(kind, true, hierarchy, day_count);
    }

    /// Expanding all groups also clears every unit flag.
    pub fn expand_all(&mut self, kind: CollapseKind, hierarchy: &Hierarchy, day_count: DayIndex) {
        self.set_all(kind, false, hierarchy, day_count);
        if kind == CollapseKind::Group {
            self.set_all(CollapseKind::Unit, false, hierarchy, day_count);
        }
    }

    fn set_all(&mut self, kind: CollapseKind, value: bool, hierarchy: &Hierarchy, day_count: DayIndex) {
        match kind {
            CollapseKind::Group => {
                for group in hierarchy.groups() {
                    self.groups.insert(group.id, value);
                }
            }
            CollapseKind::Unit => {
                for unit in hierarchy.unit_ids() {
                    self.units.insert(unit, value);
                }
            }
            CollapseKind::Day => {
                for day in 1..=day_count {
                    self.days.insert(day, value);
                }
            }
        }
    }

    /// Group collapse dominates the unit's own flag.
    pub fn is_unit_effectively_collapsed(&self, hierarchy: &Hierarchy, id: UnitId) -> bool {
        let group_collapsed = hierarchy
            .owner_of_unit(id)
            .map(|g| self.is_group_collapsed(g))
            .unwrap_or(false);
        group_collapsed || self.is_unit_collapsed(id)
    }

    /// A leaf is hidden when its day, its unit or its group is collapsed.
    /// Unknown leaves count as hidden.
    pub fn is_leaf_hidden(&self, hierarchy: &Hierarchy, id: LeafId) -> bool {
        let Some(leaf) = hierarchy.leaf(id) else {
            return true;
        };
        self.is_day_collapsed(leaf.slot) || self.is_unit_effectively_collapsed(hierarchy, leaf.unit)
    }

    /// Drop flags for ids that no longer exist after a reload.
    pub fn retain_known(&mut self, hierarchy: &Hierarchy, day_count: DayIndex) -> usize {
        let before = self.groups.len() + self.units.len() + self.days.len();
        self.groups.retain(|id, _| hierarchy.contains_group(*id));
        self.units.retain(|id, _| hierarchy.contains_unit(*id));
        self.days.retain(|day, _| (1..=day_count).contains(day));
        let removed = before - (self.groups.len() + self.units.len() + self.days.len());
        if removed > 0 {
            tracing::debug!(removed, "dropped stale collapse flags");
        }
        removed
    }
}
