use egui::Color32;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// 1-based day column index; the only persisted horizontal coordinate.
pub type DayIndex = u32;

macro_rules! typed_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "-{}"), self.0)
            }
        }
    };
}

typed_id!(
    /// A team lane.
    GroupId,
    "team"
);
typed_id!(
    /// A task row inside a team lane.
    UnitId,
    "task"
);
typed_id!(
    /// An attempt placed on the timeline.
    LeafId,
    "attempt"
);
typed_id!(
    /// Server-assigned id of a dependency edge.
    EdgeId,
    "dep"
);

/// A team lane in the timeline.
#[derive(Debug, Clone)]
pub struct Group {
    pub id: GroupId,
    pub label: String,
    pub color: Color32,
    /// Owned units in insertion order. Never re-sorted.
    pub units: Vec<UnitId>,
}

/// A task row. Owned by exactly one group.
#[derive(Debug, Clone)]
pub struct Unit {
    pub id: UnitId,
    pub label: String,
    pub group: GroupId,
    pub leaves: Vec<LeafId>,
}

/// An attempt. Owned by exactly one unit.
#[derive(Debug, Clone)]
pub struct Leaf {
    pub id: LeafId,
    pub label: String,
    pub number: u32,
    pub unit: UnitId,
    pub slot: DayIndex,
}

/// The team -> task -> attempt tree with an explicit ownership index.
///
/// Parents are resolved through the typed `group` / `unit` back references,
/// never by parsing ids.
#[derive(Debug, Clone, Default)]
pub struct Hierarchy {
    groups: Vec<Group>,
    group_index: HashMap<GroupId, usize>,
    units: HashMap<UnitId, Unit>,
    leaves: HashMap<LeafId, Leaf>,
}

impl Hierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a group. Returns false if the id is already present.
    pub fn insert_group(&mut self, id: GroupId, label: impl Into<String>, color: Color32) -> bool {
        if self.group_index.contains_key(&id) {
            return false;
        }
        self.group_index.insert(id, self.groups.len());
        self.groups.push(Group {
            id,
            label: label.into(),
            color,
            units: Vec::new(),
        });
        true
    }

    /// Append a unit to its group. Returns false for a duplicate id or an unknown group.
    pub fn insert_unit(&mut self, group: GroupId, id: UnitId, label: impl Into<String>) -> bool {
        if self.units.contains_key(&id) {
            return false;
        }
        let Some(&idx) = self.group_index.get(&group) else {
            return false;
        };
        self.groups[idx].units.push(id);
        self.units.insert(
            id,
            Unit {
                id,
                label: label.into(),
                group,
                leaves: Vec::new(),
            },
        );
        true
    }

    /// Append a leaf to its unit. Returns false for a duplicate id or an unknown unit.
    pub fn insert_leaf(
        &mut self,
        unit: UnitId,
        id: LeafId,
        label: impl Into<String>,
        number: u32,
        slot: DayIndex,
    ) -> bool {
        if self.leaves.contains_key(&id) {
            return false;
        }
        let Some(owner) = self.units.get_mut(&unit) else {
            return false;
        };
        owner.leaves.push(id);
        self.leaves.insert(
            id,
            Leaf {
                id,
                label: label.into(),
                number,
                unit,
                slot,
            },
        );
        true
    }

    /// Groups in the order the collaborator returned them.
    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter()
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.group_index.get(&id).map(|&idx| &self.groups[idx])
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    pub fn leaf(&self, id: LeafId) -> Option<&Leaf> {
        self.leaves.get(&id)
    }

    pub fn contains_group(&self, id: GroupId) -> bool {
        self.group_index.contains_key(&id)
    }

    pub fn contains_unit(&self, id: UnitId) -> bool {
        self.units.contains_key(&id)
    }

    pub fn contains_leaf(&self, id: LeafId) -> bool {
        self.leaves.contains_key(&id)
    }

    /// Units of a group in insertion order; empty for an unknown group.
    pub fn units_of(&self, group: GroupId) -> &[UnitId] {
        self.group(group).map(|g| g.units.as_slice()).unwrap_or(&[])
    }

    pub fn leaves_of(&self, unit: UnitId) -> &[LeafId] {
        self.units
            .get(&unit)
            .map(|u| u.leaves.as_slice())
            .unwrap_or(&[])
    }

    pub fn owner_of_unit(&self, unit: UnitId) -> Option<GroupId> {
        self.units.get(&unit).map(|u| u.group)
    }

    pub fn owner_of_leaf(&self, leaf: LeafId) -> Option<UnitId> {
        self.leaves.get(&leaf).map(|l| l.unit)
    }

    pub fn group_of_leaf(&self, leaf: LeafId) -> Option<GroupId> {
        self.owner_of_leaf(leaf)
            .and_then(|unit| self.owner_of_unit(unit))
    }

    pub fn leaf_slot(&self, leaf: LeafId) -> Option<DayIndex> {
        self.leaves.get(&leaf).map(|l| l.slot)
    }

    /// Overwrite a leaf's slot, returning the previous one.
    pub fn set_leaf_slot(&mut self, leaf: LeafId, slot: DayIndex) -> Option<DayIndex> {
        self.leaves
            .get_mut(&leaf)
            .map(|l| std::mem::replace(&mut l.slot, slot))
    }

    pub fn unit_ids(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.groups.iter().flat_map(|g| g.units.iter().copied())
    }

    pub fn leaves(&self) -> impl Iterator<Item = &Leaf> {
        self.unit_ids()
            .flat_map(move |u| self.leaves_of(u).iter())
            .filter_map(move |id| self.leaves.get(id))
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// Pull every slot into `1..=max`. Returns how many leaves were moved.
    pub fn clamp_slots(&mut self, max: DayIndex) -> usize {
        let max = max.max(1);
        let mut moved = 0;
        for leaf in self.leaves.values_mut() {
            let clamped = leaf.slot.clamp(1, max);
            if clamped != leaf.slot {
                leaf.slot = clamped;
                moved += 1;
            }
        }
        moved
    }
}
