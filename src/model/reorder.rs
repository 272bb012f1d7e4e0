use std::collections::HashSet;

use super::hierarchy::{GroupId, Hierarchy};
use super::layout::Layout;

/// Explicit top-to-bottom order of groups, persisted as a list of ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupOrder {
    ids: Vec<GroupId>,
}

impl GroupOrder {
    pub fn new(ids: Vec<GroupId>) -> Self {
        Self { ids }
    }

    /// Order in which the hierarchy was loaded.
    pub fn from_hierarchy(hierarchy: &Hierarchy) -> Self {
        Self::new(hierarchy.groups().map(|g| g.id).collect())
    }

    pub fn ids(&self) -> &[GroupId] {
        &self.ids
    }

    pub fn position(&self, id: GroupId) -> Option<usize> {
        self.ids.iter().position(|g| *g == id)
    }

    /// Keep the local order across a reload: drop ids that vanished and
    /// append new groups at the end in the hierarchy's order.
    pub fn reconcile(&mut self, hierarchy: &Hierarchy) -> usize {
        let before = self.ids.len();
        self.ids.retain(|id| hierarchy.contains_group(*id));
        let removed = before - self.ids.len();
        if removed > 0 {
            tracing::warn!(removed, "dropped stale groups from order");
        }
        let known: HashSet<GroupId> = self.ids.iter().copied().collect();
        self.ids
            .extend(hierarchy.groups().map(|g| g.id).filter(|id| !known.contains(id)));
        removed
    }

    /// Move `id` so it ends up at `index` of the order before removal.
    ///
    /// `index` counts slots in the current order, so dropping below yourself
    /// shifts the target up by one once the dragged id is spliced out.
    pub fn move_to(&mut self, id: GroupId, index: usize) -> bool {
        let Some(from) = self.position(id) else {
            tracing::warn!(group = %id, "reorder of unknown group ignored");
            return false;
        };
        let mut to = index.min(self.ids.len());
        if to > from {
            to -= 1;
        }
        if to == from {
            return false;
        }
        self.ids.remove(from);
        self.ids.insert(to, id);
        true
    }
}

/// Slot in the current order where a group dropped at `drop_y` lands.
///
/// Walks the laid-out groups top to bottom and returns the index of the first
/// one whose vertical midpoint lies below the drop point.
pub fn insertion_index(order: &GroupOrder, layout: &Layout, drop_y: f32) -> usize {
    for (index, id) in order.ids().iter().enumerate() {
        let Some(placement) = layout.group(*id) else {
            continue;
        };
        if drop_y < placement.midpoint() {
            return index;
        }
    }
    order.ids().len()
}
