//! Slot geometry: maps 1-based day columns to pixel intervals and back.
//!
//! Offsets are relative to the start of the day grid (the renderer adds the
//! sidebar widths). Nothing here is cached: a [`SlotGeometry`] borrows the
//! day-collapse map, so it has to be rebuilt whenever that map or the entry
//! count changes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::hierarchy::DayIndex;

/// Column widths for expanded and collapsed days.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnWidths {
    pub day: f32,
    pub collapsed: f32,
}

impl Default for ColumnWidths {
    fn default() -> Self {
        Self {
            day: 60.0,
            collapsed: 14.0,
        }
    }
}

/// Half-open pixel interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRange {
    pub start: f32,
    pub end: f32,
}

impl PixelRange {
    pub fn width(&self) -> f32 {
        self.end - self.start
    }

    pub fn midpoint(&self) -> f32 {
        self.start + self.width() / 2.0
    }

    pub fn contains(&self, x: f32) -> bool {
        self.start <= x && x < self.end
    }
}

/// Pixel <-> slot mapping for one collapse map and entry count.
#[derive(Debug, Clone, Copy)]
pub struct SlotGeometry<'a> {
    widths: ColumnWidths,
    collapsed: &'a BTreeMap<DayIndex, bool>,
    entry_count: DayIndex,
}

impl<'a> SlotGeometry<'a> {
    /// `entry_count` is clamped to at least one column.
    pub fn new(
        widths: ColumnWidths,
        collapsed: &'a BTreeMap<DayIndex, bool>,
        entry_count: DayIndex,
    ) -> Self {
        Self {
            widths,
            collapsed,
            entry_count: entry_count.max(1),
        }
    }

    pub fn entry_count(&self) -> DayIndex {
        self.entry_count
    }

    pub fn is_collapsed(&self, day: DayIndex) -> bool {
        self.collapsed.get(&day).copied().unwrap_or(false)
    }

    pub fn day_width(&self, day: DayIndex) -> f32 {
        if self.is_collapsed(day) {
            self.widths.collapsed
        } else {
            self.widths.day
        }
    }

    /// Pixel interval of `day`: the widths of days `1..day` summed, then this day's own width.
    pub fn pixel_range(&self, day: DayIndex) -> PixelRange {
        let day = day.max(1);
        let start: f32 = (1..day).map(|d| self.day_width(d)).sum();
        PixelRange {
            start,
            end: start + self.day_width(day),
        }
    }

    /// First day whose midpoint is at or right of `x`.
    ///
    /// Applied to a dropped leaf's left edge this snaps to the nearest slot
    /// start. Positions past the last midpoint clamp to `entry_count`.
    pub fn slot_from_pixel(&self, x: f32) -> DayIndex {
        let mut start = 0.0;
        for day in 1..=self.entry_count {
            let width = self.day_width(day);
            if start + width / 2.0 >= x {
                return day;
            }
            start += width;
        }
        self.entry_count
    }

    /// Day whose interval contains `x`, clamped into `1..=entry_count`.
    pub fn slot_containing(&self, x: f32) -> DayIndex {
        if x < 0.0 {
            return 1;
        }
        let mut end = 0.0;
        for day in 1..=self.entry_count {
            end += self.day_width(day);
            if x < end {
                return day;
            }
        }
        self.entry_count
    }

    pub fn total_width(&self) -> f32 {
        (1..=self.entry_count).map(|d| self.day_width(d)).sum()
    }

    /// Pixel intervals of every day, left to right.
    pub fn columns(&self) -> Vec<(DayIndex, PixelRange)> {
        let mut start = 0.0;
        (1..=self.entry_count)
            .map(|day| {
                let width = self.day_width(day);
                let range = PixelRange {
                    start,
                    end: start + width,
                };
                start += width;
                (day, range)
            })
            .collect()
    }
}
