//! Property tests for the slot geometry and collapse composition.

use std::collections::BTreeMap;

use egui::Color32;
use proptest::prelude::*;
use team_timeline::model::{CollapseState, ColumnWidths, DayIndex, GroupId, Hierarchy, LeafId, SlotGeometry, UnitId};

fn day_maps() -> impl Strategy<Value = (DayIndex, BTreeMap<DayIndex, bool>)> {
    (1u32..40)
        .prop_flat_map(|n| (Just(n), proptest::collection::vec(any::<bool>(), n as usize)))
        .prop_map(|(n, flags)| {
            let map = flags
                .into_iter()
                .enumerate()
                .map(|(i, collapsed)| (i as DayIndex + 1, collapsed))
                .collect();
            (n, map)
        })
}

proptest! {
    #[test]
    fn midpoint_maps_back_to_its_slot((n, map) in day_maps()) {
        let geometry = SlotGeometry::new(ColumnWidths::default(), &map, n);
        for slot in 1..=n {
            let mid = geometry.pixel_range(slot).midpoint();
            prop_assert_eq!(geometry.slot_from_pixel(mid), slot);
        }
    }

    #[test]
    fn containing_slot_covers_the_pixel((n, map) in day_maps(), fraction in 0.0f32..1.0) {
        let geometry = SlotGeometry::new(ColumnWidths::default(), &map, n);
        let x = fraction * geometry.total_width();
        let slot = geometry.slot_containing(x);
        prop_assert!(geometry.pixel_range(slot).contains(x), "x={} slot={}", x, slot);
    }

    #[test]
    fn lookups_stay_in_range((n, map) in day_maps(), x in -500.0f32..5000.0) {
        let geometry = SlotGeometry::new(ColumnWidths::default(), &map, n);
        prop_assert!((1..=n).contains(&geometry.slot_from_pixel(x)));
        prop_assert!((1..=n).contains(&geometry.slot_containing(x)));
    }

    #[test]
    fn ranges_tile_the_grid((n, map) in day_maps()) {
        let geometry = SlotGeometry::new(ColumnWidths::default(), &map, n);
        let mut expected_start = 0.0;
        for (day, range) in geometry.columns() {
            prop_assert_eq!(range, geometry.pixel_range(day));
            prop_assert_eq!(range.start, expected_start);
            expected_start = range.end;
        }
        prop_assert_eq!(expected_start, geometry.total_width());
    }
}

/// 2 groups x 2 units x 3 leaves, leaf slots 1..=6.
fn hierarchy() -> Hierarchy {
    let mut h = Hierarchy::new();
    for g in 1..=2u64 {
        h.insert_group(GroupId(g), format!("team {g}"), Color32::GRAY);
        for u in 1..=2u64 {
            let unit = UnitId(g * 10 + u);
            h.insert_unit(GroupId(g), unit, format!("task {}", unit.0));
            for l in 1..=3u64 {
                let leaf = unit.0 * 10 + l;
                h.insert_leaf(unit, LeafId(leaf), format!("attempt {leaf}"), l as u32, ((leaf % 6) + 1) as DayIndex);
            }
        }
    }
    h
}

#[derive(Debug, Clone)]
enum Toggle {
    Group(u64),
    Unit(u64),
    Day(DayIndex),
}

fn toggles() -> impl Strategy<Value = Vec<Toggle>> {
    let one = prop_oneof![
        (1u64..=2).prop_map(Toggle::Group),
        (1u64..=2, 1u64..=2).prop_map(|(g, u)| Toggle::Unit(g * 10 + u)),
        (1u32..=6).prop_map(Toggle::Day),
    ];
    proptest::collection::vec(one, 0..30)
}

proptest! {
    #[test]
    fn leaf_hidden_is_the_or_of_its_three_sources(ops in toggles()) {
        let h = hierarchy();
        let mut collapse = CollapseState::new();
        for op in &ops {
            match *op {
                Toggle::Group(g) => collapse.toggle_group(&h, GroupId(g)),
                Toggle::Unit(u) => collapse.toggle_unit(&h, UnitId(u)),
                Toggle::Day(d) => collapse.toggle_day(d, 6),
            };
        }

        for leaf in h.leaves() {
            let unit = h.unit(leaf.unit).unwrap();
            let expected = collapse.is_group_collapsed(unit.group)
                || collapse.is_unit_collapsed(unit.id)
                || collapse.is_day_collapsed(leaf.slot);
            prop_assert_eq!(collapse.is_leaf_hidden(&h, leaf.id), expected);
        }
    }

    #[test]
    fn expanding_a_group_expands_its_units(ops in toggles()) {
        let h = hierarchy();
        let mut collapse = CollapseState::new();
        for op in &ops {
            match *op {
                Toggle::Group(g) => collapse.toggle_group(&h, GroupId(g)),
                Toggle::Unit(u) => collapse.toggle_unit(&h, UnitId(u)),
                Toggle::Day(d) => collapse.toggle_day(d, 6),
            };
        }
        for g in 1..=2u64 {
            let group = GroupId(g);
            if collapse.is_group_collapsed(group) {
                collapse.toggle_group(&h, group);
            } else {
                collapse.toggle_group(&h, group);
                collapse.toggle_group(&h, group);
            }
            prop_assert!(!collapse.is_group_collapsed(group));
            for unit in h.units_of(group) {
                prop_assert!(!collapse.is_unit_collapsed(*unit));
            }
        }
    }
}
