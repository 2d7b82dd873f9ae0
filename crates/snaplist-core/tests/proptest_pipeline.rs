use proptest::prelude::*;
use snaplist_core::controller::SnapshotListController;
use snaplist_core::filter;
use snaplist_core::model::{Snapshot, SnapshotKind};
use snaplist_core::pipeline::{FilterState, derive};
use snaplist_core::prefs::MemoryPreferences;
use snaplist_core::query::{self, History, MemoryHistory, QueryFilters, location_for};
use snaplist_core::route::RouteContext;
use snaplist_core::sort::SortDirection;

use generators::*;

fn arb_direction() -> impl Strategy<Value = SortDirection> {
    prop_oneof![
        Just(SortDirection::Descending),
        Just(SortDirection::Ascending),
        Just(SortDirection::Unset),
    ]
}

fn arb_state() -> impl Strategy<Value = FilterState> {
    (arb_tags(), "[a-z0-9]{0,3}", arb_direction()).prop_map(|(selected_tags, metadata_query, sort)| {
        FilterState {
            selected_tags,
            metadata_query,
            sort,
            metadata_collapsed: false,
        }
    })
}

fn ids(rows: &[&Snapshot]) -> Vec<String> {
    rows.iter().map(|s| s.id.clone()).collect()
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(512))]

    #[test]
    fn derived_rows_are_a_subset(snapshots in arb_collection(), state in arb_state()) {
        let rows = derive(&snapshots, &state);
        prop_assert!(rows.len() <= snapshots.len());
        for row in &rows {
            prop_assert!(snapshots.iter().any(|s| std::ptr::eq(s, *row)));
        }
        let mut seen = ids(&rows);
        seen.sort();
        seen.dedup();
        prop_assert_eq!(seen.len(), rows.len());
    }

    #[test]
    fn every_row_carries_all_selected_tags(snapshots in arb_collection(), state in arb_state()) {
        for row in derive(&snapshots, &state) {
            for tag in &state.selected_tags {
                prop_assert!(row.tags.contains(tag));
            }
        }
    }

    #[test]
    fn every_row_matches_metadata_query(snapshots in arb_collection(), state in arb_state()) {
        for row in derive(&snapshots, &state) {
            prop_assert!(filter::flatten_metadata(&row.metadata).contains(&state.metadata_query));
        }
    }

    #[test]
    fn no_filters_keeps_everything(snapshots in arb_collection(), sort in arb_direction()) {
        let state = FilterState { sort, ..FilterState::default() };
        let rows = derive(&snapshots, &state);
        let mut got = ids(&rows);
        let mut want: Vec<String> = snapshots.iter().map(|s| s.id.clone()).collect();
        if sort == SortDirection::Unset {
            prop_assert_eq!(&got, &want);
        }
        got.sort();
        want.sort();
        prop_assert_eq!(got, want);
    }

    #[test]
    fn descending_reverses_ascending(snapshots in arb_distinct_valid_collection()) {
        let asc = derive(&snapshots, &FilterState { sort: SortDirection::Ascending, ..FilterState::default() });
        let desc = derive(&snapshots, &FilterState { sort: SortDirection::Descending, ..FilterState::default() });
        let mut reversed = ids(&asc);
        reversed.reverse();
        prop_assert_eq!(ids(&desc), reversed);
    }

    #[test]
    fn unparsable_timestamps_sort_last(snapshots in arb_collection(), sort in arb_direction()) {
        prop_assume!(sort != SortDirection::Unset);
        let state = FilterState { sort, ..FilterState::default() };
        let rows = derive(&snapshots, &state);
        let first_invalid = rows
            .iter()
            .position(|s| snaplist_core::sort::parse_timestamp(&s.timestamp).is_none())
            .unwrap_or(rows.len());
        for row in &rows[first_invalid..] {
            prop_assert!(snaplist_core::sort::parse_timestamp(&row.timestamp).is_none());
        }
    }

    #[test]
    fn sort_cycle_has_period_three(start in arb_direction()) {
        prop_assert_eq!(start.next().next().next(), start);
        prop_assert_ne!(start.next(), start);
    }

    #[test]
    fn query_round_trips(
        tags in prop::collection::vec("[a-zA-Z0-9 &=%+?#]{1,8}", 0..4),
        metadata_query in "[a-zA-Z0-9 &=%+?#,]{0,10}",
    ) {
        let filters = QueryFilters { selected_tags: tags, metadata_query };
        let base = location_for("/projects/p1/reports", Some("other=1")).expect("url");
        let written = query::write_filters(&base, &filters).unwrap_or(base);
        prop_assert_eq!(query::read_filters(&written), filters);
        let other = query::param(&written, "other");
        prop_assert_eq!(other.as_deref(), Some("1"));
    }

    #[test]
    fn sync_is_idempotent(tags in arb_tags(), metadata_query in "[a-z]{0,4}") {
        let mut history = MemoryHistory::new(location_for("/projects/p1/reports", None).expect("url"));
        let filters = QueryFilters { selected_tags: tags, metadata_query };
        query::sync(&mut history, &filters);
        let after_first = history.location().clone();
        prop_assert!(!query::sync(&mut history, &filters));
        prop_assert_eq!(history.location(), &after_first);
        prop_assert_eq!(history.len(), 1);
    }

    #[test]
    fn tag_vocabulary_ignores_filters(snapshots in arb_collection(), tags in arb_tags(), q in "[a-z]{0,3}") {
        let mut history = MemoryHistory::new(location_for("/projects/p1/reports", None).expect("url"));
        let mut ctrl = SnapshotListController::mount(
            RouteContext::for_project("p1", SnapshotKind::Reports),
            snapshots.clone(),
            &history,
            &MemoryPreferences::default(),
        )
        .expect("mount");
        let before = ctrl.all_tags().to_vec();
        ctrl.set_selected_tags(tags, &mut history);
        ctrl.set_metadata_query(q, &mut history);
        ctrl.cycle_sort();
        prop_assert_eq!(ctrl.all_tags(), before.as_slice());
        prop_assert_eq!(before, filter::all_tags(&snapshots));
    }
}
