//! The fixed derivation pipeline: tags → metadata → timestamp.

use crate::filter;
use crate::model::Snapshot;
use crate::sort::{self, SortDirection};
use serde::{Deserialize, Serialize};

/// Session-local filter state for one list view.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterState {
    /// Semantically a set; order only reflects how the tags were picked.
    pub selected_tags: Vec<String>,
    /// Empty means "no metadata filter".
    pub metadata_query: String,
    pub sort: SortDirection,
    /// Display preference, persisted outside the URL.
    pub metadata_collapsed: bool,
}

impl FilterState {
    /// Returns true if neither tags nor a metadata query narrow the list.
    #[must_use]
    pub fn is_unfiltered(&self) -> bool {
        self.selected_tags.is_empty() && self.metadata_query.is_empty()
    }
}

/// Run the full pipeline over `snapshots`.
///
/// The result borrows from the input and is always a subset of it.
#[must_use]
pub fn derive<'a>(snapshots: &'a [Snapshot], state: &FilterState) -> Vec<&'a Snapshot> {
    let all: Vec<&Snapshot> = snapshots.iter().collect();
    let by_tags = filter::by_tags(&all, &state.selected_tags);
    let by_metadata = filter::by_metadata(&by_tags, &state.metadata_query);
    let tagged = by_tags.len();
    let matched = by_metadata.len();
    let rows = sort::by_timestamp(by_metadata, state.sort);

    tracing::debug!(
        total = snapshots.len(),
        tagged,
        matched,
        sort = %state.sort,
        "derived snapshot rows"
    );
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scenario() -> Vec<Snapshot> {
        vec![
            Snapshot::new("s1", "2024-01-01", &["prod"]),
            Snapshot::new("s2", "2024-02-01", &["dev"]),
        ]
    }

    fn ids<'a>(rows: &[&'a Snapshot]) -> Vec<&'a str> {
        rows.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn tag_selection_narrows_to_matching_snapshot() {
        let snapshots = scenario();
        let state = FilterState {
            selected_tags: vec!["prod".into()],
            ..FilterState::default()
        };
        assert_eq!(ids(&derive(&snapshots, &state)), vec!["s1"]);
    }

    #[test]
    fn default_state_sorts_newest_first() {
        let snapshots = scenario();
        assert_eq!(
            ids(&derive(&snapshots, &FilterState::default())),
            vec!["s2", "s1"]
        );
    }

    #[test]
    fn stages_compose() {
        let mut snapshots = scenario();
        snapshots.push(
            Snapshot::new("s3", "2024-03-01", &["prod"]).with_metadata(
                json!({"model": "lgbm"}).as_object().cloned().unwrap_or_default(),
            ),
        );
        let state = FilterState {
            selected_tags: vec!["prod".into()],
            metadata_query: "lgbm".into(),
            sort: SortDirection::Ascending,
            metadata_collapsed: false,
        };
        assert_eq!(ids(&derive(&snapshots, &state)), vec!["s3"]);
    }

    #[test]
    fn empty_collection_derives_nothing() {
        assert!(derive(&[], &FilterState::default()).is_empty());
    }

    #[test]
    fn unfiltered_flag() {
        let mut state = FilterState::default();
        assert!(state.is_unfiltered());
        state.metadata_query = "x".into();
        assert!(!state.is_unfiltered());
    }
}
