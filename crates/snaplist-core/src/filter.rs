//! Tag and metadata filters.
//!
//! Both filters are pure and order preserving: they only ever drop entries
//! from the slice they are handed.
//!
//! The metadata filter is a linear scan: every snapshot's metadata is
//! flattened and searched on each run, O(n·m) for n snapshots of average
//! metadata size m. There is no index.

use crate::model::{Metadata, Snapshot};
use serde_json::Value;
use std::collections::HashSet;

/// The tag vocabulary offered for filtering.
///
/// Always computed over the *unfiltered* collection so the options don't
/// shrink as filters are applied. Deduplicated, in first-seen order.
#[must_use]
pub fn all_tags(snapshots: &[Snapshot]) -> Vec<String> {
    let mut seen = HashSet::new();
    snapshots
        .iter()
        .flat_map(|snapshot| snapshot.tags.iter())
        .filter(|tag| seen.insert(tag.as_str()))
        .cloned()
        .collect()
}

/// Keep snapshots whose tags are a superset of `selected`.
///
/// An empty selection keeps everything. Selected tags that no snapshot
/// carries simply match nothing.
#[must_use]
pub fn by_tags<'a>(snapshots: &[&'a Snapshot], selected: &[String]) -> Vec<&'a Snapshot> {
    if selected.is_empty() {
        return snapshots.to_vec();
    }
    snapshots
        .iter()
        .copied()
        .filter(|snapshot| snapshot.has_all_tags(selected))
        .collect()
}

/// Keep snapshots whose flattened metadata contains `query` (case-sensitive).
///
/// An empty query keeps everything.
#[must_use]
pub fn by_metadata<'a>(snapshots: &[&'a Snapshot], query: &str) -> Vec<&'a Snapshot> {
    if query.is_empty() {
        return snapshots.to_vec();
    }
    snapshots
        .iter()
        .copied()
        .filter(|snapshot| flatten_metadata(&snapshot.metadata).contains(query))
        .collect()
}

/// Project a metadata tree into one space-joined search string.
///
/// Sequences join their elements with a single space, nested trees are
/// flattened recursively, everything else uses its textual form. Top-level
/// values are then joined with a single space.
#[must_use]
pub fn flatten_metadata(metadata: &Metadata) -> String {
    metadata
        .values()
        .map(flatten_value)
        .collect::<Vec<_>>()
        .join(" ")
}

fn flatten_value(value: &Value) -> String {
    match value {
        Value::Array(items) => items
            .iter()
            .map(flatten_value)
            .collect::<Vec<_>>()
            .join(" "),
        Value::Object(tree) => flatten_metadata(tree),
        Value::String(s) => s.clone(),
        Value::Number(n) => number_text(n),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
    }
}

/// Largest integer an `f64` holds exactly (2^53 - 1).
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Numbers read the way a browser prints them: whole floats drop the `.0`.
fn number_text(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() <= MAX_EXACT_INTEGER => {
            if f == 0.0 {
                "0".to_string()
            } else {
                format!("{f:.0}")
            }
        }
        _ => n.to_string(),
    }
}
