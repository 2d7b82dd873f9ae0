//! Render-ready description of the list view.
//!
//! Nothing here draws anything. The CLI and TUI turn a [`ListView`] into
//! text, JSON or a ratatui table.

use crate::model::{Metadata, Snapshot};
use crate::route::{Crumb, DownloadTarget, RouteContext};
use crate::slots::{RowAction, RowSlots, SlotArgs};
use crate::sort::{self, SortDirection};
use serde::Serialize;

/// Shown in place of an unparsable timestamp.
pub const INVALID_DATE: &str = "Invalid Date";

/// Hint shown when filters exclude every snapshot.
pub const NO_MATCHES: &str = "No snapshots match the current filters.";

/// Top-level shape of the view.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "view", rename_all = "kebab-case")]
pub enum ListView<'a> {
    /// A nested route asked for the list to be hidden.
    Nested,
    /// The unfiltered collection is empty.
    Empty(EmptyState),
    Table(TableView<'a>),
}

#[derive(Debug, Clone, Serialize)]
pub struct EmptyState {
    pub message: String,
    pub controls: FilterControls,
}

/// Everything the filter bar needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterControls {
    pub all_tags: Vec<String>,
    pub selected_tags: Vec<String>,
    pub metadata_query: String,
    pub metadata_collapsed: bool,
    pub sort: SortDirection,
    pub refresh_label: String,
    pub refresh_enabled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableView<'a> {
    pub crumb: Crumb,
    pub id_header: &'static str,
    pub controls: FilterControls,
    pub rows: Vec<RowView<'a>>,
    /// Set when rows is empty only because of the filters.
    pub hint: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RowView<'a> {
    pub snapshot: &'a Snapshot,
    pub timestamp: String,
    pub metadata: MetadataDisplay,
    pub actions: Vec<RowAction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataDisplay {
    pub collapsed: bool,
    pub text: String,
}

/// Format a timestamp as `ddd, D MMM YYYY HH:mm` (UTC).
#[must_use]
pub fn display_timestamp(raw: &str) -> String {
    sort::parse_timestamp(raw).map_or_else(
        || INVALID_DATE.to_string(),
        |ts| ts.format("%a, %-d %b %Y %H:%M").to_string(),
    )
}

/// Metadata as shown in a row: a one-line summary when collapsed, otherwise
/// pretty JSON.
#[must_use]
pub fn metadata_display(metadata: &Metadata, collapsed: bool) -> MetadataDisplay {
    let text = if collapsed {
        match metadata.len() {
            0 => "{}".to_string(),
            1 => "{…} 1 key".to_string(),
            n => format!("{{…}} {n} keys"),
        }
    } else {
        serde_json::to_string_pretty(metadata).unwrap_or_default()
    };
    MetadataDisplay { collapsed, text }
}

/// Build the action cell for one row.
///
/// Stock order is View, Download, any slot additions, Delete; the slot
/// wrapper sees the finished list last.
#[must_use]
pub fn row_actions(
    ctx: &RouteContext,
    project_id: &str,
    snapshot: &Snapshot,
    slots: &dyn RowSlots,
    busy: bool,
) -> Vec<RowAction> {
    let args = SlotArgs {
        snapshot_id: &snapshot.id,
        project_id,
        busy,
    };

    let view = slots.view_action(&args).unwrap_or_else(|| RowAction::View {
        target: ctx.row_target(&snapshot.id),
        disabled: busy,
    });
    let download = RowAction::Download {
        link: DownloadTarget {
            project_id: project_id.to_string(),
            snapshot_id: snapshot.id.clone(),
        }
        .link(),
        variant: slots.download_variant(),
        disabled: busy,
    };

    let mut actions = vec![view, download];
    actions.extend(slots.additional_actions(&args));
    actions.push(RowAction::Delete {
        snapshot_id: snapshot.id.clone(),
        disabled: busy,
    });
    slots.wrap_actions(snapshot, actions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SnapshotKind;
    use crate::slots::{ButtonVariant, DefaultSlots};
    use serde_json::json;

    #[test]
    fn formats_timestamps_in_short_long_date() {
        assert_eq!(
            display_timestamp("2024-02-01T09:05:00Z"),
            "Thu, 1 Feb 2024 09:05"
        );
        assert_eq!(display_timestamp("2024-01-01"), "Mon, 1 Jan 2024 00:00");
    }

    #[test]
    fn unparsable_timestamp_is_invalid_date() {
        assert_eq!(display_timestamp("yesterday"), INVALID_DATE);
        assert_eq!(display_timestamp(""), INVALID_DATE);
    }

    #[test]
    fn metadata_display_modes() {
        let serde_json::Value::Object(meta) = json!({ "env": "prod", "runs": 3 }) else {
            unreachable!("object literal")
        };
        assert_eq!(metadata_display(&meta, true).text, "{…} 2 keys");
        let full = metadata_display(&meta, false);
        assert!(!full.collapsed);
        assert!(full.text.contains("\"env\": \"prod\""));
        assert_eq!(metadata_display(&Metadata::new(), true).text, "{}");
    }

    #[test]
    fn stock_row_actions() {
        let ctx = RouteContext::for_project("p1", SnapshotKind::Reports);
        let snap = Snapshot::new("s1", "2024-01-01", &[]);
        let actions = row_actions(&ctx, "p1", &snap, &DefaultSlots, false);
        let labels: Vec<&str> = actions.iter().map(RowAction::label).collect();
        assert_eq!(labels, vec!["View", "Download", "Delete"]);
        assert_eq!(
            actions[0],
            RowAction::View {
                target: "/projects/p1/reports/s1".into(),
                disabled: false
            }
        );
        assert_eq!(
            actions[1],
            RowAction::Download {
                link: "/api/projects/p1/s1/download".into(),
                variant: ButtonVariant::Outlined,
                disabled: false
            }
        );
    }

    #[test]
    fn busy_disables_stock_actions() {
        let ctx = RouteContext::for_project("p1", SnapshotKind::TestSuites);
        let snap = Snapshot::new("s1", "2024-01-01", &[]);
        let actions = row_actions(&ctx, "p1", &snap, &DefaultSlots, true);
        assert!(actions.iter().all(RowAction::is_disabled));
    }

    struct CompareSlots;

    impl RowSlots for CompareSlots {
        fn additional_actions(&self, args: &SlotArgs<'_>) -> Vec<RowAction> {
            vec![RowAction::Custom {
                label: "Compare".into(),
                command: format!("compare {}", args.snapshot_id),
                disabled: args.busy,
            }]
        }

        fn download_variant(&self) -> ButtonVariant {
            ButtonVariant::Text
        }

        fn wrap_actions(&self, _snapshot: &Snapshot, mut actions: Vec<RowAction>) -> Vec<RowAction> {
            actions.reverse();
            actions
        }
    }

    #[test]
    fn slots_customize_row_actions() {
        let ctx = RouteContext::for_project("p1", SnapshotKind::Reports);
        let snap = Snapshot::new("s9", "2024-01-01", &[]);
        let actions = row_actions(&ctx, "p1", &snap, &CompareSlots, false);
        let labels: Vec<&str> = actions.iter().map(RowAction::label).collect();
        assert_eq!(labels, vec!["Delete", "Compare", "Download", "View"]);
        assert!(matches!(
            actions[2],
            RowAction::Download {
                variant: ButtonVariant::Text,
                ..
            }
        ));
    }
}
