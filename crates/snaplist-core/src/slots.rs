//! Per-row customization points.
//!
//! A host can replace the view control, add extra actions, pick the
//! download button style, or post-process the whole action list. Every slot
//! has a default, so [`DefaultSlots`] renders the stock row.

use crate::model::Snapshot;
use serde::Serialize;

/// Visual weight of a button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonVariant {
    Text,
    #[default]
    Outlined,
    Contained,
}

/// One control in a row's action cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RowAction {
    /// Navigate to the snapshot's detail route.
    View { target: String, disabled: bool },
    /// Fetch the snapshot through the download capability.
    Download {
        link: String,
        variant: ButtonVariant,
        disabled: bool,
    },
    /// Host-supplied action.
    Custom {
        label: String,
        command: String,
        disabled: bool,
    },
    /// Delete after confirmation.
    Delete { snapshot_id: String, disabled: bool },
}

impl RowAction {
    #[must_use]
    pub const fn is_disabled(&self) -> bool {
        match self {
            Self::View { disabled, .. }
            | Self::Download { disabled, .. }
            | Self::Custom { disabled, .. }
            | Self::Delete { disabled, .. } => *disabled,
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::View { .. } => "View",
            Self::Download { .. } => "Download",
            Self::Custom { label, .. } => label,
            Self::Delete { .. } => "Delete",
        }
    }
}

/// What a slot gets to know about the row it renders into.
#[derive(Debug, Clone, Copy)]
pub struct SlotArgs<'a> {
    pub snapshot_id: &'a str,
    pub project_id: &'a str,
    /// A submission is in flight.
    pub busy: bool,
}

/// Named capability slots for the row action cell.
pub trait RowSlots {
    /// Replacement for the stock View link. Default: `None`, keep the link.
    fn view_action(&self, _args: &SlotArgs<'_>) -> Option<RowAction> {
        None
    }

    /// Actions inserted after Download. Default: none.
    fn additional_actions(&self, _args: &SlotArgs<'_>) -> Vec<RowAction> {
        Vec::new()
    }

    /// Download button style. Default: outlined.
    fn download_variant(&self) -> ButtonVariant {
        ButtonVariant::Outlined
    }

    /// Wraps the finished action list. Default: unchanged.
    fn wrap_actions(&self, _snapshot: &Snapshot, actions: Vec<RowAction>) -> Vec<RowAction> {
        actions
    }
}

/// Stock slots.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSlots;

impl RowSlots for DefaultSlots {}
