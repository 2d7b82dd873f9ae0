//! Refresh/delete submissions and the list view's in-flight state.
//!
//! The controller never performs a submission itself. It hands an
//! [`ActionRequest`] to a [`SubmissionChannel`] and stays in
//! [`NavigationState::Submitting`] until the surrounding layer reports
//! completion. Success or failure handling belongs to that layer.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Request shapes accepted by the submission channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum ActionRequest {
    /// Invalidate and refetch the collection.
    ReloadSnapshots,
    /// Remove one snapshot.
    DeleteSnapshot {
        #[serde(rename = "snapshotId")]
        snapshot_id: String,
    },
}

impl ActionRequest {
    /// The `action` discriminator as it appears on the wire.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ReloadSnapshots => "reload-snapshots",
            Self::DeleteSnapshot { .. } => "delete-snapshot",
        }
    }
}

/// Transport for action requests. Fire-and-forget from the list's side.
pub trait SubmissionChannel {
    /// Hand the request off.
    ///
    /// # Errors
    ///
    /// Returns a description when the request could not be enqueued at all.
    fn submit(&mut self, request: ActionRequest) -> Result<(), String>;
}

/// Blocking yes/no confirmation.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Prompt shown before a delete is submitted.
pub const DELETE_PROMPT: &str = "Are you sure?";

/// Whether a submission is in flight.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NavigationState {
    #[default]
    Idle,
    Submitting(ActionRequest),
}

impl NavigationState {
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        matches!(self, Self::Submitting(_))
    }
}

/// Result of asking the controller to dispatch an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Handed to the channel; the view is now submitting.
    Submitted(ActionRequest),
    /// The user declined the confirmation. Nothing changed.
    Cancelled,
}

/// A channel that just queues requests for a caller to drain.
///
/// Useful when the caller runs submissions synchronously after the event
/// that produced them.
#[derive(Debug, Default)]
pub struct SubmissionQueue {
    pending: VecDeque<ActionRequest>,
}

impl SubmissionQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the oldest queued request.
    pub fn next_request(&mut self) -> Option<ActionRequest> {
        self.pending.pop_front()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl SubmissionChannel for SubmissionQueue {
    fn submit(&mut self, request: ActionRequest) -> Result<(), String> {
        self.pending.push_back(request);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reload_request_wire_shape() {
        let value = serde_json::to_value(ActionRequest::ReloadSnapshots).unwrap();
        assert_eq!(value, json!({"action": "reload-snapshots"}));
    }

    #[test]
    fn delete_request_wire_shape() {
        let request = ActionRequest::DeleteSnapshot {
            snapshot_id: "s1".into(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value, json!({"action": "delete-snapshot", "snapshotId": "s1"}));
        assert_eq!(request.name(), "delete-snapshot");
    }

    #[test]
    fn delete_request_parses_from_wire() {
        let request: ActionRequest =
            serde_json::from_value(json!({"action": "delete-snapshot", "snapshotId": "abc"}))
                .unwrap();
        assert_eq!(
            request,
            ActionRequest::DeleteSnapshot {
                snapshot_id: "abc".into()
            }
        );
    }

    #[test]
    fn closures_confirm() {
        let mut asked = Vec::new();
        let mut confirm = |prompt: &str| {
            asked.push(prompt.to_string());
            false
        };
        assert!(!confirm.confirm(DELETE_PROMPT));
        assert_eq!(asked, vec!["Are you sure?"]);
    }

    #[test]
    fn queue_is_fifo() {
        let mut queue = SubmissionQueue::new();
        queue.submit(ActionRequest::ReloadSnapshots).unwrap();
        queue
            .submit(ActionRequest::DeleteSnapshot {
                snapshot_id: "s1".into(),
            })
            .unwrap();
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.next_request(), Some(ActionRequest::ReloadSnapshots));
        assert!(matches!(
            queue.next_request(),
            Some(ActionRequest::DeleteSnapshot { .. })
        ));
        assert!(queue.is_empty());
    }

    #[test]
    fn navigation_state_defaults_to_idle() {
        assert!(!NavigationState::default().is_busy());
        assert!(NavigationState::Submitting(ActionRequest::ReloadSnapshots).is_busy());
    }
}
