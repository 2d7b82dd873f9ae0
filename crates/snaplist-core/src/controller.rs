//! The snapshot list controller.
//!
//! Owns the loaded collection and the per-view [`FilterState`], and answers
//! every question a renderer asks. It does no I/O of its own: history,
//! submissions, confirmation and preferences arrive as trait objects.

use crate::actions::{
    ActionRequest, Confirm, DELETE_PROMPT, Dispatch, NavigationState, SubmissionChannel,
};
use crate::error::ListError;
use crate::filter;
use crate::model::{Snapshot, SnapshotKind};
use crate::pipeline::{self, FilterState};
use crate::prefs::{PreferenceStore, PrefsError, SHOW_FULL_JSON_METADATA};
use crate::query::{self, History, QueryFilters};
use crate::route::{DownloadTarget, RouteContext};
use crate::slots::{RowAction, RowSlots};
use crate::sort::SortDirection;
use crate::view::{
    self, EmptyState, FilterControls, ListView, NO_MATCHES, RowView, TableView,
};

#[derive(Debug, Clone)]
pub struct SnapshotListController {
    ctx: RouteContext,
    project_id: String,
    snapshots: Vec<Snapshot>,
    all_tags: Vec<String>,
    state: FilterState,
    navigation: NavigationState,
    pending_delete: Option<String>,
}

impl SnapshotListController {
    /// Mount the view over `snapshots`.
    ///
    /// Tags and metadata query are seeded from the current location; sort
    /// starts descending; the collapse flag comes from `prefs`.
    ///
    /// # Errors
    ///
    /// Returns [`ListError::MissingRoutingContext`] if the route has no
    /// project id.
    pub fn mount(
        ctx: RouteContext,
        snapshots: Vec<Snapshot>,
        history: &dyn History,
        prefs: &dyn PreferenceStore,
    ) -> Result<Self, ListError> {
        let project_id = ctx.require_project()?.to_string();
        let seeded = query::read_filters(history.location());
        let state = FilterState {
            selected_tags: seeded.selected_tags,
            metadata_query: seeded.metadata_query,
            sort: SortDirection::Descending,
            metadata_collapsed: prefs.get_bool(SHOW_FULL_JSON_METADATA).unwrap_or(false),
        };
        let all_tags = filter::all_tags(&snapshots);

        tracing::debug!(
            project_id = %project_id,
            kind = %ctx.kind,
            snapshots = snapshots.len(),
            tags = ?state.selected_tags,
            "mounted snapshot list"
        );

        Ok(Self {
            ctx,
            project_id,
            snapshots,
            all_tags,
            state,
            navigation: NavigationState::Idle,
            pending_delete: None,
        })
    }

    /// Start from a different sort direction than the mount default.
    #[must_use]
    pub const fn with_sort(mut self, sort: SortDirection) -> Self {
        self.state.sort = sort;
        self
    }

    #[must_use]
    pub const fn context(&self) -> &RouteContext {
        &self.ctx
    }

    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    #[must_use]
    pub const fn kind(&self) -> SnapshotKind {
        self.ctx.kind
    }

    #[must_use]
    pub const fn state(&self) -> &FilterState {
        &self.state
    }

    #[must_use]
    pub const fn navigation(&self) -> &NavigationState {
        &self.navigation
    }

    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.navigation.is_busy()
    }

    #[must_use]
    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    /// Tag vocabulary of the unfiltered collection.
    #[must_use]
    pub fn all_tags(&self) -> &[String] {
        &self.all_tags
    }

    /// Displayed rows, in display order.
    #[must_use]
    pub fn rows(&self) -> Vec<&Snapshot> {
        pipeline::derive(&self.snapshots, &self.state)
    }

    #[must_use]
    pub fn controls(&self) -> FilterControls {
        FilterControls {
            all_tags: self.all_tags.clone(),
            selected_tags: self.state.selected_tags.clone(),
            metadata_query: self.state.metadata_query.clone(),
            metadata_collapsed: self.state.metadata_collapsed,
            sort: self.state.sort,
            refresh_label: self.ctx.kind.refresh_label(),
            refresh_enabled: !self.is_busy(),
        }
    }

    /// The whole view, ready to render.
    #[must_use]
    pub fn view<'a>(&'a self, slots: &dyn RowSlots) -> ListView<'a> {
        if self.ctx.config.hide_list {
            return ListView::Nested;
        }
        if self.snapshots.is_empty() {
            return ListView::Empty(EmptyState {
                message: self.ctx.kind.empty_message(),
                controls: self.controls(),
            });
        }

        let rows: Vec<RowView<'a>> = self
            .rows()
            .into_iter()
            .map(|snapshot| RowView {
                snapshot,
                timestamp: view::display_timestamp(&snapshot.timestamp),
                metadata: view::metadata_display(&snapshot.metadata, self.state.metadata_collapsed),
                actions: self.row_actions(snapshot, slots),
            })
            .collect();
        let hint = rows.is_empty().then_some(NO_MATCHES);

        ListView::Table(TableView {
            crumb: self.ctx.crumb(),
            id_header: self.ctx.kind.id_header(),
            controls: self.controls(),
            rows,
            hint,
        })
    }

    #[must_use]
    pub fn row_actions(&self, snapshot: &Snapshot, slots: &dyn RowSlots) -> Vec<RowAction> {
        view::row_actions(&self.ctx, &self.project_id, snapshot, slots, self.is_busy())
    }

    #[must_use]
    pub fn row_target(&self, snapshot_id: &str) -> String {
        self.ctx.row_target(snapshot_id)
    }

    #[must_use]
    pub fn download_target(&self, snapshot_id: &str) -> DownloadTarget {
        DownloadTarget {
            project_id: self.project_id.clone(),
            snapshot_id: snapshot_id.to_string(),
        }
    }

    // Filters

    /// Replace the tag selection and sync the location. Returns `true` if
    /// the location changed.
    pub fn set_selected_tags(&mut self, tags: Vec<String>, history: &mut dyn History) -> bool {
        self.state.selected_tags = tags;
        self.sync(history)
    }

    /// Add `tag` to the selection unless it is already there.
    pub fn add_tag(&mut self, tag: &str, history: &mut dyn History) -> bool {
        if self.state.selected_tags.iter().any(|t| t == tag) {
            return false;
        }
        self.state.selected_tags.push(tag.to_string());
        self.sync(history)
    }

    pub fn remove_tag(&mut self, tag: &str, history: &mut dyn History) -> bool {
        let before = self.state.selected_tags.len();
        self.state.selected_tags.retain(|t| t != tag);
        if self.state.selected_tags.len() == before {
            return false;
        }
        self.sync(history)
    }

    pub fn set_metadata_query(&mut self, query: impl Into<String>, history: &mut dyn History) -> bool {
        self.state.metadata_query = query.into();
        self.sync(history)
    }

    fn sync(&self, history: &mut dyn History) -> bool {
        query::sync(
            history,
            &QueryFilters {
                selected_tags: self.state.selected_tags.clone(),
                metadata_query: self.state.metadata_query.clone(),
            },
        )
    }

    /// Advance the sort control one step and return the new direction.
    pub fn cycle_sort(&mut self) -> SortDirection {
        self.state.sort = self.state.sort.next();
        self.state.sort
    }

    /// Flip the collapse flag and persist it.
    ///
    /// # Errors
    ///
    /// Returns the preference store's error; the in-memory flag still flips.
    pub fn toggle_metadata_collapsed(
        &mut self,
        prefs: &mut dyn PreferenceStore,
    ) -> Result<bool, PrefsError> {
        self.state.metadata_collapsed = !self.state.metadata_collapsed;
        prefs.set_bool(SHOW_FULL_JSON_METADATA, self.state.metadata_collapsed)?;
        Ok(self.state.metadata_collapsed)
    }

    // Submissions

    /// Submit a reload of the collection.
    ///
    /// # Errors
    ///
    /// [`ListError::SubmissionInFlight`] while another submission is pending;
    /// [`ListError::SubmissionRejected`] if the channel refuses it.
    pub fn request_refresh(
        &mut self,
        channel: &mut dyn SubmissionChannel,
    ) -> Result<Dispatch, ListError> {
        self.ensure_idle()?;
        self.submit(ActionRequest::ReloadSnapshots, channel)
    }

    /// First half of a two-step delete: remember which row is awaiting
    /// confirmation.
    ///
    /// # Errors
    ///
    /// [`ListError::SubmissionInFlight`] while another submission is pending.
    pub fn begin_delete(&mut self, snapshot_id: &str) -> Result<(), ListError> {
        self.ensure_idle()?;
        self.pending_delete = Some(snapshot_id.to_string());
        Ok(())
    }

    #[must_use]
    pub fn pending_delete(&self) -> Option<&str> {
        self.pending_delete.as_deref()
    }

    /// Second half of a two-step delete. A declined confirmation, or no
    /// pending delete, changes nothing.
    ///
    /// # Errors
    ///
    /// Same as [`Self::request_refresh`].
    pub fn confirm_delete(
        &mut self,
        confirmed: bool,
        channel: &mut dyn SubmissionChannel,
    ) -> Result<Dispatch, ListError> {
        let Some(snapshot_id) = self.pending_delete.take() else {
            return Ok(Dispatch::Cancelled);
        };
        if !confirmed {
            tracing::debug!(snapshot_id = %snapshot_id, "delete cancelled");
            return Ok(Dispatch::Cancelled);
        }
        self.ensure_idle()?;
        self.submit(ActionRequest::DeleteSnapshot { snapshot_id }, channel)
    }

    /// Ask `confirm` and, if accepted, submit the delete.
    ///
    /// # Errors
    ///
    /// Same as [`Self::request_refresh`].
    pub fn request_delete(
        &mut self,
        snapshot_id: &str,
        confirm: &mut dyn Confirm,
        channel: &mut dyn SubmissionChannel,
    ) -> Result<Dispatch, ListError> {
        self.begin_delete(snapshot_id)?;
        let confirmed = confirm.confirm(DELETE_PROMPT);
        self.confirm_delete(confirmed, channel)
    }

    fn ensure_idle(&self) -> Result<(), ListError> {
        if self.is_busy() {
            return Err(ListError::SubmissionInFlight);
        }
        Ok(())
    }

    fn submit(
        &mut self,
        request: ActionRequest,
        channel: &mut dyn SubmissionChannel,
    ) -> Result<Dispatch, ListError> {
        channel
            .submit(request.clone())
            .map_err(ListError::SubmissionRejected)?;
        tracing::info!(action = request.name(), project_id = %self.project_id, "submitted");
        self.navigation = NavigationState::Submitting(request.clone());
        Ok(Dispatch::Submitted(request))
    }

    /// The submission layer finished, successfully or not.
    pub fn complete_submission(&mut self) -> Option<ActionRequest> {
        match std::mem::take(&mut self.navigation) {
            NavigationState::Submitting(request) => Some(request),
            NavigationState::Idle => None,
        }
    }

    /// Swap in a freshly loaded collection. Filter state is kept.
    pub fn replace_snapshots(&mut self, snapshots: Vec<Snapshot>) {
        self.all_tags = filter::all_tags(&snapshots);
        self.snapshots = snapshots;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::SubmissionQueue;
    use crate::prefs::MemoryPreferences;
    use crate::query::{MemoryHistory, location_for};
    use crate::route::ListConfig;
    use crate::slots::DefaultSlots;

    fn collection() -> Vec<Snapshot> {
        vec![
            Snapshot::new("s1", "2024-01-01", &["prod"]),
            Snapshot::new("s2", "2024-02-01", &["dev"]),
        ]
    }

    fn history(query: Option<&str>) -> MemoryHistory {
        MemoryHistory::new(location_for("/projects/p1/reports", query).expect("url"))
    }

    fn mounted(query: Option<&str>) -> (SnapshotListController, MemoryHistory) {
        let history = history(query);
        let ctrl = SnapshotListController::mount(
            RouteContext::for_project("p1", SnapshotKind::Reports),
            collection(),
            &history,
            &MemoryPreferences::default(),
        )
        .expect("mount");
        (ctrl, history)
    }

    fn ids(ctrl: &SnapshotListController) -> Vec<String> {
        ctrl.rows().iter().map(|s| s.id.clone()).collect()
    }

    #[test]
    fn mount_requires_project() {
        let mut ctx = RouteContext::for_project("p1", SnapshotKind::Reports);
        ctx.project_id = None;
        let err = SnapshotListController::mount(
            ctx,
            collection(),
            &history(None),
            &MemoryPreferences::default(),
        )
        .unwrap_err();
        assert_eq!(err, ListError::MissingRoutingContext("projectId"));
    }

    #[test]
    fn mount_seeds_from_query_and_sorts_descending() {
        let (ctrl, _) = mounted(Some("tags=prod&metadata-query=x"));
        assert_eq!(ctrl.state().selected_tags, vec!["prod".to_string()]);
        assert_eq!(ctrl.state().metadata_query, "x");
        assert_eq!(ctrl.state().sort, SortDirection::Descending);
        assert!(!ctrl.state().metadata_collapsed);
    }

    #[test]
    fn mount_reads_collapse_preference() {
        let mut prefs = MemoryPreferences::default();
        prefs.set_bool(SHOW_FULL_JSON_METADATA, true).expect("set");
        let ctrl = SnapshotListController::mount(
            RouteContext::for_project("p1", SnapshotKind::Reports),
            collection(),
            &history(None),
            &prefs,
        )
        .expect("mount");
        assert!(ctrl.state().metadata_collapsed);
    }

    #[test]
    fn default_view_is_newest_first() {
        let (ctrl, _) = mounted(None);
        assert_eq!(ids(&ctrl), vec!["s2", "s1"]);
    }

    #[test]
    fn tag_changes_sync_location() {
        let (mut ctrl, mut history) = mounted(None);
        assert!(ctrl.add_tag("prod", &mut history));
        assert_eq!(ids(&ctrl), vec!["s1"]);
        assert_eq!(history.location().query(), Some("tags=prod"));

        assert!(!ctrl.add_tag("prod", &mut history));
        assert_eq!(history.replacements(), 1);

        assert!(ctrl.remove_tag("prod", &mut history));
        assert_eq!(history.location().query(), None);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn unknown_selected_tag_matches_nothing() {
        let (mut ctrl, mut history) = mounted(None);
        ctrl.set_selected_tags(vec!["nope".into()], &mut history);
        assert!(ids(&ctrl).is_empty());
        let ListView::Table(table) = ctrl.view(&DefaultSlots) else {
            panic!("expected table");
        };
        assert!(table.rows.is_empty());
        assert_eq!(table.hint, Some(NO_MATCHES));
        assert_eq!(table.controls.all_tags, vec!["prod", "dev"]);
    }

    #[test]
    fn metadata_query_syncs_and_clears() {
        let (mut ctrl, mut history) = mounted(None);
        assert!(ctrl.set_metadata_query("foo", &mut history));
        assert_eq!(history.location().query(), Some("metadata-query=foo"));
        assert!(!ctrl.set_metadata_query("foo", &mut history));
        assert!(ctrl.set_metadata_query("", &mut history));
        assert_eq!(history.location().query(), None);
    }

    #[test]
    fn sort_cycles_through_three_states() {
        let (mut ctrl, _) = mounted(None);
        assert_eq!(ctrl.cycle_sort(), SortDirection::Ascending);
        assert_eq!(ids(&ctrl), vec!["s1", "s2"]);
        assert_eq!(ctrl.cycle_sort(), SortDirection::Unset);
        assert_eq!(ids(&ctrl), vec!["s1", "s2"]);
        assert_eq!(ctrl.cycle_sort(), SortDirection::Descending);
    }

    #[test]
    fn collapse_toggle_persists() {
        let (mut ctrl, _) = mounted(None);
        let mut prefs = MemoryPreferences::default();
        assert!(ctrl.toggle_metadata_collapsed(&mut prefs).expect("toggle"));
        assert_eq!(prefs.get_bool(SHOW_FULL_JSON_METADATA), Some(true));
        assert!(!ctrl.toggle_metadata_collapsed(&mut prefs).expect("toggle"));
    }

    #[test]
    fn empty_collection_shows_empty_state() {
        let ctrl = SnapshotListController::mount(
            RouteContext::for_project("p1", SnapshotKind::TestSuites),
            Vec::new(),
            &history(None),
            &MemoryPreferences::default(),
        )
        .expect("mount");
        match ctrl.view(&DefaultSlots) {
            ListView::Empty(empty) => {
                assert_eq!(empty.message, "You don't have any test suites yet.");
                assert!(empty.controls.refresh_enabled);
            }
            other => panic!("expected empty state, got {other:?}"),
        }
    }

    #[test]
    fn hidden_list_renders_nested_only() {
        let mut ctx = RouteContext::for_project("p1", SnapshotKind::Reports);
        ctx.config = ListConfig { hide_list: true };
        let ctrl = SnapshotListController::mount(
            ctx,
            collection(),
            &history(None),
            &MemoryPreferences::default(),
        )
        .expect("mount");
        assert!(matches!(ctrl.view(&DefaultSlots), ListView::Nested));
    }

    #[test]
    fn refresh_marks_busy_until_completion() {
        let (mut ctrl, _) = mounted(None);
        let mut queue = SubmissionQueue::new();
        assert_eq!(
            ctrl.request_refresh(&mut queue),
            Ok(Dispatch::Submitted(ActionRequest::ReloadSnapshots))
        );
        assert!(ctrl.is_busy());
        assert!(!ctrl.controls().refresh_enabled);
        assert_eq!(
            ctrl.request_refresh(&mut queue),
            Err(ListError::SubmissionInFlight)
        );
        assert_eq!(queue.len(), 1);

        let rows_disabled = ctrl
            .row_actions(&ctrl.snapshots()[0], &DefaultSlots)
            .iter()
            .all(RowAction::is_disabled);
        assert!(rows_disabled);

        assert_eq!(
            ctrl.complete_submission(),
            Some(ActionRequest::ReloadSnapshots)
        );
        assert!(!ctrl.is_busy());
        assert_eq!(ctrl.complete_submission(), None);
    }

    #[test]
    fn filters_stay_interactive_while_submitting() {
        let (mut ctrl, mut history) = mounted(None);
        ctrl.request_refresh(&mut SubmissionQueue::new()).expect("refresh");
        ctrl.add_tag("dev", &mut history);
        ctrl.cycle_sort();
        assert_eq!(ids(&ctrl), vec!["s2"]);
    }

    #[test]
    fn cancelled_delete_changes_nothing() {
        let (mut ctrl, _) = mounted(None);
        let before = ctrl.state().clone();
        let mut queue = SubmissionQueue::new();
        let mut deny = |_: &str| false;
        let outcome = ctrl.request_delete("s1", &mut deny, &mut queue);
        assert_eq!(outcome, Ok(Dispatch::Cancelled));
        assert!(queue.is_empty());
        assert!(!ctrl.is_busy());
        assert_eq!(ctrl.state(), &before);
        assert_eq!(ctrl.snapshots().len(), 2);
    }

    #[test]
    fn confirmed_delete_submits_request() {
        let (mut ctrl, _) = mounted(None);
        let mut queue = SubmissionQueue::new();
        let mut prompts = Vec::new();
        let mut accept = |prompt: &str| {
            prompts.push(prompt.to_string());
            true
        };
        let outcome = ctrl.request_delete("s1", &mut accept, &mut queue);
        let expected = ActionRequest::DeleteSnapshot {
            snapshot_id: "s1".into(),
        };
        assert_eq!(outcome, Ok(Dispatch::Submitted(expected.clone())));
        assert_eq!(prompts, vec![DELETE_PROMPT]);
        assert_eq!(queue.next_request(), Some(expected));
        assert!(ctrl.is_busy());
    }

    #[test]
    fn two_step_delete() {
        let (mut ctrl, _) = mounted(None);
        let mut queue = SubmissionQueue::new();
        ctrl.begin_delete("s2").expect("begin");
        assert_eq!(ctrl.pending_delete(), Some("s2"));
        assert!(!ctrl.is_busy());
        ctrl.confirm_delete(true, &mut queue).expect("confirm");
        assert_eq!(ctrl.pending_delete(), None);
        assert!(ctrl.is_busy());
        assert_eq!(ctrl.begin_delete("s1"), Err(ListError::SubmissionInFlight));
    }

    struct Refusing;

    impl SubmissionChannel for Refusing {
        fn submit(&mut self, _request: ActionRequest) -> Result<(), String> {
            Err("worker gone".into())
        }
    }

    #[test]
    fn rejected_submission_stays_idle() {
        let (mut ctrl, _) = mounted(None);
        assert_eq!(
            ctrl.request_refresh(&mut Refusing),
            Err(ListError::SubmissionRejected("worker gone".into()))
        );
        assert!(!ctrl.is_busy());
    }

    #[test]
    fn replace_snapshots_recomputes_vocabulary_and_keeps_filters() {
        let (mut ctrl, mut history) = mounted(None);
        ctrl.add_tag("prod", &mut history);
        ctrl.replace_snapshots(vec![
            Snapshot::new("s3", "2024-03-01", &["prod", "nightly"]),
            Snapshot::new("s4", "2024-04-01", &["nightly"]),
        ]);
        assert_eq!(ctrl.all_tags(), ["prod", "nightly"]);
        assert_eq!(ids(&ctrl), vec!["s3"]);
    }

    #[test]
    fn targets_follow_route() {
        let (ctrl, _) = mounted(None);
        assert_eq!(ctrl.row_target("s1"), "/projects/p1/reports/s1");
        assert_eq!(
            ctrl.download_target("s1").link(),
            "/api/projects/p1/s1/download"
        );
    }
}
