pub mod completions;
pub mod delete;
pub mod list;
pub mod prefs;
pub mod reload;
pub mod tags;

use crate::output::OutputMode;
use anyhow::{Context, Result};
use clap::Args;
use snaplist_core::actions::SubmissionQueue;
use snaplist_core::controller::SnapshotListController;
use snaplist_core::model::SnapshotKind;
use snaplist_core::prefs::{FilePreferences, MemoryPreferences, PreferenceStore};
use snaplist_core::query::{MemoryHistory, location_for};
use snaplist_core::route::RouteContext;
use snaplist_core::sort::SortDirection;
use snaplist_core::store::SnapshotStore;
use std::path::PathBuf;
use url::Url;

/// Env var overriding where display preferences are stored.
pub const PREFS_FILE_ENV: &str = "SNAPLIST_PREFS_FILE";

/// Resolved settings every command runs with.
#[derive(Debug, Clone)]
pub struct CmdContext {
    pub data_dir: PathBuf,
    pub output: OutputMode,
    pub default_sort: SortDirection,
}

impl CmdContext {
    pub fn store(&self) -> SnapshotStore {
        SnapshotStore::new(&self.data_dir)
    }

    /// File-backed preferences, or in-memory ones when there is nowhere to
    /// put the file.
    pub fn preferences(&self) -> Box<dyn PreferenceStore> {
        let path = std::env::var_os(PREFS_FILE_ENV)
            .map(PathBuf::from)
            .or_else(FilePreferences::default_path);
        match path {
            Some(path) => Box::new(FilePreferences::open(&path)),
            None => Box::new(MemoryPreferences::default()),
        }
    }
}

/// Which collection a command works on.
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Project that owns the snapshots.
    pub project: String,

    /// Collection kind: reports or test-suites.
    #[arg(short, long, default_value = "reports")]
    pub kind: SnapshotKind,
}

impl TargetArgs {
    pub fn route(&self) -> RouteContext {
        RouteContext::for_project(&self.project, self.kind)
    }
}

/// Filters shared by `list` and `tui`.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Query string to seed filters from, e.g. `tags=prod,gpu&metadata-query=nightly`.
    #[arg(long)]
    pub query: Option<String>,

    /// Require this tag (repeatable). Replaces tags from --query.
    #[arg(short, long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// Case-sensitive substring to find in flattened metadata.
    #[arg(short, long, value_name = "TEXT")]
    pub search: Option<String>,

    /// Timestamp order: desc, asc or none.
    #[arg(long)]
    pub sort: Option<SortDirection>,
}

/// A mounted controller plus the pieces it was mounted with.
pub struct Session {
    pub store: SnapshotStore,
    pub controller: SnapshotListController,
    pub history: MemoryHistory,
}

/// Load the collection and mount a controller over it, applying `filters`
/// the same way interactive edits would.
pub fn open_session(
    ctx: &CmdContext,
    target: &TargetArgs,
    filters: &FilterArgs,
) -> Result<Session> {
    let store = ctx.store();
    let route = target.route();
    let location = location_for(&route.path, filters.query.as_deref())
        .with_context(|| format!("invalid --query for {}", route.path))?;
    let mut history = MemoryHistory::new(location);

    let snapshots = store
        .load(&target.project, target.kind)
        .with_context(|| format!("failed to load {} for {}", target.kind, target.project))?;
    let prefs = ctx.preferences();
    let mut controller = SnapshotListController::mount(route, snapshots, &history, prefs.as_ref())?
        .with_sort(filters.sort.unwrap_or(ctx.default_sort));

    if !filters.tags.is_empty() {
        controller.set_selected_tags(filters.tags.clone(), &mut history);
    }
    if let Some(search) = &filters.search {
        controller.set_metadata_query(search.clone(), &mut history);
    }

    Ok(Session {
        store,
        controller,
        history,
    })
}

/// Run every queued submission against the store, then report completion
/// to the controller. The controller is idle again even when a submission
/// fails.
pub fn drain_submissions(session: &mut Session, queue: &mut SubmissionQueue) -> Result<()> {
    while let Some(request) = queue.next_request() {
        let project = session.controller.project_id().to_string();
        let kind = session.controller.kind();
        let result = session.store.execute(&project, kind, &request);
        session.controller.complete_submission();
        let snapshots =
            result.with_context(|| format!("{} failed for {project}", request.name()))?;
        session.controller.replace_snapshots(snapshots);
    }
    Ok(())
}

/// `path?query` of a location, the part a user would share.
pub fn display_location(location: &Url) -> String {
    match location.query() {
        Some(query) => format!("{}?{query}", location.path()),
        None => location.path().to_string(),
    }
}
