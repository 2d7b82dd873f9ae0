//! Routing context handed to the list view by the composition layer.

use crate::error::ListError;
use crate::model::SnapshotKind;
use serde::Serialize;

/// Explicit per-route configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListConfig {
    /// A nested route is active and wants the list hidden; render only the
    /// nested content.
    pub hide_list: bool,
}

/// Where the list view is mounted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteContext {
    /// `None` when the route carried no project segment.
    pub project_id: Option<String>,
    pub kind: SnapshotKind,
    /// Path of the list route, e.g. `/projects/p1/reports`.
    pub path: String,
    pub config: ListConfig,
}

impl RouteContext {
    /// Context for `/projects/{project_id}/{kind}`.
    pub fn for_project(project_id: impl Into<String>, kind: SnapshotKind) -> Self {
        let project_id = project_id.into();
        let path = format!("/projects/{project_id}/{}", kind.as_str());
        Self {
            project_id: Some(project_id),
            kind,
            path,
            config: ListConfig::default(),
        }
    }

    /// The project id, or a fatal precondition error.
    ///
    /// # Errors
    ///
    /// Returns [`ListError::MissingRoutingContext`] when no project id is set
    /// or it is blank.
    pub fn require_project(&self) -> Result<&str, ListError> {
        match self.project_id.as_deref() {
            Some(id) if !id.trim().is_empty() => Ok(id),
            _ => Err(ListError::MissingRoutingContext("projectId")),
        }
    }

    /// Detail route for one snapshot: the list path plus the snapshot id.
    #[must_use]
    pub fn row_target(&self, snapshot_id: &str) -> String {
        format!("{}/{snapshot_id}", self.path.trim_end_matches('/'))
    }

    /// Breadcrumb for this route.
    #[must_use]
    pub fn crumb(&self) -> Crumb {
        crumb_for(&self.path)
    }
}

/// Identifying pair for the download capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadTarget {
    pub project_id: String,
    pub snapshot_id: String,
}

impl DownloadTarget {
    /// API path the download capability serves this snapshot from.
    #[must_use]
    pub fn link(&self) -> String {
        format!(
            "/api/projects/{}/{}/download",
            self.project_id, self.snapshot_id
        )
    }
}

/// Breadcrumb entry: a link target and its text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Crumb {
    pub to: String,
    pub link_text: &'static str,
}

/// Breadcrumb for a list route, named after its last path segment.
#[must_use]
pub fn crumb_for(path: &str) -> Crumb {
    let last = path.trim_end_matches('/').rsplit('/').next().unwrap_or_default();
    Crumb {
        to: path.to_string(),
        link_text: if last == "reports" {
            "Reports"
        } else {
            "Test Suites"
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_route_shape() {
        let ctx = RouteContext::for_project("p1", SnapshotKind::TestSuites);
        assert_eq!(ctx.path, "/projects/p1/test-suites");
        assert_eq!(ctx.require_project(), Ok("p1"));
        assert!(!ctx.config.hide_list);
    }

    #[test]
    fn missing_project_is_fatal() {
        let mut ctx = RouteContext::for_project("p1", SnapshotKind::Reports);
        ctx.project_id = None;
        assert_eq!(
            ctx.require_project(),
            Err(ListError::MissingRoutingContext("projectId"))
        );
        ctx.project_id = Some("  ".into());
        assert!(ctx.require_project().is_err());
    }

    #[test]
    fn row_target_appends_snapshot_id() {
        let mut ctx = RouteContext::for_project("p1", SnapshotKind::Reports);
        assert_eq!(ctx.row_target("s9"), "/projects/p1/reports/s9");
        ctx.path.push('/');
        assert_eq!(ctx.row_target("s9"), "/projects/p1/reports/s9");
    }

    #[test]
    fn download_link() {
        let target = DownloadTarget {
            project_id: "p1".into(),
            snapshot_id: "s1".into(),
        };
        assert_eq!(target.link(), "/api/projects/p1/s1/download");
    }

    #[test]
    fn crumb_text_follows_last_segment() {
        assert_eq!(crumb_for("/projects/p1/reports").link_text, "Reports");
        assert_eq!(crumb_for("/projects/p1/test-suites").link_text, "Test Suites");
        assert_eq!(crumb_for("/projects/p1/reports/").to, "/projects/p1/reports/");
    }
}
