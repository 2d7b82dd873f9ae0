use std::fmt;

/// Machine-readable error codes for scripts and agents driving the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    MissingRoutingContext,
    ConfigParseError,
    InvalidProjectId,
    SnapshotNotFound,
    InvalidEnumValue,
    SubmissionInFlight,
    SubmissionRejected,
    CollectionReadFailed,
    CollectionCorrupt,
    CollectionWriteFailed,
    LockContention,
    PreferenceWriteFailed,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::MissingRoutingContext => "E1001",
            Self::ConfigParseError => "E1002",
            Self::InvalidProjectId => "E1003",
            Self::SnapshotNotFound => "E2001",
            Self::InvalidEnumValue => "E2002",
            Self::SubmissionInFlight => "E2003",
            Self::SubmissionRejected => "E2004",
            Self::CollectionReadFailed => "E3001",
            Self::CollectionCorrupt => "E3002",
            Self::CollectionWriteFailed => "E5001",
            Self::LockContention => "E5002",
            Self::PreferenceWriteFailed => "E5003",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::MissingRoutingContext => "Missing routing context",
            Self::ConfigParseError => "Config file parse error",
            Self::InvalidProjectId => "Invalid project ID",
            Self::SnapshotNotFound => "Snapshot not found",
            Self::InvalidEnumValue => "Invalid kind/sort value",
            Self::SubmissionInFlight => "Another submission is in flight",
            Self::SubmissionRejected => "Submission rejected",
            Self::CollectionReadFailed => "Snapshot collection read failed",
            Self::CollectionCorrupt => "Snapshot collection is not valid JSON",
            Self::CollectionWriteFailed => "Snapshot collection write failed",
            Self::LockContention => "Lock contention",
            Self::PreferenceWriteFailed => "Preference write failed",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::MissingRoutingContext => Some("Pass `--project <id>` or set it in the route."),
            Self::ConfigParseError => Some("Fix syntax in ~/.config/snaplist/config.toml and retry."),
            Self::InvalidProjectId => Some("Project IDs must not contain path separators."),
            Self::SnapshotNotFound => None,
            Self::InvalidEnumValue => {
                Some("Use `reports` or `test-suites` for kind, `desc|asc|none` for sort.")
            }
            Self::SubmissionInFlight => Some("Wait for the pending refresh/delete to finish."),
            Self::SubmissionRejected => Some("Retry once the submission worker is available."),
            Self::CollectionReadFailed => Some("Check that the data directory is readable."),
            Self::CollectionCorrupt => Some("Restore the collection file from a known-good copy."),
            Self::CollectionWriteFailed => Some("Check disk space and write permissions."),
            Self::LockContention => Some("Retry after the other `snaplist` process finishes."),
            Self::PreferenceWriteFailed => Some("Check permissions on ~/.config/snaplist."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors raised by the list controller itself.
///
/// The controller performs no I/O, so the taxonomy is narrow: a missing
/// precondition at mount time, or a submission the channel refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListError {
    /// A routing value the view cannot render without (e.g. the project id).
    #[error("missing {0}")]
    MissingRoutingContext(&'static str),

    /// A refresh/delete was requested while another one is still pending.
    #[error("a submission is already in flight")]
    SubmissionInFlight,

    /// The submission channel refused the request.
    #[error("submission rejected: {0}")]
    SubmissionRejected(String),
}

impl ListError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::MissingRoutingContext(_) => ErrorCode::MissingRoutingContext,
            Self::SubmissionInFlight => ErrorCode::SubmissionInFlight,
            Self::SubmissionRejected(_) => ErrorCode::SubmissionRejected,
        }
    }
}
