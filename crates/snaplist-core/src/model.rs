use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Free-form metadata attached to a snapshot.
///
/// Values are primitives, nested trees, or sequences of primitives. Key order
/// is the order the loader produced, which matters for flattening.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A single report or test-suite result as supplied by the loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Opaque, stable identifier. Used as the list key.
    pub id: String,
    /// Date/time string; not guaranteed unique and not guaranteed parseable.
    pub timestamp: String,
    /// Tag labels. Duplicates from the source are kept as-is.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Snapshot {
    /// Construct a snapshot with empty metadata.
    pub fn new(id: impl Into<String>, timestamp: impl Into<String>, tags: &[&str]) -> Self {
        Self {
            id: id.into(),
            timestamp: timestamp.into(),
            tags: tags.iter().map(|t| (*t).to_string()).collect(),
            metadata: Metadata::new(),
        }
    }

    /// Builder-style metadata attachment.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// True if every tag in `selected` appears in this snapshot's tags.
    #[must_use]
    pub fn has_all_tags(&self, selected: &[String]) -> bool {
        selected.iter().all(|candidate| self.tags.contains(candidate))
    }
}

/// Which collection a list view is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SnapshotKind {
    Reports,
    TestSuites,
}

impl SnapshotKind {
    /// Route segment / storage stem (`reports`, `test-suites`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reports => "reports",
            Self::TestSuites => "test-suites",
        }
    }

    /// Human noun used in labels ("refresh test suites").
    #[must_use]
    pub const fn noun(self) -> &'static str {
        match self {
            Self::Reports => "reports",
            Self::TestSuites => "test suites",
        }
    }

    /// Header of the identifier column.
    #[must_use]
    pub const fn id_header(self) -> &'static str {
        match self {
            Self::Reports => "Report ID",
            Self::TestSuites => "Test Suite ID",
        }
    }

    /// Label of the refresh control.
    #[must_use]
    pub fn refresh_label(self) -> String {
        format!("refresh {}", self.noun())
    }

    /// Message shown when the collection has no snapshots at all.
    #[must_use]
    pub fn empty_message(self) -> String {
        format!("You don't have any {} yet.", self.noun())
    }
}

impl fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a string into one of the list enums.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {expected}: '{got}'")]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl ParseEnumError {
    #[must_use]
    pub const fn code(&self) -> crate::error::ErrorCode {
        crate::error::ErrorCode::InvalidEnumValue
    }
}

pub(crate) fn normalize(input: &str) -> String {
    input.trim().to_ascii_lowercase()
}

impl FromStr for SnapshotKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "reports" | "report" => Ok(Self::Reports),
            "test-suites" | "test_suites" | "test suites" | "testsuites" | "test-suite" => {
                Ok(Self::TestSuites)
            }
            _ => Err(ParseEnumError {
                expected: "kind",
                got: s.to_string(),
            }),
        }
    }
}
