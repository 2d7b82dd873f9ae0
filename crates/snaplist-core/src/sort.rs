//! Timestamp ordering for the snapshot list.

use crate::model::{ParseEnumError, Snapshot, normalize};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt, str::FromStr};

/// Direction of the timestamp column.
///
/// The column header cycles `Unset → Descending → Ascending → Unset`. A freshly
/// mounted view starts at `Descending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortDirection {
    /// Newest first.
    #[default]
    #[serde(rename = "desc")]
    Descending,
    /// Oldest first.
    #[serde(rename = "asc")]
    Ascending,
    /// Keep the loader's order.
    #[serde(rename = "none")]
    Unset,
}

impl SortDirection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Descending => "desc",
            Self::Ascending => "asc",
            Self::Unset => "none",
        }
    }

    /// Direction after one click on the sort control.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Unset => Self::Descending,
            Self::Descending => Self::Ascending,
            Self::Ascending => Self::Unset,
        }
    }

    /// Whether the column shows an active sort indicator.
    #[must_use]
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Unset)
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "desc" | "descending" => Ok(Self::Descending),
            "asc" | "ascending" => Ok(Self::Ascending),
            "none" | "unset" | "off" => Ok(Self::Unset),
            _ => Err(ParseEnumError {
                expected: "sort",
                got: s.to_string(),
            }),
        }
    }
}

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Date-times with a numeric offset RFC 3339 rejects (`+0000`, no seconds).
const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M%z",
];

/// Parse a snapshot timestamp.
///
/// Accepts RFC 3339, RFC 2822, ISO-8601 date-times with or without an
/// offset, and reduced-precision dates (`2024-03-01`, `2024-03`, `2024`).
/// Values without an offset are read as UTC; partial dates start at the
/// first of the period. Returns `None` when nothing fits.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    parse_date(raw)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// `YYYY-MM-DD`, `YYYY-MM` or `YYYY`.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let mut parts = raw.split('-');
    let year = parts.next().filter(|y| y.len() == 4)?;
    let month = parts.next();
    let day = parts.next();
    if parts.next().is_some() {
        return None;
    }
    let field = |part: Option<&str>| -> Option<u32> {
        match part {
            None => Some(1),
            Some(p) if p.len() == 2 && p.bytes().all(|b| b.is_ascii_digit()) => p.parse().ok(),
            Some(_) => None,
        }
    };
    if !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::from_ymd_opt(year.parse().ok()?, field(month)?, field(day)?)
}

/// Order rows by timestamp.
///
/// `Unset` returns the input untouched. Otherwise the sort is stable, so equal
/// timestamps keep their relative input order. Unparsable timestamps always go
/// last, in input order, whichever direction is active.
#[must_use]
pub fn by_timestamp<'a>(rows: Vec<&'a Snapshot>, direction: SortDirection) -> Vec<&'a Snapshot> {
    if direction == SortDirection::Unset {
        return rows;
    }

    let mut keyed: Vec<(Option<DateTime<Utc>>, &'a Snapshot)> = rows
        .into_iter()
        .map(|snapshot| (parse_timestamp(&snapshot.timestamp), snapshot))
        .collect();

    keyed.sort_by(|(a, _), (b, _)| match (a, b) {
        (Some(a), Some(b)) => match direction {
            SortDirection::Descending => b.cmp(a),
            SortDirection::Ascending | SortDirection::Unset => a.cmp(b),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    keyed.into_iter().map(|(_, snapshot)| snapshot).collect()
}
