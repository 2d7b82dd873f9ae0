//! Two-way binding between the filter state and the location's query string.
//!
//! Both directions are pure functions over [`Url`]:
//!
//! - [`read_filters`] runs once when a view mounts.
//! - [`write_filters`] runs on every tag/query change and yields the next
//!   location, which [`sync`] applies with [`History::replace`]. Replacing the
//!   current entry never adds back/forward history and never runs the loader.
//!
//! Serialization follows `application/x-www-form-urlencoded`, so a comma in
//! `tags` is written as `%2C`.

use url::Url;

/// Comma-joined list of selected tags.
pub const TAGS_PARAM: &str = "tags";
/// Raw metadata search text.
pub const METADATA_QUERY_PARAM: &str = "metadata-query";

const BASE_ORIGIN: &str = "http://localhost";

/// The two pieces of filter state that live in the URL.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryFilters {
    pub selected_tags: Vec<String>,
    pub metadata_query: String,
}

/// Split a `tags` parameter value. Empty segments are dropped.
#[must_use]
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Join selected tags into a `tags` parameter value.
#[must_use]
pub fn join_tags(tags: &[String]) -> String {
    tags.join(",")
}

/// First value of `key` in the location's query, like `URLSearchParams.get`.
#[must_use]
pub fn param(location: &Url, key: &str) -> Option<String> {
    location
        .query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

/// Seed filter state from a location. Absent parameters mean "no filter".
#[must_use]
pub fn read_filters(location: &Url) -> QueryFilters {
    QueryFilters {
        selected_tags: param(location, TAGS_PARAM)
            .map(|raw| split_tags(&raw))
            .unwrap_or_default(),
        metadata_query: param(location, METADATA_QUERY_PARAM).unwrap_or_default(),
    }
}

/// Return `location` with `key` set to `value`, or `None` if nothing changes.
///
/// An empty `value` removes the parameter instead of writing `key=`. An
/// existing value is replaced in place; a new one is appended.
#[must_use]
pub fn with_param(location: &Url, key: &str, value: &str) -> Option<Url> {
    let current = param(location, key).unwrap_or_default();
    if current == value {
        return None;
    }

    let mut pairs: Vec<(String, String)> = Vec::new();
    let mut replaced = false;
    for (k, v) in location.query_pairs().into_owned() {
        if k != key {
            pairs.push((k, v));
        } else if !value.is_empty() && !replaced {
            pairs.push((k, value.to_string()));
            replaced = true;
        }
    }
    if !value.is_empty() && !replaced {
        pairs.push((key.to_string(), value.to_string()));
    }

    let mut next = location.clone();
    if pairs.is_empty() {
        next.set_query(None);
    } else {
        let mut serializer = next.query_pairs_mut();
        serializer.clear();
        serializer.extend_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }
    Some(next)
}

/// Serialize `filters` onto `location`. `None` means the URL is already current.
#[must_use]
pub fn write_filters(location: &Url, filters: &QueryFilters) -> Option<Url> {
    let tags = join_tags(&filters.selected_tags);
    let after_tags = with_param(location, TAGS_PARAM, &tags);
    let base = after_tags.as_ref().unwrap_or(location);
    with_param(base, METADATA_QUERY_PARAM, &filters.metadata_query).or(after_tags)
}

/// The browser-history capability the list view needs.
pub trait History {
    /// Current location.
    fn location(&self) -> &Url;

    /// Swap the current entry for `url` without adding an entry and without
    /// triggering any data loading.
    fn replace(&mut self, url: Url);
}

/// Push `filters` into `history` if they differ from the current location.
///
/// Returns `true` when the location was replaced.
pub fn sync(history: &mut dyn History, filters: &QueryFilters) -> bool {
    match write_filters(history.location(), filters) {
        Some(next) => {
            tracing::debug!(location = %next, "replacing location query");
            history.replace(next);
            true
        }
        None => false,
    }
}

/// In-memory history stack used by the CLI and tests.
#[derive(Debug, Clone)]
pub struct MemoryHistory {
    entries: Vec<Url>,
    index: usize,
    replacements: usize,
}

impl MemoryHistory {
    #[must_use]
    pub fn new(location: Url) -> Self {
        Self {
            entries: vec![location],
            index: 0,
            replacements: 0,
        }
    }

    /// Navigate to `url`, discarding any forward entries.
    pub fn push(&mut self, url: Url) {
        self.entries.truncate(self.index + 1);
        self.entries.push(url);
        self.index = self.entries.len() - 1;
    }

    /// Step back one entry. Returns false at the start of history.
    pub fn back(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }

    /// Number of entries in the stack.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// How many times the current entry has been replaced.
    #[must_use]
    pub const fn replacements(&self) -> usize {
        self.replacements
    }
}

impl History for MemoryHistory {
    fn location(&self) -> &Url {
        &self.entries[self.index]
    }

    fn replace(&mut self, url: Url) {
        self.entries[self.index] = url;
        self.replacements += 1;
    }
}

/// Build a location for `route_path` from user input.
///
/// `raw` may be a full `http(s)://` URL, a `?query`, or a bare `key=value`
/// query. `None` yields the route path with no query.
///
/// # Errors
///
/// Returns the parse error if the combined URL is malformed.
pub fn location_for(route_path: &str, raw: Option<&str>) -> Result<Url, url::ParseError> {
    let path = if route_path.starts_with('/') {
        route_path.to_string()
    } else {
        format!("/{route_path}")
    };
    match raw.map(str::trim) {
        Some(full) if full.starts_with("http://") || full.starts_with("https://") => {
            Url::parse(full)
        }
        Some(query) if !query.is_empty() => {
            let query = query.strip_prefix('?').unwrap_or(query);
            Url::parse(&format!("{BASE_ORIGIN}{path}?{query}"))
        }
        _ => Url::parse(&format!("{BASE_ORIGIN}{path}")),
    }
}
