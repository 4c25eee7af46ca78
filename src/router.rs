//! URL routing between the list view and the detail view.
//!
//! The route is never cached: it is recomputed from the current location on
//! every navigation, so multi-step back/forward stays correct.

use url::form_urlencoded;

pub const PROBLEM_PARAM: &str = "problem";
pub const ROOT_LOCATION: &str = "/";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Route {
    #[default]
    List,
    Detail { slug: String },
}

impl Route {
    pub fn slug(&self) -> Option<&str> {
        match self {
            Self::List => None,
            Self::Detail { slug } => Some(slug),
        }
    }
}

/// Resolves a location (`/?problem=two-sum`) or a bare query string
/// (`problem=two-sum`) into a route.
pub fn resolve(location: &str) -> Route {
    let query = query_part(location);
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == PROBLEM_PARAM)
        .map(|(_, value)| value.trim().to_string())
        .filter(|slug| !slug.is_empty())
        .map_or(Route::List, |slug| Route::Detail { slug })
}

/// Location for a problem's detail view.
pub fn detail_location(slug: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(slug.as_bytes()).collect();
    format!("/?{PROBLEM_PARAM}={encoded}")
}

/// Absolute URL that reloads the detail view of `slug` directly.
pub fn permalink(origin: &str, slug: &str) -> String {
    format!("{}{}", origin.trim_end_matches('/'), detail_location(slug))
}

fn query_part(location: &str) -> &str {
    let without_fragment = location.split('#').next().unwrap_or_default();
    match without_fragment.split_once('?') {
        Some((_, query)) => query,
        None if without_fragment.starts_with('/') => "",
        None => without_fragment,
    }
}

/// In-memory stand-in for the browser history stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserHistory {
    entries: Vec<String>,
    cursor: usize,
}

impl Default for BrowserHistory {
    fn default() -> Self {
        Self::new(ROOT_LOCATION)
    }
}

impl BrowserHistory {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            entries: vec![initial.into()],
            cursor: 0,
        }
    }

    pub fn current(&self) -> &str {
        &self.entries[self.cursor]
    }

    pub fn route(&self) -> Route {
        resolve(self.current())
    }

    /// Pushes a new entry, dropping any forward entries.
    pub fn push(&mut self, location: impl Into<String>) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push(location.into());
        self.cursor = self.entries.len() - 1;
    }

    /// Returns `false` when already at the oldest entry.
    pub fn back(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        true
    }

    pub fn forward(&mut self) -> bool {
        if self.cursor + 1 >= self.entries.len() {
            return false;
        }
        self.cursor += 1;
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
