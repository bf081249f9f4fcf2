//! Path descriptors and string conversions.
//!
//! # Design Decisions
//! - Nothing here percent-encodes or decodes: `/%23abc` and `/#abc` stay
//!   distinct, and `create_path(parse_path(s))` returns `s` for plain paths
//! - Relative resolution treats the base pathname as a directory

use serde::{Deserialize, Serialize};

/// A fully specified path: `pathname` + `search` + `hash`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Path {
    pub pathname: String,
    /// Empty or starting with `?`.
    pub search: String,
    /// Empty or starting with `#`.
    pub hash: String,
}

impl Path {
    pub fn new(pathname: impl Into<String>) -> Self {
        Self {
            pathname: pathname.into(),
            ..Self::default()
        }
    }
}

/// A navigation target where every part is optional.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PartialPath {
    pub pathname: Option<String>,
    pub search: Option<String>,
    pub hash: Option<String>,
}

impl PartialPath {
    pub fn pathname(pathname: impl Into<String>) -> Self {
        Self {
            pathname: Some(pathname.into()),
            ..Self::default()
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }
}

impl From<&str> for PartialPath {
    fn from(value: &str) -> Self {
        parse_path(value)
    }
}

impl From<String> for PartialPath {
    fn from(value: String) -> Self {
        parse_path(&value)
    }
}

impl From<&String> for PartialPath {
    fn from(value: &String) -> Self {
        parse_path(value)
    }
}

impl From<&Path> for PartialPath {
    fn from(path: &Path) -> Self {
        Self {
            pathname: Some(path.pathname.clone()),
            search: Some(path.search.clone()),
            hash: Some(path.hash.clone()),
        }
    }
}

impl From<Path> for PartialPath {
    fn from(path: Path) -> Self {
        Self {
            pathname: Some(path.pathname),
            search: Some(path.search),
            hash: Some(path.hash),
        }
    }
}

/// Split a string at the first `#`, then at the first `?` before it.
pub fn parse_path(path: &str) -> PartialPath {
    let mut parsed = PartialPath::default();
    let mut rest = path;

    if let Some(index) = rest.find('#') {
        parsed.hash = Some(rest[index..].to_string());
        rest = &rest[..index];
    }
    if let Some(index) = rest.find('?') {
        parsed.search = Some(rest[index..].to_string());
        rest = &rest[..index];
    }
    if !rest.is_empty() {
        parsed.pathname = Some(rest.to_string());
    }
    parsed
}

/// Join the parts of a path; a missing pathname renders as `/`.
pub fn create_path(path: &PartialPath) -> String {
    let mut out = path.pathname.clone().unwrap_or_else(|| "/".to_string());

    if let Some(search) = path.search.as_deref() {
        if !search.is_empty() && search != "?" {
            if !search.starts_with('?') {
                out.push('?');
            }
            out.push_str(search);
        }
    }
    if let Some(hash) = path.hash.as_deref() {
        if !hash.is_empty() && hash != "#" {
            if !hash.starts_with('#') {
                out.push('#');
            }
            out.push_str(hash);
        }
    }
    out
}

/// Resolve `to` against the pathname `from`.
///
/// Absolute pathnames are kept verbatim, a missing pathname reuses `from`,
/// and relative ones are applied segment by segment with `..` popping.
pub fn resolve_path(to: &PartialPath, from: &str) -> Path {
    let pathname = match to.pathname.as_deref() {
        None | Some("") => from.to_string(),
        Some(p) if p.starts_with('/') => p.to_string(),
        Some(p) => resolve_relative(p, from),
    };

    Path {
        pathname,
        search: normalize_prefixed(to.search.as_deref(), '?'),
        hash: normalize_prefixed(to.hash.as_deref(), '#'),
    }
}

fn resolve_relative(relative: &str, from: &str) -> String {
    let mut segments: Vec<&str> = from.trim_end_matches('/').split('/').collect();

    for segment in relative.split('/') {
        match segment {
            ".." => {
                if segments.len() > 1 {
                    segments.pop();
                }
            }
            "." => {}
            other => segments.push(other),
        }
    }

    if segments.len() > 1 {
        segments.join("/")
    } else {
        "/".to_string()
    }
}

fn normalize_prefixed(value: Option<&str>, prefix: char) -> String {
    match value {
        None | Some("") => String::new(),
        Some(v) if v.len() == 1 && v.starts_with(prefix) => String::new(),
        Some(v) if v.starts_with(prefix) => v.to_string(),
        Some(v) => format!("{}{}", prefix, v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_path_splits_hash_before_search() {
        let parsed = parse_path("/the/path?the=query#the-hash?not-search");
        assert_eq!(parsed.pathname.as_deref(), Some("/the/path"));
        assert_eq!(parsed.search.as_deref(), Some("?the=query"));
        assert_eq!(parsed.hash.as_deref(), Some("#the-hash?not-search"));
    }

    #[test]
    fn test_encoded_and_unencoded_hash_differ() {
        let encoded = parse_path("/view/%23abc");
        assert_eq!(encoded.pathname.as_deref(), Some("/view/%23abc"));
        assert_eq!(encoded.hash, None);

        let unencoded = parse_path("/view/#abc");
        assert_eq!(unencoded.pathname.as_deref(), Some("/view/"));
        assert_eq!(unencoded.hash.as_deref(), Some("#abc"));
    }

    #[test]
    fn test_create_path_round_trips() {
        for href in ["/", "/the/path?the=query#the-hash", "/%23abc", "/a?x", "/a#b"] {
            assert_eq!(create_path(&parse_path(href)), href);
        }
    }

    #[test]
    fn test_create_path_adds_missing_prefixes() {
        let path = PartialPath::pathname("/a").with_search("x=1").with_hash("top");
        assert_eq!(create_path(&path), "/a?x=1#top");
        assert_eq!(create_path(&PartialPath::default()), "/");
    }

    #[test]
    fn test_resolve_relative_paths() {
        let from = "/the/path";
        assert_eq!(resolve_path(&"other".into(), from).pathname, "/the/path/other");
        assert_eq!(resolve_path(&"../other".into(), from).pathname, "/the/other");
        assert_eq!(resolve_path(&"./x/../y".into(), from).pathname, "/the/path/y");
        assert_eq!(resolve_path(&"../../../..".into(), from).pathname, "/");
        assert_eq!(resolve_path(&"/abs".into(), from).pathname, "/abs");
    }

    #[test]
    fn test_resolve_without_pathname_reuses_base() {
        let resolved = resolve_path(&"?q=1".into(), "/current");
        assert_eq!(resolved.pathname, "/current");
        assert_eq!(resolved.search, "?q=1");
        assert_eq!(resolved.hash, "");
    }
}
