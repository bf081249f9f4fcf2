//! Path pattern compilation.
//!
//! # Grammar
//! ```text
//! /blog          literal segment (case-sensitive)
//! /:slug         named parameter, one non-empty segment
//! /:lang?        optional parameter
//! /:parts*       rest catch-all, zero or more segments as a list
//! /*             remainder catch-all, the rest as one string (may be empty)
//! ```
//!
//! # Design Decisions
//! - Segment matching with backtracking, no regex
//! - Empty segments are ignored on both sides, so trailing slashes never matter
//! - Captured values are kept as written (no percent-decoding)

use crate::routing::route::{ParamValue, Params};

/// Key under which the remainder catch-all is captured.
pub const REMAINDER_KEY: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param { name: String, optional: bool },
    Rest(String),
    Remainder,
}

/// Result of matching one pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMatch {
    /// The consumed part of the pathname, normalised (`/blog/hello`).
    pub pathname: String,
    pub params: Params,
}

/// A compiled path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    source: String,
    segments: Vec<Segment>,
}

type Captures = Vec<(String, ParamValue)>;

impl PathPattern {
    pub fn compile(pattern: &str) -> Self {
        let segments = split(pattern)
            .into_iter()
            .map(|segment| {
                if segment == REMAINDER_KEY {
                    Segment::Remainder
                } else if let Some(name) = segment.strip_prefix(':') {
                    if let Some(name) = name.strip_suffix('?') {
                        Segment::Param {
                            name: name.to_string(),
                            optional: true,
                        }
                    } else if let Some(name) = name.strip_suffix('*') {
                        Segment::Rest(name.to_string())
                    } else {
                        Segment::Param {
                            name: name.to_string(),
                            optional: false,
                        }
                    }
                } else {
                    Segment::Literal(segment.to_string())
                }
            })
            .collect();

        Self {
            source: pattern.to_string(),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Match the whole pathname.
    pub fn match_exact(&self, pathname: &str) -> Option<PathMatch> {
        self.match_with(pathname, true)
    }

    /// Match a leading run of whole segments of the pathname.
    pub fn match_prefix(&self, pathname: &str) -> Option<PathMatch> {
        self.match_with(pathname, false)
    }

    fn match_with(&self, pathname: &str, end: bool) -> Option<PathMatch> {
        let path = split(pathname);
        let (consumed, captures) = match_segments(&self.segments, &path, end)?;
        Some(PathMatch {
            pathname: format!("/{}", path[..consumed].join("/")),
            params: captures.into_iter().collect(),
        })
    }
}

fn split(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn match_segments(pattern: &[Segment], path: &[&str], end: bool) -> Option<(usize, Captures)> {
    let Some((segment, rest)) = pattern.split_first() else {
        return if end && !path.is_empty() { None } else { Some((0, Vec::new())) };
    };

    match segment {
        Segment::Literal(literal) => {
            let (first, tail) = path.split_first()?;
            if first != literal {
                return None;
            }
            let (consumed, captures) = match_segments(rest, tail, end)?;
            Some((consumed + 1, captures))
        }
        Segment::Param { name, optional } => {
            if let Some((first, tail)) = path.split_first() {
                if let Some((consumed, mut captures)) = match_segments(rest, tail, end) {
                    captures.push((name.clone(), ParamValue::One(first.to_string())));
                    return Some((consumed + 1, captures));
                }
            }
            if *optional {
                match_segments(rest, path, end)
            } else {
                None
            }
        }
        Segment::Rest(_) | Segment::Remainder => {
            // Greedy: take as many segments as the rest of the pattern allows.
            for take in (0..=path.len()).rev() {
                if let Some((consumed, mut captures)) = match_segments(rest, &path[take..], end) {
                    let taken = &path[..take];
                    let value = match segment {
                        Segment::Rest(name) => (
                            name.clone(),
                            ParamValue::Many(taken.iter().map(|s| s.to_string()).collect()),
                        ),
                        _ => (REMAINDER_KEY.to_string(), ParamValue::One(taken.join("/"))),
                    };
                    captures.push(value);
                    return Some((consumed + take, captures));
                }
            }
            None
        }
    }
}

/// Match `pathname` against a single pattern, outside of any route tree.
pub fn match_path(pattern: &str, pathname: &str) -> Option<PathMatch> {
    PathPattern::compile(pattern).match_exact(pathname)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one(value: &str) -> ParamValue {
        ParamValue::One(value.to_string())
    }

    #[test]
    fn test_literal_match_is_exact_and_case_sensitive() {
        assert!(match_path("/about", "/about").is_some());
        assert!(match_path("/about", "/about/").is_some());
        assert!(match_path("/about", "/About").is_none());
        assert!(match_path("/about", "/about/team").is_none());
        assert!(match_path("/", "/").is_some());
        assert!(match_path("/", "/x").is_none());
    }

    #[test]
    fn test_named_params() {
        let m = match_path("/users/:id/posts/:post", "/users/42/posts/7").unwrap();
        assert_eq!(m.params["id"], one("42"));
        assert_eq!(m.params["post"], one("7"));
        assert_eq!(m.pathname, "/users/42/posts/7");
        assert!(match_path("/users/:id", "/users").is_none());
    }

    #[test]
    fn test_optional_param() {
        let pattern = PathPattern::compile("/:lang?/docs");
        assert_eq!(pattern.match_exact("/en/docs").unwrap().params["lang"], one("en"));
        let bare = pattern.match_exact("/docs").unwrap();
        assert!(!bare.params.contains_key("lang"));
    }

    #[test]
    fn test_rest_captures_segments() {
        let m = match_path("/files/:parts*", "/files/a/b/c").unwrap();
        assert_eq!(
            m.params["parts"].as_segments().unwrap(),
            &["a".to_string(), "b".to_string(), "c".to_string()]
        );
        let empty = match_path("/files/:parts*", "/files").unwrap();
        assert!(empty.params["parts"].as_segments().unwrap().is_empty());
    }

    #[test]
    fn test_remainder_captures_string() {
        let m = match_path("/docs/*", "/docs/guide/intro").unwrap();
        assert_eq!(m.params[REMAINDER_KEY], one("guide/intro"));
        let empty = match_path("/docs/*", "/docs").unwrap();
        assert_eq!(empty.params[REMAINDER_KEY], one(""));
    }

    #[test]
    fn test_rest_in_the_middle_backtracks() {
        let m = match_path("/a/:mid*/z", "/a/b/c/z").unwrap();
        assert_eq!(m.params["mid"].as_segments().unwrap().len(), 2);
    }

    #[test]
    fn test_prefix_match_stops_at_segment_boundary() {
        let pattern = PathPattern::compile("/blog");
        assert_eq!(pattern.match_prefix("/blog/hello").unwrap().pathname, "/blog");
        assert!(pattern.match_prefix("/blogger").is_none());
        assert!(PathPattern::compile("/").match_prefix("/anything").is_some());
    }
}
