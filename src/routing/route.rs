//! Route tree and match result types.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque handle to the page component behind a route.
///
/// Resolved by an external loader; this crate stores it verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentRef(String);

impl ComponentRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A node of the route tree. Trees are immutable snapshots; an update builds a new tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteNode {
    pub id: String,
    /// Pattern, e.g. `/blog/:slug`. Child patterns without a leading `/`
    /// are relative to their parent.
    pub path: String,
    /// Exact routes must consume the whole pathname; others match as a prefix.
    pub exact: bool,
    pub component: ComponentRef,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RouteNode>,
}

impl RouteNode {
    pub fn new(id: impl Into<String>, path: impl Into<String>, exact: bool, component: ComponentRef) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            exact,
            component,
            children: Vec::new(),
        }
    }

    /// Exact route whose id and component are its path.
    pub fn page(path: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(path.clone(), path.clone(), true, ComponentRef::new(path))
    }

    /// Prefix route wrapping `children`.
    pub fn layout(path: impl Into<String>, children: Vec<RouteNode>) -> Self {
        let path = path.into();
        let mut node = Self::new(path.clone(), path.clone(), false, ComponentRef::new(path));
        node.children = children;
        node
    }

    pub fn with_children(mut self, children: Vec<RouteNode>) -> Self {
        self.children = children;
        self
    }
}

/// A captured parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Named parameter or remainder catch-all.
    One(String),
    /// Rest catch-all: the remaining segments in order.
    Many(Vec<String>),
}

impl ParamValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::One(value) => Some(value),
            ParamValue::Many(_) => None,
        }
    }

    pub fn as_segments(&self) -> Option<&[String]> {
        match self {
            ParamValue::Many(values) => Some(values),
            ParamValue::One(_) => None,
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::One(value.to_string())
    }
}

/// Parameters keyed by name (`*` for the remainder catch-all).
pub type Params = BTreeMap<String, ParamValue>;

/// One level of a matched route chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteMatch {
    pub route: RouteNode,
    /// The part of the pathname this level consumed.
    pub pathname: String,
    /// Parameters of this level merged over its ancestors'.
    pub params: Params,
}
