//! Locations and history actions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::history::path::{Path, PartialPath};

/// Key carried by a location that was never pushed or replaced.
pub const DEFAULT_KEY: &str = "default";

/// How the current entry came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    /// A new entry was added.
    Push,
    /// The current entry was overwritten.
    Replace,
    /// The cursor moved back or forward.
    Pop,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Push => "PUSH",
            Action::Replace => "REPLACE",
            Action::Pop => "POP",
        }
    }
}

/// A committed (or proposed) entry of the history stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub pathname: String,
    pub search: String,
    pub hash: String,
    /// Opaque user state attached by `push`/`replace`.
    pub state: Value,
    pub key: String,
}

impl Location {
    pub fn new(path: Path, state: Value, key: impl Into<String>) -> Self {
        Self {
            pathname: path.pathname,
            search: path.search,
            hash: path.hash,
            state,
            key: key.into(),
        }
    }

    /// Location for an entry that existed before the history was created.
    pub fn initial(path: Path, state: Value) -> Self {
        Self::new(path, state, DEFAULT_KEY)
    }

    /// Location of a new entry: missing parts of `to` are taken from `current`
    /// (pathname only; search and hash reset) and a fresh key is generated.
    pub fn next(current: &Location, to: PartialPath, state: Value) -> Self {
        let path = Path {
            pathname: to.pathname.unwrap_or_else(|| current.pathname.clone()),
            search: to.search.unwrap_or_default(),
            hash: to.hash.unwrap_or_default(),
        };
        Self::new(path, state, create_key())
    }

    pub fn path(&self) -> Path {
        Path {
            pathname: self.pathname.clone(),
            search: self.search.clone(),
            hash: self.hash.clone(),
        }
    }
}

/// Fresh opaque key for a committed PUSH/REPLACE.
pub fn create_key() -> String {
    let mut key = Uuid::new_v4().simple().to_string();
    key.truncate(8);
    key
}
