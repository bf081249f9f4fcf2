//! Hash-fragment encoding for the platform-backed history.

use url::Url;

use crate::history::browser::{PlatformHistory, UrlScheme};
use crate::history::path::{create_path, parse_path, Path};

/// Location stored in the URL fragment: `http://host/#/path?query#hash`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashScheme;

impl UrlScheme for HashScheme {
    fn read(url: &Url) -> Path {
        let parsed = parse_path(url.fragment().unwrap_or(""));
        Path {
            pathname: parsed.pathname.unwrap_or_else(|| "/".to_string()),
            search: parsed.search.unwrap_or_default(),
            hash: parsed.hash.unwrap_or_default(),
        }
    }

    fn href(path: &Path) -> String {
        format!("#{}", create_path(&path.into()))
    }
}

/// Backend keeping the location in the URL fragment.
pub type HashHistory = PlatformHistory<HashScheme>;
