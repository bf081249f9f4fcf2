//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that discovery markers cannot collide with each other
//! - Validate value ranges (intervals > 0, parsable base URL)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;

use url::Url;

use crate::config::schema::{HistoryMode, RouterConfig};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let discovery = &config.discovery;

    if discovery.extensions.is_empty() {
        errors.push(ValidationError::new("discovery.extensions", "at least one extension is required"));
    }
    for ext in &discovery.extensions {
        if ext.is_empty() || ext.contains('.') || ext.contains('/') {
            errors.push(ValidationError::new(
                "discovery.extensions",
                format!("invalid extension {:?} (expected e.g. \"tsx\")", ext),
            ));
        }
    }

    for (field, value) in [
        ("discovery.layout_marker", &discovery.layout_marker),
        ("discovery.dynamic_prefix", &discovery.dynamic_prefix),
        ("discovery.index_name", &discovery.index_name),
    ] {
        if value.is_empty() {
            errors.push(ValidationError::new(field, "must not be empty"));
        } else if value.contains('/') || value.contains('\\') {
            errors.push(ValidationError::new(field, "must not contain path separators"));
        }
    }

    if discovery.layout_marker == discovery.index_name {
        errors.push(ValidationError::new(
            "discovery.layout_marker",
            "layout marker and index name must differ",
        ));
    }
    if discovery.layout_marker.starts_with(&discovery.dynamic_prefix) && !discovery.dynamic_prefix.is_empty() {
        errors.push(ValidationError::new(
            "discovery.layout_marker",
            "layout marker must not start with the dynamic prefix",
        ));
    }

    if config.watch.poll_interval_ms == 0 {
        errors.push(ValidationError::new("watch.poll_interval_ms", "must be greater than 0"));
    }
    if config.watch.debounce_ms == 0 {
        errors.push(ValidationError::new("watch.debounce_ms", "must be greater than 0"));
    }

    if let Err(e) = Url::parse(&config.history.base_url) {
        errors.push(ValidationError::new("history.base_url", format!("invalid URL: {}", e)));
    }
    if config.history.mode == HistoryMode::Memory {
        if config.history.initial_entries.is_empty() {
            errors.push(ValidationError::new("history.initial_entries", "memory history needs an entry"));
        }
        for entry in &config.history.initial_entries {
            if !entry.starts_with('/') {
                errors.push(ValidationError::new(
                    "history.initial_entries",
                    format!("entry {:?} must be an absolute path", entry),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&RouterConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = RouterConfig::default();
        config.discovery.extensions = vec![".tsx".into()];
        config.discovery.index_name = "_layout".into();
        config.watch.debounce_ms = 0;
        config.history.base_url = "not a url".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "discovery.extensions",
                "discovery.layout_marker",
                "watch.debounce_ms",
                "history.base_url",
            ]
        );
    }

    #[test]
    fn test_memory_entries_must_be_absolute() {
        let mut config = RouterConfig::default();
        config.history.mode = HistoryMode::Memory;
        config.history.initial_entries = vec!["/".into(), "relative".into()];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "history.initial_entries");
    }
}
