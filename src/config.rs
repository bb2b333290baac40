//! # Group configuration.
//!
//! [`GroupConfig`] carries the static settings of a run group: its display name, free-form
//! help text and the version reported by `--version`.
//!
//! # Example
//! ```
//! use rungroup::{GroupConfig, config::BINARY_NAME};
//!
//! let mut cfg = GroupConfig::default();
//! cfg.name = Some("api".into());
//! cfg.help_text = format!("Run with: {BINARY_NAME} --listen :8080");
//! cfg.version = "v1.2.0".into();
//!
//! assert_eq!(cfg.name.as_deref(), Some("api"));
//! ```

/// Placeholder in [`GroupConfig::help_text`] replaced by the invoked binary path.
pub const BINARY_NAME: &str = "{{.Name}}";

/// Version reported when none was configured.
pub const UNOFFICIAL_VERSION: &str = "v0.0.0-unofficial";

/// Static configuration for a [`Group`](crate::Group).
#[derive(Clone, Debug)]
pub struct GroupConfig {
    /// Display name. `None` (or empty) falls back to the binary name; `--name` overrides both.
    pub name: Option<String>,
    /// Text printed below the usage header of `--help`.
    pub help_text: String,
    /// Version printed by `--version` and logged at startup.
    pub version: String,
}

impl Default for GroupConfig {
    /// Provides a default configuration:
    /// - `name = None`
    /// - `help_text = ""`
    /// - `version = "v0.0.0-unofficial"`
    fn default() -> Self {
        Self {
            name: None,
            help_text: String::new(),
            version: UNOFFICIAL_VERSION.to_string(),
        }
    }
}

impl GroupConfig {
    /// Creates a configuration with an explicit name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Returns the configured version, or the unofficial placeholder when empty.
    pub fn version_or_default(&self) -> &str {
        if self.version.is_empty() {
            UNOFFICIAL_VERSION
        } else {
            &self.version
        }
    }
}
