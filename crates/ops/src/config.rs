use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_PERMANENT_ATTRIBUTE: &str = "data-permanent";

/// Engine-wide settings, usually read from a TOML file.
///
/// ```toml
/// emit_missing_element_warnings = true
/// permanent_attribute_name = "data-permanent"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub emit_missing_element_warnings: bool,
    /// Marker attribute that shields a subtree from merges. Empty disables
    /// the built-in permanence check unless a descriptor names its own.
    pub permanent_attribute_name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            emit_missing_element_warnings: true,
            permanent_attribute_name: DEFAULT_PERMANENT_ATTRIBUTE.to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn permanent_attribute(&self) -> Option<&str> {
        Some(self.permanent_attribute_name.as_str()).filter(|s| !s.is_empty())
    }
}

/// Per-call driver options.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BatchOptions {
    /// When a selector matches nothing: `true` still invokes the handler and
    /// reports a resolution diagnostic, `false` skips the entry silently.
    pub emit_missing_element_warnings: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            emit_missing_element_warnings: true,
        }
    }
}

impl From<&EngineConfig> for BatchOptions {
    fn from(config: &EngineConfig) -> Self {
        Self {
            emit_missing_element_warnings: config.emit_missing_element_warnings,
        }
    }
}
