//! Patcher configuration: the text → key dictionary and the attribute name.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use crate::errors::PatchError;

pub const DEFAULT_ATTRIBUTE: &str = "data-i18n";

#[derive(Debug, Clone)]
pub struct PatchConfig {
    mapping: BTreeMap<String, String>,
    attribute: String,
}

impl PatchConfig {
    /// Validates and builds a config.
    ///
    /// Dictionary texts are trimmed; keys must be non-empty and free of
    /// whitespace and control characters. The attribute name must be a plain
    /// ASCII name (letters, digits, `-`, `_`, `:`, `.`).
    pub fn new(
        mapping: BTreeMap<String, String>,
        attribute: impl Into<String>,
    ) -> Result<Self, PatchError> {
        let attribute = attribute.into();
        let valid_attr = !attribute.is_empty()
            && attribute.starts_with(|c: char| c.is_ascii_alphabetic())
            && attribute
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'));
        if !valid_attr {
            return Err(PatchError::InvalidAttribute(attribute));
        }

        let mut cleaned = BTreeMap::new();
        for (text, key) in mapping {
            if key.is_empty() || key.chars().any(|c| c.is_whitespace() || c.is_control()) {
                return Err(PatchError::InvalidKey { text, key });
            }
            let text = text.trim().to_string();
            if text.is_empty() {
                return Err(PatchError::Mapping(format!(
                    "empty display text for key {key:?}"
                )));
            }
            cleaned.insert(text, key);
        }

        Ok(Self {
            mapping: cleaned,
            attribute: attribute.to_ascii_lowercase(),
        })
    }

    /// Parses a flat JSON object `{ "display text": "dotted.key", ... }`.
    pub fn from_json(json: &str, attribute: impl Into<String>) -> Result<Self, PatchError> {
        let mapping: BTreeMap<String, String> =
            serde_json::from_str(json).map_err(|e| PatchError::Mapping(e.to_string()))?;
        Self::new(mapping, attribute)
    }

    /// Reads and parses a JSON mapping file.
    pub fn load(path: &Path, attribute: impl Into<String>) -> Result<Self, PatchError> {
        let json = std::fs::read_to_string(path).map_err(|source| PatchError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg = Self::from_json(&json, attribute)?;
        debug!(path = %path.display(), entries = cfg.mapping.len(), "mapping loaded");
        Ok(cfg)
    }

    pub fn key_for(&self, text: &str) -> Option<&str> {
        self.mapping.get(text).map(String::as_str)
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }
}
