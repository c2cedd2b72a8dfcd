use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The mapping file is not a flat JSON object of strings.
    #[error("invalid mapping: {0}")]
    Mapping(String),

    /// A localization key that cannot be emitted as an attribute value.
    #[error("invalid localization key {key:?} for text {text:?}")]
    InvalidKey { text: String, key: String },

    #[error("invalid attribute name {0:?}")]
    InvalidAttribute(String),
}
