//! Localization-attribute patcher for static HTML pages.
//!
//! Given a dictionary of display text → dotted localization key, annotates
//! `label`, `span`, `h1`–`h6`, `button` and `.form-hint` elements whose sole
//! child is matching text:
//!
//! ```
//! use html_i18n::{PatchConfig, patch_document};
//!
//! let cfg = PatchConfig::from_json(r#"{"Sprache": "settings.general.language"}"#, "data-i18n").unwrap();
//! let out = patch_document("<label>Sprache</label>", &cfg);
//! assert_eq!(out.output, r#"<label data-i18n="settings.general.language">Sprache</label>"#);
//! ```
//!
//! Elements that already carry the attribute, contain nested markup or have
//! no dictionary entry are left byte-for-byte unchanged, so patching is
//! idempotent.

pub mod config;
mod entities;
pub mod errors;
pub mod patch;
pub mod tokenizer;

pub use config::{DEFAULT_ATTRIBUTE, PatchConfig};
pub use errors::PatchError;
pub use patch::{PatchOutcome, patch_document};
