//! Schema-checked configuration layering.
//!
//! A [`Configuration`] starts from a base mapping that doubles as the
//! schema: overlays may change values but, outside explicitly extensible
//! nodes, not introduce keys the base does not have. Three overlay
//! strategies cover the usual sources:
//!
//! - [`Configuration::apply`] merges a nested mapping, for configuration
//!   files
//! - [`Configuration::apply_flat`] merges flat delimiter-joined keys, for
//!   environment variables
//! - [`Configuration::apply_object`] merges the public fields of any
//!   serializable value, for parsed command-line arguments
//!
//! Later overlays win, so apply them in order of increasing precedence:
//!
//! ```
//! use std::collections::HashMap;
//!
//! use conflayer::{Configuration, UnknownKeyPolicy};
//! use serde_json::{Value, json};
//!
//! let mut config = Configuration::new(json!({
//!     "bind": "127.0.0.1:8080",
//!     "logging": { "level": "info" }
//! }))?;
//!
//! // File overlay first.
//! config.apply(
//!     &json!({ "logging": { "level": "warn" } }),
//!     UnknownKeyPolicy::Strict,
//! )?;
//!
//! // Environment second: APP_LOGGING_LEVEL=debug overrides the file.
//! let environment: HashMap<String, Value> = std::env::vars()
//!     .map(|(key, value)| (key.to_lowercase(), Value::String(value)))
//!     .collect();
//! config.apply_flat_with(&environment, "_", "app_");
//!
//! assert!(config.contains_key("logging"));
//! # Ok::<(), conflayer::ConfigError>(())
//! ```
//!
//! Flat and object overlays address leaves through an index built on first
//! use. Mark nodes extensible and populate them with structural overlays
//! before the first flat or object overlay; leaves added afterwards are not
//! addressable by flat keys.

mod config;
mod error;
mod index;
mod merge;
mod tree;

pub use config::{Configuration, ConfigurationBuilder, DEFAULT_SEPARATOR};
pub use error::{ConfigError, ConfigResult};
pub use merge::UnknownKeyPolicy;
pub use tree::{MapNode, Node};
