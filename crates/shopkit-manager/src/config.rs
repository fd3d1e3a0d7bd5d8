//! # Configuration Source
//!
//! Read-only key-path configuration lookups with defaults.
//!
//! ## Configuration Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Paths                                  │
//! │                                                                         │
//! │  shopkit/common/manager/decorators/default   = ["Depth", "Log"]         │
//! │  shopkit/price/manager/decorators/excludes   = ["Log"]                  │
//! │  shopkit/price/manager/decorators/global     = [...]                    │
//! │  shopkit/price/manager/list/decorators/local = [...]                    │
//! │  shopkit/price/manager/list/name             = "Standard"               │
//! │  shopkit/price/manager/list/submanagers      = ["type"]                 │
//! │                                                                         │
//! │  The core only ever consumes get(path) with a caller-side default.     │
//! │  Where the values come from (files, environment, database) is not      │
//! │  this crate's concern.                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde_json::Value as JsonValue;
use std::fmt;

// =============================================================================
// Config Source
// =============================================================================

/// Read-only configuration lookups.
///
/// Paths are `/`-separated. Lookups never fail; absent paths yield the
/// caller's default.
pub trait ConfigSource: Send + Sync + fmt::Debug {
    /// Returns the raw value at the path, if present.
    fn get(&self, path: &str) -> Option<JsonValue>;

    /// Returns the string at the path, or the default.
    fn get_str(&self, path: &str, default: &str) -> String {
        match self.get(path) {
            Some(JsonValue::String(s)) => s,
            _ => default.to_string(),
        }
    }

    /// Returns the string list at the path, or the default.
    ///
    /// Non-string array elements are skipped.
    fn get_list(&self, path: &str, default: &[&str]) -> Vec<String> {
        match self.get(path) {
            Some(JsonValue::Array(items)) => items
                .into_iter()
                .filter_map(|item| match item {
                    JsonValue::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
            _ => default.iter().map(|s| s.to_string()).collect(),
        }
    }
}

// =============================================================================
// Memory Config
// =============================================================================

/// In-memory configuration backed by a JSON tree.
///
/// ## Usage
/// ```rust
/// use serde_json::json;
/// use shopkit_manager::config::{ConfigSource, MemoryConfig};
///
/// let config = MemoryConfig::new(json!({
///     "shopkit": { "price": { "manager": { "name": "Standard" } } }
/// }));
/// assert_eq!(config.get_str("shopkit/price/manager/name", "x"), "Standard");
/// assert_eq!(config.get_str("shopkit/price/manager/missing", "x"), "x");
/// ```
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    root: JsonValue,
}

impl MemoryConfig {
    /// Creates a config from a JSON tree.
    pub fn new(root: JsonValue) -> Self {
        MemoryConfig { root }
    }

    /// Creates a config with no entries.
    pub fn empty() -> Self {
        MemoryConfig {
            root: JsonValue::Null,
        }
    }
}

impl ConfigSource for MemoryConfig {
    fn get(&self, path: &str) -> Option<JsonValue> {
        let mut node = &self.root;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            node = node.get(segment)?;
        }
        Some(node.clone())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
