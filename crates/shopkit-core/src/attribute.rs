//! # Attribute Registry
//!
//! Per-entity mapping from public search keys to internal column
//! expressions.
//!
//! ## Why a Registry?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Public Key → Internal Expression                     │
//! │                                                                         │
//! │  Caller speaks:   "price.list.domain"                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Registry maps:   prili."domain"                                        │
//! │                   + LEFT JOIN "shop_price_list" AS prili ON (...)       │
//! │                                                                         │
//! │  Callers never see physical tables, aliases or joins. The registry     │
//! │  is the single place where the public search vocabulary is bound to    │
//! │  the storage layout, so the layout can change without breaking any     │
//! │  caller.                                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{CoreError, CoreResult};
use crate::value::SemanticType;

// =============================================================================
// Attribute Definition
// =============================================================================

/// A single queryable/sortable attribute of an entity.
///
/// Immutable once registered. The `key` is the public, stable, dot-separated
/// identifier; `internal_expr` is the column expression substituted into
/// generated SQL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    /// Public search key, e.g. `price.list.domain`.
    pub key: String,

    /// Internal column expression, e.g. `prili."domain"`.
    pub internal_expr: String,

    /// Join clauses this attribute depends on, in dependency order.
    /// Empty for attributes of the entity's base table.
    pub join_deps: Vec<String>,

    /// Domain-level type of the attribute.
    pub semantic_type: SemanticType,

    /// Human-readable description published with the catalog.
    pub label: String,

    /// Whether the attribute is published to callers.
    /// Internal columns (ids, siteid) stay hidden.
    pub visible: bool,
}

impl AttributeDefinition {
    /// Creates a visible attribute with no join dependencies.
    pub fn new(
        key: impl Into<String>,
        internal_expr: impl Into<String>,
        semantic_type: SemanticType,
        label: impl Into<String>,
    ) -> Self {
        AttributeDefinition {
            key: key.into(),
            internal_expr: internal_expr.into(),
            join_deps: Vec::new(),
            semantic_type,
            label: label.into(),
            visible: true,
        }
    }

    /// Marks the attribute as internal (not published to callers).
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Adds a join clause this attribute depends on.
    pub fn join(mut self, clause: impl Into<String>) -> Self {
        self.join_deps.push(clause.into());
        self
    }
}

// =============================================================================
// Attribute Registry
// =============================================================================

/// Registry of all attributes of one entity.
///
/// Constructed once per entity type and read-only afterwards. Registration
/// order is preserved and is the order used for catalog publication and
/// join emission.
#[derive(Debug, Default, Clone)]
pub struct AttributeRegistry {
    /// Definitions in registration order.
    defs: Vec<AttributeDefinition>,

    /// Key → index into `defs`.
    index: HashMap<String, usize>,
}

impl AttributeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an attribute definition.
    ///
    /// ## Errors
    /// * `CoreError::DuplicateKey` - the key is already registered
    pub fn register(&mut self, def: AttributeDefinition) -> CoreResult<()> {
        if self.index.contains_key(&def.key) {
            return Err(CoreError::DuplicateKey(def.key));
        }

        self.index.insert(def.key.clone(), self.defs.len());
        self.defs.push(def);
        Ok(())
    }

    /// Resolves a public key to its definition.
    ///
    /// ## Errors
    /// * `CoreError::UnknownKey` - the key is not registered
    pub fn resolve(&self, key: &str) -> CoreResult<&AttributeDefinition> {
        self.index
            .get(key)
            .map(|&i| &self.defs[i])
            .ok_or_else(|| CoreError::UnknownKey(key.to_string()))
    }

    /// Returns true if the key is registered.
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Returns all definitions in registration order.
    pub fn all(&self) -> &[AttributeDefinition] {
        &self.defs
    }

    /// Returns the visible definitions in registration order.
    ///
    /// This is the catalog published to callers.
    pub fn all_visible(&self) -> Vec<&AttributeDefinition> {
        self.defs.iter().filter(|d| d.visible).collect()
    }

    /// Returns the deduplicated join clauses required by any of the given
    /// keys.
    ///
    /// Join order follows registration order (not the order of `keys`), so
    /// the same key set always emits the same join sequence. Identical
    /// clauses required by several keys are emitted once, at first-seen
    /// position.
    ///
    /// ## Errors
    /// * `CoreError::UnknownKey` - any key is not registered
    pub fn joins_for<'a, I>(&self, keys: I) -> CoreResult<Vec<&str>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut wanted: Vec<&str> = Vec::new();
        for key in keys {
            // Validate every requested key, even ones without joins
            self.resolve(key)?;
            if !wanted.contains(&key) {
                wanted.push(key);
            }
        }

        let mut joins: Vec<&str> = Vec::new();
        for def in &self.defs {
            if !wanted.contains(&def.key.as_str()) {
                continue;
            }
            for clause in &def.join_deps {
                if !joins.contains(&clause.as_str()) {
                    joins.push(clause);
                }
            }
        }

        Ok(joins)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> AttributeRegistry {
        let mut reg = AttributeRegistry::new();
        reg.register(
            AttributeDefinition::new("a.id", "t.\"id\"", SemanticType::Int, "ID").hidden(),
        )
        .unwrap();
        reg.register(AttributeDefinition::new(
            "a.code",
            "t.\"code\"",
            SemanticType::Str,
            "Code",
        ))
        .unwrap();
        reg.register(
            AttributeDefinition::new("a.ref.label", "tr.\"label\"", SemanticType::Str, "Ref label")
                .join("LEFT JOIN \"t_ref\" AS tr ON ( t.\"id\" = tr.\"parentid\" )"),
        )
        .unwrap();
        reg.register(
            AttributeDefinition::new("a.ref.status", "tr.\"status\"", SemanticType::Int, "Ref status")
                .join("LEFT JOIN \"t_ref\" AS tr ON ( t.\"id\" = tr.\"parentid\" )"),
        )
        .unwrap();
        reg
    }

    #[test]
    fn test_register_and_resolve_roundtrip() {
        let reg = registry();
        let def = reg.resolve("a.code").unwrap();
        assert_eq!(def.internal_expr, "t.\"code\"");
        assert_eq!(def.semantic_type, SemanticType::Str);
        assert!(def.visible);
    }

    #[test]
    fn test_unknown_key_fails() {
        let reg = registry();
        assert!(matches!(
            reg.resolve("a.missing"),
            Err(CoreError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_duplicate_key_fails() {
        let mut reg = registry();
        let err = reg
            .register(AttributeDefinition::new(
                "a.code",
                "t.\"code\"",
                SemanticType::Str,
                "Code",
            ))
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateKey(_)));
    }

    #[test]
    fn test_all_visible_preserves_registration_order() {
        let reg = registry();
        let visible: Vec<&str> = reg.all_visible().iter().map(|d| d.key.as_str()).collect();
        // a.id is hidden
        assert_eq!(visible, vec!["a.code", "a.ref.label", "a.ref.status"]);
    }

    #[test]
    fn test_joins_are_deduplicated() {
        let reg = registry();
        // Both ref keys depend on the same join clause
        let joins = reg.joins_for(["a.ref.label", "a.ref.status"]).unwrap();
        assert_eq!(joins.len(), 1);
        assert!(joins[0].starts_with("LEFT JOIN \"t_ref\""));
    }

    #[test]
    fn test_joins_for_base_keys_is_empty() {
        let reg = registry();
        assert!(reg.joins_for(["a.id", "a.code"]).unwrap().is_empty());
    }

    #[test]
    fn test_joins_for_unknown_key_fails() {
        let reg = registry();
        assert!(reg.joins_for(["a.nope"]).is_err());
    }
}
