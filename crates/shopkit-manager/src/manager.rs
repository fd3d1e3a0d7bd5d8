//! # Manager Trait
//!
//! The uniform capability surface of every entity manager.
//!
//! ## Manager Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      What a Manager Is                                  │
//! │                                                                         │
//! │  Caller                                                                 │
//! │    │  resolve("price/list")                                             │
//! │    ▼                                                                    │
//! │  ┌────────────────────────────┐                                         │
//! │  │ Decorator (Log)            │  ◄── outermost, closest to caller       │
//! │  │ ┌────────────────────────┐ │                                         │
//! │  │ │ Decorator (Depth)      │ │                                         │
//! │  │ │ ┌────────────────────┐ │ │                                         │
//! │  │ │ │ PriceListManager   │ │ │  ◄── base implementation                │
//! │  │ │ └────────────────────┘ │ │                                         │
//! │  │ └────────────────────────┘ │                                         │
//! │  └────────────────────────────┘                                         │
//! │                                                                         │
//! │  Every layer exposes the same trait. Decorators own exactly one        │
//! │  inner manager and forward by default; the outermost handle is         │
//! │  shared via Arc by the resolver cache.                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Compile-Side Operations
//! Manager operations produce [`CompiledStatement`]s; they never touch
//! storage. Execution is the job of the database layer, which keeps this
//! crate synchronous and I/O-free.

use std::sync::Arc;

use shopkit_core::{
    AttributeDefinition, AttributeRegistry, CompiledStatement, Criteria, Filter, Value,
};

use crate::config::ConfigSource;
use crate::error::ManagerResult;

// =============================================================================
// Capabilities
// =============================================================================

/// The operations a manager component can perform.
///
/// Capability sets are the structural interface test applied at
/// composition time: a decorator must preserve its inner manager's set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Search,
    Count,
    Delete,
    Insert,
    Update,
    NextId,
}

/// The capability set every composed manager must satisfy.
pub const REQUIRED_CAPABILITIES: &[Capability] = &[
    Capability::Search,
    Capability::Count,
    Capability::Delete,
    Capability::Insert,
    Capability::Update,
    Capability::NextId,
];

// =============================================================================
// Manager Context
// =============================================================================

/// Shared per-process context handed to entity managers.
///
/// Carries the caller's site partition, the audit editor name, the active
/// backend dialect and the configuration source.
#[derive(Debug, Clone)]
pub struct ManagerContext {
    /// The caller's site identifier (scope filter parameter).
    pub site_id: String,

    /// Editor name written into audit columns.
    pub editor: String,

    /// Active backend dialect, e.g. `sqlite`.
    pub dialect: String,

    /// Configuration source for decorator lists and implementation names.
    pub config: Arc<dyn ConfigSource>,
}

impl ManagerContext {
    pub fn new(
        site_id: impl Into<String>,
        editor: impl Into<String>,
        dialect: impl Into<String>,
        config: Arc<dyn ConfigSource>,
    ) -> Self {
        ManagerContext {
            site_id: site_id.into(),
            editor: editor.into(),
            dialect: dialect.into(),
            config,
        }
    }
}

// =============================================================================
// Manager Trait
// =============================================================================

/// A fully composed manager handle, shared by the resolver cache.
pub type ManagerHandle = Arc<dyn Manager>;

/// The uniform surface of entity managers and their decorators.
pub trait Manager: Send + Sync {
    /// The manager's domain path, e.g. `price/list`.
    fn domain(&self) -> &str;

    /// The capability set this component satisfies.
    fn capabilities(&self) -> &[Capability];

    /// The entity's attribute registry.
    fn attributes(&self) -> &AttributeRegistry;

    /// The visible search attributes published to callers, in
    /// registration order.
    fn search_attributes(&self) -> Vec<AttributeDefinition> {
        self.attributes()
            .all_visible()
            .into_iter()
            .cloned()
            .collect()
    }

    /// The sub-manager domains this manager can delegate to.
    fn sub_domains(&self) -> &[String];

    /// Compiles a search statement for the criteria.
    ///
    /// `keys` selects columns; empty selects every visible attribute.
    fn search(&self, criteria: &Criteria, keys: &[&str]) -> ManagerResult<CompiledStatement>;

    /// Compiles a saturating count statement for the criteria.
    fn count(&self, criteria: &Criteria) -> ManagerResult<CompiledStatement>;

    /// Compiles a delete statement. `None` deletes the caller's whole
    /// site partition (used by cleanup).
    fn delete(&self, filter: Option<&Filter>) -> ManagerResult<CompiledStatement>;

    /// Compiles an insert statement for (column, value) pairs.
    fn insert(&self, values: &[(String, Value)]) -> ManagerResult<CompiledStatement>;

    /// Compiles an update statement for one entity row.
    fn update(&self, id: Value, values: &[(String, Value)]) -> ManagerResult<CompiledStatement>;

    /// Compiles the backend-specific last-inserted-id query.
    fn newid(&self) -> ManagerResult<CompiledStatement>;
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::StubManager;

    #[test]
    fn test_required_capabilities_cover_all_statements() {
        assert_eq!(REQUIRED_CAPABILITIES.len(), 6);
    }

    #[test]
    fn test_search_attributes_default_uses_registry() {
        let stub = StubManager::new("price");
        // Stub registry is empty, so the published catalog is too
        assert!(stub.search_attributes().is_empty());
    }
}
