//! # Decorator Registry and Built-ins
//!
//! Cross-cutting behavior layered around entity managers.
//!
//! ## Decorator Chain
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Decorator Wrapping                                  │
//! │                                                                         │
//! │  Registry:  "Log"   ──► |inner| LogDecorator::layer(inner)              │
//! │             "Depth" ──► |inner| DepthDecorator::layer(inner)            │
//! │                                                                         │
//! │  Composer asks the registry by NAME, one wrap at a time:               │
//! │                                                                         │
//! │     base ──wrap("Depth")──► Depth(base) ──wrap("Log")──► Log(Depth(base))│
//! │                                                                         │
//! │  Names come from configuration; factories are registered explicitly    │
//! │  at process start. An unregistered name is a hard error, never a       │
//! │  silent skip.                                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every decorator forwards the full [`Manager`] surface and reports its
//! inner manager's capability set unchanged, so structural interface
//! checks see through the chain.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use shopkit_core::{AttributeRegistry, CompiledStatement, Criteria, Filter, Value};

use crate::error::{ManagerError, ManagerResult};
use crate::manager::{Capability, Manager, ManagerHandle};

// =============================================================================
// Decorator Registry
// =============================================================================

/// Builds one decorator layer around an inner manager.
pub type DecoratorFactory = Box<dyn Fn(ManagerHandle) -> ManagerHandle + Send + Sync>;

/// Explicit name → factory registry for decorators.
///
/// Populated once at process start. Configuration may only name
/// decorators that exist here.
#[derive(Default)]
pub struct DecoratorRegistry {
    factories: HashMap<String, DecoratorFactory>,
}

impl fmt::Debug for DecoratorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("DecoratorRegistry")
            .field("names", &names)
            .finish()
    }
}

impl DecoratorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in decorators registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("Log", Box::new(|inner| Arc::new(LogDecorator::layer(inner))));
        registry.register("Depth", Box::new(|inner| {
            Arc::new(DepthDecorator::layer(inner))
        }));
        registry
    }

    /// Registers a factory under a name. Later registrations replace
    /// earlier ones.
    pub fn register(&mut self, name: impl Into<String>, factory: DecoratorFactory) {
        self.factories.insert(name.into(), factory);
    }

    /// Returns true if a factory is registered under the name.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Wraps the inner manager in the named decorator.
    ///
    /// ## Errors
    /// * `ManagerError::InvalidDecorator` - no factory under that name
    pub fn wrap(&self, name: &str, inner: ManagerHandle) -> ManagerResult<ManagerHandle> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| ManagerError::InvalidDecorator(name.to_string()))?;
        Ok(factory(inner))
    }
}

// =============================================================================
// Log Decorator
// =============================================================================

/// Logs every compiled operation with structured fields.
pub struct LogDecorator {
    inner: ManagerHandle,
}

impl LogDecorator {
    pub fn layer(inner: ManagerHandle) -> Self {
        LogDecorator { inner }
    }
}

impl Manager for LogDecorator {
    fn domain(&self) -> &str {
        self.inner.domain()
    }

    fn capabilities(&self) -> &[Capability] {
        self.inner.capabilities()
    }

    fn attributes(&self) -> &AttributeRegistry {
        self.inner.attributes()
    }

    fn sub_domains(&self) -> &[String] {
        self.inner.sub_domains()
    }

    fn search(&self, criteria: &Criteria, keys: &[&str]) -> ManagerResult<CompiledStatement> {
        let stmt = self.inner.search(criteria, keys)?;
        debug!(
            domain = self.inner.domain(),
            op = "search",
            params = stmt.params.len(),
            "Compiled statement"
        );
        Ok(stmt)
    }

    fn count(&self, criteria: &Criteria) -> ManagerResult<CompiledStatement> {
        let stmt = self.inner.count(criteria)?;
        debug!(
            domain = self.inner.domain(),
            op = "count",
            params = stmt.params.len(),
            "Compiled statement"
        );
        Ok(stmt)
    }

    fn delete(&self, filter: Option<&Filter>) -> ManagerResult<CompiledStatement> {
        let stmt = self.inner.delete(filter)?;
        debug!(
            domain = self.inner.domain(),
            op = "delete",
            scoped_only = filter.is_none(),
            "Compiled statement"
        );
        Ok(stmt)
    }

    fn insert(&self, values: &[(String, Value)]) -> ManagerResult<CompiledStatement> {
        let stmt = self.inner.insert(values)?;
        debug!(
            domain = self.inner.domain(),
            op = "insert",
            columns = values.len(),
            "Compiled statement"
        );
        Ok(stmt)
    }

    fn update(&self, id: Value, values: &[(String, Value)]) -> ManagerResult<CompiledStatement> {
        let stmt = self.inner.update(id, values)?;
        debug!(
            domain = self.inner.domain(),
            op = "update",
            columns = values.len(),
            "Compiled statement"
        );
        Ok(stmt)
    }

    fn newid(&self) -> ManagerResult<CompiledStatement> {
        self.inner.newid()
    }
}

// =============================================================================
// Depth Decorator
// =============================================================================

/// Maximum criteria tree nesting accepted by [`DepthDecorator`].
///
/// Deeply nested trees come from unbounded caller-side composition and
/// explode join/condition size; eight levels is far beyond anything a
/// storefront composes legitimately.
pub const MAX_CRITERIA_DEPTH: usize = 8;

/// Rejects criteria trees nested deeper than [`MAX_CRITERIA_DEPTH`]
/// before they reach compilation.
pub struct DepthDecorator {
    inner: ManagerHandle,
    max_depth: usize,
}

impl DepthDecorator {
    pub fn layer(inner: ManagerHandle) -> Self {
        DepthDecorator {
            inner,
            max_depth: MAX_CRITERIA_DEPTH,
        }
    }

    /// Overrides the depth limit (tests, special tenants).
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    fn check(&self, criteria: &Criteria) -> ManagerResult<()> {
        let depth = criteria.filter().map(Filter::depth).unwrap_or(0);
        if depth > self.max_depth {
            return Err(ManagerError::CriteriaTooDeep {
                depth,
                max: self.max_depth,
            });
        }
        Ok(())
    }
}

impl Manager for DepthDecorator {
    fn domain(&self) -> &str {
        self.inner.domain()
    }

    fn capabilities(&self) -> &[Capability] {
        self.inner.capabilities()
    }

    fn attributes(&self) -> &AttributeRegistry {
        self.inner.attributes()
    }

    fn sub_domains(&self) -> &[String] {
        self.inner.sub_domains()
    }

    fn search(&self, criteria: &Criteria, keys: &[&str]) -> ManagerResult<CompiledStatement> {
        self.check(criteria)?;
        self.inner.search(criteria, keys)
    }

    fn count(&self, criteria: &Criteria) -> ManagerResult<CompiledStatement> {
        self.check(criteria)?;
        self.inner.count(criteria)
    }

    fn delete(&self, filter: Option<&Filter>) -> ManagerResult<CompiledStatement> {
        self.inner.delete(filter)
    }

    fn insert(&self, values: &[(String, Value)]) -> ManagerResult<CompiledStatement> {
        self.inner.insert(values)
    }

    fn update(&self, id: Value, values: &[(String, Value)]) -> ManagerResult<CompiledStatement> {
        self.inner.update(id, values)
    }

    fn newid(&self) -> ManagerResult<CompiledStatement> {
        self.inner.newid()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
