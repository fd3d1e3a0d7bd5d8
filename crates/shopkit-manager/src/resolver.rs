//! # Sub-Manager Resolution
//!
//! Turns domain paths like `price/list/type` into fully composed,
//! cached manager handles.
//!
//! ## Resolution Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   resolve("price/list")                                 │
//! │                                                                         │
//! │   1. Override?            injected handle returned as-is                │
//! │   2. Parent check         resolve("price"), "list" ∈ sub_domains        │
//! │   3. Identity             config shopkit/price/manager/list/name        │
//! │                           (default "Standard")                          │
//! │   4. Cache                hit on (path, identity) → shared Arc          │
//! │   5. Factory              explicit (path, identity) registry            │
//! │   6. Capability check     base must satisfy the full operation set      │
//! │   7. Compose              default/global/local decorator phases         │
//! │   8. Insert + return      all-or-nothing cache population               │
//! │                                                                         │
//! │  The parent is resolved BEFORE the cache lock is taken; resolution     │
//! │  recursion never holds the lock.                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Overrides exist for test injection. An injected handle bypasses the
//! factory registry, the composer and the cache entirely.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use tracing::{debug, info};

use shopkit_core::{AttributeDefinition, CompiledStatement};

use crate::composer::{config_prefix, DecoratorSpec, ManagerComposer};
use crate::config::ConfigSource;
use crate::decorator::DecoratorRegistry;
use crate::error::{ManagerError, ManagerResult};
use crate::manager::{Capability, Manager, ManagerContext, ManagerHandle, REQUIRED_CAPABILITIES};

// =============================================================================
// Composition Context
// =============================================================================

/// Per-resolver override map for dependency injection.
///
/// An override binds a domain path to a prebuilt handle. Overridden
/// paths skip identity lookup, composition and caching.
#[derive(Default, Clone)]
pub struct CompositionContext {
    overrides: HashMap<String, ManagerHandle>,
}

impl fmt::Debug for CompositionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut paths: Vec<&str> = self.overrides.keys().map(String::as_str).collect();
        paths.sort_unstable();
        f.debug_struct("CompositionContext")
            .field("overrides", &paths)
            .finish()
    }
}

impl CompositionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Injects a prebuilt handle for a domain path.
    pub fn with_override(mut self, path: impl Into<String>, handle: ManagerHandle) -> Self {
        self.overrides.insert(path.into(), handle);
        self
    }

    fn get(&self, path: &str) -> Option<&ManagerHandle> {
        self.overrides.get(path)
    }
}

// =============================================================================
// Manager Factory Registry
// =============================================================================

/// Builds a base (undecorated) manager for one (path, identity) pair.
pub type ManagerFactory = Box<dyn Fn(&ManagerContext) -> ManagerResult<ManagerHandle> + Send + Sync>;

/// Explicit (path, identity) → factory registry.
///
/// Identities are implementation names such as `Standard`; configuration
/// selects among them per path.
#[derive(Default)]
pub struct ManagerRegistry {
    factories: HashMap<(String, String), ManagerFactory>,
}

impl fmt::Debug for ManagerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self
            .factories
            .keys()
            .map(|(path, name)| format!("{}:{}", path, name))
            .collect();
        keys.sort_unstable();
        f.debug_struct("ManagerRegistry").field("keys", &keys).finish()
    }
}

impl ManagerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory. Later registrations replace earlier ones.
    pub fn register(
        &mut self,
        path: impl Into<String>,
        name: impl Into<String>,
        factory: ManagerFactory,
    ) {
        self.factories.insert((path.into(), name.into()), factory);
    }

    /// Builds the base manager for the pair.
    ///
    /// ## Errors
    /// * `ManagerError::UnknownImplementation` - no factory registered
    fn build(&self, path: &str, name: &str, ctx: &ManagerContext) -> ManagerResult<ManagerHandle> {
        let factory = self
            .factories
            .get(&(path.to_string(), name.to_string()))
            .ok_or_else(|| ManagerError::UnknownImplementation {
                path: path.to_string(),
                name: name.to_string(),
            })?;
        factory(ctx)
    }
}

// =============================================================================
// Resolver
// =============================================================================

/// The implementation identity used when configuration names none.
pub const DEFAULT_IMPLEMENTATION: &str = "Standard";

/// Resolves domain paths to composed manager handles, with caching.
pub struct SubManagerResolver {
    context: ManagerContext,
    managers: ManagerRegistry,
    decorators: DecoratorRegistry,
    composition: CompositionContext,
    cache: Mutex<HashMap<(String, String), ManagerHandle>>,
}

impl fmt::Debug for SubManagerResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cached = self
            .cache
            .lock()
            .map(|cache| cache.len())
            .unwrap_or_default();
        f.debug_struct("SubManagerResolver")
            .field("context", &self.context)
            .field("managers", &self.managers)
            .field("decorators", &self.decorators)
            .field("composition", &self.composition)
            .field("cached", &cached)
            .finish()
    }
}

impl SubManagerResolver {
    pub fn new(
        context: ManagerContext,
        managers: ManagerRegistry,
        decorators: DecoratorRegistry,
        composition: CompositionContext,
    ) -> Self {
        SubManagerResolver {
            context,
            managers,
            decorators,
            composition,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// The resolver's shared context.
    pub fn context(&self) -> &ManagerContext {
        &self.context
    }

    /// Resolves a domain path with its configured implementation
    /// identity.
    pub fn resolve(&self, path: &str) -> ManagerResult<ManagerHandle> {
        let prefix = config_prefix(path)?;
        let name = self
            .context
            .config
            .get_str(&format!("{}/name", prefix), DEFAULT_IMPLEMENTATION);
        self.resolve_named(path, &name)
    }

    /// Resolves a domain path with an explicit implementation identity.
    pub fn resolve_named(&self, path: &str, name: &str) -> ManagerResult<ManagerHandle> {
        if let Some(handle) = self.composition.get(path) {
            debug!(path, "Resolved manager from override");
            return Ok(handle.clone());
        }

        // Validate the leaf against its parent before taking the cache
        // lock; resolving the parent recurses into this method.
        self.check_parent(path)?;

        let key = (path.to_string(), name.to_string());
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(handle) = cache.get(&key) {
            debug!(path, name, "Resolved manager from cache");
            return Ok(handle.clone());
        }

        let base = self.managers.build(path, name, &self.context)?;
        if !satisfies(base.capabilities()) {
            return Err(ManagerError::InterfaceMismatch {
                name: name.to_string(),
            });
        }

        let spec = DecoratorSpec::from_config(self.context.config.as_ref(), path)?;
        let handle = ManagerComposer::new(&self.decorators).compose(base, &spec)?;

        info!(path, name, "Composed manager");
        cache.insert(key, handle.clone());
        Ok(handle)
    }

    /// For nested paths, resolves the parent and checks that the leaf
    /// is one of its sub-domains.
    fn check_parent(&self, path: &str) -> ManagerResult<()> {
        let Some((parent, leaf)) = path.rsplit_once('/') else {
            return Ok(());
        };
        if parent.is_empty() || leaf.is_empty() {
            return Err(ManagerError::UnsupportedDomainPath(path.to_string()));
        }

        let parent_mgr = self.resolve(parent)?;
        if !parent_mgr.sub_domains().iter().any(|d| d == leaf) {
            return Err(ManagerError::UnsupportedDomainPath(path.to_string()));
        }
        Ok(())
    }

    /// The published search attribute catalog of a path, optionally
    /// merged with every transitive sub-manager's catalog.
    pub fn search_attributes(
        &self,
        path: &str,
        with_sub: bool,
    ) -> ManagerResult<Vec<AttributeDefinition>> {
        let manager = self.resolve(path)?;
        let mut attrs = manager.search_attributes();

        if with_sub {
            for sub in manager.sub_domains().to_vec() {
                let sub_path = format!("{}/{}", path, sub);
                attrs.extend(self.search_attributes(&sub_path, true)?);
            }
        }

        Ok(attrs)
    }

    /// Compiles site-partition delete statements for a path and every
    /// transitive sub-manager, children first.
    ///
    /// Children go first so referencing rows are removed before the
    /// rows they point at.
    pub fn cleanup(&self, path: &str) -> ManagerResult<Vec<CompiledStatement>> {
        let manager = self.resolve(path)?;
        let mut statements = Vec::new();

        for sub in manager.sub_domains().to_vec() {
            let sub_path = format!("{}/{}", path, sub);
            statements.extend(self.cleanup(&sub_path)?);
        }

        statements.push(manager.delete(None)?);
        Ok(statements)
    }
}

fn satisfies(caps: &[Capability]) -> bool {
    REQUIRED_CAPABILITIES.iter().all(|cap| caps.contains(cap))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryConfig;
    use crate::testutil::{tag_registry, StubManager};
    use serde_json::json;
    use std::sync::Arc;

    fn context(config: MemoryConfig) -> ManagerContext {
        ManagerContext::new("site-1", "tester", "sqlite", Arc::new(config))
    }

    fn registry() -> ManagerRegistry {
        let mut managers = ManagerRegistry::new();
        managers.register(
            "price",
            "Standard",
            Box::new(|_ctx| {
                Ok(Arc::new(StubManager::new("price").with_sub_domains(["list"])) as ManagerHandle)
            }),
        );
        managers.register(
            "price/list",
            "Standard",
            Box::new(|_ctx| {
                Ok(Arc::new(StubManager::new("price/list").with_sub_domains(["type"]))
                    as ManagerHandle)
            }),
        );
        managers.register(
            "price/list/type",
            "Standard",
            Box::new(|_ctx| Ok(Arc::new(StubManager::new("price/list/type")) as ManagerHandle)),
        );
        managers
    }

    fn resolver(config: MemoryConfig) -> SubManagerResolver {
        SubManagerResolver::new(
            context(config),
            registry(),
            tag_registry(&["Log", "Depth", "Extra"]),
            CompositionContext::new(),
        )
    }

    #[test]
    fn test_resolve_composes_default_chain() {
        let resolver = resolver(MemoryConfig::empty());
        let handle = resolver.resolve("price").unwrap();
        // Built-in default list is ["Log", "Depth"]; Depth wraps first
        assert_eq!(handle.domain(), "price+Depth+Log");
    }

    #[test]
    fn test_resolve_is_cached() {
        let resolver = resolver(MemoryConfig::empty());
        let first = resolver.resolve("price/list").unwrap();
        let second = resolver.resolve("price/list").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_nested_path_validated_against_parent() {
        let resolver = resolver(MemoryConfig::empty());
        assert!(resolver.resolve("price/list/type").is_ok());

        let err = resolver.resolve("price/bogus").err().unwrap();
        assert!(matches!(err, ManagerError::UnsupportedDomainPath(path) if path == "price/bogus"));
    }

    #[test]
    fn test_configured_identity_and_local_phase() {
        let config = MemoryConfig::new(json!({
            "shopkit": {
                "price": {
                    "manager": {
                        "name": "Fast",
                        "decorators": { "local": ["Extra"] }
                    }
                }
            }
        }));

        let mut managers = registry();
        managers.register(
            "price",
            "Fast",
            Box::new(|_ctx| Ok(Arc::new(StubManager::new("price-fast")) as ManagerHandle)),
        );
        let resolver = SubManagerResolver::new(
            context(config),
            managers,
            tag_registry(&["Log", "Depth", "Extra"]),
            CompositionContext::new(),
        );

        let handle = resolver.resolve("price").unwrap();
        // Local phase ends outermost overall
        assert_eq!(handle.domain(), "price-fast+Depth+Log+Extra");
    }

    #[test]
    fn test_unknown_identity_fails() {
        let config = MemoryConfig::new(json!({
            "shopkit": { "price": { "manager": { "name": "Missing" } } }
        }));
        let err = resolver(config).resolve("price").err().unwrap();
        assert!(matches!(
            err,
            ManagerError::UnknownImplementation { path, name }
                if path == "price" && name == "Missing"
        ));
    }

    #[test]
    fn test_override_bypasses_composition_and_cache() {
        let injected: ManagerHandle = Arc::new(StubManager::new("price-injected"));
        let resolver = SubManagerResolver::new(
            context(MemoryConfig::empty()),
            registry(),
            tag_registry(&["Log", "Depth"]),
            CompositionContext::new().with_override("price", injected.clone()),
        );

        let handle = resolver.resolve("price").unwrap();
        // No decorator tags: the injected handle came back untouched
        assert_eq!(handle.domain(), "price-injected");
        assert!(Arc::ptr_eq(&handle, &injected));
    }

    #[test]
    fn test_search_attributes_with_sub_merges_catalogs() {
        let resolver = resolver(MemoryConfig::empty());
        // Stub registries are empty; the call exercises traversal only
        let attrs = resolver.search_attributes("price", true).unwrap();
        assert!(attrs.is_empty());
    }

    #[test]
    fn test_cleanup_is_children_first() {
        let resolver = resolver(MemoryConfig::empty());
        let statements = resolver.cleanup("price").unwrap();

        let order: Vec<&str> = statements.iter().map(|s| s.sql.as_str()).collect();
        assert_eq!(
            order,
            vec![
                "delete:price/list/type",
                "delete:price/list",
                "delete:price"
            ]
        );
    }
}
