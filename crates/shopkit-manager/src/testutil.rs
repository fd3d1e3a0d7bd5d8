//! Test doubles for composition and resolution tests.
//!
//! `StubManager` satisfies the full operation set with marker statements
//! (`"<op>:<domain>"`); tag decorators append their name to the domain
//! string at wrap time, so a composed handle's domain reads the wrap
//! order inner-to-outer.

use std::sync::Arc;

use shopkit_core::{AttributeRegistry, CompiledStatement, Criteria, Filter, Value};

use crate::decorator::DecoratorRegistry;
use crate::error::ManagerResult;
use crate::manager::{Capability, Manager, ManagerHandle, REQUIRED_CAPABILITIES};

// =============================================================================
// Stub Manager
// =============================================================================

pub struct StubManager {
    domain: String,
    attributes: AttributeRegistry,
    sub_domains: Vec<String>,
}

impl StubManager {
    pub fn new(domain: impl Into<String>) -> Self {
        StubManager {
            domain: domain.into(),
            attributes: AttributeRegistry::new(),
            sub_domains: Vec::new(),
        }
    }

    pub fn with_sub_domains<I, S>(mut self, subs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sub_domains = subs.into_iter().map(Into::into).collect();
        self
    }

    fn marker(&self, op: &str) -> CompiledStatement {
        CompiledStatement {
            sql: format!("{}:{}", op, self.domain),
            params: Vec::new(),
        }
    }
}

impl Manager for StubManager {
    fn domain(&self) -> &str {
        &self.domain
    }

    fn capabilities(&self) -> &[Capability] {
        REQUIRED_CAPABILITIES
    }

    fn attributes(&self) -> &AttributeRegistry {
        &self.attributes
    }

    fn sub_domains(&self) -> &[String] {
        &self.sub_domains
    }

    fn search(&self, _criteria: &Criteria, _keys: &[&str]) -> ManagerResult<CompiledStatement> {
        Ok(self.marker("search"))
    }

    fn count(&self, _criteria: &Criteria) -> ManagerResult<CompiledStatement> {
        Ok(self.marker("count"))
    }

    fn delete(&self, _filter: Option<&Filter>) -> ManagerResult<CompiledStatement> {
        Ok(self.marker("delete"))
    }

    fn insert(&self, _values: &[(String, Value)]) -> ManagerResult<CompiledStatement> {
        Ok(self.marker("insert"))
    }

    fn update(&self, _id: Value, _values: &[(String, Value)]) -> ManagerResult<CompiledStatement> {
        Ok(self.marker("update"))
    }

    fn newid(&self) -> ManagerResult<CompiledStatement> {
        Ok(self.marker("newid"))
    }
}

// =============================================================================
// Tag Decorator
// =============================================================================

/// Appends its tag to the inner domain string; otherwise forwards
/// everything.
pub struct TagDecorator {
    inner: ManagerHandle,
    tagged_domain: String,
}

impl TagDecorator {
    pub fn layer(inner: ManagerHandle, tag: &str) -> Self {
        let tagged_domain = format!("{}+{}", inner.domain(), tag);
        TagDecorator {
            inner,
            tagged_domain,
        }
    }
}

impl Manager for TagDecorator {
    fn domain(&self) -> &str {
        &self.tagged_domain
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
        self.inner.search(criteria, keys)
    }

    fn count(&self, criteria: &Criteria) -> ManagerResult<CompiledStatement> {
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

/// A decorator registry where each name wraps with a [`TagDecorator`]
/// carrying that name.
pub fn tag_registry(names: &[&str]) -> DecoratorRegistry {
    let mut registry = DecoratorRegistry::new();
    for name in names {
        let tag = name.to_string();
        registry.register(
            tag.clone(),
            Box::new(move |inner| Arc::new(TagDecorator::layer(inner, &tag))),
        );
    }
    registry
}

// =============================================================================
// Lossy Decorator
// =============================================================================

/// Reports a reduced capability set; composition must reject it.
pub struct LossyDecorator {
    inner: ManagerHandle,
}

impl LossyDecorator {
    pub fn layer(inner: ManagerHandle) -> Self {
        LossyDecorator { inner }
    }
}

impl Manager for LossyDecorator {
    fn domain(&self) -> &str {
        self.inner.domain()
    }

    fn capabilities(&self) -> &[Capability] {
        &[Capability::Search, Capability::Count]
    }

    fn attributes(&self) -> &AttributeRegistry {
        self.inner.attributes()
    }

    fn sub_domains(&self) -> &[String] {
        self.inner.sub_domains()
    }

    fn search(&self, criteria: &Criteria, keys: &[&str]) -> ManagerResult<CompiledStatement> {
        self.inner.search(criteria, keys)
    }

    fn count(&self, criteria: &Criteria) -> ManagerResult<CompiledStatement> {
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
