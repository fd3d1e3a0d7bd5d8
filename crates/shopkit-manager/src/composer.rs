//! # Phase-Ordered Composition
//!
//! Builds the decorator chain around a base manager from configuration.
//!
//! ## Phase Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Composition Phases                                  │
//! │                                                                         │
//! │  default  = ["Log", "Depth"]   (shared, filterable via excludes)        │
//! │  global   = ["Audit"]          (per domain)                             │
//! │  local    = ["Cache"]          (per manager path)                       │
//! │                                                                         │
//! │  Wrapping proceeds phase by phase; within a phase the list is walked   │
//! │  in REVERSE so the first configured name ends outermost of its phase:  │
//! │                                                                         │
//! │    base                                                                 │
//! │    └─ Depth(base)                     default, reversed                 │
//! │       └─ Log(Depth(base))                                               │
//! │          └─ Audit(Log(Depth(base)))   global                            │
//! │             └─ Cache(...)             local = outermost overall         │
//! │                                                                         │
//! │  Every wrap is followed by a structural capability check; a decorator  │
//! │  that drops an operation aborts composition.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::debug;

use crate::config::ConfigSource;
use crate::decorator::DecoratorRegistry;
use crate::error::{ManagerError, ManagerResult};
use crate::manager::{Capability, Manager, ManagerHandle};

// =============================================================================
// Config Paths
// =============================================================================

/// The shared default decorator list, overridable at
/// `shopkit/common/manager/decorators/default`.
pub const DEFAULT_DECORATORS: &[&str] = &["Log", "Depth"];

/// Config path of the shared default decorator list.
const DEFAULT_LIST_PATH: &str = "shopkit/common/manager/decorators/default";

/// Maps a domain path to its configuration prefix.
///
/// `price` → `shopkit/price/manager`,
/// `price/list/type` → `shopkit/price/manager/list/type`.
///
/// ## Errors
/// * `ManagerError::UnsupportedDomainPath` - empty path
pub fn config_prefix(path: &str) -> ManagerResult<String> {
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    let root = segments
        .next()
        .ok_or_else(|| ManagerError::UnsupportedDomainPath(path.to_string()))?;

    let rest: Vec<&str> = segments.collect();
    if rest.is_empty() {
        Ok(format!("shopkit/{}/manager", root))
    } else {
        Ok(format!("shopkit/{}/manager/{}", root, rest.join("/")))
    }
}

// =============================================================================
// Decorator Spec
// =============================================================================

/// The resolved decorator configuration for one manager path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoratorSpec {
    /// Shared default phase (before exclusion filtering).
    pub default: Vec<String>,

    /// Names removed from the default phase for this path.
    pub excludes: Vec<String>,

    /// Per-path global phase.
    pub global: Vec<String>,

    /// Per-path local phase; ends outermost overall.
    pub local: Vec<String>,
}

impl DecoratorSpec {
    /// Reads the spec for a domain path from configuration.
    pub fn from_config(config: &dyn ConfigSource, path: &str) -> ManagerResult<Self> {
        let prefix = config_prefix(path)?;

        Ok(DecoratorSpec {
            default: config.get_list(DEFAULT_LIST_PATH, DEFAULT_DECORATORS),
            excludes: config.get_list(&format!("{}/decorators/excludes", prefix), &[]),
            global: config.get_list(&format!("{}/decorators/global", prefix), &[]),
            local: config.get_list(&format!("{}/decorators/local", prefix), &[]),
        })
    }

    /// The default phase after exclusion filtering, order preserved.
    pub fn filtered_default(&self) -> Vec<&str> {
        self.default
            .iter()
            .map(String::as_str)
            .filter(|name| !self.excludes.iter().any(|ex| ex == name))
            .collect()
    }
}

// =============================================================================
// Composer
// =============================================================================

/// Wraps a base manager in its configured decorator chain.
#[derive(Debug)]
pub struct ManagerComposer<'a> {
    decorators: &'a DecoratorRegistry,
}

impl<'a> ManagerComposer<'a> {
    pub fn new(decorators: &'a DecoratorRegistry) -> Self {
        ManagerComposer { decorators }
    }

    /// Composes the full chain: default (filtered), then global, then
    /// local, with the local phase outermost.
    pub fn compose(&self, base: ManagerHandle, spec: &DecoratorSpec) -> ManagerResult<ManagerHandle> {
        let mut handle = base;

        for phase in [
            spec.filtered_default(),
            spec.global.iter().map(String::as_str).collect(),
            spec.local.iter().map(String::as_str).collect(),
        ] {
            handle = self.wrap_phase(handle, &phase)?;
        }

        Ok(handle)
    }

    /// Wraps one phase, reversed so the first name ends outermost of
    /// the phase.
    fn wrap_phase(&self, mut handle: ManagerHandle, names: &[&str]) -> ManagerResult<ManagerHandle> {
        for name in names.iter().rev() {
            let required = handle.capabilities().to_vec();
            let wrapped = self.decorators.wrap(name, handle)?;

            if !satisfies(wrapped.capabilities(), &required) {
                return Err(ManagerError::InterfaceMismatch {
                    name: name.to_string(),
                });
            }

            debug!(decorator = name, domain = wrapped.domain(), "Wrapped manager");
            handle = wrapped;
        }
        Ok(handle)
    }
}

/// Structural capability check: `outer` must cover every capability of
/// `inner`.
fn satisfies(outer: &[Capability], inner: &[Capability]) -> bool {
    inner.iter().all(|cap| outer.contains(cap))
}

// =============================================================================
// Unit Tests
// =============================================================================
