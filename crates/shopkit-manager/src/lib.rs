//! # shopkit-manager: Manager Composition and Resolution
//!
//! This crate turns the pure compilation machinery of `shopkit-core` into
//! the manager objects callers actually hold: decorated, cached,
//! path-addressable.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shopkit Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │             ★ shopkit-manager (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  manager  │  │ decorator │  │ composer  │  │ resolver  │  │   │
//! │  │   │   trait   │  │ registry  │  │  phases   │  │ path+cache│  │   │
//! │  │   │   caps    │  │ Log/Depth │  │ dflt/gl/lo│  │ overrides │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                shopkit-core (Compilation)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`manager`] - The `Manager` trait, capabilities and shared context
//! - [`decorator`] - Decorator registry and the Log/Depth built-ins
//! - [`composer`] - Phase-ordered decorator chain composition
//! - [`resolver`] - Domain path resolution, caching and overrides
//! - [`config`] - Read-only configuration source abstraction
//! - [`error`] - Composition and resolution error types
//!
//! ## Design Principles
//!
//! 1. **Explicit registries**: factories are registered by name at process
//!    start; nothing is loaded reflectively from configuration strings
//! 2. **Structural checks**: components are validated by capability set,
//!    never by type name
//! 3. **Shared handles**: resolution caches `Arc<dyn Manager>` per
//!    (path, identity); a handle is composed at most once

// =============================================================================
// Module Declarations
// =============================================================================

pub mod composer;
pub mod config;
pub mod decorator;
pub mod error;
pub mod manager;
pub mod resolver;

#[cfg(test)]
pub(crate) mod testutil;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use composer::{config_prefix, DecoratorSpec, ManagerComposer, DEFAULT_DECORATORS};
pub use config::{ConfigSource, MemoryConfig};
pub use decorator::{
    DecoratorFactory, DecoratorRegistry, DepthDecorator, LogDecorator, MAX_CRITERIA_DEPTH,
};
pub use error::{ManagerError, ManagerResult};
pub use manager::{Capability, Manager, ManagerContext, ManagerHandle, REQUIRED_CAPABILITIES};
pub use resolver::{
    CompositionContext, ManagerFactory, ManagerRegistry, SubManagerResolver,
    DEFAULT_IMPLEMENTATION,
};
