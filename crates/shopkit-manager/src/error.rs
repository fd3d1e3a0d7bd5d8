//! # Error Types
//!
//! Composition and resolution error types.
//!
//! All variants are configuration or programming mistakes surfaced
//! immediately to the caller; nothing here is transient and nothing is
//! retried. Compilation failures from shopkit-core pass through via the
//! `Core` variant.

use thiserror::Error;

use shopkit_core::CoreError;

// =============================================================================
// Manager Error
// =============================================================================

/// Manager composition and resolution errors.
#[derive(Debug, Error)]
pub enum ManagerError {
    /// A configured decorator name has no registered factory.
    ///
    /// ## When This Occurs
    /// - A decorator list in configuration names a component that was
    ///   never registered at process start
    #[error("Decorator not available: '{0}'")]
    InvalidDecorator(String),

    /// A component does not satisfy the required capability set.
    ///
    /// This is a structural check against the component's reported
    /// capabilities, never a type-name compare.
    #[error("Component '{name}' does not satisfy the manager capability set")]
    InterfaceMismatch { name: String },

    /// A domain path segment is not a sub-manager of its parent.
    ///
    /// ## When This Occurs
    /// - `resolve("price/bogus")` where the price manager knows no
    ///   `bogus` sub-domain
    #[error("Unsupported domain path: '{0}'")]
    UnsupportedDomainPath(String),

    /// No factory is registered for the resolved implementation identity.
    ///
    /// ## When This Occurs
    /// - Configuration names an implementation that was never registered
    /// - A domain path without a default implementation
    #[error("No manager implementation '{name}' registered for path '{path}'")]
    UnknownImplementation { path: String, name: String },

    /// A criteria tree exceeds the configured nesting limit.
    ///
    /// Raised by the Depth decorator before compilation.
    #[error("Criteria tree depth {depth} exceeds maximum {max}")]
    CriteriaTooDeep { depth: usize, max: usize },

    /// Compilation error from shopkit-core.
    #[error(transparent)]
    Core(#[from] CoreError),
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with ManagerError.
pub type ManagerResult<T> = Result<T, ManagerError>;

// =============================================================================
// Unit Tests
// =============================================================================
