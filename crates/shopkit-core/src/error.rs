//! # Error Types
//!
//! Compilation error types for shopkit-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  shopkit-core errors (this file)                                       │
//! │  └── CoreError        - Registry, criteria and compiler failures       │
//! │                                                                         │
//! │  shopkit-manager errors (separate crate)                               │
//! │  └── ManagerError     - Composition and resolution failures            │
//! │                                                                         │
//! │  shopkit-db errors (separate crate)                                    │
//! │  └── DbError          - Database execution failures                    │
//! │                                                                         │
//! │  Flow: CoreError → ManagerError → DbError → caller                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (key, dialect, placeholder)
//! 3. Errors are enum variants, never String
//! 4. All variants are configuration/programming mistakes - nothing here is
//!    transient, so nothing is retried

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Compilation core errors.
///
/// Every variant indicates a programming or configuration mistake surfaced
/// immediately to the caller. Transient backend failures (connection loss,
/// deadlock) never originate here - they belong to the execution layer.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A search key is not present in the attribute registry.
    ///
    /// ## When This Occurs
    /// - Building a criteria tree with a typo'd key
    /// - Sorting by a key the entity never registered
    /// - Requesting an unregistered column in a search
    #[error("Unknown search key: {0}")]
    UnknownKey(String),

    /// A search key was registered twice.
    ///
    /// ## When This Occurs
    /// - An entity catalog registers the same key a second time
    #[error("Duplicate search key: {0}")]
    DuplicateKey(String),

    /// No template exists for the requested statement and dialect.
    ///
    /// ## When This Occurs
    /// - The dialect has no entry and there is no `ansi` fallback
    /// - `newid` is compiled for a dialect without a last-insert-id query
    #[error("No '{statement}' template for dialect '{dialect}'")]
    UnsupportedDialect { statement: String, dialect: String },

    /// No renderer is registered for a criteria function on this dialect.
    ///
    /// ## When This Occurs
    /// - A relevance/ranking function is used against a backend that has
    ///   no registered rendering rule for it
    #[error("No renderer for function '{name}' on dialect '{dialect}'")]
    UnsupportedFunction { name: String, dialect: String },

    /// A template contains a placeholder the compiler cannot resolve.
    ///
    /// Fatal configuration error: the template and the statement context
    /// disagree. Never retried.
    #[error("Template for '{statement}' contains unresolvable placeholder ':{placeholder}'")]
    MalformedTemplate {
        statement: String,
        placeholder: String,
    },

    /// A table or column identifier contains characters outside
    /// `[A-Za-z0-9_]`.
    ///
    /// ## When This Occurs
    /// - A caller passes a table/column name built from untrusted input
    #[error("Invalid SQL identifier: '{0}'")]
    InvalidIdentifier(String),
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::UnknownKey("price.list.domain".to_string());
        assert_eq!(err.to_string(), "Unknown search key: price.list.domain");

        let err = CoreError::UnsupportedDialect {
            statement: "newid".to_string(),
            dialect: "ansi".to_string(),
        };
        assert_eq!(err.to_string(), "No 'newid' template for dialect 'ansi'");
    }

    #[test]
    fn test_malformed_template_message() {
        let err = CoreError::MalformedTemplate {
            statement: "search".to_string(),
            placeholder: "bogus".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Template for 'search' contains unresolvable placeholder ':bogus'"
        );
    }
}
