//! # shopkit-core: Pure Criteria-to-SQL Compilation for Shopkit
//!
//! This crate is the **heart** of Shopkit. It turns abstract search
//! criteria into dialect-correct parameterized SQL as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shopkit Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 shopkit-manager (Composition)                   │   │
//! │  │    Decorators ──► Composer ──► Sub-manager resolution           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ shopkit-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │ attribute │  │ criteria  │  │ template  │  │ compiler  │  │   │
//! │  │   │ Registry  │  │  Filter   │  │  Catalog  │  │  Dialect  │  │   │
//! │  │   │  key→col  │  │  Sort     │  │  Tokens   │  │  Compiler │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 shopkit-db (Execution Layer)                    │   │
//! │  │            binds params, runs statements via sqlx               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`attribute`] - Public search key → internal column expression registry
//! - [`criteria`] - Criteria trees, sort specs and result slices
//! - [`template`] - Statement templates, dialect fallback and tokenizer
//! - [`compiler`] - The dialect compiler producing (sql, params)
//! - [`value`] - Typed parameter values
//! - [`error`] - Compilation error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: compiling the same criteria twice yields the same
//!    statement (modulo audit timestamps)
//! 2. **No I/O**: execution belongs to shopkit-db
//! 3. **Values as Parameters**: values never appear in SQL text, only `?`
//!    markers backed by an ordered parameter list
//! 4. **Explicit Errors**: every failure is a typed variant, never a panic
//!
//! ## Example Usage
//!
//! ```rust
//! use shopkit_core::attribute::{AttributeDefinition, AttributeRegistry};
//! use shopkit_core::compiler::{CompileContext, DialectCompiler, FunctionRegistry, Scope};
//! use shopkit_core::criteria::{CompareOp, Criteria, Filter};
//! use shopkit_core::template::StatementCatalog;
//! use shopkit_core::value::{SemanticType, Value};
//!
//! let mut registry = AttributeRegistry::new();
//! registry
//!     .register(AttributeDefinition::new(
//!         "a.id",
//!         "\"t\".\"id\"",
//!         SemanticType::Int,
//!         "ID",
//!     ))
//!     .unwrap();
//!
//! let catalog = StatementCatalog::common();
//! let functions = FunctionRegistry::new();
//! let ctx = CompileContext::new(
//!     &registry,
//!     &catalog,
//!     &functions,
//!     "ansi",
//!     "t",
//!     Scope::new("\"t\".\"siteid\"", "site-1"),
//! );
//!
//! let criteria = Criteria::new()
//!     .with_filter(Filter::compare(&registry, CompareOp::Gt, "a.id", 5i64).unwrap());
//! let stmt = DialectCompiler::new(&ctx).search(&criteria, &["a.id"]).unwrap();
//!
//! assert!(stmt.sql.contains("\"t\".\"id\" > ?"));
//! assert_eq!(stmt.params[0], Value::Int(5));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod attribute;
pub mod compiler;
pub mod criteria;
pub mod error;
pub mod template;
pub mod value;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use shopkit_core::Criteria` instead of
// `use shopkit_core::criteria::Criteria`

pub use attribute::{AttributeDefinition, AttributeRegistry};
pub use compiler::{
    CompileContext, CompiledStatement, DialectCompiler, FunctionRegistry, Rendered, Scope,
};
pub use criteria::{BoolOp, CompareOp, Criteria, Filter, Slice, SortDir, SortSpec, SortTarget};
pub use error::{CoreError, CoreResult};
pub use template::{StatementCatalog, StatementKind, ANSI};
pub use value::{SemanticType, Value};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default slice size when a caller sets no explicit window.
pub const DEFAULT_SLICE_SIZE: u64 = 100;

/// The hard cap on the count subselect.
///
/// ## Why a cap?
/// Exact counts over large joined result sets are the most expensive query
/// a storefront issues, and nobody pages past a five-digit result anyway.
/// Counts saturate at this value instead of scanning further; the cap is
/// baked into the count templates in [`template::StatementCatalog::common`].
pub const COUNT_CAP: u64 = 10_000;
