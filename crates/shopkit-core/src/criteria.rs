//! # Criteria Module
//!
//! Abstract search criteria built from public search keys.
//!
//! ## Criteria Tree
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      How a Criteria Tree Looks                          │
//! │                                                                         │
//! │  "active price list entries for the product domain"                    │
//! │                                                                         │
//! │                    Combine(And)                                         │
//! │                    ├── Compare(==, price.list.domain, "product")        │
//! │                    └── Compare(==, price.list.status, 1)                │
//! │                                                                         │
//! │  Trees reference PUBLIC keys only. Validation happens eagerly at       │
//! │  construction time against the entity's attribute registry; the        │
//! │  compiler can assume every key resolves.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Immutability
//! A tree is immutable once built. Composing a larger tree from sub-trees
//! moves the sub-trees in; there is no back-mutation, and cloning shares
//! nothing mutable.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::attribute::AttributeRegistry;
use crate::error::{CoreError, CoreResult};
use crate::value::Value;

// =============================================================================
// Comparison Operators
// =============================================================================

/// Comparison operators usable in criteria trees.
///
/// The textual forms (`==`, `!=`, `~=`, ...) match the public operator
/// vocabulary exposed to configuration and transport layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    /// Equality (`==`). Compared against `Value::Null` renders IS NULL.
    Eq,

    /// Inequality (`!=`). Compared against `Value::Null` renders IS NOT NULL.
    Ne,

    /// Less than (`<`).
    Lt,

    /// Less than or equal (`<=`).
    Le,

    /// Greater than (`>`).
    Gt,

    /// Greater than or equal (`>=`).
    Ge,

    /// SQL LIKE (`~=`). The value is passed through verbatim; callers
    /// supply their own wildcards.
    Like,

    /// SQL IN. Requires a `Value::List` operand.
    In,

    /// SQL NOT IN. Requires a `Value::List` operand.
    NotIn,

    /// IS NULL. Takes no operand value.
    IsNull,

    /// IS NOT NULL. Takes no operand value.
    IsNotNull,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Like => "~=",
            CompareOp::In => "in",
            CompareOp::NotIn => "not_in",
            CompareOp::IsNull => "null",
            CompareOp::IsNotNull => "not_null",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for CompareOp {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "==" => Ok(CompareOp::Eq),
            "!=" => Ok(CompareOp::Ne),
            "<" => Ok(CompareOp::Lt),
            "<=" => Ok(CompareOp::Le),
            ">" => Ok(CompareOp::Gt),
            ">=" => Ok(CompareOp::Ge),
            "~=" => Ok(CompareOp::Like),
            "in" => Ok(CompareOp::In),
            "not_in" => Ok(CompareOp::NotIn),
            "null" => Ok(CompareOp::IsNull),
            "not_null" => Ok(CompareOp::IsNotNull),
            other => Err(CoreError::UnknownKey(format!("operator '{}'", other))),
        }
    }
}

// =============================================================================
// Boolean Operators
// =============================================================================

/// Boolean combinators over ordered child sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoolOp {
    /// All children must match.
    And,

    /// Any child must match.
    Or,

    /// No child may match. Children are ANDed before negation.
    Not,
}

// =============================================================================
// Filter Tree
// =============================================================================

/// A node of the criteria tree.
///
/// Child order affects generated clause nesting but not semantics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Filter {
    /// Leaf comparison: `key OP value`.
    Compare {
        op: CompareOp,
        key: String,
        value: Value,
    },

    /// Boolean combination over an ordered child sequence.
    Combine { op: BoolOp, children: Vec<Filter> },

    /// Named function with opaque ordered arguments.
    ///
    /// Arguments are passed through verbatim to the per-dialect renderer;
    /// the tree does not validate function semantics.
    Func { name: String, args: Vec<Value> },
}

impl Filter {
    /// Creates a comparison leaf, validating the key against the registry.
    ///
    /// ## Errors
    /// * `CoreError::UnknownKey` - the key is not registered
    pub fn compare(
        registry: &AttributeRegistry,
        op: CompareOp,
        key: &str,
        value: impl Into<Value>,
    ) -> CoreResult<Filter> {
        registry.resolve(key)?;
        Ok(Filter::Compare {
            op,
            key: key.to_string(),
            value: value.into(),
        })
    }

    /// Combines children with AND.
    pub fn and(children: Vec<Filter>) -> Filter {
        Filter::Combine {
            op: BoolOp::And,
            children,
        }
    }

    /// Combines children with OR.
    pub fn or(children: Vec<Filter>) -> Filter {
        Filter::Combine {
            op: BoolOp::Or,
            children,
        }
    }

    /// Negates the AND of the children.
    pub fn not(children: Vec<Filter>) -> Filter {
        Filter::Combine {
            op: BoolOp::Not,
            children,
        }
    }

    /// Creates a function node. Arguments are opaque to the tree.
    pub fn func(name: impl Into<String>, args: Vec<Value>) -> Filter {
        Filter::Func {
            name: name.into(),
            args,
        }
    }

    /// Collects every referenced search key, depth-first in child order.
    pub fn collect_keys<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Filter::Compare { key, .. } => out.push(key),
            Filter::Combine { children, .. } => {
                for child in children {
                    child.collect_keys(out);
                }
            }
            Filter::Func { .. } => {}
        }
    }

    /// Returns the nesting depth of the tree (leaf = 1).
    pub fn depth(&self) -> usize {
        match self {
            Filter::Compare { .. } | Filter::Func { .. } => 1,
            Filter::Combine { children, .. } => {
                1 + children.iter().map(Filter::depth).max().unwrap_or(0)
            }
        }
    }
}

// =============================================================================
// Sorting
// =============================================================================

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    /// The SQL suffix for this direction.
    pub fn sql(&self) -> &'static str {
        match self {
            SortDir::Asc => "ASC",
            SortDir::Desc => "DESC",
        }
    }
}

/// What a sort entry orders by: a registered key or a function expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SortTarget {
    /// A registered search key.
    Key(String),

    /// A named function (e.g. relevance scoring), rendered per dialect.
    Func { name: String, args: Vec<Value> },
}

/// One entry of an ordered sort sequence. The first entry has highest
/// precedence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortSpec {
    pub dir: SortDir,
    pub target: SortTarget,
}

// =============================================================================
// Slice (pagination)
// =============================================================================

/// Requested result window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slice {
    /// Offset of the first row.
    pub start: u64,

    /// Maximum number of rows.
    pub size: u64,
}

impl Default for Slice {
    fn default() -> Self {
        Slice {
            start: 0,
            size: crate::DEFAULT_SLICE_SIZE,
        }
    }
}

// =============================================================================
// Criteria
// =============================================================================

/// A complete search specification: optional filter tree, ordered sort
/// sequence and a result slice.
///
/// ## Usage
/// ```rust
/// use shopkit_core::attribute::{AttributeDefinition, AttributeRegistry};
/// use shopkit_core::criteria::{CompareOp, Criteria, Filter, SortDir};
/// use shopkit_core::value::SemanticType;
///
/// let mut reg = AttributeRegistry::new();
/// reg.register(AttributeDefinition::new(
///     "a.id",
///     "t.\"id\"",
///     SemanticType::Int,
///     "ID",
/// ))
/// .unwrap();
///
/// let criteria = Criteria::new()
///     .with_filter(Filter::compare(&reg, CompareOp::Gt, "a.id", 5i64).unwrap())
///     .sort_by(&reg, SortDir::Asc, "a.id")
///     .unwrap()
///     .slice(0, 25);
/// assert_eq!(criteria.slice_ref().size, 25);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    filter: Option<Filter>,
    sorts: Vec<SortSpec>,
    slice: Slice,
}

impl Criteria {
    /// Creates an empty criteria (no filter, no sort, default slice).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the filter tree.
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Appends a sort entry on a registered key.
    ///
    /// ## Errors
    /// * `CoreError::UnknownKey` - the key is not registered
    pub fn sort_by(
        mut self,
        registry: &AttributeRegistry,
        dir: SortDir,
        key: &str,
    ) -> CoreResult<Self> {
        registry.resolve(key)?;
        self.sorts.push(SortSpec {
            dir,
            target: SortTarget::Key(key.to_string()),
        });
        Ok(self)
    }

    /// Appends a sort entry on a function expression.
    pub fn sort_by_func(mut self, dir: SortDir, name: impl Into<String>, args: Vec<Value>) -> Self {
        self.sorts.push(SortSpec {
            dir,
            target: SortTarget::Func {
                name: name.into(),
                args,
            },
        });
        self
    }

    /// Sets the result slice.
    pub fn slice(mut self, start: u64, size: u64) -> Self {
        self.slice = Slice { start, size };
        self
    }

    /// The filter tree, if any.
    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    /// The sort sequence, highest precedence first.
    pub fn sorts(&self) -> &[SortSpec] {
        &self.sorts
    }

    /// The requested result slice.
    pub fn slice_ref(&self) -> Slice {
        self.slice
    }

    /// Collects every search key referenced by the filter and the sorts.
    pub fn referenced_keys(&self) -> Vec<&str> {
        let mut keys = Vec::new();
        if let Some(filter) = &self.filter {
            filter.collect_keys(&mut keys);
        }
        for sort in &self.sorts {
            if let SortTarget::Key(key) = &sort.target {
                keys.push(key);
            }
        }
        keys
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeDefinition;
    use crate::value::SemanticType;

    fn registry() -> AttributeRegistry {
        let mut reg = AttributeRegistry::new();
        for (key, expr) in [("a.id", "t.\"id\""), ("a.code", "t.\"code\"")] {
            reg.register(AttributeDefinition::new(key, expr, SemanticType::Str, key))
                .unwrap();
        }
        reg
    }

    #[test]
    fn test_compare_validates_key_eagerly() {
        let reg = registry();
        assert!(Filter::compare(&reg, CompareOp::Eq, "a.id", 1i64).is_ok());
        assert!(matches!(
            Filter::compare(&reg, CompareOp::Eq, "a.nope", 1i64),
            Err(CoreError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_sort_validates_key_eagerly() {
        let reg = registry();
        let err = Criteria::new().sort_by(&reg, SortDir::Asc, "a.nope");
        assert!(matches!(err, Err(CoreError::UnknownKey(_))));
    }

    #[test]
    fn test_composition_shares_without_mutation() {
        let reg = registry();
        let leaf = Filter::compare(&reg, CompareOp::Eq, "a.id", 1i64).unwrap();
        let copy = leaf.clone();

        let tree = Filter::and(vec![leaf, Filter::compare(&reg, CompareOp::Ne, "a.code", "x").unwrap()]);

        // Building the larger tree did not change the sub-tree
        if let Filter::Combine { children, .. } = &tree {
            assert_eq!(children[0], copy);
        } else {
            panic!("expected combine node");
        }
    }

    #[test]
    fn test_referenced_keys_cover_filter_and_sorts() {
        let reg = registry();
        let criteria = Criteria::new()
            .with_filter(Filter::and(vec![
                Filter::compare(&reg, CompareOp::Eq, "a.id", 1i64).unwrap(),
                Filter::func("relevance", vec![Value::from("de")]),
            ]))
            .sort_by(&reg, SortDir::Desc, "a.code")
            .unwrap();

        assert_eq!(criteria.referenced_keys(), vec!["a.id", "a.code"]);
    }

    #[test]
    fn test_depth() {
        let reg = registry();
        let leaf = Filter::compare(&reg, CompareOp::Eq, "a.id", 1i64).unwrap();
        assert_eq!(leaf.depth(), 1);

        let nested = Filter::not(vec![Filter::or(vec![
            Filter::compare(&reg, CompareOp::Eq, "a.id", 1i64).unwrap(),
        ])]);
        assert_eq!(nested.depth(), 3);
    }

    #[test]
    fn test_operator_roundtrip() {
        for (text, op) in [
            ("==", CompareOp::Eq),
            ("~=", CompareOp::Like),
            ("not_in", CompareOp::NotIn),
        ] {
            assert_eq!(text.parse::<CompareOp>().unwrap(), op);
            assert_eq!(op.to_string(), text);
        }
    }

    #[test]
    fn test_default_slice() {
        let criteria = Criteria::new();
        assert_eq!(criteria.slice_ref().start, 0);
        assert_eq!(criteria.slice_ref().size, crate::DEFAULT_SLICE_SIZE);
    }
}
