//! # Statement Templates
//!
//! Dialect-keyed statement skeletons and their tokenizer.
//!
//! ## Template Resolution
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     How a Template is Selected                          │
//! │                                                                         │
//! │  catalog.template(Search, "mysql")                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  per-dialect map has "mysql"?  ──yes──►  use it                         │
//! │       │ no                                                              │
//! │       ▼                                                                 │
//! │  per-dialect map has "ansi"?   ──yes──►  use the ANSI fallback          │
//! │       │ no                                                              │
//! │       ▼                                                                 │
//! │  UnsupportedDialect                                                     │
//! │                                                                         │
//! │  `newid` deliberately has NO ansi entry: there is no portable           │
//! │  last-insert-id query, so an unmapped dialect must fail loudly.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Tokenization
//! Templates are parsed into a token list (literal text vs. placeholder
//! markers) instead of being string-replaced. Substitution can therefore
//! never touch literal SQL text, and each placeholder is testable in
//! isolation.

use std::collections::HashMap;
use std::fmt;

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Statement Kinds
// =============================================================================

/// The six statement skeletons every manager carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Delete,
    Insert,
    Update,
    Search,
    Count,
    NewId,
}

impl StatementKind {
    /// All kinds, in catalog order.
    pub const ALL: [StatementKind; 6] = [
        StatementKind::Delete,
        StatementKind::Insert,
        StatementKind::Update,
        StatementKind::Search,
        StatementKind::Count,
        StatementKind::NewId,
    ];
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StatementKind::Delete => "delete",
            StatementKind::Insert => "insert",
            StatementKind::Update => "update",
            StatementKind::Search => "search",
            StatementKind::Count => "count",
            StatementKind::NewId => "newid",
        };
        write!(f, "{}", s)
    }
}

// =============================================================================
// Placeholders & Tokens
// =============================================================================

/// Positional markers a template may contain.
///
/// Value markers (`?`) are not placeholders; they stay literal text and
/// their parameters are appended in left-to-right emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    /// `:table` - physical table name.
    Table,

    /// `:cond` - rendered condition clause.
    Cond,

    /// `:joins` - deduplicated join clauses.
    Joins,

    /// `:columns` - aliased column expression list.
    Columns,

    /// `:group` - GROUP BY expression list.
    Group,

    /// `:order` - ORDER BY expression list.
    Order,

    /// `:names` - insert/update column name list.
    Names,

    /// `:values` - insert value marker list.
    Values,

    /// `:start` - pagination offset.
    Start,

    /// `:size` - pagination limit.
    Size,
}

impl Placeholder {
    /// Maps a placeholder word (without the leading colon) to its marker.
    fn lookup(word: &str) -> Option<Placeholder> {
        match word {
            "table" => Some(Placeholder::Table),
            "cond" => Some(Placeholder::Cond),
            "joins" => Some(Placeholder::Joins),
            "columns" => Some(Placeholder::Columns),
            "group" => Some(Placeholder::Group),
            "order" => Some(Placeholder::Order),
            "names" => Some(Placeholder::Names),
            "values" => Some(Placeholder::Values),
            "start" => Some(Placeholder::Start),
            "size" => Some(Placeholder::Size),
            _ => None,
        }
    }

    /// The placeholder word, without the leading colon.
    pub fn word(&self) -> &'static str {
        match self {
            Placeholder::Table => "table",
            Placeholder::Cond => "cond",
            Placeholder::Joins => "joins",
            Placeholder::Columns => "columns",
            Placeholder::Group => "group",
            Placeholder::Order => "order",
            Placeholder::Names => "names",
            Placeholder::Values => "values",
            Placeholder::Start => "start",
            Placeholder::Size => "size",
        }
    }
}

/// One token of a parsed template.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Literal SQL text, emitted verbatim.
    Literal(String),

    /// A placeholder marker, resolved at compile time.
    Marker(Placeholder),
}

/// Parses a template string into a token list.
///
/// A colon followed by a lowercase word is a placeholder; anything else
/// (including `?` value markers) is literal text.
///
/// ## Errors
/// * `CoreError::MalformedTemplate` - `:word` is not a known placeholder
pub fn tokenize(statement: StatementKind, template: &str) -> CoreResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut chars = template.char_indices().peekable();

    while let Some((_, ch)) = chars.next() {
        if ch != ':' {
            literal.push(ch);
            continue;
        }

        // Read the word after the colon
        let mut word = String::new();
        while let Some(&(_, next)) = chars.peek() {
            if next.is_ascii_lowercase() {
                word.push(next);
                chars.next();
            } else {
                break;
            }
        }

        if word.is_empty() {
            // Bare colon, e.g. inside a time literal
            literal.push(':');
            continue;
        }

        match Placeholder::lookup(&word) {
            Some(marker) => {
                if !literal.is_empty() {
                    tokens.push(Token::Literal(std::mem::take(&mut literal)));
                }
                tokens.push(Token::Marker(marker));
            }
            None => {
                return Err(CoreError::MalformedTemplate {
                    statement: statement.to_string(),
                    placeholder: word,
                });
            }
        }
    }

    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }

    Ok(tokens)
}

// =============================================================================
// Statement Catalog
// =============================================================================

/// The dialect identifier templates fall back to.
pub const ANSI: &str = "ansi";

/// Per-entity statement catalog: statement kind → dialect → template.
///
/// Constructed once per entity type and read-only afterwards. Entities
/// start from [`StatementCatalog::common`] and override the statements
/// that need table aliases or joins.
#[derive(Debug, Clone, Default)]
pub struct StatementCatalog {
    map: HashMap<StatementKind, HashMap<String, String>>,
}

impl StatementCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the template for a statement kind and dialect.
    pub fn set(
        &mut self,
        kind: StatementKind,
        dialect: impl Into<String>,
        template: impl Into<String>,
    ) {
        self.map
            .entry(kind)
            .or_default()
            .insert(dialect.into(), template.into());
    }

    /// Resolves the template for a statement kind and dialect, falling
    /// back to the `ansi` entry.
    ///
    /// ## Errors
    /// * `CoreError::UnsupportedDialect` - neither the dialect nor `ansi`
    ///   has a template
    pub fn template(&self, kind: StatementKind, dialect: &str) -> CoreResult<&str> {
        self.map
            .get(&kind)
            .and_then(|per_dialect| {
                per_dialect
                    .get(dialect)
                    .or_else(|| per_dialect.get(ANSI))
            })
            .map(String::as_str)
            .ok_or_else(|| CoreError::UnsupportedDialect {
                statement: kind.to_string(),
                dialect: dialect.to_string(),
            })
    }

    /// The generic statement catalog shared by all entities.
    ///
    /// ## Contract
    /// This is the bit-exact statement contract of the framework,
    /// including:
    /// - the fixed trailing `"mtime", "editor", "siteid", "ctime"` columns
    ///   on insert and the `"mtime" = ?, "editor" = ?` assignments on
    ///   update
    /// - the id-only, id-grouped, id-ordered count subselect hard-capped
    ///   at 10000 rows (counts saturate at the cap - a deliberate
    ///   accuracy/performance trade-off for exact counts on large sets)
    /// - per-dialect pagination syntax (OFFSET/FETCH vs LIMIT/OFFSET)
    ///   that callers never see
    pub fn common() -> Self {
        let mut catalog = StatementCatalog::new();

        catalog.set(
            StatementKind::Delete,
            ANSI,
            r#"
                DELETE FROM ":table"
                WHERE :cond AND "siteid" LIKE ?
            "#,
        );

        catalog.set(
            StatementKind::Insert,
            ANSI,
            r#"
                INSERT INTO ":table" (
                    :names
                    "mtime", "editor", "siteid", "ctime"
                ) VALUES (
                    :values
                    ?, ?, ?, ?
                )
            "#,
        );

        catalog.set(
            StatementKind::Update,
            ANSI,
            r#"
                UPDATE ":table"
                SET :names "mtime" = ?, "editor" = ?
                WHERE "siteid" LIKE ? AND "id" = ?
            "#,
        );

        catalog.set(
            StatementKind::Search,
            ANSI,
            r#"
                SELECT :columns
                FROM ":table"
                :joins
                WHERE :cond
                GROUP BY :group
                ORDER BY :order
                OFFSET :start ROWS FETCH NEXT :size ROWS ONLY
            "#,
        );
        catalog.set(
            StatementKind::Search,
            "mysql",
            r#"
                SELECT :columns
                FROM ":table"
                :joins
                WHERE :cond
                GROUP BY :group
                ORDER BY :order
                LIMIT :size OFFSET :start
            "#,
        );
        catalog.set(
            StatementKind::Search,
            "sqlite",
            r#"
                SELECT :columns
                FROM ":table"
                :joins
                WHERE :cond
                GROUP BY :group
                ORDER BY :order
                LIMIT :size OFFSET :start
            "#,
        );

        catalog.set(
            StatementKind::Count,
            ANSI,
            r#"
                SELECT COUNT(*) AS "count"
                FROM (
                    SELECT "id"
                    FROM ":table"
                    :joins
                    WHERE :cond
                    GROUP BY "id"
                    ORDER BY "id"
                    OFFSET 0 ROWS FETCH NEXT 10000 ROWS ONLY
                ) AS list
            "#,
        );
        catalog.set(
            StatementKind::Count,
            "mysql",
            r#"
                SELECT COUNT(*) AS "count"
                FROM (
                    SELECT "id"
                    FROM ":table"
                    :joins
                    WHERE :cond
                    GROUP BY "id"
                    ORDER BY "id"
                    LIMIT 10000 OFFSET 0
                ) AS list
            "#,
        );
        catalog.set(
            StatementKind::Count,
            "sqlite",
            r#"
                SELECT COUNT(*) AS "count"
                FROM (
                    SELECT "id"
                    FROM ":table"
                    :joins
                    WHERE :cond
                    GROUP BY "id"
                    ORDER BY "id"
                    LIMIT 10000 OFFSET 0
                ) AS list
            "#,
        );

        // newid is chosen purely by dialect; no placeholders, no params
        catalog.set(StatementKind::NewId, "mysql", "SELECT LAST_INSERT_ID()");
        catalog.set(StatementKind::NewId, "pgsql", "SELECT lastval()");
        catalog.set(StatementKind::NewId, "sqlsrv", "SELECT @@IDENTITY");
        catalog.set(StatementKind::NewId, "sqlite", "SELECT last_insert_rowid()");

        catalog
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_splits_literals_and_markers() {
        let tokens = tokenize(StatementKind::Delete, "DELETE FROM \":table\" WHERE :cond").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Literal("DELETE FROM \"".to_string()),
                Token::Marker(Placeholder::Table),
                Token::Literal("\" WHERE ".to_string()),
                Token::Marker(Placeholder::Cond),
            ]
        );
    }

    #[test]
    fn test_tokenize_keeps_value_markers_literal() {
        let tokens = tokenize(StatementKind::Delete, "WHERE :cond AND \"siteid\" LIKE ?").unwrap();
        assert!(matches!(tokens.last(), Some(Token::Literal(s)) if s.ends_with("LIKE ?")));
    }

    #[test]
    fn test_tokenize_rejects_unknown_placeholder() {
        let err = tokenize(StatementKind::Search, "SELECT :bogus").unwrap_err();
        assert!(matches!(
            err,
            crate::error::CoreError::MalformedTemplate { placeholder, .. } if placeholder == "bogus"
        ));
    }

    #[test]
    fn test_tokenize_bare_colon_is_literal() {
        let tokens = tokenize(StatementKind::Search, "WHERE t.\"x\" = '12:30'").unwrap();
        assert_eq!(tokens.len(), 1);
        // '30' after the colon is not lowercase alpha, so the colon stays literal
        assert!(matches!(&tokens[0], Token::Literal(s) if s.contains("12:30")));
    }

    #[test]
    fn test_dialect_fallback_to_ansi() {
        let catalog = StatementCatalog::common();
        let ansi = catalog.template(StatementKind::Delete, ANSI).unwrap();
        let other = catalog.template(StatementKind::Delete, "pgsql").unwrap();
        assert_eq!(ansi, other);
    }

    #[test]
    fn test_search_differs_per_dialect() {
        let catalog = StatementCatalog::common();
        let ansi = catalog.template(StatementKind::Search, ANSI).unwrap();
        let mysql = catalog.template(StatementKind::Search, "mysql").unwrap();
        assert!(ansi.contains("FETCH NEXT :size ROWS ONLY"));
        assert!(mysql.contains("LIMIT :size OFFSET :start"));
    }

    #[test]
    fn test_newid_has_no_ansi_fallback() {
        let catalog = StatementCatalog::common();
        assert!(catalog.template(StatementKind::NewId, "mysql").is_ok());
        assert!(matches!(
            catalog.template(StatementKind::NewId, ANSI),
            Err(crate::error::CoreError::UnsupportedDialect { .. })
        ));
    }

    #[test]
    fn test_count_carries_hard_cap() {
        let catalog = StatementCatalog::common();
        for dialect in [ANSI, "mysql", "sqlite"] {
            let tpl = catalog.template(StatementKind::Count, dialect).unwrap();
            assert!(tpl.contains("10000"), "cap missing for {}", dialect);
            assert!(tpl.contains("GROUP BY \"id\""));
        }
    }
}
