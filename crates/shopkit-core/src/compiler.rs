//! # Dialect Compiler
//!
//! Turns a criteria tree plus a statement template into backend SQL and an
//! ordered parameter list.
//!
//! ## Compilation Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Criteria → SQL Compilation                          │
//! │                                                                         │
//! │  Criteria tree (public keys)          Statement catalog                 │
//! │       │                                     │                           │
//! │       ▼                                     ▼                           │
//! │  AttributeRegistry resolves         template(kind, dialect)             │
//! │  keys → column exprs + joins        (ansi fallback)                     │
//! │       │                                     │                           │
//! │       └──────────────┬──────────────────────┘                           │
//! │                      ▼                                                  │
//! │              tokenize to Literal/Marker list                            │
//! │                      ▼                                                  │
//! │              walk tokens, substitute fragments,                         │
//! │              append params in emission order                            │
//! │                      ▼                                                  │
//! │              CompiledStatement { sql, params }                          │
//! │                                                                         │
//! │  Values NEVER enter the SQL text. Every comparison emits a `?`          │
//! │  marker and pushes its value onto the parameter list at the same       │
//! │  position the marker appears in the clause.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Scope Filter
//! Every statement is implicitly restricted to the caller's site partition.
//! For search/count the scope condition is ANDed last into `:cond`; for
//! delete/insert/update the generic templates carry fixed `"siteid"`
//! columns/conditions whose parameters are appended after all placeholder
//! parameters.

use chrono::Utc;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

use crate::attribute::AttributeRegistry;
use crate::criteria::{BoolOp, CompareOp, Criteria, Filter, SortTarget};
use crate::error::{CoreError, CoreResult};
use crate::template::{tokenize, Placeholder, StatementCatalog, StatementKind, Token, ANSI};
use crate::value::Value;

// =============================================================================
// Compiled Statement
// =============================================================================

/// Final parameterized SQL plus its ordered parameter list.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledStatement {
    /// The SQL text, containing only `?` value markers.
    pub sql: String,

    /// Parameters in marker order.
    pub params: Vec<Value>,
}

// =============================================================================
// Function Renderer Registry
// =============================================================================

/// A rendered SQL fragment (clause text plus its parameters).
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Renders a named criteria function for one dialect.
///
/// Arguments arrive verbatim from the criteria tree; the renderer produces
/// a dialect-correct expression usable in both `:cond` and `:order`.
pub type FunctionRenderer = Box<dyn Fn(&[Value]) -> CoreResult<Rendered> + Send + Sync>;

/// Per-(function, dialect) rendering rules.
///
/// This is the extension point for backend-specific ranking/relevance
/// expressions: nothing is hard-coded in the compiler. A renderer
/// registered under the `ansi` dialect acts as the fallback for dialects
/// without an explicit rule.
#[derive(Default)]
pub struct FunctionRegistry {
    map: HashMap<(String, String), FunctionRenderer>,
}

impl FunctionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a renderer for a function on a dialect.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        dialect: impl Into<String>,
        renderer: FunctionRenderer,
    ) {
        self.map.insert((name.into(), dialect.into()), renderer);
    }

    /// Renders a function call for a dialect, falling back to the `ansi`
    /// rule.
    ///
    /// ## Errors
    /// * `CoreError::UnsupportedFunction` - no rule for this combination
    pub fn render(&self, name: &str, dialect: &str, args: &[Value]) -> CoreResult<Rendered> {
        let renderer = self
            .map
            .get(&(name.to_string(), dialect.to_string()))
            .or_else(|| self.map.get(&(name.to_string(), ANSI.to_string())))
            .ok_or_else(|| CoreError::UnsupportedFunction {
                name: name.to_string(),
                dialect: dialect.to_string(),
            })?;

        renderer(args)
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.map.keys().collect::<Vec<_>>())
            .finish()
    }
}

// =============================================================================
// Compile Context
// =============================================================================

/// The implicit site scope every statement is restricted to.
#[derive(Debug, Clone, PartialEq)]
pub struct Scope {
    /// Internal siteid expression for search/count conditions,
    /// e.g. `pri."siteid"`.
    pub expr: String,

    /// The caller's site identifier, bound as a parameter.
    pub site_id: String,
}

impl Scope {
    pub fn new(expr: impl Into<String>, site_id: impl Into<String>) -> Self {
        Scope {
            expr: expr.into(),
            site_id: site_id.into(),
        }
    }
}

/// Everything a compilation needs besides the criteria itself.
///
/// Constructed per entity manager; cheap to build per call.
#[derive(Debug)]
pub struct CompileContext<'a> {
    /// The entity's attribute registry.
    pub registry: &'a AttributeRegistry,

    /// The entity's statement catalog.
    pub catalog: &'a StatementCatalog,

    /// Function rendering rules.
    pub functions: &'a FunctionRegistry,

    /// Active backend dialect, e.g. `sqlite`.
    pub dialect: String,

    /// Physical table name (unquoted identifier).
    pub table: String,

    /// The caller's site scope.
    pub scope: Scope,

    /// Editor name written into mtime/editor audit columns.
    pub editor: String,
}

impl<'a> CompileContext<'a> {
    /// Creates a context with the default editor name.
    pub fn new(
        registry: &'a AttributeRegistry,
        catalog: &'a StatementCatalog,
        functions: &'a FunctionRegistry,
        dialect: impl Into<String>,
        table: impl Into<String>,
        scope: Scope,
    ) -> Self {
        CompileContext {
            registry,
            catalog,
            functions,
            dialect: dialect.into(),
            table: table.into(),
            scope,
            editor: "shopkit".to_string(),
        }
    }

    /// Sets the editor name.
    pub fn editor(mut self, editor: impl Into<String>) -> Self {
        self.editor = editor.into();
        self
    }
}

// =============================================================================
// Fragments
// =============================================================================

/// A resolved placeholder: clause text plus the parameters it emits.
#[derive(Debug, Default)]
struct Fragment {
    sql: String,
    params: Vec<Value>,
}

impl Fragment {
    fn text(sql: impl Into<String>) -> Self {
        Fragment {
            sql: sql.into(),
            params: Vec::new(),
        }
    }
}

// =============================================================================
// Dialect Compiler
// =============================================================================

/// Compiles criteria against one entity's context.
#[derive(Debug)]
pub struct DialectCompiler<'a> {
    ctx: &'a CompileContext<'a>,
}

impl<'a> DialectCompiler<'a> {
    pub fn new(ctx: &'a CompileContext<'a>) -> Self {
        DialectCompiler { ctx }
    }

    /// Compiles the `search` statement.
    ///
    /// ## Arguments
    /// * `criteria` - filter, sorts and slice
    /// * `keys` - columns to select; empty selects every visible attribute
    ///
    /// Columns render as `expr AS "key"`, grouping repeats the bare
    /// expressions, and the slice is substituted into whichever pagination
    /// syntax the dialect's template uses.
    pub fn search(&self, criteria: &Criteria, keys: &[&str]) -> CoreResult<CompiledStatement> {
        let keys = self.column_keys(keys);

        let mut columns = Vec::with_capacity(keys.len());
        let mut group = Vec::with_capacity(keys.len());
        for key in &keys {
            let def = self.ctx.registry.resolve(key)?;
            columns.push(format!("{} AS \"{}\"", def.internal_expr, key));
            group.push(def.internal_expr.clone());
        }

        // Joins cover everything the statement references: columns,
        // filter keys and sort keys
        let mut referenced: Vec<&str> = keys.clone();
        referenced.extend(criteria.referenced_keys());
        let joins = self.ctx.registry.joins_for(referenced)?.join("\n");

        let cond = self.scoped_cond(criteria.filter())?;
        let order = self.render_order(criteria, &group)?;
        let slice = criteria.slice_ref();

        let mut fragments = HashMap::new();
        fragments.insert(Placeholder::Table, self.table_fragment()?);
        fragments.insert(Placeholder::Columns, Fragment::text(columns.join(", ")));
        fragments.insert(Placeholder::Joins, Fragment::text(joins));
        fragments.insert(Placeholder::Cond, cond);
        fragments.insert(Placeholder::Group, Fragment::text(group.join(", ")));
        fragments.insert(Placeholder::Order, order);
        fragments.insert(Placeholder::Start, Fragment::text(slice.start.to_string()));
        fragments.insert(Placeholder::Size, Fragment::text(slice.size.to_string()));

        self.substitute(StatementKind::Search, fragments, Vec::new())
    }

    /// Compiles the `count` statement.
    ///
    /// The template wraps an id-only, caller-unsorted, id-ordered subselect
    /// hard-capped at 10000 rows: counts saturate at the cap instead of
    /// paying for an exact count on arbitrarily large result sets.
    pub fn count(&self, criteria: &Criteria) -> CoreResult<CompiledStatement> {
        let referenced: Vec<&str> = match criteria.filter() {
            Some(filter) => {
                let mut keys = Vec::new();
                filter.collect_keys(&mut keys);
                keys
            }
            None => Vec::new(),
        };
        let joins = self.ctx.registry.joins_for(referenced)?.join("\n");

        let mut fragments = HashMap::new();
        fragments.insert(Placeholder::Table, self.table_fragment()?);
        fragments.insert(Placeholder::Joins, Fragment::text(joins));
        fragments.insert(Placeholder::Cond, self.scoped_cond(criteria.filter())?);

        self.substitute(StatementKind::Count, fragments, Vec::new())
    }

    /// Compiles the `delete` statement.
    ///
    /// The template carries the site restriction itself
    /// (`AND "siteid" LIKE ?`), so the scope parameter is appended after
    /// the condition parameters instead of inside `:cond`.
    pub fn delete(&self, filter: Option<&Filter>) -> CoreResult<CompiledStatement> {
        let cond = match filter {
            Some(filter) => self.render_filter(filter)?,
            None => Fragment::text("1=1"),
        };

        let mut fragments = HashMap::new();
        fragments.insert(Placeholder::Table, self.table_fragment()?);
        fragments.insert(Placeholder::Cond, cond);

        let trailing = vec![Value::Str(self.ctx.scope.site_id.clone())];
        self.substitute(StatementKind::Delete, fragments, trailing)
    }

    /// Compiles the `insert` statement.
    ///
    /// `values` are (raw column name, value) pairs. The fixed trailing
    /// `"mtime", "editor", "siteid", "ctime"` columns come from the
    /// template; their parameters are appended after the value parameters.
    pub fn insert(&self, values: &[(String, Value)]) -> CoreResult<CompiledStatement> {
        let mut names = String::new();
        let mut markers = String::new();
        let mut params = Vec::with_capacity(values.len());
        for (column, value) in values {
            validate_identifier(column)?;
            names.push_str(&format!("\"{}\", ", column));
            markers.push_str("?, ");
            params.push(value.clone());
        }

        let mut fragments = HashMap::new();
        fragments.insert(Placeholder::Table, self.table_fragment()?);
        fragments.insert(Placeholder::Names, Fragment::text(names));
        fragments.insert(
            Placeholder::Values,
            Fragment {
                sql: markers,
                params,
            },
        );

        let now = Utc::now();
        let trailing = vec![
            Value::DateTime(now),
            Value::Str(self.ctx.editor.clone()),
            Value::Str(self.ctx.scope.site_id.clone()),
            Value::DateTime(now),
        ];
        self.substitute(StatementKind::Insert, fragments, trailing)
    }

    /// Compiles the `update` statement for one entity row.
    ///
    /// The template appends the fixed `"mtime" = ?, "editor" = ?`
    /// assignments and restricts by siteid and id; those parameters follow
    /// the value parameters.
    pub fn update(&self, id: Value, values: &[(String, Value)]) -> CoreResult<CompiledStatement> {
        let mut names = String::new();
        let mut params = Vec::with_capacity(values.len());
        for (column, value) in values {
            validate_identifier(column)?;
            names.push_str(&format!("\"{}\" = ?, ", column));
            params.push(value.clone());
        }

        let mut fragments = HashMap::new();
        fragments.insert(Placeholder::Table, self.table_fragment()?);
        fragments.insert(
            Placeholder::Names,
            Fragment {
                sql: names,
                params,
            },
        );

        let trailing = vec![
            Value::DateTime(Utc::now()),
            Value::Str(self.ctx.editor.clone()),
            Value::Str(self.ctx.scope.site_id.clone()),
            id,
        ];
        self.substitute(StatementKind::Update, fragments, trailing)
    }

    /// Compiles the `newid` statement.
    ///
    /// Chosen purely by dialect; no placeholders, no parameters.
    pub fn newid(&self) -> CoreResult<CompiledStatement> {
        self.substitute(StatementKind::NewId, HashMap::new(), Vec::new())
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    /// Requested column keys, defaulting to every visible attribute.
    fn column_keys<'k>(&'k self, keys: &[&'k str]) -> Vec<&'k str> {
        if keys.is_empty() {
            self.ctx
                .registry
                .all_visible()
                .iter()
                .map(|d| d.key.as_str())
                .collect()
        } else {
            keys.to_vec()
        }
    }

    fn table_fragment(&self) -> CoreResult<Fragment> {
        validate_identifier(&self.ctx.table)?;
        Ok(Fragment::text(self.ctx.table.clone()))
    }

    /// Renders `:cond` for search/count: the caller's filter (if any)
    /// ANDed with the site scope, scope last.
    fn scoped_cond(&self, filter: Option<&Filter>) -> CoreResult<Fragment> {
        let scope_sql = format!("{} LIKE ?", self.ctx.scope.expr);
        let scope_param = Value::Str(self.ctx.scope.site_id.clone());

        match filter {
            Some(filter) => {
                let mut fragment = self.render_filter(filter)?;
                fragment.sql = format!("{} AND {}", fragment.sql, scope_sql);
                fragment.params.push(scope_param);
                Ok(fragment)
            }
            None => Ok(Fragment {
                sql: scope_sql,
                params: vec![scope_param],
            }),
        }
    }

    /// Renders `:order`: the sort sequence, or the first selected column
    /// ascending when the caller specified no sorts (pagination needs a
    /// stable order).
    fn render_order(&self, criteria: &Criteria, group: &[String]) -> CoreResult<Fragment> {
        if criteria.sorts().is_empty() {
            let expr = group.first().cloned().unwrap_or_else(|| "1".to_string());
            return Ok(Fragment::text(format!("{} ASC", expr)));
        }

        let mut parts = Vec::with_capacity(criteria.sorts().len());
        let mut params = Vec::new();
        for sort in criteria.sorts() {
            match &sort.target {
                SortTarget::Key(key) => {
                    let def = self.ctx.registry.resolve(key)?;
                    parts.push(format!("{} {}", def.internal_expr, sort.dir.sql()));
                }
                SortTarget::Func { name, args } => {
                    let rendered =
                        self.ctx
                            .functions
                            .render(name, &self.ctx.dialect, args)?;
                    parts.push(format!("{} {}", rendered.sql, sort.dir.sql()));
                    params.extend(rendered.params);
                }
            }
        }

        Ok(Fragment {
            sql: parts.join(", "),
            params,
        })
    }

    /// Recursively renders a filter tree into a condition fragment.
    ///
    /// Parameters are appended in the same left-to-right order the clause
    /// text is emitted.
    fn render_filter(&self, filter: &Filter) -> CoreResult<Fragment> {
        match filter {
            Filter::Compare { op, key, value } => self.render_compare(*op, key, value),

            Filter::Combine { op, children } => {
                let mut parts = Vec::with_capacity(children.len());
                let mut params = Vec::new();
                for child in children {
                    let fragment = self.render_filter(child)?;
                    parts.push(fragment.sql);
                    params.extend(fragment.params);
                }

                let sql = match op {
                    _ if parts.is_empty() => match op {
                        BoolOp::And => "1=1".to_string(),
                        BoolOp::Or => "1=0".to_string(),
                        BoolOp::Not => "NOT ( 1=1 )".to_string(),
                    },
                    BoolOp::And => format!("( {} )", parts.join(" AND ")),
                    BoolOp::Or => format!("( {} )", parts.join(" OR ")),
                    BoolOp::Not => format!("NOT ( {} )", parts.join(" AND ")),
                };

                Ok(Fragment { sql, params })
            }

            Filter::Func { name, args } => {
                let rendered = self.ctx.functions.render(name, &self.ctx.dialect, args)?;
                Ok(Fragment {
                    sql: rendered.sql,
                    params: rendered.params,
                })
            }
        }
    }

    fn render_compare(&self, op: CompareOp, key: &str, value: &Value) -> CoreResult<Fragment> {
        let def = self.ctx.registry.resolve(key)?;
        let expr = &def.internal_expr;

        let fragment = match op {
            CompareOp::IsNull => Fragment::text(format!("{} IS NULL", expr)),
            CompareOp::IsNotNull => Fragment::text(format!("{} IS NOT NULL", expr)),

            // Null operands collapse equality into NULL checks
            CompareOp::Eq if value.is_null() => Fragment::text(format!("{} IS NULL", expr)),
            CompareOp::Ne if value.is_null() => Fragment::text(format!("{} IS NOT NULL", expr)),

            CompareOp::In | CompareOp::NotIn => {
                let elements = match value {
                    Value::List(elements) => elements.clone(),
                    other => vec![other.clone()],
                };

                if elements.is_empty() {
                    // Empty operand lists have a fixed truth value
                    let sql = match op {
                        CompareOp::In => "1=0",
                        _ => "1=1",
                    };
                    Fragment::text(sql)
                } else {
                    let markers = vec!["?"; elements.len()].join(", ");
                    let word = if op == CompareOp::In { "IN" } else { "NOT IN" };
                    Fragment {
                        sql: format!("{} {} ({})", expr, word, markers),
                        params: elements,
                    }
                }
            }

            CompareOp::Like => Fragment {
                sql: format!("{} LIKE ?", expr),
                params: vec![value.clone()],
            },

            _ => {
                let symbol = match op {
                    CompareOp::Eq => "=",
                    CompareOp::Ne => "<>",
                    CompareOp::Lt => "<",
                    CompareOp::Le => "<=",
                    CompareOp::Gt => ">",
                    CompareOp::Ge => ">=",
                    // Remaining ops handled above
                    _ => unreachable!(),
                };
                Fragment {
                    sql: format!("{} {} ?", expr, symbol),
                    params: vec![value.clone()],
                }
            }
        };

        Ok(fragment)
    }

    /// Resolves the template, walks its token list and assembles the final
    /// statement. Placeholder parameters land in token order; `trailing`
    /// parameters (the templates' literal `?` markers) are appended last.
    fn substitute(
        &self,
        kind: StatementKind,
        mut fragments: HashMap<Placeholder, Fragment>,
        trailing: Vec<Value>,
    ) -> CoreResult<CompiledStatement> {
        debug!(
            statement = %kind,
            dialect = %self.ctx.dialect,
            table = %self.ctx.table,
            "Compiling statement"
        );

        let template = self.ctx.catalog.template(kind, &self.ctx.dialect)?;
        let tokens = tokenize(kind, template)?;

        let mut sql = String::with_capacity(template.len());
        let mut params = Vec::new();

        for token in tokens {
            match token {
                Token::Literal(text) => sql.push_str(&text),
                Token::Marker(marker) => {
                    let fragment = fragments.remove(&marker).ok_or_else(|| {
                        CoreError::MalformedTemplate {
                            statement: kind.to_string(),
                            placeholder: marker.word().to_string(),
                        }
                    })?;
                    sql.push_str(&fragment.sql);
                    params.extend(fragment.params);
                }
            }
        }

        params.extend(trailing);

        debug!(params = params.len(), "Statement compiled");
        Ok(CompiledStatement { sql, params })
    }
}

/// Rejects identifiers that could smuggle SQL into a statement.
fn validate_identifier(name: &str) -> CoreResult<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(())
    } else {
        Err(CoreError::InvalidIdentifier(name.to_string()))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
