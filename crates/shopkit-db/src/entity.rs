//! # SQL Entity Manager
//!
//! The shared base implementation behind every entity manager.
//!
//! ## One Struct, Many Entities
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SqlManager                                       │
//! │                                                                         │
//! │  price::standard(ctx) ──────────┐                                       │
//! │  price::list::standard(ctx) ────┼──► SqlManager {                       │
//! │  price::list_type::standard(ctx)┘      table, scope expr,               │
//! │                                        attribute registry,              │
//! │                                        statement catalog,               │
//! │                                        sub-domain list }                │
//! │                                                                         │
//! │  What differs between entities is pure data: the table, the key →      │
//! │  column catalog and the aliased search/count templates. The Manager    │
//! │  impl itself is identical, so it lives here once.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use shopkit_core::{
    AttributeRegistry, CompileContext, CompiledStatement, Criteria, DialectCompiler, Filter,
    FunctionRegistry, Scope, StatementCatalog, Value,
};
use shopkit_manager::{Capability, Manager, ManagerContext, ManagerResult, REQUIRED_CAPABILITIES};

use crate::error::DbResult;
use crate::executor::StatementExecutor;

// =============================================================================
// SQL Manager
// =============================================================================

/// A table-backed entity manager.
///
/// Holds the entity's compilation inputs and the caller's scope; every
/// operation builds a fresh compile context over them.
pub struct SqlManager {
    domain: String,
    table: String,
    scope_expr: String,
    dialect: String,
    site_id: String,
    editor: String,
    attributes: AttributeRegistry,
    catalog: StatementCatalog,
    functions: FunctionRegistry,
    sub_domains: Vec<String>,
}

impl SqlManager {
    /// Creates a manager for one entity table.
    ///
    /// ## Arguments
    /// * `domain` - domain path, e.g. `price/list`
    /// * `table` - physical table name, e.g. `shop_price_list`
    /// * `scope_expr` - aliased siteid expression, e.g. `prili."siteid"`
    /// * `ctx` - dialect, site and editor of the caller
    pub fn new(
        domain: impl Into<String>,
        table: impl Into<String>,
        scope_expr: impl Into<String>,
        ctx: &ManagerContext,
        attributes: AttributeRegistry,
        catalog: StatementCatalog,
        sub_domains: Vec<String>,
    ) -> Self {
        SqlManager {
            domain: domain.into(),
            table: table.into(),
            scope_expr: scope_expr.into(),
            dialect: ctx.dialect.clone(),
            site_id: ctx.site_id.clone(),
            editor: ctx.editor.clone(),
            attributes,
            catalog,
            functions: FunctionRegistry::new(),
            sub_domains,
        }
    }

    /// Replaces the function renderer registry.
    pub fn with_functions(mut self, functions: FunctionRegistry) -> Self {
        self.functions = functions;
        self
    }

    fn context(&self) -> CompileContext<'_> {
        CompileContext::new(
            &self.attributes,
            &self.catalog,
            &self.functions,
            self.dialect.as_str(),
            self.table.as_str(),
            Scope::new(self.scope_expr.as_str(), self.site_id.as_str()),
        )
        .editor(self.editor.as_str())
    }
}

impl Manager for SqlManager {
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

    fn search(&self, criteria: &Criteria, keys: &[&str]) -> ManagerResult<CompiledStatement> {
        let ctx = self.context();
        Ok(DialectCompiler::new(&ctx).search(criteria, keys)?)
    }

    fn count(&self, criteria: &Criteria) -> ManagerResult<CompiledStatement> {
        let ctx = self.context();
        Ok(DialectCompiler::new(&ctx).count(criteria)?)
    }

    fn delete(&self, filter: Option<&Filter>) -> ManagerResult<CompiledStatement> {
        let ctx = self.context();
        Ok(DialectCompiler::new(&ctx).delete(filter)?)
    }

    fn insert(&self, values: &[(String, Value)]) -> ManagerResult<CompiledStatement> {
        let ctx = self.context();
        Ok(DialectCompiler::new(&ctx).insert(values)?)
    }

    fn update(&self, id: Value, values: &[(String, Value)]) -> ManagerResult<CompiledStatement> {
        let ctx = self.context();
        Ok(DialectCompiler::new(&ctx).update(id, values)?)
    }

    fn newid(&self) -> ManagerResult<CompiledStatement> {
        let ctx = self.context();
        Ok(DialectCompiler::new(&ctx).newid()?)
    }
}

// =============================================================================
// Aliased Statement Catalogs
// =============================================================================

/// Builds an entity catalog whose search/count statements alias the base
/// table.
///
/// The generic templates select `FROM ":table"` without an alias, which
/// cannot support joined attributes. Entities override search and count
/// with `FROM ":table" AS <alias>` so their aliased column expressions
/// and join clauses resolve; delete/insert/update keep the generic,
/// unaliased shape.
pub(crate) fn aliased_catalog(alias: &str) -> shopkit_core::StatementCatalog {
    use shopkit_core::{StatementKind, ANSI};

    let mut catalog = shopkit_core::StatementCatalog::common();

    let search = |pagination: &str| {
        format!(
            r#"
                SELECT :columns
                FROM ":table" AS {alias}
                :joins
                WHERE :cond
                GROUP BY :group
                ORDER BY :order
                {pagination}
            "#
        )
    };
    catalog.set(
        StatementKind::Search,
        ANSI,
        search("OFFSET :start ROWS FETCH NEXT :size ROWS ONLY"),
    );
    catalog.set(
        StatementKind::Search,
        "mysql",
        search("LIMIT :size OFFSET :start"),
    );
    catalog.set(
        StatementKind::Search,
        "sqlite",
        search("LIMIT :size OFFSET :start"),
    );

    let count = |cap: &str| {
        format!(
            r#"
                SELECT COUNT(*) AS "count"
                FROM (
                    SELECT {alias}."id"
                    FROM ":table" AS {alias}
                    :joins
                    WHERE :cond
                    GROUP BY {alias}."id"
                    ORDER BY {alias}."id"
                    {cap}
                ) AS list
            "#
        )
    };
    catalog.set(
        StatementKind::Count,
        ANSI,
        count("OFFSET 0 ROWS FETCH NEXT 10000 ROWS ONLY"),
    );
    catalog.set(StatementKind::Count, "mysql", count("LIMIT 10000 OFFSET 0"));
    catalog.set(StatementKind::Count, "sqlite", count("LIMIT 10000 OFFSET 0"));

    catalog
}

// =============================================================================
// Execution Helpers
// =============================================================================

/// Compiles and runs an insert, returning the new row id.
pub async fn insert_returning_id(
    manager: &dyn Manager,
    executor: &StatementExecutor,
    values: &[(String, Value)],
) -> DbResult<i64> {
    executor.execute(&manager.insert(values)?).await?;
    executor.last_insert_id(&manager.newid()?).await
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use shopkit_core::SemanticType;
    use shopkit_manager::{ConfigSource, MemoryConfig};
    use std::sync::Arc;

    fn manager() -> SqlManager {
        let config: Arc<dyn ConfigSource> = Arc::new(MemoryConfig::empty());
        let ctx = ManagerContext::new("site-1", "tester", "sqlite", config);

        let mut attributes = AttributeRegistry::new();
        attributes
            .register(shopkit_core::AttributeDefinition::new(
                "thing.code",
                "\"thing\".\"code\"",
                SemanticType::Str,
                "Code",
            ))
            .unwrap();

        SqlManager::new(
            "thing",
            "shop_thing",
            "\"thing\".\"siteid\"",
            &ctx,
            attributes,
            StatementCatalog::common(),
            vec!["part".to_string()],
        )
    }

    #[test]
    fn test_manager_carries_context() {
        let mgr = manager();
        assert_eq!(mgr.domain(), "thing");
        assert_eq!(mgr.sub_domains(), ["part".to_string()]);
        assert_eq!(mgr.capabilities(), REQUIRED_CAPABILITIES);
    }

    #[test]
    fn test_operations_use_dialect_and_scope() {
        let mgr = manager();

        let stmt = mgr.search(&Criteria::new(), &[]).unwrap();
        assert!(stmt.sql.contains("FROM \"shop_thing\""));
        assert!(stmt.sql.contains("LIMIT 100 OFFSET 0")); // sqlite pagination
        assert_eq!(stmt.params, vec![Value::Str("site-1".to_string())]);

        let stmt = mgr.newid().unwrap();
        assert_eq!(stmt.sql, "SELECT last_insert_rowid()");

        let stmt = mgr.update(Value::Int(9), &[]).unwrap();
        // Editor comes from the manager context
        assert_eq!(stmt.params[1], Value::Str("tester".to_string()));
    }
}
