//! # shopkit-db: Database Execution Layer
//!
//! The only crate in the workspace that touches storage. Compiled
//! statements arrive from the manager layer; this crate binds their
//! parameters and runs them on a SQLite pool.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shopkit Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │           shopkit-manager / shopkit-core                        │   │
//! │  │        criteria → CompiledStatement { sql, params }             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ shopkit-db (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   pool    │  │ executor  │  │  entity   │  │   price   │  │   │
//! │  │   │ WAL, pool │  │ bind+run  │  │ SqlManager│  │  family   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`pool`] - SQLite connection pool (WAL mode)
//! - [`executor`] - Binds and runs compiled statements
//! - [`entity`] - The table-backed `SqlManager` base implementation
//! - [`price`] - The price entity family (price, price/list, price/list/type)
//! - [`error`] - Database error types

// =============================================================================
// Module Declarations
// =============================================================================

pub mod entity;
pub mod error;
pub mod executor;
pub mod pool;
pub mod price;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use entity::{insert_returning_id, SqlManager};
pub use error::{DbError, DbResult};
pub use executor::StatementExecutor;
pub use pool::{Database, DbConfig};
pub use price::register_price_managers;

// =============================================================================
// End-to-End Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use shopkit_core::{CompareOp, Criteria, Filter, SortDir, Value, COUNT_CAP};
    use shopkit_manager::{
        CompositionContext, ConfigSource, DecoratorRegistry, Manager, ManagerContext,
        ManagerRegistry, MemoryConfig, SubManagerResolver,
    };
    use sqlx::Row;
    use std::sync::Arc;

    async fn database() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        for ddl in [
            r#"CREATE TABLE shop_price (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                siteid TEXT NOT NULL,
                typeid INTEGER,
                currencyid TEXT,
                domain TEXT,
                label TEXT,
                quantity INTEGER NOT NULL DEFAULT 1,
                value REAL,
                costs REAL,
                rebate REAL,
                taxrate REAL,
                status INTEGER NOT NULL DEFAULT 0,
                mtime TEXT,
                editor TEXT,
                ctime TEXT
            )"#,
            r#"CREATE TABLE shop_price_list (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                parentid INTEGER NOT NULL,
                siteid TEXT NOT NULL,
                typeid INTEGER,
                domain TEXT,
                refid TEXT,
                start TEXT,
                "end" TEXT,
                config TEXT,
                pos INTEGER,
                status INTEGER,
                mtime TEXT,
                editor TEXT,
                ctime TEXT
            )"#,
            r#"CREATE TABLE shop_price_list_type (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                siteid TEXT NOT NULL,
                code TEXT,
                domain TEXT,
                label TEXT,
                status INTEGER,
                mtime TEXT,
                editor TEXT,
                ctime TEXT
            )"#,
        ] {
            sqlx::query(ddl).execute(db.pool()).await.unwrap();
        }

        db
    }

    fn resolver() -> SubManagerResolver {
        let config: Arc<dyn ConfigSource> = Arc::new(MemoryConfig::empty());
        let ctx = ManagerContext::new("site-1", "tester", "sqlite", config);

        let mut managers = ManagerRegistry::new();
        register_price_managers(&mut managers);

        SubManagerResolver::new(
            ctx,
            managers,
            DecoratorRegistry::with_builtins(),
            CompositionContext::new(),
        )
    }

    fn pairs(values: &[(&str, Value)]) -> Vec<(String, Value)> {
        values
            .iter()
            .map(|(column, value)| (column.to_string(), value.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_price_family_flow() {
        let db = database().await;
        let executor = db.executor();
        let resolver = resolver();

        let prices = resolver.resolve("price").unwrap();
        let lists = resolver.resolve("price/list").unwrap();
        let types = resolver.resolve("price/list/type").unwrap();

        // One type, two prices, one list entry linking price 1 to product 42
        let type_id = insert_returning_id(
            types.as_ref(),
            &executor,
            &pairs(&[
                ("code", Value::from("default")),
                ("domain", Value::from("product")),
                ("label", Value::from("Standard")),
                ("status", Value::Int(1)),
            ]),
        )
        .await
        .unwrap();

        let cheap = insert_returning_id(
            prices.as_ref(),
            &executor,
            &pairs(&[
                ("currencyid", Value::from("EUR")),
                ("domain", Value::from("product")),
                ("quantity", Value::Int(1)),
                ("value", Value::Float(9.99)),
                ("status", Value::Int(1)),
            ]),
        )
        .await
        .unwrap();

        insert_returning_id(
            prices.as_ref(),
            &executor,
            &pairs(&[
                ("currencyid", Value::from("EUR")),
                ("domain", Value::from("product")),
                ("quantity", Value::Int(10)),
                ("value", Value::Float(7.50)),
                ("status", Value::Int(0)),
            ]),
        )
        .await
        .unwrap();

        insert_returning_id(
            lists.as_ref(),
            &executor,
            &pairs(&[
                ("parentid", Value::Int(cheap)),
                ("typeid", Value::Int(type_id)),
                ("domain", Value::from("product")),
                ("refid", Value::from("42")),
                ("pos", Value::Int(0)),
                ("status", Value::Int(1)),
            ]),
        )
        .await
        .unwrap();

        // Search prices attached to product 42 through the list join
        let registry = prices.attributes();
        let criteria = Criteria::new()
            .with_filter(
                Filter::compare(registry, CompareOp::Eq, "price.list.refid", "42").unwrap(),
            )
            .sort_by(registry, SortDir::Asc, "price.value")
            .unwrap();

        let stmt = prices
            .search(&criteria, &["price.id", "price.value"])
            .unwrap();
        let rows = executor.fetch_rows(&stmt).await.unwrap();
        assert_eq!(rows.len(), 1);
        let value: f64 = rows[0].try_get("price.value").unwrap();
        assert!((value - 9.99).abs() < f64::EPSILON);

        // Count sees both prices of the site
        let count_stmt = prices.count(&Criteria::new()).unwrap();
        assert_eq!(executor.fetch_count(&count_stmt).await.unwrap(), 2);

        // Update flips the cheap price's status
        let update = prices
            .update(Value::Int(cheap), &pairs(&[("status", Value::Int(0))]))
            .unwrap();
        assert_eq!(executor.execute(&update).await.unwrap(), 1);

        let active = Criteria::new().with_filter(
            Filter::compare(registry, CompareOp::Eq, "price.status", 1i64).unwrap(),
        );
        let stmt = prices.count(&active).unwrap();
        assert_eq!(executor.fetch_count(&stmt).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_site_partition_is_invisible() {
        let db = database().await;
        let executor = db.executor();
        let resolver = resolver();
        let prices = resolver.resolve("price").unwrap();

        // A foreign site's row, inserted behind the managers' back
        sqlx::query("INSERT INTO shop_price (siteid, value, status) VALUES ('site-2', 1.0, 1)")
            .execute(db.pool())
            .await
            .unwrap();

        insert_returning_id(
            prices.as_ref(),
            &executor,
            &pairs(&[("value", Value::Float(2.0)), ("status", Value::Int(1))]),
        )
        .await
        .unwrap();

        let stmt = prices.count(&Criteria::new()).unwrap();
        assert_eq!(executor.fetch_count(&stmt).await.unwrap(), 1);

        let stmt = prices.search(&Criteria::new(), &["price.value"]).unwrap();
        let rows = executor.fetch_rows(&stmt).await.unwrap();
        assert_eq!(rows.len(), 1);
        let value: f64 = rows[0].try_get("price.value").unwrap();
        assert!((value - 2.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_count_saturates_at_cap() {
        let db = database().await;
        let executor = db.executor();
        let resolver = resolver();
        let types = resolver.resolve("price/list/type").unwrap();

        // One row more than the cap, generated in a single statement
        let total = COUNT_CAP as i64 + 1;
        sqlx::query(
            "WITH RECURSIVE seq(n) AS (SELECT 1 UNION ALL SELECT n + 1 FROM seq WHERE n < ?) \
             INSERT INTO shop_price_list_type (siteid, code, status) \
             SELECT 'site-1', 'code-' || n, 1 FROM seq",
        )
        .bind(total)
        .execute(db.pool())
        .await
        .unwrap();

        let row = sqlx::query("SELECT COUNT(*) FROM shop_price_list_type")
            .fetch_one(db.pool())
            .await
            .unwrap();
        let raw: i64 = row.try_get(0).unwrap();
        assert_eq!(raw, total);

        let stmt = types.count(&Criteria::new()).unwrap();
        assert_eq!(executor.fetch_count(&stmt).await.unwrap(), COUNT_CAP);
    }

    #[tokio::test]
    async fn test_cleanup_clears_family_children_first() {
        let db = database().await;
        let executor = db.executor();
        let resolver = resolver();

        let prices = resolver.resolve("price").unwrap();
        let lists = resolver.resolve("price/list").unwrap();

        let price_id = insert_returning_id(
            prices.as_ref(),
            &executor,
            &pairs(&[("value", Value::Float(3.0)), ("status", Value::Int(1))]),
        )
        .await
        .unwrap();

        insert_returning_id(
            lists.as_ref(),
            &executor,
            &pairs(&[
                ("parentid", Value::Int(price_id)),
                ("domain", Value::from("product")),
                ("refid", Value::from("7")),
            ]),
        )
        .await
        .unwrap();

        let statements = resolver.cleanup("price").unwrap();
        // type, list, then price
        assert_eq!(statements.len(), 3);
        assert!(statements[0].sql.contains("shop_price_list_type"));
        assert!(statements[1].sql.contains("shop_price_list"));

        for stmt in &statements {
            executor.execute(stmt).await.unwrap();
        }

        for table in ["shop_price", "shop_price_list", "shop_price_list_type"] {
            let row = sqlx::query(&format!("SELECT COUNT(*) FROM {}", table))
                .fetch_one(db.pool())
                .await
                .unwrap();
            let count: i64 = row.try_get(0).unwrap();
            assert_eq!(count, 0, "{} not emptied", table);
        }
    }
}
