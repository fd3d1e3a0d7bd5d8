//! # Statement Executor
//!
//! Binds compiled statements and runs them on the pool.
//!
//! ## Execution Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     CompiledStatement → Rows                            │
//! │                                                                         │
//! │  manager.search(criteria, keys)                                         │
//! │       │            CompiledStatement { sql: "... ? ...", params }       │
//! │       ▼                                                                 │
//! │  executor.fetch_rows(&stmt)                                             │
//! │       │  1. sqlx::query(&stmt.sql)                                      │
//! │       │  2. bind each param in order (typed, never inlined)             │
//! │       │  3. fetch on the pool                                           │
//! │       ▼                                                                 │
//! │  Vec<SqliteRow>  (columns named by public search keys)                  │
//! │                                                                         │
//! │  The executor is deliberately dumb: it neither inspects nor rewrites   │
//! │  SQL. Everything it runs was produced by the dialect compiler.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::query::Query;
use sqlx::{Row, Sqlite, SqlitePool};
use tracing::debug;

use shopkit_core::{CompiledStatement, Value};

use crate::error::{DbError, DbResult};

// =============================================================================
// Statement Executor
// =============================================================================

/// Runs compiled statements against a SQLite pool.
#[derive(Debug, Clone)]
pub struct StatementExecutor {
    pool: SqlitePool,
}

impl StatementExecutor {
    pub fn new(pool: SqlitePool) -> Self {
        StatementExecutor { pool }
    }

    /// Runs a search statement and returns the raw rows.
    ///
    /// Result columns are named by public search keys (`price.value`),
    /// matching the `expr AS "key"` column aliases.
    pub async fn fetch_rows(&self, stmt: &CompiledStatement) -> DbResult<Vec<SqliteRow>> {
        debug!(params = stmt.params.len(), "Executing search statement");
        let query = bind_params(sqlx::query(&stmt.sql), &stmt.params)?;
        Ok(query.fetch_all(&self.pool).await?)
    }

    /// Runs a count statement and returns the (saturating) total.
    pub async fn fetch_count(&self, stmt: &CompiledStatement) -> DbResult<u64> {
        let query = bind_params(sqlx::query(&stmt.sql), &stmt.params)?;
        let row = query.fetch_one(&self.pool).await?;
        let count: i64 = row.try_get(0)?;
        Ok(count.max(0) as u64)
    }

    /// Runs a write statement (insert/update/delete) and returns the
    /// number of affected rows.
    pub async fn execute(&self, stmt: &CompiledStatement) -> DbResult<u64> {
        debug!(params = stmt.params.len(), "Executing write statement");
        let query = bind_params(sqlx::query(&stmt.sql), &stmt.params)?;
        let result = query.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    /// Runs a newid statement and returns the last inserted id.
    pub async fn last_insert_id(&self, stmt: &CompiledStatement) -> DbResult<i64> {
        let query = bind_params(sqlx::query(&stmt.sql), &stmt.params)?;
        let row = query.fetch_one(&self.pool).await?;
        Ok(row.try_get(0)?)
    }
}

/// Binds parameters in order.
///
/// ## Errors
/// * `DbError::UnboundList` - a `Value::List` survived compilation
fn bind_params<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    params: &[Value],
) -> DbResult<Query<'q, Sqlite, SqliteArguments<'q>>> {
    for (position, value) in params.iter().enumerate() {
        query = match value {
            Value::Int(v) => query.bind(*v),
            Value::Float(v) => query.bind(*v),
            Value::Str(s) => query.bind(s.clone()),
            Value::Bool(b) => query.bind(*b),
            Value::DateTime(dt) => query.bind(*dt),
            Value::Null => query.bind(Option::<String>::None),
            Value::List(_) => return Err(DbError::UnboundList(position)),
        };
    }
    Ok(query)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_param_rejected() {
        let query = sqlx::query("SELECT ?");
        let err = match bind_params(query, &[Value::List(vec![Value::Int(1)])]) {
            Err(err) => err,
            Ok(_) => panic!("expected list param to be rejected"),
        };
        assert!(matches!(err, DbError::UnboundList(0)));
    }

    #[tokio::test]
    async fn test_bind_and_fetch_roundtrip() {
        // `last_insert_rowid()` is per-connection; pin the in-memory pool to
        // one connection so it sees the preceding INSERT.
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query("CREATE TABLE t (id INTEGER PRIMARY KEY, code TEXT, status INTEGER)")
            .execute(&pool)
            .await
            .unwrap();

        let executor = StatementExecutor::new(pool);

        let insert = CompiledStatement {
            sql: "INSERT INTO t (code, status) VALUES (?, ?)".to_string(),
            params: vec![Value::from("default"), Value::Int(1)],
        };
        assert_eq!(executor.execute(&insert).await.unwrap(), 1);

        let newid = CompiledStatement {
            sql: "SELECT last_insert_rowid()".to_string(),
            params: Vec::new(),
        };
        assert_eq!(executor.last_insert_id(&newid).await.unwrap(), 1);

        let select = CompiledStatement {
            sql: "SELECT code FROM t WHERE status = ?".to_string(),
            params: vec![Value::Int(1)],
        };
        let rows = executor.fetch_rows(&select).await.unwrap();
        assert_eq!(rows.len(), 1);
        let code: String = rows[0].try_get("code").unwrap();
        assert_eq!(code, "default");

        let count = CompiledStatement {
            sql: "SELECT COUNT(*) FROM t".to_string(),
            params: Vec::new(),
        };
        assert_eq!(executor.fetch_count(&count).await.unwrap(), 1);
    }
}
