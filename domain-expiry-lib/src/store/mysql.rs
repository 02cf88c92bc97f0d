//! MySQL-backed schema discovery and row fetching.
//!
//! Nothing about the backing database is assumed beyond one default table
//! guess: tables are enumerated with `SHOW TABLES`, qualified with
//! `SHOW COLUMNS ... LIKE`, and queried with a parameterized `SELECT`.
//! Introspection failures degrade instead of failing the lookup: a broken
//! `SHOW TABLES` falls back to the default table, and a table that cannot be
//! introspected is skipped.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::mysql::{MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::Row;

use crate::config::DatabaseConfig;
use crate::error::DomainExpiryError;
use crate::store::{ExpiryStore, SchemaLocator};
use crate::types::{
    ExpireValue, ExpiryRecord, TableSchema, DEFAULT_TABLE, DOMAIN_COLUMN, EXPIRE_COLUMN,
};

/// MySQL access for expiry lookups: one connection pool serving both the
/// schema-discovery and row-fetch capabilities.
#[derive(Debug, Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
    default_table: String,
}

impl MySqlStore {
    /// Connect a bounded pool using the given database settings.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DomainExpiryError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(config.connect_options())
            .await?;

        Ok(Self {
            pool,
            default_table: DEFAULT_TABLE.to_string(),
        })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: MySqlPool) -> Self {
        Self {
            pool,
            default_table: DEFAULT_TABLE.to_string(),
        }
    }

    /// Override the table guessed before discovery runs.
    pub fn with_default_table<T: Into<String>>(mut self, table: T) -> Self {
        self.default_table = table.into();
        self
    }

    /// Close the underlying pool. Called on graceful shutdown after the
    /// server has drained.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Whether `table` has a column named exactly `column`.
    ///
    /// Errors count as "no": an uninspectable table is skipped, never fatal.
    async fn has_column(&self, table: &str, column: &str) -> bool {
        let sql = format!(
            "SHOW COLUMNS FROM {} LIKE '{}'",
            quote_identifier(table),
            column
        );

        match sqlx::query(&sql).fetch_all(&self.pool).await {
            Ok(rows) => !rows.is_empty(),
            Err(err) => {
                tracing::debug!(table = %table, column = %column, "column check failed: {}", err);
                false
            }
        }
    }
}

#[async_trait]
impl SchemaLocator for MySqlStore {
    async fn locate(&self) -> Result<Vec<TableSchema>, DomainExpiryError> {
        let mut tables = vec![self.default_table.clone()];

        match sqlx::query("SHOW TABLES").fetch_all(&self.pool).await {
            Ok(rows) => {
                for row in rows {
                    if let Ok(name) = row.try_get::<String, _>(0) {
                        if !tables.contains(&name) {
                            tables.push(name);
                        }
                    }
                }
            }
            Err(err) => {
                tracing::warn!("table enumeration failed, using default table only: {}", err);
            }
        }

        let mut schemas = Vec::new();
        for table in tables {
            if self.has_column(&table, DOMAIN_COLUMN).await
                && self.has_column(&table, EXPIRE_COLUMN).await
            {
                schemas.push(TableSchema::with_default_columns(table));
            } else {
                tracing::debug!(table = %table, "table lacks required columns, skipping");
            }
        }

        Ok(schemas)
    }
}

#[async_trait]
impl ExpiryStore for MySqlStore {
    async fn fetch(
        &self,
        schema: &TableSchema,
        candidates: &[String],
    ) -> Result<Option<ExpiryRecord>, DomainExpiryError> {
        if candidates.is_empty() {
            return Ok(None);
        }

        let sql = build_fetch_sql(schema, candidates.len());

        let mut query = sqlx::query(&sql);
        for candidate in candidates {
            query = query.bind(candidate.trim());
        }
        for candidate in candidates {
            query = query.bind(candidate.as_str());
        }

        let row = query.fetch_optional(&self.pool).await?;
        Ok(row.map(|row| decode_record(&row, schema)))
    }
}

/// Build the single-row lookup query for `schema` with `count` candidates.
///
/// Matches either the trimmed or the raw stored value against the candidate
/// set, mirroring how loosely the data tends to be entered.
fn build_fetch_sql(schema: &TableSchema, count: usize) -> String {
    let placeholders = vec!["?"; count].join(",");
    format!(
        "SELECT {domain}, {expire} FROM {table} WHERE TRIM({domain}) IN ({placeholders}) OR {domain} IN ({placeholders}) LIMIT 1",
        domain = quote_identifier(&schema.domain_column),
        expire = quote_identifier(&schema.expire_column),
        table = quote_identifier(&schema.table),
    )
}

/// Quote a MySQL identifier discovered at runtime.
fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

fn decode_record(row: &MySqlRow, schema: &TableSchema) -> ExpiryRecord {
    let domain_name = row
        .try_get::<Option<String>, _>(schema.domain_column.as_str())
        .ok()
        .flatten();

    ExpiryRecord {
        domain_name,
        expire: decode_expire(row, &schema.expire_column),
    }
}

/// Decode the expiration column without assuming its type.
///
/// Tried in order: TIMESTAMP, DATETIME, DATE, then raw text. A NULL or
/// undecodable value comes back as `None` and reads as "not found" upstream.
fn decode_expire(row: &MySqlRow, column: &str) -> Option<ExpireValue> {
    if let Ok(Some(dt)) = row.try_get::<Option<DateTime<Utc>>, _>(column) {
        return Some(ExpireValue::DateTime(dt.naive_utc()));
    }
    if let Ok(Some(dt)) = row.try_get::<Option<NaiveDateTime>, _>(column) {
        return Some(ExpireValue::DateTime(dt));
    }
    if let Ok(Some(date)) = row.try_get::<Option<NaiveDate>, _>(column) {
        return Some(ExpireValue::Date(date));
    }
    if let Ok(Some(text)) = row.try_get::<Option<String>, _>(column) {
        return Some(ExpireValue::Text(text));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_fetch_sql_shape() {
        let schema = TableSchema::with_default_columns("domains");
        let sql = build_fetch_sql(&schema, 3);

        assert_eq!(
            sql,
            "SELECT `domain_name`, `expire_date` FROM `domains` \
             WHERE TRIM(`domain_name`) IN (?,?,?) OR `domain_name` IN (?,?,?) LIMIT 1"
        );
    }

    #[test]
    fn test_build_fetch_sql_uses_schema_columns() {
        let schema = TableSchema::new("legacy", "name", "expires_at");
        let sql = build_fetch_sql(&schema, 1);

        assert!(sql.contains("FROM `legacy`"));
        assert!(sql.contains("TRIM(`name`) IN (?)"));
        assert!(sql.contains("`expires_at`"));
    }

    #[test]
    fn test_quote_identifier_escapes_backticks() {
        assert_eq!(quote_identifier("domains"), "`domains`");
        assert_eq!(quote_identifier("odd`name"), "`odd``name`");
    }
}
