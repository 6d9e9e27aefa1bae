//! Catalog introspection and schema description rendering.

use crate::database::ConnectionPool;
use crate::error::ServerError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Column metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    /// Declared type as reported by the catalog.
    pub data_type: String,
}

/// Table metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
}

impl TableInfo {
    /// Create a table from `(name, type)` column pairs.
    pub fn new(name: impl Into<String>, columns: &[(&str, &str)]) -> Self {
        Self {
            name: name.into(),
            columns: columns
                .iter()
                .map(|(n, t)| ColumnInfo {
                    name: n.to_string(),
                    data_type: t.to_string(),
                })
                .collect(),
        }
    }

    /// Render as a single schema description line.
    pub fn describe(&self) -> String {
        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("{} ({})", c.name, c.data_type))
            .collect();
        format!("Table {}: {}", self.name, columns.join(", "))
    }
}

/// Source of table and column metadata.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// List tables in catalog order, each with its columns in ordinal order.
    async fn list_tables(&self) -> Result<Vec<TableInfo>, ServerError>;
}

/// Render tables as a schema description, one line per table.
pub fn render_schema(tables: &[TableInfo]) -> String {
    tables
        .iter()
        .map(TableInfo::describe)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Read the catalog and render its schema description.
///
/// Errors from the catalog propagate as returned.
pub async fn describe_schema(catalog: &dyn Catalog) -> Result<String, ServerError> {
    let tables = catalog.list_tables().await?;
    debug!("Described {} tables", tables.len());
    Ok(render_schema(&tables))
}

/// Tables of the current schema, in the order `pg_class` returns them.
const LIST_TABLES_SQL: &str = r#"
    SELECT c.relname::text AS table_name
    FROM pg_catalog.pg_class c
    JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
    WHERE n.nspname = current_schema()
      AND c.relkind IN ('r', 'p')
"#;

/// Columns of every table in the current schema with their declared types.
const LIST_COLUMNS_SQL: &str = r#"
    SELECT
        c.relname::text AS table_name,
        a.attname::text AS column_name,
        upper(pg_catalog.format_type(a.atttypid, a.atttypmod)) AS data_type
    FROM pg_catalog.pg_attribute a
    JOIN pg_catalog.pg_class c ON c.oid = a.attrelid
    JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
    WHERE n.nspname = current_schema()
      AND c.relkind IN ('r', 'p')
      AND a.attnum > 0
      AND NOT a.attisdropped
    ORDER BY a.attrelid, a.attnum
"#;

/// PostgreSQL catalog queries.
pub struct MetadataQueries {
    pool: ConnectionPool,
}

impl MetadataQueries {
    /// Create a new metadata query builder.
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Catalog for MetadataQueries {
    async fn list_tables(&self) -> Result<Vec<TableInfo>, ServerError> {
        let conn = self.pool.get().await?;

        let table_rows = conn
            .query(LIST_TABLES_SQL, &[])
            .await
            .map_err(introspection_error)?;
        let column_rows = conn
            .query(LIST_COLUMNS_SQL, &[])
            .await
            .map_err(introspection_error)?;

        let mut columns: HashMap<String, Vec<ColumnInfo>> = HashMap::new();
        for row in &column_rows {
            let table: String = row.try_get(0).map_err(introspection_error)?;
            columns.entry(table).or_default().push(ColumnInfo {
                name: row.try_get(1).map_err(introspection_error)?,
                data_type: row.try_get(2).map_err(introspection_error)?,
            });
        }

        table_rows
            .iter()
            .map(|row| -> Result<TableInfo, ServerError> {
                let name: String = row.try_get(0).map_err(introspection_error)?;
                let columns = columns.remove(&name).unwrap_or_default();
                Ok(TableInfo { name, columns })
            })
            .collect()
    }
}

fn introspection_error(e: tokio_postgres::Error) -> ServerError {
    reclassify_introspection(ServerError::from(e))
}

/// Catalog queries are fixed, so a database error there is a server fault
/// rather than a problem with generated SQL. Connection failures keep their
/// own category.
fn reclassify_introspection(err: ServerError) -> ServerError {
    match err {
        ServerError::Execution { message, .. } => {
            ServerError::internal(format!("Schema introspection failed: {message}"))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedCatalog(Vec<TableInfo>);

    #[async_trait]
    impl Catalog for FixedCatalog {
        async fn list_tables(&self) -> Result<Vec<TableInfo>, ServerError> {
            Ok(self.0.clone())
        }
    }

    struct BrokenCatalog;

    #[async_trait]
    impl Catalog for BrokenCatalog {
        async fn list_tables(&self) -> Result<Vec<TableInfo>, ServerError> {
            Err(ServerError::connection("catalog unavailable"))
        }
    }

    #[test]
    fn test_table_line() {
        let table = TableInfo::new("users", &[("id", "INTEGER"), ("name", "TEXT")]);
        assert_eq!(table.describe(), "Table users: id (INTEGER), name (TEXT)");
    }

    #[tokio::test]
    async fn test_catalog_order_is_preserved() {
        let catalog = FixedCatalog(vec![
            TableInfo::new("zebras", &[("id", "INTEGER")]),
            TableInfo::new("apples", &[("id", "INTEGER"), ("kind", "CHARACTER VARYING(20)")]),
        ]);

        let description = describe_schema(&catalog).await.unwrap();
        assert_eq!(
            description,
            "Table zebras: id (INTEGER)\nTable apples: id (INTEGER), kind (CHARACTER VARYING(20))"
        );
    }

    #[tokio::test]
    async fn test_empty_catalog_renders_empty_string() {
        let description = describe_schema(&FixedCatalog(Vec::new())).await.unwrap();
        assert_eq!(description, "");
    }

    #[tokio::test]
    async fn test_catalog_errors_propagate() {
        let err = describe_schema(&BrokenCatalog).await.unwrap_err();
        assert!(matches!(err, ServerError::Connection { .. }));
    }

    #[test]
    fn test_catalog_query_errors_are_internal() {
        let err = reclassify_introspection(ServerError::execution_with_state(
            "permission denied for table pg_class",
            "42501",
        ));
        assert!(matches!(err, ServerError::Internal(_)));
        assert_eq!(
            err.status_code(),
            axum::http::StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            err.to_string(),
            "Internal error: Schema introspection failed: permission denied for table pg_class"
        );
    }

    #[test]
    fn test_catalog_connection_errors_keep_category() {
        let err = reclassify_introspection(ServerError::connection("Connection closed"));
        assert!(matches!(err, ServerError::Connection { .. }));
    }

    #[test]
    fn test_table_without_columns() {
        let table = TableInfo::new("empty", &[]);
        assert_eq!(table.describe(), "Table empty: ");
    }
}
