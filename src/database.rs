//! Database connectivity, catalog introspection and query execution.

mod connection;
pub mod metadata;
mod query;

pub use connection::{build_pool, connect_config, create_pool, ConnectionPool};
pub use metadata::{
    describe_schema, render_schema, Catalog, ColumnInfo, MetadataQueries, TableInfo,
};
pub(crate) use query::truncate_for_log;
pub use query::{QueryExecutor, QueryResult, QueryRunner};
