mod columns;
mod constraints;
mod enums;
mod indexes;
mod tables;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::defaults;
use crate::dialect::Dialect;
use crate::error::{IntrospectError, QueryError};
use crate::introspect::{DialectDriver, RawColumn, RawRelation, RawTable};
use crate::schema::{EnumType, Index, IntrospectionResult, TypeId};
use crate::typemap::{self, MappedType};

/// `information_schema.columns.data_type` of enum (and other user-defined) columns.
const USER_DEFINED: &str = "USER-DEFINED";

/// PostgreSQL driver over a sqlx pool.
///
/// The pool hands each concurrent query its own connection.
#[derive(Debug, Clone)]
pub struct PostgresDriver {
    pool: PgPool,
}

impl PostgresDriver {
    pub fn new(pool: PgPool) -> Self {
        PostgresDriver { pool }
    }

    /// Open a pool sized for the requested per-table fan-out.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, IntrospectError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect(url)
            .await
            .map_err(|e| IntrospectError::Connection(e.to_string()))?;
        Ok(PostgresDriver::new(pool))
    }
}

/// Schemas owned by the server: the `pg_` catalog family and `information_schema`.
pub fn is_reserved_schema(name: &str) -> bool {
    name.starts_with("pg_") || name == "information_schema"
}

/// Resolve `USER-DEFINED` columns that are enums of the introspected schema.
///
/// Enum columns become `String` with the enum's name attached; other
/// user-defined types keep their diagnostic.
pub fn harmonize_enums(mut result: IntrospectionResult) -> IntrospectionResult {
    for table in &mut result.tables {
        for column in &mut table.columns {
            if column.raw_type != USER_DEFINED {
                continue;
            }
            if result.enums.iter().any(|e| e.name == column.udt_name) {
                column.type_id = Some(TypeId::String);
                column.type_comment = None;
                column.type_error = None;
                column.enum_name = Some(column.udt_name.clone());
            }
        }
    }
    result
}

#[async_trait]
impl DialectDriver for PostgresDriver {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn list_schemas(&self) -> Result<Vec<String>, QueryError> {
        tables::query_schemas(&self.pool).await
    }

    fn is_reserved_schema(&self, name: &str) -> bool {
        is_reserved_schema(name)
    }

    async fn list_tables(&self, schema: &str) -> Result<Vec<RawTable>, QueryError> {
        tables::query_tables(&self.pool, schema).await
    }

    async fn list_columns(&self, schema: &str, table: &str) -> Result<Vec<RawColumn>, QueryError> {
        columns::query_columns(&self.pool, schema, table).await
    }

    async fn column_comment(
        &self,
        schema: &str,
        table: &str,
        column: &str,
    ) -> Result<Option<String>, QueryError> {
        columns::query_column_comment(&self.pool, schema, table, column).await
    }

    async fn list_indices(&self, schema: &str, table: &str) -> Result<Vec<Index>, QueryError> {
        indexes::query_indexes(&self.pool, schema, table).await
    }

    async fn list_relations(
        &self,
        schema: &str,
        table: &str,
    ) -> Result<Vec<RawRelation>, QueryError> {
        constraints::query_relations(&self.pool, schema, table).await
    }

    async fn list_enums(&self, schema: &str) -> Result<Vec<EnumType>, QueryError> {
        enums::query_enums(&self.pool, schema).await
    }

    fn map_type(&self, raw_type: &str, column: &str, is_primary_key: bool) -> MappedType {
        typemap::pg::map_type(raw_type, column, is_primary_key)
    }

    fn normalize_default(&self, raw: Option<&str>) -> Option<String> {
        defaults::pg::normalize_default(raw)
    }

    fn finalize(&self, result: IntrospectionResult) -> IntrospectionResult {
        harmonize_enums(result)
    }
}
