//! Dialect drivers: the catalog queries and type/default semantics of one
//! database engine, behind the [`DialectDriver`] trait consumed by the
//! [`Connector`](crate::connector::Connector).

pub mod mssql;
pub mod pg;

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::dialect::Dialect;
use crate::error::QueryError;
use crate::schema::{Cardinality, EnumType, Index, IntrospectionResult, Relation};
use crate::typemap::MappedType;

/// A table as listed by the catalog, before its columns are fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    pub name: String,
    pub comment: Option<String>,
}

/// A column row as reported by the catalog, before type and default mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawColumn {
    pub name: String,
    pub ordinal_position: i32,
    pub data_type: String,
    /// Underlying type name; for Postgres enums this is the enum's name.
    pub udt_name: String,
    pub is_nullable: bool,
    pub column_default: Option<String>,
    pub is_identity: bool,
}

/// One (index, column) row of an index catalog query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawIndexColumn {
    pub table_name: String,
    pub index_name: String,
    /// `None` for an expression key such as `lower(email)`.
    pub column_name: Option<String>,
    /// 1-based position of the column inside the index key.
    pub position: i32,
    pub is_unique: bool,
    pub is_primary_key: bool,
}

/// One column pair of a foreign key constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRelation {
    pub constraint_name: String,
    pub source_table: String,
    pub source_column: String,
    pub target_schema: String,
    pub target_table: String,
    pub target_column: String,
    pub position: i32,
}

/// Catalog access and dialect semantics for one database engine.
///
/// Every query method returns raw catalog data; the connector owns ordering,
/// mapping, and assembly. Implementations must tolerate concurrent calls.
#[async_trait]
pub trait DialectDriver: Send + Sync {
    fn dialect(&self) -> Dialect;

    /// All schema names, reserved ones included.
    async fn list_schemas(&self) -> Result<Vec<String>, QueryError>;

    /// Whether the schema is internal to the engine.
    fn is_reserved_schema(&self, name: &str) -> bool;

    async fn list_tables(&self, schema: &str) -> Result<Vec<RawTable>, QueryError>;

    async fn list_columns(&self, schema: &str, table: &str) -> Result<Vec<RawColumn>, QueryError>;

    /// Descriptive comment of one column; `None` when there is none.
    async fn column_comment(
        &self,
        schema: &str,
        table: &str,
        column: &str,
    ) -> Result<Option<String>, QueryError>;

    async fn list_indices(&self, schema: &str, table: &str) -> Result<Vec<Index>, QueryError>;

    async fn list_relations(
        &self,
        schema: &str,
        table: &str,
    ) -> Result<Vec<RawRelation>, QueryError>;

    async fn list_enums(&self, _schema: &str) -> Result<Vec<EnumType>, QueryError> {
        Ok(Vec::new())
    }

    fn map_type(&self, raw_type: &str, column: &str, is_primary_key: bool) -> MappedType;

    fn normalize_default(&self, raw: Option<&str>) -> Option<String>;

    /// Dialect-specific post-processing of an assembled result. In-memory only.
    fn finalize(&self, result: IntrospectionResult) -> IntrospectionResult {
        result
    }
}

/// Group per-column index rows into indices.
///
/// Fields are ordered by their key position, never by row arrival order, so a
/// composite index keeps its physical column order. Indices with an expression
/// key are skipped: their column list would not describe what is indexed.
pub fn group_index_rows(rows: Vec<RawIndexColumn>) -> Vec<Index> {
    let mut grouped: BTreeMap<(String, String), (bool, bool, Vec<(i32, Option<String>)>)> =
        BTreeMap::new();

    for row in rows {
        grouped
            .entry((row.table_name, row.index_name))
            .or_insert_with(|| (row.is_unique, row.is_primary_key, Vec::new()))
            .2
            .push((row.position, row.column_name));
    }

    grouped
        .into_iter()
        .filter_map(|((table_name, name), (unique, is_primary_key, mut fields))| {
            fields.sort_by_key(|(position, _)| *position);
            let fields: Option<Vec<String>> =
                fields.into_iter().map(|(_, column)| column).collect();
            let Some(fields) = fields else {
                tracing::debug!("Skipping expression index {}.{}", table_name, name);
                return None;
            };
            Some(Index {
                name,
                table_name,
                fields,
                unique,
                is_primary_key,
            })
        })
        .collect()
}

/// Turn raw foreign-key rows into relations, ordered by constraint and key
/// position. Cardinality starts as `ManyToOne` and is resolved at assembly.
pub fn relations_from_rows(mut rows: Vec<RawRelation>) -> Vec<Relation> {
    rows.sort_by(|a, b| {
        a.constraint_name
            .cmp(&b.constraint_name)
            .then(a.position.cmp(&b.position))
    });
    rows.into_iter()
        .map(|row| Relation {
            name: row.constraint_name,
            source_table: row.source_table,
            source_column: row.source_column,
            target_schema: row.target_schema,
            target_table: row.target_table,
            target_column: row.target_column,
            cardinality: Cardinality::ManyToOne,
        })
        .collect()
}
