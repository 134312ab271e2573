use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::defaults;
use crate::dialect::Dialect;
use crate::error::{QueryError, Step};
use crate::introspect::{
    group_index_rows, pg, DialectDriver, RawColumn, RawIndexColumn, RawRelation, RawTable,
};
use crate::schema::{Cardinality, Column, EnumType, Index, IntrospectionResult, Relation, Table};
use crate::typemap::{self, MappedType};

/// Create a Column with sensible defaults for testing.
/// Returns a non-nullable integer column with no default and no comment.
pub fn test_column(name: &str) -> Column {
    Column {
        name: name.to_string(),
        raw_type: "integer".to_string(),
        udt_name: "int4".to_string(),
        type_id: Some(crate::schema::TypeId::Int),
        type_comment: None,
        type_error: None,
        is_nullable: false,
        default: None,
        comment: None,
        is_primary_key: false,
        is_unique: false,
        enum_name: None,
    }
}

pub fn test_table(name: &str) -> Table {
    Table {
        name: name.to_string(),
        comment: None,
        columns: vec![test_column("id")],
        indices: Vec::new(),
    }
}

pub fn test_index(table: &str, name: &str, fields: &[&str], unique: bool) -> Index {
    Index {
        name: name.to_string(),
        table_name: table.to_string(),
        fields: fields.iter().map(|f| f.to_string()).collect(),
        unique,
        is_primary_key: false,
    }
}

pub fn test_relation(
    name: &str,
    source_table: &str,
    source_column: &str,
    target_table: &str,
    target_column: &str,
) -> Relation {
    Relation {
        name: name.to_string(),
        source_table: source_table.to_string(),
        source_column: source_column.to_string(),
        target_schema: "public".to_string(),
        target_table: target_table.to_string(),
        target_column: target_column.to_string(),
        cardinality: Cardinality::ManyToOne,
    }
}

/// Create a raw catalog column of the given Postgres `data_type`.
pub fn raw_column(name: &str, position: i32, data_type: &str) -> RawColumn {
    RawColumn {
        name: name.to_string(),
        ordinal_position: position,
        data_type: data_type.to_string(),
        udt_name: data_type.to_string(),
        is_nullable: true,
        column_default: None,
        is_identity: false,
    }
}

pub fn raw_index_column(
    table: &str,
    index: &str,
    column: &str,
    position: i32,
    is_unique: bool,
    is_primary_key: bool,
) -> RawIndexColumn {
    RawIndexColumn {
        table_name: table.to_string(),
        index_name: index.to_string(),
        column_name: Some(column.to_string()),
        position,
        is_unique,
        is_primary_key,
    }
}

/// In-memory catalog speaking Postgres semantics.
#[derive(Default)]
pub struct FakeDriver {
    pub schemas: Vec<String>,
    pub tables: Vec<RawTable>,
    pub columns: HashMap<String, Vec<RawColumn>>,
    pub comments: HashMap<(String, String), String>,
    pub index_rows: HashMap<String, Vec<RawIndexColumn>>,
    pub relations: HashMap<String, Vec<RawRelation>>,
    pub enums: Vec<EnumType>,
    /// Step and table whose query fails.
    pub fail_on: Option<(Step, String)>,
    /// Artificial latency of the column query per table.
    pub delays: HashMap<String, Duration>,
}

impl FakeDriver {
    pub fn add_table(&mut self, name: &str, columns: Vec<RawColumn>) {
        self.tables.push(RawTable {
            name: name.to_string(),
            comment: None,
        });
        self.columns.insert(name.to_string(), columns);
    }

    fn check(&self, step: Step, table: &str) -> Result<(), QueryError> {
        match &self.fail_on {
            Some((s, t)) if *s == step && t == table => Err(QueryError::Decode(format!(
                "permission denied for table {table}"
            ))),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl DialectDriver for FakeDriver {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn list_schemas(&self) -> Result<Vec<String>, QueryError> {
        Ok(self.schemas.clone())
    }

    fn is_reserved_schema(&self, name: &str) -> bool {
        pg::is_reserved_schema(name)
    }

    async fn list_tables(&self, _schema: &str) -> Result<Vec<RawTable>, QueryError> {
        Ok(self.tables.clone())
    }

    async fn list_columns(&self, _schema: &str, table: &str) -> Result<Vec<RawColumn>, QueryError> {
        if let Some(delay) = self.delays.get(table) {
            tokio::time::sleep(*delay).await;
        }
        self.check(Step::Columns, table)?;
        Ok(self.columns.get(table).cloned().unwrap_or_default())
    }

    async fn column_comment(
        &self,
        _schema: &str,
        table: &str,
        column: &str,
    ) -> Result<Option<String>, QueryError> {
        self.check(Step::Comments, table)?;
        Ok(self
            .comments
            .get(&(table.to_string(), column.to_string()))
            .cloned())
    }

    async fn list_indices(&self, _schema: &str, table: &str) -> Result<Vec<Index>, QueryError> {
        self.check(Step::Indices, table)?;
        Ok(group_index_rows(
            self.index_rows.get(table).cloned().unwrap_or_default(),
        ))
    }

    async fn list_relations(
        &self,
        _schema: &str,
        table: &str,
    ) -> Result<Vec<RawRelation>, QueryError> {
        self.check(Step::Relations, table)?;
        Ok(self.relations.get(table).cloned().unwrap_or_default())
    }

    async fn list_enums(&self, _schema: &str) -> Result<Vec<EnumType>, QueryError> {
        Ok(self.enums.clone())
    }

    fn map_type(&self, raw_type: &str, column: &str, is_primary_key: bool) -> MappedType {
        typemap::pg::map_type(raw_type, column, is_primary_key)
    }

    fn normalize_default(&self, raw: Option<&str>) -> Option<String> {
        defaults::pg::normalize_default(raw)
    }

    fn finalize(&self, result: IntrospectionResult) -> IntrospectionResult {
        pg::harmonize_enums(result)
    }
}
