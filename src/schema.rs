use serde::{Deserialize, Serialize};

use crate::dialect::Dialect;

/// Dialect-independent type tag consumed by downstream data-model generators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeId {
    Uuid,
    Id,
    String,
    Int,
    Float,
    Boolean,
    DateTime,
    Json,
}

/// Normalized description of one introspected schema.
///
/// Built once per introspection run and never published partially: either the
/// whole schema was read or the run failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntrospectionResult {
    pub dialect: Dialect,
    pub schema: String,
    pub tables: Vec<Table>,
    pub relations: Vec<Relation>,
    pub enums: Vec<EnumType>,
}

impl IntrospectionResult {
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Columns whose type could not be mapped, paired with their table name.
    pub fn partial_columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.tables.iter().flat_map(|t| {
            t.columns
                .iter()
                .filter(|c| c.is_partial())
                .map(move |c| (t.name.as_str(), c))
        })
    }
}

/// Metadata for a single table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub comment: Option<String>,
    pub columns: Vec<Column>,
    pub indices: Vec<Index>,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Metadata for a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    /// Type as spelled by the dialect catalog (e.g. `character varying`).
    pub raw_type: String,
    /// Underlying type name (`int4`, `varchar`, or a user-defined type's name).
    pub udt_name: String,
    /// `None` when the raw type has no mapping; see `type_error`.
    pub type_id: Option<TypeId>,
    pub type_comment: Option<String>,
    pub type_error: Option<String>,
    pub is_nullable: bool,
    pub default: Option<String>,
    pub comment: Option<String>,
    pub is_primary_key: bool,
    pub is_unique: bool,
    pub enum_name: Option<String>,
}

impl Column {
    /// A partial column kept in the result even though its type is unmapped.
    pub fn is_partial(&self) -> bool {
        self.type_id.is_none()
    }
}

/// Metadata for a database index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    pub name: String,
    pub table_name: String,
    /// Participating columns in catalog order.
    pub fields: Vec<String>,
    pub unique: bool,
    pub is_primary_key: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cardinality {
    OneToOne,
    ManyToOne,
}

/// One column pair of a foreign key, pointing from source to target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub name: String,
    pub source_table: String,
    pub source_column: String,
    pub target_schema: String,
    pub target_table: String,
    pub target_column: String,
    pub cardinality: Cardinality,
}

/// A user-defined enum type and its labels in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumType {
    pub name: String,
    pub values: Vec<String>,
}
