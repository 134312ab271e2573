use crate::schema::TypeId;

use super::MappedType;

/// MSSQL types as reported (lowercased) by `INFORMATION_SCHEMA.COLUMNS.DATA_TYPE`.
pub const TYPE_TABLE: &[(&str, TypeId)] = &[
    ("uniqueidentifier", TypeId::Uuid),
    ("char", TypeId::String),
    ("varchar", TypeId::String),
    ("nchar", TypeId::String),
    ("nvarchar", TypeId::String),
    ("text", TypeId::String),
    ("ntext", TypeId::String),
    ("tinyint", TypeId::Int),
    ("smallint", TypeId::Int),
    ("int", TypeId::Int),
    ("bigint", TypeId::Int),
    ("real", TypeId::Float),
    ("float", TypeId::Float),
    ("decimal", TypeId::Float),
    ("numeric", TypeId::Float),
    ("money", TypeId::Float),
    ("smallmoney", TypeId::Float),
    ("bit", TypeId::Boolean),
    ("date", TypeId::DateTime),
    ("datetime", TypeId::DateTime),
    ("datetime2", TypeId::DateTime),
    ("smalldatetime", TypeId::DateTime),
    ("datetimeoffset", TypeId::DateTime),
];

const ID_CAPABLE: &[&str] = &[
    "char",
    "varchar",
    "nchar",
    "nvarchar",
    "text",
    "ntext",
    "uniqueidentifier",
];

/// Map a MSSQL column type to its canonical identifier.
pub fn map_type(raw_type: &str, column: &str, is_primary_key: bool) -> MappedType {
    let dt = raw_type.to_ascii_lowercase();

    if is_primary_key && ID_CAPABLE.contains(&dt.as_str()) {
        return match dt.as_str() {
            "uniqueidentifier" => MappedType::known(TypeId::Uuid),
            _ => MappedType::known(TypeId::Id),
        };
    }

    TYPE_TABLE
        .iter()
        .find(|(name, _)| *name == dt)
        .map(|(_, id)| MappedType::known(*id))
        .unwrap_or_else(|| MappedType::unsupported(raw_type, column))
}
