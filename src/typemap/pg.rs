use crate::schema::TypeId;

use super::MappedType;

/// PostgreSQL types as spelled in `information_schema.columns.data_type`.
///
/// Every integer width collapses to `Int`; the canonical model does not keep
/// the storage width.
pub const TYPE_TABLE: &[(&str, TypeId)] = &[
    ("uuid", TypeId::Uuid),
    ("character", TypeId::String),
    ("character varying", TypeId::String),
    ("text", TypeId::String),
    ("smallint", TypeId::Int),
    ("integer", TypeId::Int),
    ("bigint", TypeId::Int),
    ("real", TypeId::Float),
    ("double precision", TypeId::Float),
    ("numeric", TypeId::Float),
    ("boolean", TypeId::Boolean),
    ("timestamp without time zone", TypeId::DateTime),
    ("timestamp with time zone", TypeId::DateTime),
    ("timestamp", TypeId::DateTime),
    ("date", TypeId::DateTime),
    ("json", TypeId::Json),
    ("jsonb", TypeId::Json),
];

/// Types that may back a primary key identifier.
const ID_CAPABLE: &[&str] = &["character", "character varying", "text", "uuid"];

/// Map a PostgreSQL column type to its canonical identifier.
pub fn map_type(raw_type: &str, column: &str, is_primary_key: bool) -> MappedType {
    if is_primary_key && ID_CAPABLE.contains(&raw_type) {
        return match raw_type {
            "uuid" => MappedType::known(TypeId::Uuid),
            _ => MappedType::known(TypeId::Id),
        };
    }

    TYPE_TABLE
        .iter()
        .find(|(name, _)| *name == raw_type)
        .map(|(_, id)| MappedType::known(*id))
        .unwrap_or_else(|| MappedType::unsupported(raw_type, column))
}
