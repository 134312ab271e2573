use tiberius::Client;
use tokio::net::TcpStream;
use tokio_util::compat::Compat;

use crate::error::QueryError;
use crate::introspect::RawRelation;

use super::required_str;

pub async fn query_relations(
    client: &mut Client<Compat<TcpStream>>,
    schema: &str,
    table_name: &str,
) -> Result<Vec<RawRelation>, QueryError> {
    let query = r#"
        SELECT
            fk.name AS constraint_name,
            OBJECT_NAME(fk.parent_object_id) AS source_table,
            COL_NAME(fkc.parent_object_id, fkc.parent_column_id) AS source_column,
            SCHEMA_NAME(ref_t.schema_id) AS target_schema,
            ref_t.name AS target_table,
            COL_NAME(fkc.referenced_object_id, fkc.referenced_column_id) AS target_column,
            fkc.constraint_column_id AS position
        FROM sys.foreign_keys fk
        JOIN sys.foreign_key_columns fkc ON fkc.constraint_object_id = fk.object_id
        JOIN sys.tables ref_t ON ref_t.object_id = fk.referenced_object_id
        WHERE fk.parent_object_id = OBJECT_ID(QUOTENAME(@P1) + '.' + QUOTENAME(@P2))
        ORDER BY fk.name, fkc.constraint_column_id
    "#;

    let stream = client.query(query, &[&schema, &table_name]).await?;
    let rows = stream.into_first_result().await?;

    let mut relations = Vec::with_capacity(rows.len());
    for row in rows {
        relations.push(RawRelation {
            constraint_name: required_str(&row, "constraint_name")?,
            source_table: required_str(&row, "source_table")?,
            source_column: required_str(&row, "source_column")?,
            target_schema: required_str(&row, "target_schema")?,
            target_table: required_str(&row, "target_table")?,
            target_column: required_str(&row, "target_column")?,
            position: row.try_get::<i32, _>("position")?.unwrap_or(0),
        });
    }

    Ok(relations)
}
