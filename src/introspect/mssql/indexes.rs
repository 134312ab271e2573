use tiberius::Client;
use tokio::net::TcpStream;
use tokio_util::compat::Compat;

use crate::error::QueryError;
use crate::introspect::{group_index_rows, RawIndexColumn};
use crate::schema::Index;

use super::required_str;

pub async fn query_indexes(
    client: &mut Client<Compat<TcpStream>>,
    schema: &str,
    table_name: &str,
) -> Result<Vec<Index>, QueryError> {
    let query = r#"
        SELECT
            OBJECT_NAME(i.object_id) AS table_name,
            i.name AS index_name,
            i.is_unique,
            i.is_primary_key,
            COL_NAME(ic.object_id, ic.column_id) AS column_name,
            CAST(ic.key_ordinal AS INT) AS key_ordinal
        FROM sys.indexes i
        JOIN sys.index_columns ic
            ON ic.object_id = i.object_id AND ic.index_id = i.index_id
        WHERE i.object_id = OBJECT_ID(QUOTENAME(@P1) + '.' + QUOTENAME(@P2))
          AND i.type <> 0
          AND ic.key_ordinal > 0
        ORDER BY i.name, ic.key_ordinal
    "#;

    let stream = client.query(query, &[&schema, &table_name]).await?;
    let rows = stream.into_first_result().await?;

    // One row per key column; grouping orders fields by key_ordinal.
    let mut raw = Vec::with_capacity(rows.len());
    for row in rows {
        raw.push(RawIndexColumn {
            table_name: required_str(&row, "table_name")?,
            index_name: required_str(&row, "index_name")?,
            column_name: Some(required_str(&row, "column_name")?),
            position: row.try_get::<i32, _>("key_ordinal")?.unwrap_or(0),
            is_unique: row.try_get::<bool, _>("is_unique")?.unwrap_or(false),
            is_primary_key: row.try_get::<bool, _>("is_primary_key")?.unwrap_or(false),
        });
    }

    Ok(group_index_rows(raw))
}
