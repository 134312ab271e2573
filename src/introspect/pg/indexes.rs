use sqlx::PgPool;

use crate::error::QueryError;
use crate::introspect::{group_index_rows, RawIndexColumn};
use crate::schema::Index;

/// Query indices of an ordinary table, one row per key column.
///
/// `indkey` is unnested with its ordinality so every row carries the column's
/// key position; grouping happens in [`group_index_rows`], which orders by
/// that position. Only the first `indnkeyatts` entries are keys, the rest are
/// INCLUDE columns. Expression keys (attnum 0) come back with a NULL name.
pub async fn query_indexes(
    pool: &PgPool,
    schema: &str,
    table_name: &str,
) -> Result<Vec<Index>, QueryError> {
    let rows = sqlx::query_as::<_, IndexRow>(
        r#"
        SELECT t.relname::text AS table_name, i.relname::text AS index_name,
               a.attname::text AS column_name, k.ord::int4 AS position,
               ix.indisunique AS is_unique, ix.indisprimary AS is_primary_key
        FROM pg_index ix
        JOIN pg_class t ON t.oid = ix.indrelid
        JOIN pg_class i ON i.oid = ix.indexrelid
        JOIN pg_namespace n ON n.oid = t.relnamespace
        CROSS JOIN LATERAL unnest(ix.indkey) WITH ORDINALITY AS k(attnum, ord)
        LEFT JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = k.attnum AND k.attnum > 0
        WHERE n.nspname = $1 AND t.relname = $2 AND t.relkind = 'r'
          AND k.ord <= ix.indnkeyatts
        ORDER BY i.relname, k.ord
        "#,
    )
    .bind(schema)
    .bind(table_name)
    .fetch_all(pool)
    .await?;

    Ok(group_index_rows(
        rows.into_iter()
            .map(|row| RawIndexColumn {
                table_name: row.table_name,
                index_name: row.index_name,
                column_name: row.column_name,
                position: row.position,
                is_unique: row.is_unique,
                is_primary_key: row.is_primary_key,
            })
            .collect(),
    ))
}

#[derive(sqlx::FromRow)]
struct IndexRow {
    table_name: String,
    index_name: String,
    column_name: Option<String>,
    position: i32,
    is_unique: bool,
    is_primary_key: bool,
}
