use sqlx::PgPool;

use crate::error::QueryError;
use crate::introspect::RawRelation;

/// Query foreign keys declared on a table, one row per column pair.
pub async fn query_relations(
    pool: &PgPool,
    schema: &str,
    table_name: &str,
) -> Result<Vec<RawRelation>, QueryError> {
    let rows = sqlx::query_as::<_, FkRow>(
        r#"
        SELECT con.conname::text AS constraint_name,
               src.relname::text AS source_table, sa.attname::text AS source_column,
               tn.nspname::text AS target_schema, tgt.relname::text AS target_table,
               ta.attname::text AS target_column, k.ord::int4 AS position
        FROM pg_constraint con
        JOIN pg_class src ON src.oid = con.conrelid
        JOIN pg_namespace sn ON sn.oid = src.relnamespace
        JOIN pg_class tgt ON tgt.oid = con.confrelid
        JOIN pg_namespace tn ON tn.oid = tgt.relnamespace
        CROSS JOIN LATERAL unnest(con.conkey, con.confkey)
            WITH ORDINALITY AS k(src_attnum, tgt_attnum, ord)
        JOIN pg_attribute sa ON sa.attrelid = src.oid AND sa.attnum = k.src_attnum
        JOIN pg_attribute ta ON ta.attrelid = tgt.oid AND ta.attnum = k.tgt_attnum
        WHERE con.contype = 'f' AND sn.nspname = $1 AND src.relname = $2
        ORDER BY con.conname, k.ord
        "#,
    )
    .bind(schema)
    .bind(table_name)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| RawRelation {
            constraint_name: row.constraint_name,
            source_table: row.source_table,
            source_column: row.source_column,
            target_schema: row.target_schema,
            target_table: row.target_table,
            target_column: row.target_column,
            position: row.position,
        })
        .collect())
}

#[derive(sqlx::FromRow)]
struct FkRow {
    constraint_name: String,
    source_table: String,
    source_column: String,
    target_schema: String,
    target_table: String,
    target_column: String,
    position: i32,
}
