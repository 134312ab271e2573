use sqlx::PgPool;

use crate::error::QueryError;
use crate::introspect::RawTable;

pub async fn query_schemas(pool: &PgPool) -> Result<Vec<String>, QueryError> {
    let names = sqlx::query_scalar::<_, String>(
        r#"
        SELECT n.nspname::text
        FROM pg_namespace n
        ORDER BY n.nspname
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(names)
}

pub async fn query_tables(pool: &PgPool, schema: &str) -> Result<Vec<RawTable>, QueryError> {
    let rows = sqlx::query_as::<_, TableRow>(
        r#"
        SELECT t.table_name::text AS table_name,
               obj_description(
                   (quote_ident(t.table_schema) || '.' || quote_ident(t.table_name))::regclass,
                   'pg_class'
               ) AS comment
        FROM information_schema.tables t
        WHERE t.table_schema = $1
          AND t.table_type = 'BASE TABLE'
        ORDER BY t.table_name
        "#,
    )
    .bind(schema)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| RawTable {
            name: row.table_name,
            comment: row.comment,
        })
        .collect())
}

#[derive(sqlx::FromRow)]
struct TableRow {
    table_name: String,
    comment: Option<String>,
}
