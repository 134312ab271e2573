use sqlx::PgPool;

use crate::error::QueryError;
use crate::introspect::RawColumn;

pub async fn query_columns(
    pool: &PgPool,
    schema: &str,
    table_name: &str,
) -> Result<Vec<RawColumn>, QueryError> {
    let rows = sqlx::query_as::<_, ColumnRow>(
        r#"
        SELECT c.column_name::text AS column_name, c.ordinal_position::int4 AS ordinal_position,
               c.is_nullable = 'YES' AS is_nullable,
               c.data_type::text AS data_type, c.udt_name::text AS udt_name,
               c.column_default::text AS column_default,
               c.is_identity = 'YES' AS is_identity
        FROM information_schema.columns c
        WHERE c.table_schema = $1 AND c.table_name = $2
        ORDER BY c.ordinal_position
        "#,
    )
    .bind(schema)
    .bind(table_name)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| RawColumn {
            name: row.column_name,
            ordinal_position: row.ordinal_position,
            data_type: row.data_type,
            udt_name: row.udt_name,
            is_nullable: row.is_nullable,
            column_default: row.column_default,
            is_identity: row.is_identity,
        })
        .collect())
}

/// Look up the `COMMENT ON COLUMN` text of one column.
pub async fn query_column_comment(
    pool: &PgPool,
    schema: &str,
    table_name: &str,
    column_name: &str,
) -> Result<Option<String>, QueryError> {
    let comment = sqlx::query_scalar::<_, Option<String>>(
        r#"
        SELECT col_description(
                   (quote_ident(c.table_schema) || '.' || quote_ident(c.table_name))::regclass,
                   c.ordinal_position::int
               ) AS column_comment
        FROM information_schema.columns c
        WHERE c.table_schema = $1 AND c.table_name = $2 AND c.column_name = $3
        "#,
    )
    .bind(schema)
    .bind(table_name)
    .bind(column_name)
    .fetch_optional(pool)
    .await?;

    Ok(comment.flatten())
}

#[derive(sqlx::FromRow)]
struct ColumnRow {
    column_name: String,
    ordinal_position: i32,
    is_nullable: bool,
    data_type: String,
    udt_name: String,
    column_default: Option<String>,
    is_identity: bool,
}
