use std::collections::BTreeMap;

use sqlx::PgPool;

use crate::error::QueryError;
use crate::schema::EnumType;

pub async fn query_enums(pool: &PgPool, schema: &str) -> Result<Vec<EnumType>, QueryError> {
    let rows = sqlx::query_as::<_, EnumRow>(
        r#"
        SELECT t.typname::text AS enum_name, e.enumlabel::text AS label
        FROM pg_type t
        JOIN pg_enum e ON e.enumtypid = t.oid
        JOIN pg_namespace n ON n.oid = t.typnamespace
        WHERE n.nspname = $1
        ORDER BY t.typname, e.enumsortorder
        "#,
    )
    .bind(schema)
    .fetch_all(pool)
    .await?;

    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for row in rows {
        grouped.entry(row.enum_name).or_default().push(row.label);
    }

    Ok(grouped
        .into_iter()
        .map(|(name, values)| EnumType { name, values })
        .collect())
}

#[derive(sqlx::FromRow)]
struct EnumRow {
    enum_name: String,
    label: String,
}
