use tiberius::Client;
use tokio::net::TcpStream;
use tokio_util::compat::Compat;

use crate::error::QueryError;
use crate::introspect::RawColumn;

use super::required_str;

pub async fn query_columns(
    client: &mut Client<Compat<TcpStream>>,
    schema: &str,
    table_name: &str,
) -> Result<Vec<RawColumn>, QueryError> {
    let query = r#"
        SELECT
            c.COLUMN_NAME,
            c.ORDINAL_POSITION,
            CASE WHEN c.IS_NULLABLE = 'YES' THEN 1 ELSE 0 END AS is_nullable,
            c.DATA_TYPE,
            c.COLUMN_DEFAULT,
            COLUMNPROPERTY(OBJECT_ID(QUOTENAME(c.TABLE_SCHEMA) + '.' + QUOTENAME(c.TABLE_NAME)), c.COLUMN_NAME, 'IsIdentity') AS is_identity
        FROM INFORMATION_SCHEMA.COLUMNS c
        WHERE c.TABLE_SCHEMA = @P1 AND c.TABLE_NAME = @P2
        ORDER BY c.ORDINAL_POSITION
    "#;

    let stream = client.query(query, &[&schema, &table_name]).await?;
    let rows = stream.into_first_result().await?;

    let mut columns = Vec::with_capacity(rows.len());
    for row in rows {
        let data_type = required_str(&row, "DATA_TYPE")?.to_lowercase();
        columns.push(RawColumn {
            name: required_str(&row, "COLUMN_NAME")?,
            ordinal_position: row.try_get::<i32, _>("ORDINAL_POSITION")?.unwrap_or(0),
            udt_name: data_type.clone(),
            data_type,
            is_nullable: row.try_get::<i32, _>("is_nullable")?.unwrap_or(0) == 1,
            column_default: row
                .try_get::<&str, _>("COLUMN_DEFAULT")?
                .map(str::to_string),
            is_identity: row.try_get::<i32, _>("is_identity")?.unwrap_or(0) == 1,
        });
    }

    Ok(columns)
}

/// Look up the `MS_Description` extended property of one column.
pub async fn query_column_comment(
    client: &mut Client<Compat<TcpStream>>,
    schema: &str,
    table_name: &str,
    column_name: &str,
) -> Result<Option<String>, QueryError> {
    let query = r#"
        SELECT CAST(ep.value AS NVARCHAR(MAX)) AS comment
        FROM sys.columns sc
        JOIN sys.extended_properties ep
            ON ep.major_id = sc.object_id
            AND ep.minor_id = sc.column_id
            AND ep.name = 'MS_Description'
        WHERE sc.object_id = OBJECT_ID(QUOTENAME(@P1) + '.' + QUOTENAME(@P2))
          AND sc.name = @P3
    "#;

    let stream = client
        .query(query, &[&schema, &table_name, &column_name])
        .await?;
    let row = stream.into_row().await?;

    match row {
        Some(row) => Ok(row.try_get::<&str, _>("comment")?.map(str::to_string)),
        None => Ok(None),
    }
}
