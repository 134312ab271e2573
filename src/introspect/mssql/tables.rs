use tiberius::Client;
use tokio::net::TcpStream;
use tokio_util::compat::Compat;

use crate::error::QueryError;
use crate::introspect::RawTable;

use super::required_str;

pub async fn query_schemas(
    client: &mut Client<Compat<TcpStream>>,
) -> Result<Vec<String>, QueryError> {
    let stream = client
        .query("SELECT s.name FROM sys.schemas s ORDER BY s.name", &[])
        .await?;
    let rows = stream.into_first_result().await?;

    rows.iter().map(|row| required_str(row, "name")).collect()
}

pub async fn query_tables(
    client: &mut Client<Compat<TcpStream>>,
    schema: &str,
) -> Result<Vec<RawTable>, QueryError> {
    let query = r#"
        SELECT
            t.TABLE_NAME,
            CAST(ep.value AS NVARCHAR(MAX)) AS comment
        FROM INFORMATION_SCHEMA.TABLES t
        LEFT JOIN sys.extended_properties ep
            ON ep.major_id = OBJECT_ID(QUOTENAME(t.TABLE_SCHEMA) + '.' + QUOTENAME(t.TABLE_NAME))
            AND ep.minor_id = 0
            AND ep.name = 'MS_Description'
        WHERE t.TABLE_SCHEMA = @P1
          AND t.TABLE_TYPE = 'BASE TABLE'
        ORDER BY t.TABLE_NAME
    "#;

    let stream = client.query(query, &[&schema]).await?;
    let rows = stream.into_first_result().await?;

    let mut tables = Vec::with_capacity(rows.len());
    for row in rows {
        tables.push(RawTable {
            name: required_str(&row, "TABLE_NAME")?,
            comment: row.try_get::<&str, _>("comment")?.map(str::to_string),
        });
    }

    Ok(tables)
}
