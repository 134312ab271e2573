mod columns;
mod constraints;
mod indexes;
mod tables;

use async_trait::async_trait;
use tiberius::{Client, Config, EncryptionLevel, Row};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use crate::defaults;
use crate::dialect::Dialect;
use crate::error::{IntrospectError, QueryError};
use crate::introspect::{DialectDriver, RawColumn, RawRelation, RawTable};
use crate::schema::Index;
use crate::typemap::{self, MappedType};

/// Establish a connection to a MSSQL server.
pub async fn connect(
    host: &str,
    port: u16,
    database: &str,
    user: &str,
    password: &str,
    trust_cert: bool,
) -> Result<Client<Compat<TcpStream>>, IntrospectError> {
    let mut config = Config::new();
    config.host(host);
    config.port(port);
    config.database(database);
    config.authentication(tiberius::AuthMethod::sql_server(user, password));
    config.encryption(EncryptionLevel::Required);
    if trust_cert {
        config.trust_cert();
    }

    let tcp = TcpStream::connect(config.get_addr()).await.map_err(|e| {
        IntrospectError::Connection(format!("TCP connection to {host}:{port} failed: {e}"))
    })?;
    tcp.set_nodelay(true)
        .map_err(|e| IntrospectError::Connection(format!("Failed to set TCP_NODELAY: {e}")))?;

    Client::connect(config, tcp.compat_write())
        .await
        .map_err(|e| IntrospectError::Connection(e.to_string()))
}

/// Schemas created by the server itself, including the fixed `db_*` role schemas.
pub fn is_reserved_schema(name: &str) -> bool {
    name.starts_with("db_")
        || name.eq_ignore_ascii_case("sys")
        || name.eq_ignore_ascii_case("information_schema")
        || name.eq_ignore_ascii_case("guest")
}

/// Read a non-null string column from a result row.
fn required_str(row: &Row, column: &str) -> Result<String, QueryError> {
    row.try_get::<&str, _>(column)?
        .map(str::to_string)
        .ok_or_else(|| QueryError::Decode(format!("column '{column}' is NULL")))
}

/// MSSQL driver over one tiberius client.
///
/// The TDS client is not shareable, so concurrent callers queue on the mutex.
pub struct MssqlDriver {
    client: Mutex<Client<Compat<TcpStream>>>,
}

impl MssqlDriver {
    pub fn new(client: Client<Compat<TcpStream>>) -> Self {
        MssqlDriver {
            client: Mutex::new(client),
        }
    }
}

#[async_trait]
impl DialectDriver for MssqlDriver {
    fn dialect(&self) -> Dialect {
        Dialect::Mssql
    }

    async fn list_schemas(&self) -> Result<Vec<String>, QueryError> {
        let mut client = self.client.lock().await;
        tables::query_schemas(&mut client).await
    }

    fn is_reserved_schema(&self, name: &str) -> bool {
        is_reserved_schema(name)
    }

    async fn list_tables(&self, schema: &str) -> Result<Vec<RawTable>, QueryError> {
        let mut client = self.client.lock().await;
        tables::query_tables(&mut client, schema).await
    }

    async fn list_columns(&self, schema: &str, table: &str) -> Result<Vec<RawColumn>, QueryError> {
        let mut client = self.client.lock().await;
        columns::query_columns(&mut client, schema, table).await
    }

    async fn column_comment(
        &self,
        schema: &str,
        table: &str,
        column: &str,
    ) -> Result<Option<String>, QueryError> {
        let mut client = self.client.lock().await;
        columns::query_column_comment(&mut client, schema, table, column).await
    }

    async fn list_indices(&self, schema: &str, table: &str) -> Result<Vec<Index>, QueryError> {
        let mut client = self.client.lock().await;
        indexes::query_indexes(&mut client, schema, table).await
    }

    async fn list_relations(
        &self,
        schema: &str,
        table: &str,
    ) -> Result<Vec<RawRelation>, QueryError> {
        let mut client = self.client.lock().await;
        constraints::query_relations(&mut client, schema, table).await
    }

    fn map_type(&self, raw_type: &str, column: &str, is_primary_key: bool) -> MappedType {
        typemap::mssql::map_type(raw_type, column, is_primary_key)
    }

    fn normalize_default(&self, raw: Option<&str>) -> Option<String> {
        defaults::mssql::normalize_default(raw)
    }
}
