//! Explicit registry of dialect drivers.
//!
//! The registry is built at startup and handed to whoever opens connections;
//! there is no process-wide driver table.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::cli::ConnectionConfig;
use crate::connector::IntrospectOptions;
use crate::error::IntrospectError;
use crate::introspect::mssql::{self, MssqlDriver};
use crate::introspect::pg::PostgresDriver;
use crate::introspect::DialectDriver;

pub type DriverFuture =
    Pin<Box<dyn Future<Output = Result<Arc<dyn DialectDriver>, IntrospectError>> + Send>>;

/// Opens a driver for a connection configuration.
pub type DriverFactory =
    Arc<dyn Fn(ConnectionConfig, &IntrospectOptions) -> DriverFuture + Send + Sync>;

#[derive(Default, Clone)]
pub struct DialectRegistry {
    factories: BTreeMap<String, DriverFactory>,
}

impl DialectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the Postgres and MSSQL drivers.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("postgres", Arc::new(postgres_factory));
        registry.register("mssql", Arc::new(mssql_factory));
        registry
    }

    pub fn register(&mut self, name: &str, factory: DriverFactory) {
        self.factories.insert(name.to_string(), factory);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Open a driver for `config` using the factory of its dialect.
    pub async fn connect(
        &self,
        config: ConnectionConfig,
        options: &IntrospectOptions,
    ) -> Result<Arc<dyn DialectDriver>, IntrospectError> {
        let name = config.dialect().name();
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| IntrospectError::UnknownDialect(name.to_string()))?;
        tracing::debug!("Connecting with the {} driver", name);
        factory(config, options).await
    }
}

fn postgres_factory(config: ConnectionConfig, options: &IntrospectOptions) -> DriverFuture {
    let max_connections = options.concurrency.max(1) as u32;
    Box::pin(async move {
        match config {
            ConnectionConfig::Postgres(url) => {
                let driver = PostgresDriver::connect(&url, max_connections).await?;
                Ok(Arc::new(driver) as Arc<dyn DialectDriver>)
            }
            other => Err(IntrospectError::Connection(format!(
                "postgres driver cannot open a {} connection",
                other.dialect()
            ))),
        }
    })
}

fn mssql_factory(config: ConnectionConfig, _options: &IntrospectOptions) -> DriverFuture {
    Box::pin(async move {
        match config {
            ConnectionConfig::Mssql {
                host,
                port,
                database,
                user,
                password,
                trust_cert,
            } => {
                let client =
                    mssql::connect(&host, port, &database, &user, &password, trust_cert).await?;
                Ok(Arc::new(MssqlDriver::new(client)) as Arc<dyn DialectDriver>)
            }
            other => Err(IntrospectError::Connection(format!(
                "mssql driver cannot open a {} connection",
                other.dialect()
            ))),
        }
    })
}
