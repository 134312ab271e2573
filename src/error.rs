use std::fmt;

use thiserror::Error;

/// Catalog step that was running when a query failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Schemas,
    Tables,
    Columns,
    Comments,
    Indices,
    Relations,
    Enums,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Schemas => "schema",
            Step::Tables => "table",
            Step::Columns => "column",
            Step::Comments => "comment",
            Step::Indices => "index",
            Step::Relations => "relation",
            Step::Enums => "enum",
        };
        f.write_str(name)
    }
}

/// Error raised by a dialect driver while executing one catalog query.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Postgres error: {0}")]
    Postgres(#[from] sqlx::Error),

    #[error("MSSQL error: {0}")]
    Mssql(#[from] tiberius::error::Error),

    #[error("Unexpected catalog row: {0}")]
    Decode(String),
}

#[derive(Error, Debug)]
pub enum IntrospectError {
    #[error("{step} query failed{}: {source}", table_context(.table))]
    QueryFailure {
        step: Step,
        table: Option<String>,
        source: QueryError,
    },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Unknown dialect: {0}")]
    UnknownDialect(String),

    #[error("Worker task failed: {0}")]
    Worker(String),
}

impl IntrospectError {
    pub fn query(step: Step, table: Option<&str>, source: impl Into<QueryError>) -> Self {
        IntrospectError::QueryFailure {
            step,
            table: table.map(str::to_string),
            source: source.into(),
        }
    }

    /// Table the failing query was scoped to, if any.
    pub fn table(&self) -> Option<&str> {
        match self {
            IntrospectError::QueryFailure { table, .. } => table.as_deref(),
            _ => None,
        }
    }
}

fn table_context(table: &Option<String>) -> String {
    table
        .as_deref()
        .map(|t| format!(" for table '{t}'"))
        .unwrap_or_default()
}
