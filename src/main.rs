use std::fs;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use relspect::cli::Cli;
use relspect::{Connector, DialectRegistry};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = cli.parse_connection()?;
    let dialect = config.dialect();
    let schema = cli.schema_or(dialect.default_schema()).to_string();
    let options = cli.introspect_options();

    tracing::debug!("Connecting to database...");
    let registry = DialectRegistry::with_builtins();
    let driver = registry.connect(config, &options).await?;
    let connector = Connector::with_options(driver, options);

    let output = if cli.list_schemas {
        let mut lines = connector.list_schemas().await?.join("\n");
        lines.push('\n');
        lines
    } else {
        tracing::debug!("Introspecting {} schema {schema}...", connector.dialect());
        let result = connector.introspect(&schema).await?;
        tracing::debug!("Found {} tables", result.tables.len());
        let mut json = serde_json::to_string_pretty(&result)?;
        json.push('\n');
        json
    };

    match cli.outfile {
        Some(ref path) => {
            fs::write(path, &output)?;
            tracing::info!("Output written to {path}");
        }
        None => {
            print!("{output}");
        }
    }

    Ok(())
}
