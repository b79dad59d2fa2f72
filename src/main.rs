//! Metricbridge CLI
//!
//! Operator tool for exercising the datasource adapter against a live
//! backend: health checks, option listings, and ad-hoc queries.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use metricbridge::{
    Config, Datasource, DatasourceConfig, HttpDatasource, MetricRef, PlainTemplates, QueryRequest,
};

#[derive(Parser)]
#[command(name = "metricbridge", about = "Datasource bridge for time-series backends")]
struct Cli {
    /// Config file path (defaults to the standard locations)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Backend base URL, overriding the config
    #[arg(long)]
    url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Health-check the backend
    Health,
    /// List measurements matching an expression
    Measurements {
        #[arg(default_value = "")]
        metric: String,
    },
    /// List tags for a metric
    Tags { metric: String },
    /// List aggregators for a metric
    Aggregators { metric: String },
    /// List time units for a metric
    Units { metric: String },
    /// List condition types
    Ctypes,
    /// List fields for a metric
    Fields { metric: String },
    /// Run a query request read from a JSON file
    Query { file: PathBuf },
    /// Print a default config file
    InitConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("metricbridge={}", config.logging.level)),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Command::InitConfig = cli.command {
        print!("{}", metricbridge::config::generate_default_config());
        return Ok(());
    }

    let datasource = HttpDatasource::new(
        DatasourceConfig {
            base_url: cli.url.unwrap_or(config.datasource.base_url),
            name: config.datasource.name,
            request_timeout_ms: config.datasource.request_timeout_ms,
            ..DatasourceConfig::default()
        },
        Arc::new(PlainTemplates),
    );

    tracing::info!(url = %datasource.config().base_url, "Metricbridge v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Health => {
            let status = datasource.test_datasource().await?;
            print_json(&status)?;
        }
        Command::Measurements { metric } => {
            let options = datasource.measurements(MetricRef::from(metric)).await?;
            print_json(&options)?;
        }
        Command::Tags { metric } => {
            let options = datasource.tags(MetricRef::from(metric)).await?;
            print_json(&options)?;
        }
        Command::Aggregators { metric } => {
            let options = datasource.aggregators(MetricRef::from(metric)).await?;
            print_json(&options)?;
        }
        Command::Units { metric } => {
            let options = datasource.units(MetricRef::from(metric)).await?;
            print_json(&options)?;
        }
        Command::Ctypes => {
            let options = datasource.condition_types().await?;
            print_json(&options)?;
        }
        Command::Fields { metric } => {
            let options = datasource.fields(MetricRef::from(metric)).await?;
            print_json(&options)?;
        }
        Command::Query { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("reading query request {:?}", file))?;
            let request: QueryRequest = serde_json::from_str(&content)
                .with_context(|| format!("parsing query request {:?}", file))?;

            let response = datasource.query(request).await?;
            tracing::info!(series = response.data.len(), "query complete");
            print_json(&response)?;
        }
        Command::InitConfig => unreachable!(),
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
