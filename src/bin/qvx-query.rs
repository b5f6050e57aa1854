use anyhow::{Context, Result};
use clap::Parser;
use querivox_core::{AppConfig, SqlDialect};
use querivox_query::{BigQueryClient, QueryRunner};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "qvx-query", about = "Run a SQL query against the managed query service")]
struct Cli {
    /// SQL query text
    query: String,

    /// Use standard SQL syntax instead of legacy SQL
    #[arg(long = "use_standard_sql")]
    use_standard_sql: bool,

    /// Path to an optional configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_or_default(cli.config.as_deref())
        .with_context(|| format!("failed to load config from {:?}", cli.config))?;

    let env_filter = EnvFilter::try_new(&config.general.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::Registry::default().with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(false),
    );
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    let dialect = if cli.use_standard_sql {
        SqlDialect::Standard
    } else {
        SqlDialect::Legacy
    };

    let client = BigQueryClient::from_config(&config.query)?;
    let runner = QueryRunner::new(
        client,
        Duration::from_millis(config.query.poll_interval_ms),
    );

    let mut stdout = std::io::stdout().lock();
    runner
        .run(&cli.query, dialect, &mut stdout)
        .await
        .context("query failed")?;
    Ok(())
}
