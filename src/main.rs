use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use poker_ledger_server::server::{run_server, RequestsLoggingLevel, ServerConfig};
use poker_ledger_server::SqliteLedgerStore;

const DEFAULT_DB_FILE: &str = "poker.db";

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the SQLite ledger database file. Falls back to the POKER_DB
    /// environment variable, then to "poker.db" in the working directory.
    /// Created with a fresh schema if the file does not exist.
    #[clap(long, value_parser = parse_path)]
    pub db: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3000)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let db_path = match cli_args.db {
        Some(path) => path,
        None => match std::env::var("POKER_DB") {
            Ok(path) => parse_path(&path)?,
            Err(_) => PathBuf::from(DEFAULT_DB_FILE),
        },
    };

    info!("Opening SQLite ledger database at {:?}...", db_path);
    let ledger_store = Arc::new(SqliteLedgerStore::new(&db_path)?);

    let config = ServerConfig {
        port: cli_args.port,
        requests_logging_level: cli_args.logging_level,
        ..Default::default()
    };

    info!("Ready to serve at port {}!", config.port);
    run_server(config, ledger_store).await
}
