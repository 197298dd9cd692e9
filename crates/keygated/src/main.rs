use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

// ── CLI definition ─────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "keygated",
    about = "Keygated — API key quota and update-gate server daemon",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the Keygate HTTP server
    Serve {
        /// Port to listen on
        #[arg(long, env = "KEYGATE_PORT", default_value = "8080")]
        port: u16,
        /// Host to bind
        #[arg(long, env = "KEYGATE_HOST", default_value = "0.0.0.0")]
        host: String,
        /// Shared secret expected in the X-Admin-Key header
        #[arg(long, env = "KEYGATE_ADMIN_KEY", hide_env_values = true)]
        admin_key: String,
        /// Directory holding keygate.db (default: platform data dir)
        #[arg(long, env = "KEYGATE_DATA_DIR")]
        data_dir: Option<PathBuf>,
        /// Comma-separated CORS origins (default: any)
        #[arg(long, env = "KEYGATE_CORS_ORIGINS")]
        cors_origins: Option<String>,
        /// Log level: error, warn, info, debug, verbose (default: warn)
        #[arg(long, env = "KEYGATE_LOG_LEVEL")]
        log_level: Option<String>,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let Commands::Serve {
        port,
        host,
        admin_key,
        data_dir,
        cors_origins,
        log_level,
    } = cli.command;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(effective_log_level(log_level)))
        .init();

    let cfg = keygate_server::ServerConfig {
        host,
        port,
        admin_key,
        data_dir,
        cors_origins,
    };

    keygate_server::run(cfg).await
}

fn effective_log_level(raw: Option<String>) -> String {
    let raw = raw.unwrap_or_else(|| "warn".into());
    if raw.eq_ignore_ascii_case("verbose") {
        "debug".to_owned()
    } else {
        raw
    }
}
