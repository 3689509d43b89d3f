//! fittrack API server
//!
//! HTTP backend for the fittrack Telegram Mini App.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use tracing::info;

use fittrack_core::Environment;
use fittrack_core::config::load_config;
use fittrack_core::tracing_init::init_tracing;
use fittrack_server::auth::build_verifier;
use fittrack_server::rate_limit::RateLimiter;
use fittrack_server::routes::{AppState, build_router};
use fittrack_server::storage::ServerDatabase;

#[derive(Parser)]
#[command(name = "fittrack-server")]
#[command(version, about = "fittrack API server for the Telegram Mini App")]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0:3000", env = "LISTEN_ADDR")]
    addr: SocketAddr,

    /// Telegram bot token; the root secret for initData signatures.
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    bot_token: String,

    /// Deployment environment (`production` or `development`).
    #[arg(long, env = "APP_ENV", default_value_t = Environment::Production)]
    app_env: Environment,

    /// Path to SQLite database file.
    #[arg(long, env = "FITTRACK_DB_PATH")]
    db_path: Option<PathBuf>,

    /// JSON settings file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Take client addresses from `X-Forwarded-For` (behind a reverse proxy).
    #[arg(long, env = "FITTRACK_TRUST_PROXY")]
    trust_proxy: bool,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing("fittrack_server=info", args.log_json)?;

    let config = load_config(args.config.as_deref())?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %args.addr,
        env = %args.app_env,
        "Starting fittrack-server"
    );

    let verifier = build_verifier(&args.bot_token, args.app_env)?;

    let db_path = match args.db_path {
        Some(path) => path,
        None => default_db_path()?,
    };
    info!(path = %db_path.display(), "Opening server database");
    let db = ServerDatabase::open(&db_path).await?;

    let limiter = Arc::new(RateLimiter::new(&config.rate_limit, args.trust_proxy));

    // Forget clients whose window has elapsed so the table stays bounded.
    let prune_limiter = Arc::clone(&limiter);
    let prune_every = Duration::from_secs(config.rate_limit.window_secs);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(prune_every);
        interval.tick().await; // Skip first immediate tick
        loop {
            interval.tick().await;
            let removed = prune_limiter.prune(Instant::now()).await;
            if removed > 0 {
                info!(removed, "Pruned idle rate limit windows");
            }
        }
    });

    let app = build_router(
        AppState {
            verifier,
            db,
            limiter,
        },
        &config.server,
    );

    let listener = tokio::net::TcpListener::bind(args.addr).await?;
    info!(addr = %args.addr, "Listening");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Received shutdown signal");
    }
}

fn default_db_path() -> anyhow::Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home.join(".fittrack").join("fittrack.db"))
}
