use std::time::Duration;

use clap::Parser;
use kagami::config::Config;

/// kagami - HTTP image transformation service
#[derive(Parser, Debug)]
#[command(name = "kagami")]
#[command(version, about, long_about = None)]
struct Args {
    /// Address to bind the HTTP listener on
    #[arg(long, default_value = "0.0.0.0")]
    address: String,

    /// Port to listen on (the PORT environment variable takes precedence)
    #[arg(short, long, default_value_t = 3010)]
    port: u16,

    /// Timeout in seconds for fetching source images
    #[arg(long, default_value_t = 30)]
    fetch_timeout_secs: u64,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    kagami::logging::init_subscriber(args.log_json)
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    let config = Config {
        address: args.address,
        port: args.port,
        fetch_timeout: Duration::from_secs(args.fetch_timeout_secs),
        log_json: args.log_json,
    }
    .with_env_overrides();

    let router = kagami::http::router(&config)?;
    let listener = tokio::net::TcpListener::bind(config.listen_addr()).await?;

    tracing::info!(
        address = %config.listen_addr(),
        fetch_timeout_secs = config.fetch_timeout.as_secs(),
        "starting image transformation service"
    );

    axum::serve(listener, router.into_make_service()).await?;
    Ok(())
}
