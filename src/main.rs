use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use iptv_source_cache::{
    config::Config,
    database::open_store,
    ingestor::HttpFetcher,
    services::PlaylistService,
    utils::{Clock, SystemClock},
    web::{AppState, WebServer},
};

#[derive(Parser)]
#[command(name = "iptv-source-cache")]
#[command(version)]
#[command(about = "Caches remote IPTV playlists on a schedule and serves them")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Listening IP address
    #[arg(short = 'H', long, value_name = "IP")]
    host: Option<String>,

    /// Listening port
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Database URL, or `memory` (overrides config file)
    #[arg(short = 'd', long, value_name = "URL")]
    database_url: Option<String>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,

    /// Run one refresh batch and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = if cli.log_level == "trace" {
        format!("iptv_source_cache={},tower_http=trace", cli.log_level)
    } else {
        format!("iptv_source_cache={}", cli.log_level)
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting IPTV source cache v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load(&cli.config)?;
    info!("Configuration loaded from: {}", cli.config);

    if let Some(host) = cli.host {
        config.web.host = host;
    }
    if let Some(port) = cli.port {
        config.web.port = port;
    }
    if let Some(database_url) = cli.database_url {
        config.database.url = database_url;
    }

    info!("Using store: {}", config.database.url);

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = open_store(&config, clock.clone()).await?;
    let fetcher = Arc::new(HttpFetcher::new(
        config.refresh.fetch_timeout(),
        &config.refresh.user_agent,
    ));
    let service = PlaylistService::new(store, fetcher, clock, &config);

    if cli.once {
        let summary = service.run_scheduled_batch().await?;
        info!(
            "Refresh batch complete: {} sources, {} succeeded, {} failed",
            summary.total, summary.succeeded, summary.failed
        );
        return Ok(());
    }

    let scheduler = service.scheduler(config.refresh.check_interval());
    tokio::spawn(scheduler.start());
    info!("Scheduler service started");

    let web_server = WebServer::new(&config, AppState::new(service, &config))?;
    info!(
        "Starting web server on {}:{}",
        web_server.host(),
        web_server.port()
    );
    web_server.serve().await?;

    Ok(())
}
