//! Feed harvester binary entrypoint.
//! Loads config, starts the harvest / retention / stats loops, and serves the
//! page, media files and feeds over HTTP.

use std::sync::Arc;

use anyhow::{Context, Result};
use feed_harvester::{
    api::{create_router, AppState},
    ingest::{
        providers::{channel::ChannelFeedSource, xml_feed::XmlFeedReader, ytdlp::CommandFetcher},
        scheduler, Harvester,
    },
    metrics::Metrics,
    stats::NetworkStatsHandle,
    AppConfig, Catalog, Materializer,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact logs by default, JSON lines when `LOG_FORMAT=json`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("feed_harvester=info,tower_http=warn,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = Arc::new(AppConfig::load_default().context("loading configuration")?);
    let retention_at = config.retention_time()?;
    tokio::fs::create_dir_all(&config.media_root)
        .await
        .with_context(|| format!("creating media root {}", config.media_root.display()))?;

    let metrics = Metrics::init(config.retention_days)?;

    let catalog = Catalog::new();
    let network = NetworkStatsHandle::new();
    let reader: Arc<XmlFeedReader> = Arc::new(XmlFeedReader::http()?);

    let source = ChannelFeedSource::new(reader.clone(), config.channel_feed_base.clone());
    let materializer = Materializer::new(
        Arc::new(source),
        Arc::new(CommandFetcher::new(config.downloader.clone())),
        config.media_root.clone(),
    );
    let harvester = Arc::new(Harvester::new(
        materializer,
        config.sources_file.clone(),
        catalog.clone(),
    ));

    scheduler::spawn_harvest_scheduler(harvester, config.harvest_interval());
    scheduler::spawn_retention_scheduler(
        catalog.clone(),
        config.media_root.clone(),
        retention_at,
        config.retention_horizon(),
    );
    scheduler::spawn_stats_sampler(network.clone(), config.stats_interval());

    let state = AppState {
        catalog,
        config: config.clone(),
        feeds: reader,
        network,
    };
    let app = create_router(state).merge(metrics.router());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, "serving");
    axum::serve(listener, app).await.context("http server")?;
    Ok(())
}
