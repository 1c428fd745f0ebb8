//! slircbot - Straylight IRC Bot
//!
//! Connects to one server and routes chat to the built-in modules.

use slircbot::config::{self, Config};
use slircbot::db::Database;
use slircbot::handlers::{Registry, ResponseMiddleware};
use slircbot::modules::{HttpSource, Manifest};
use slircbot::network::Connection;
use slircbot::state::{SharedCache, spawn_refresh};
use slircbot::{Bot, http, metrics};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Rate-limit state cleanup period.
const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(300);

/// Pause before reconnecting after the server drops us.
const RECONNECT_DELAY: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    if let Err(errors) = config::validation::validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        return Err(anyhow::anyhow!(
            "{} configuration error(s) in {config_path}",
            errors.len()
        ));
    }

    info!(
        nick = %config.bot.nick,
        server = %config.server.host,
        port = config.server.port,
        "Starting slircbot"
    );

    let db = Database::new(&config.database.path).await?;

    // Headline feed, refreshed in the background
    let headlines = Arc::new(SharedCache::<Vec<String>>::default());
    let mut manifest = Manifest::new(&config.bot.owner_command);
    if let Some(feed) = &config.headlines {
        let source = HttpSource::new(&feed.url)?;
        spawn_refresh(
            Arc::clone(&headlines),
            source,
            Duration::from_secs(feed.refresh_secs),
            Duration::from_secs(feed.retry_secs),
        );
        manifest = manifest.with_headlines(Arc::clone(&headlines), feed.max_items);
        info!(url = %feed.url, "Headline refresher started");
    }

    let registry = Arc::new(Registry::new());
    manifest.load(&registry, &config.modules.enabled)?;

    // Prometheus metrics are optional; 0 or unset disables the endpoint.
    match config.metrics_port {
        Some(port) if port != 0 => {
            metrics::init();
            tokio::spawn(http::run_http_server(port));
        }
        _ => info!("Prometheus metrics disabled"),
    }

    let (out_tx, mut out_rx) = mpsc::channel(config.network.send_queue);
    let (events_tx, events_rx) = mpsc::channel(config.network.send_queue);

    let bot = Arc::new(Bot::new(
        &config,
        db,
        registry,
        ResponseMiddleware::Direct(out_tx),
    )?);
    bot.spawn_maintenance(MAINTENANCE_INTERVAL);

    let runner = {
        let bot = Arc::clone(&bot);
        tokio::spawn(async move { bot.run(events_rx).await })
    };

    let connection = Connection::new(&config, bot.nick_handle());
    let link = async {
        loop {
            match connection.run(&events_tx, &mut out_rx).await {
                Ok(()) => warn!("Connection ended"),
                Err(e) => warn!(error = %e, "Connection lost"),
            }
            info!(delay_secs = RECONNECT_DELAY.as_secs(), "Reconnecting");
            tokio::time::sleep(RECONNECT_DELAY).await;
        }
    };

    tokio::select! {
        _ = link => {}
        _ = tokio::signal::ctrl_c() => info!("Shutting down"),
    }
    runner.abort();
    Ok(())
}
