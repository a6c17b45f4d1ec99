//! Plate-Gate - License Plate Access Control
//!
//! Main entry point. Wires the registry, the optional MySQL mirror, the
//! barrier actuator and the recognition loop, then runs the loop on the
//! built-in text feed harness (the production capture driver is an
//! external collaborator).

use plate_gate::{
    actuator::ActuatorClient,
    config::AppConfig,
    cooldown::CooldownTracker,
    mirror::MysqlMirror,
    pipeline::RecognitionLoop,
    registry::PlateRegistry,
    vision::TextFeed,
};
use sqlx::mysql::MySqlPoolOptions;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "plate_gate=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Plate-Gate v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = AppConfig::default();
    tracing::info!(
        registry_csv = %config.registry_csv.display(),
        actuator_url = %config.actuator_url,
        mirror = config.mirror_database_url.is_some(),
        min_plate_len = config.min_plate_len,
        cooldown_secs = config.cooldown.as_secs(),
        "Configuration loaded"
    );

    // Load the registry; a corrupt log refuses to start rather than
    // miscompute ids or plate states
    let mut registry = PlateRegistry::load(&config.registry_csv)?;

    // Optional best-effort MySQL mirror. The pool connects lazily: a
    // dead MySQL server degrades to per-insert logged failures and must
    // never keep the recognition pipeline from starting.
    let mut mirror_task = None;
    if let Some(dsn) = &config.mirror_database_url {
        match MySqlPoolOptions::new()
            .max_connections(2)
            .acquire_timeout(Duration::from_secs(10))
            .connect_lazy(dsn)
        {
            Ok(pool) => {
                let (tx, rx) = mpsc::unbounded_channel();
                registry = registry.with_mirror(tx);
                mirror_task = Some(MysqlMirror::new(pool).spawn(rx));
                tracing::info!("MySQL mirror attached");
            }
            Err(e) => {
                tracing::error!(error = %e, "Mirror DSN rejected, continuing without mirror");
            }
        }
    }

    let actuator = Arc::new(ActuatorClient::new(
        config.actuator_base(),
        config.actuator_timeout,
    ));
    let cooldown = CooldownTracker::new(config.cooldown);

    tracing::info!("Recognition active. One candidate per line on stdin, 'q' to quit.");

    // The text feed plays source, detector and OCR at once; the real
    // camera/detector/OCR stack plugs in through the same three traits
    let pipeline = RecognitionLoop::new(
        TextFeed::stdin(),
        TextFeed::new(Cursor::new("")),
        TextFeed::new(Cursor::new("")),
        registry,
        cooldown,
        Some(actuator),
        config.min_plate_len,
    );

    let stats = pipeline.run().await?;
    tracing::info!(toggles = stats.toggles, "Shutting down");

    // Registry (and its mirror sender) dropped above; let the mirror
    // drain its queue before exit
    if let Some(task) = mirror_task {
        let _ = task.await;
    }

    Ok(())
}
