//! producer — the spate workload producer daemon.
//!
//! Single binary that assembles the demo:
//! - Work store + production loop
//! - Replica telemetry against the Docker engine
//! - HTTP surface (chart page, config, consume, metrics, stats stream)
//!
//! # Usage
//!
//! ```text
//! producer serve --port 5000 --service consumer
//! ```

mod config;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use spate_api::ApiState;
use spate_metrics::DemoMetrics;
use spate_store::{Dice, Producer, ProductionParameters, SeededDice, ThreadDice, WorkloadStore};
use spate_telemetry::{DockerOrchestrator, ReplicaTelemetry, ServiceMode};

use crate::config::{ServeArgs, Settings};

const DEFAULT_LOG_FILTER: &str = "info,producer=debug,spate=debug";

/// How long open requests may keep the process alive after ctrl-c.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "producer", about = "spate workload producer")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the workload store and its HTTP surface.
    Serve(ServeArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => {
            init_tracing(args.log_json);
            let settings = Settings::load(&args)?;
            run(settings).await
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(settings: Settings) -> anyhow::Result<()> {
    info!(service = %settings.service, "spate producer starting");

    // ── Initialize subsystems ──────────────────────────────────

    let metrics = Arc::new(DemoMetrics::new());

    let dice: Arc<dyn Dice> = match settings.seed {
        Some(seed) => {
            info!(seed, "using seeded random draws");
            Arc::new(SeededDice::new(seed))
        }
        None => Arc::new(ThreadDice),
    };

    // Orchestrator. The watched service must be resolvable before we serve.
    let orchestrator = DockerOrchestrator::from_host(&settings.docker_host, settings.request_timeout)
        .with_context(|| format!("docker host {:?}", settings.docker_host))?;
    info!(endpoint = ?orchestrator.endpoint(), "docker orchestrator configured");

    let telemetry = Arc::new(ReplicaTelemetry::new(
        Arc::new(orchestrator),
        settings.service.clone(),
        metrics.clone(),
    ));
    match telemetry
        .probe()
        .await
        .context("startup probe of the watched service failed")?
    {
        ServiceMode::Replicated {
            replicas: Some(replicas),
        } => info!(service = %settings.service, replicas, "watched service resolved"),
        mode => warn!(
            service = %settings.service,
            ?mode,
            "watched service has no fixed replica count; desired replicas will not update"
        ),
    }

    // Work store and production parameters.
    let store = Arc::new(WorkloadStore::new(
        settings.initial_store,
        dice.clone(),
        metrics.clone(),
    ));
    let params = Arc::new(ProductionParameters::new(settings.production));
    info!(
        store = settings.initial_store,
        amount = settings.production.amount,
        variation = settings.production.variation,
        "work store initialized"
    );

    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let producer_shutdown = shutdown_rx.clone();
    let mut server_shutdown = shutdown_rx;

    // ── Start background tasks ─────────────────────────────────

    let producer = Producer::new(
        store.clone(),
        params.clone(),
        dice,
        settings.produce_interval,
    );
    let producer_handle = tokio::spawn(async move {
        producer.run(producer_shutdown).await;
    });

    // ── Start API server ───────────────────────────────────────

    let router = spate_api::build_router(ApiState {
        store: store.clone(),
        params,
        telemetry,
        metrics,
        stats_interval: settings.stats_interval,
        consume_timeout: settings.consume_timeout,
    });
    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));

    info!(%addr, "API server starting");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;

    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        let _ = server_shutdown.changed().await;
    });
    let mut server_handle = tokio::spawn(async move { server.await });

    tokio::select! {
        result = &mut server_handle => {
            let _ = shutdown_tx.send(true);
            result.context("API server task")?.context("API server")?;
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("install ctrl-c handler")?;
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);

            // Consume requests may wait forever; do not let them pin the process.
            match tokio::time::timeout(SHUTDOWN_GRACE, &mut server_handle).await {
                Ok(result) => result.context("API server task")?.context("API server")?,
                Err(_) => warn!(
                    waiting_consumers = store.waiting_consumers(),
                    "connections still open after grace period, exiting anyway"
                ),
            }
        }
    }

    let _ = producer_handle.await;

    info!("spate producer stopped");
    Ok(())
}
