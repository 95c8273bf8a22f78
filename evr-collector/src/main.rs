use std::net::SocketAddr;
use std::path::PathBuf;

use axum::routing::get;
use clap::Parser;
use evr_collector::{
    api::{self, ApiState},
    config::{Config, IngestConfig, RouteStoreConfig, SampleStoreConfig},
    ingest::{IngestPool, requeue_pending},
    registry::{
        RouteRegistry, SampleRegistry,
        memory::{InMemoryRouteRegistry, InMemorySampleRegistry},
        mongo::MongoRouteRegistry,
        postgres::PostgresSampleRegistry,
        sqlite::SqliteSampleRegistry,
    },
    scratch::ScratchStore,
    state::TrainLock,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "evr-collector")]
#[command(about = "EVR sensor collector")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "evr-collector.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "tracing=info,evr_collector=info".to_owned());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE)
        .init();

    let cli = Cli::parse();

    let config = if cli.config.exists() {
        info!(path = ?cli.config, "Loading configuration");
        Config::load(&cli.config)?
    } else {
        info!("No configuration file found, using defaults");
        Config::default()
    };
    let Config {
        server,
        samples,
        routes,
        ingest,
    } = config.with_env_overrides(|key| std::env::var(key).ok());

    info!(http_addr = %server.http_addr, "Starting server");

    match samples {
        SampleStoreConfig::Memory => {
            info!("Using in-memory sample registry");
            with_routes(InMemorySampleRegistry::new(), routes, server.http_addr, ingest).await?;
        }
        SampleStoreConfig::Sqlite { path } => {
            info!(path = ?path, "Using SQLite sample registry");
            let registry = SqliteSampleRegistry::new(&path.to_string_lossy()).await?;
            with_routes(registry, routes, server.http_addr, ingest).await?;
        }
        SampleStoreConfig::Postgres {
            url,
            max_connections,
        } => {
            info!(max_connections, "Using PostgreSQL sample registry");
            let registry = PostgresSampleRegistry::new(&url, max_connections).await?;
            with_routes(registry, routes, server.http_addr, ingest).await?;
        }
    }

    Ok(())
}

async fn with_routes<S>(
    samples: S,
    routes: RouteStoreConfig,
    http_addr: SocketAddr,
    ingest: IngestConfig,
) -> color_eyre::Result<()>
where
    S: SampleRegistry,
{
    match routes {
        RouteStoreConfig::Memory => {
            info!("Using in-memory route registry");
            run_server(samples, InMemoryRouteRegistry::new(), http_addr, ingest).await
        }
        RouteStoreConfig::Mongodb { url, database } => {
            info!(database = %database, "Using MongoDB route registry");
            let registry = MongoRouteRegistry::new(&url, &database).await?;
            run_server(samples, registry, http_addr, ingest).await
        }
    }
}

async fn run_server<S, R>(
    samples: S,
    routes: R,
    http_addr: SocketAddr,
    ingest: IngestConfig,
) -> color_eyre::Result<()>
where
    S: SampleRegistry,
    R: RouteRegistry,
{
    let scratch = ScratchStore::create(&ingest.scratch_dir)?;
    info!(dir = ?scratch.dir(), "Scratch directory ready");

    let cancel = CancellationToken::new();
    let (ingest_handle, pool) = IngestPool::spawn(
        samples.clone(),
        ingest.workers,
        ingest.queue_capacity,
        cancel.clone(),
    );

    if let Err(e) = requeue_pending(&ingest_handle, &scratch).await {
        warn!(error = ?e, dir = ?scratch.dir(), "Failed to scan scratch directory");
    }

    let state = ApiState {
        samples,
        routes,
        ingest: ingest_handle,
        scratch,
        lock: TrainLock::new(),
    };

    let axum_app =
        api::api_router(state, ingest.max_upload_bytes).route("/health", get(health_handler));

    let axum_listener = TcpListener::bind(http_addr).await?;
    info!(%http_addr, "HTTP server listening");

    // in-flight uploads finish and are queued before the pool is stopped
    if let Err(e) = axum::serve(axum_listener, axum_app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!(error = ?e, "HTTP server error");
    }
    info!("HTTP server shut down");

    cancel.cancel();
    pool.join().await;

    info!("evr-collector shut down complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = ?e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C, shutting down...");
}

async fn health_handler() -> &'static str {
    "OK"
}
