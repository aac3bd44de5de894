//! pathjudge - Application Entry Point

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pathjudge::{
    config::{Config, JudgeMode, LocalExecutorKind},
    db,
    graph::{GraphService, GraphStore},
    handlers,
    judge::{spawn_worker, JudgeCoordinator, JudgeQueue},
    state::AppState,
    storage::{ObjectStore, S3ObjectStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.server.rust_log.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting pathjudge server...");

    // Database
    tracing::info!("Connecting to database...");
    let pool = db::connect(&config.database).await?;
    db::run_migrations(&pool).await?;

    // Object store
    tracing::info!("Connecting to object store at {}...", config.oss.address);
    let storage: Arc<dyn ObjectStore> = Arc::new(S3ObjectStore::new(&config.oss));
    storage.create_bucket_if_absent().await?;
    if !config.oss.public_read_prefixes.is_empty() {
        storage
            .set_public_read_prefixes(&config.oss.public_read_prefixes)
            .await?;
    }

    // Graph projection, reconciled from the relational store
    let graph = GraphService::new(Arc::new(GraphStore::new()));
    tracing::info!("Reconciling graph projection...");
    graph.init_graph(&pool).await?;

    // Docker client, only when the container executor is selected
    let docker = if config.judge.mode == JudgeMode::Local
        && config.judge.local.executor == LocalExecutorKind::Container
    {
        tracing::info!("Connecting to Docker...");
        let docker = bollard::Docker::connect_with_socket_defaults()?;
        let version = docker.version().await?;
        tracing::info!(
            "Connected to Docker version: {}",
            version.version.unwrap_or_default()
        );
        Some(docker)
    } else {
        None
    };

    // Judge pipeline: coordinator + bounded queue + background worker
    let coordinator = Arc::new(JudgeCoordinator::new(
        pool.clone(),
        storage.clone(),
        config.judge.clone(),
        docker,
    )?);
    let (queue, rx) = JudgeQueue::new(config.judge.queue_size);
    spawn_worker(rx, pool.clone(), coordinator, Some(graph.clone()));

    // HTTP surface
    let state = AppState::new(pool, storage, graph, queue, config.clone());
    let app = Router::new()
        .merge(handlers::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    let listener = TcpListener::bind(addr).await?;

    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
