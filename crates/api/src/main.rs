//! SRS Backend Server

use std::sync::Arc;
use std::time::Instant;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use srs_backend_api::{build_router, AppState};
use srs_backend_config::AppConfig;
use srs_backend_domain::SystemClock;
use srs_backend_engine::{DueQueueService, ReviewService, SessionTracker};
use srs_backend_storage::{
    create_pool, run_migrations, GraphRepository, HistoryRepository, ProgressRepository,
    SessionRepository,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting SRS Backend Server...");

    let config = AppConfig::from_env()?;
    tracing::info!("Binding to {}", config.bind_address);

    let pool = create_pool(&config.database_url).await?;
    tracing::info!("Database connection pool created");

    run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    let graph_repo = GraphRepository::new(pool.clone());
    let progress_repo = ProgressRepository::new(pool.clone());
    let history_repo = HistoryRepository::new(pool.clone());
    let session_repo = SessionRepository::new(pool.clone());
    let clock = Arc::new(SystemClock);

    let review_service = ReviewService::new(
        pool.clone(),
        graph_repo.clone(),
        progress_repo.clone(),
        history_repo.clone(),
        session_repo.clone(),
        clock.clone(),
        config.propagation_decay,
        config.propagation_min_credit,
    );
    let due_queue = DueQueueService::new(graph_repo.clone(), progress_repo.clone());
    let session_tracker = SessionTracker::new(session_repo.clone());

    let state = Arc::new(AppState {
        pool,
        graph_repo,
        progress_repo,
        history_repo,
        review_service,
        due_queue,
        session_tracker,
        clock,
        config: config.clone(),
        start_time: Instant::now(),
    });

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    tracing::info!("Server listening on {}", config.bind_address);

    // `GovernorLayer`'s default key extractor reads the client's peer
    // address from `ConnectInfo`, so the make-service must supply it.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
