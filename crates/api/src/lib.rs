//! SRS Backend Server library.

pub mod handlers;
pub mod middleware;

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

use srs_backend_config::AppConfig;
use srs_backend_domain::{Clock, HealthResponse, ReadyResponse};
use srs_backend_engine::{DueQueueService, ReviewService, SessionTracker};
use srs_backend_storage::{
    check_connection, GraphRepository, HistoryRepository, ProgressRepository, SessionRepository,
};
use sqlx::PgPool;

use middleware::auth::AdminApiKey;

/// Application state shared across handlers (spec §5).
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub graph_repo: GraphRepository,
    pub progress_repo: ProgressRepository,
    pub history_repo: HistoryRepository,
    pub review_service: ReviewService,
    pub due_queue: DueQueueService,
    pub session_tracker: SessionTracker,
    pub clock: Arc<dyn Clock>,
    pub config: AppConfig,
    pub start_time: Instant,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let review_governor = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(1)
            .burst_size(state.config.review_rate_limit_per_sec as u32)
            .finish()
            .expect("rate limiter config is valid"),
    );

    let reviews_route = Router::new()
        .route("/srs/reviews", post(handlers::reviews::submit_review))
        .layer(GovernorLayer {
            config: review_governor,
        });

    Router::new()
        .route("/srs/health", get(health))
        .route("/srs/ready", get(ready))
        .merge(reviews_route)
        .route(
            "/srs/reviews/history",
            get(handlers::reviews::review_history),
        )
        .route("/srs/nodes/status", put(handlers::status::change_status))
        .route(
            "/srs/domains/{domainId}/due",
            get(handlers::due::due),
        )
        .route(
            "/srs/domains/{domainId}/progress",
            get(handlers::progress::list_progress),
        )
        .route(
            "/srs/domains/{domainId}/stats",
            get(handlers::stats::stats),
        )
        .route(
            "/srs/domains/{domainId}/prerequisites",
            get(handlers::prerequisites::list_prerequisites),
        )
        .route(
            "/srs/prerequisites",
            post(handlers::prerequisites::create_prerequisite),
        )
        .route(
            "/srs/prerequisites/{id}",
            axum::routing::delete(handlers::prerequisites::delete_prerequisite),
        )
        .route(
            "/srs/sessions",
            post(handlers::sessions::start_session).get(handlers::sessions::list_sessions),
        )
        .route(
            "/srs/sessions/{id}/end",
            put(handlers::sessions::end_session),
        )
        .route(
            "/srs/admin/domains/{domainId}/audit",
            get(admin_domain_audit),
        )
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint.
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let uptime = state.start_time.elapsed().as_secs();

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        build_sha: option_env!("BUILD_SHA").unwrap_or("dev").to_string(),
        uptime_seconds: uptime,
    })
}

/// Readiness check endpoint.
async fn ready(State(state): State<Arc<AppState>>) -> Json<ReadyResponse> {
    let db_status = match check_connection(&state.pool).await {
        Ok(()) => "connected",
        Err(_) => "disconnected",
    };

    Json(ReadyResponse {
        status: if db_status == "connected" {
            "ok"
        } else {
            "degraded"
        }
        .to_string(),
        database: db_status.to_string(),
    })
}

/// Admin audit surface over a domain's review history, irrespective of user
/// (supplemented feature, gated by the shared admin key).
async fn admin_domain_audit(
    State(state): State<Arc<AppState>>,
    _admin: AdminApiKey,
    axum::extract::Path(domain_id): axum::extract::Path<String>,
    axum::extract::Query(query): axum::extract::Query<srs_backend_domain::HistoryQuery>,
) -> Result<Json<Vec<srs_backend_domain::ReviewRecordDto>>, srs_backend_domain::DomainError> {
    let records = state
        .history_repo
        .query_domain_audit(&domain_id, query.resolved_limit())
        .await?;

    Ok(Json(records.into_iter().map(Into::into).collect()))
}
