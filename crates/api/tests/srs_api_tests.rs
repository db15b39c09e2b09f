#![cfg(feature = "postgres-tests")]

use std::{
    net::{SocketAddr, Ipv4Addr},
    sync::Arc,
    time::Instant,
};

use axum::{
    body::{to_bytes, Body},
    extract::connect_info::ConnectInfo,
    http::{header, Request, StatusCode},
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use srs_backend_api::{build_router, AppState};
use srs_backend_config::AppConfig;
use srs_backend_domain::{Claims, SystemClock};
use srs_backend_engine::{DueQueueService, ReviewService, SessionTracker};
use srs_backend_storage::{GraphRepository, HistoryRepository, ProgressRepository, SessionRepository};

const JWT_SECRET: &str = "test-secret";

fn test_state(pool: PgPool) -> Arc<AppState> {
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
        0.5,
        0.01,
    );
    let due_queue = DueQueueService::new(graph_repo.clone(), progress_repo.clone());
    let session_tracker = SessionTracker::new(session_repo.clone());

    Arc::new(AppState {
        pool,
        graph_repo,
        progress_repo,
        history_repo,
        review_service,
        due_queue,
        session_tracker,
        clock,
        config: AppConfig {
            database_url: "postgres://unused".to_string(),
            jwt_secret: JWT_SECRET.to_string(),
            bind_address: "127.0.0.1:0".to_string(),
            admin_api_key: "test-admin-key".to_string(),
            propagation_decay: 0.5,
            propagation_min_credit: 0.01,
            review_rate_limit_per_sec: 1000,
        },
        start_time: Instant::now(),
    })
}

fn auth_header(user_id: Uuid) -> String {
    let now = 1_700_000_000u64;
    let token = encode(
        &Header::default(),
        &Claims {
            sub: user_id.to_string(),
            exp: now + 3600,
            iat: now,
        },
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap();

    format!("Bearer {token}")
}

/// `GovernorLayer`'s default key extractor reads the client address from
/// `ConnectInfo`, which a real connection supplies but `oneshot` does not.
fn with_peer_addr(mut req: Request<Body>) -> Request<Body> {
    req.extensions_mut()
        .insert(ConnectInfo(SocketAddr::from((Ipv4Addr::LOCALHOST, 9999))));
    req
}

async fn seed_node(pool: &PgPool, node_type: &str, node_id: i64, domain: &str, difficulty: Option<i32>) {
    sqlx::query(
        "INSERT INTO nodes (node_type, node_id, domain_id, difficulty) VALUES ($1, $2, $3, $4)",
    )
    .bind(node_type)
    .bind(node_id)
    .bind(domain)
    .bind(difficulty)
    .execute(pool)
    .await
    .unwrap();
}

#[sqlx::test(migrations = "../../migrations")]
async fn review_cycle_updates_progress_and_history(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
    seed_node(&pool, "exercise", 1, "quran", Some(2)).await;
    let user_id = Uuid::new_v4();

    let app = build_router(test_state(pool.clone()));

    let submit = app
        .clone()
        .oneshot(with_peer_addr(
            Request::builder()
                .method("POST")
                .uri("/srs/reviews")
                .header(header::AUTHORIZATION, auth_header(user_id))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json!({
                    "node_id": 1,
                    "node_type": "exercise",
                    "success": true,
                    "quality": 4
                }))?))?,
        ))
        .await?;
    assert_eq!(submit.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(&to_bytes(submit.into_body(), 1024 * 1024).await?)?;
    assert_eq!(body["success"], true);

    let history = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/srs/reviews/history?limit=10")
                .header(header::AUTHORIZATION, auth_header(user_id))
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(history.status(), StatusCode::OK);
    let history_json: Value =
        serde_json::from_slice(&to_bytes(history.into_body(), 1024 * 1024).await?)?;
    assert_eq!(history_json.as_array().unwrap().len(), 1);

    let progress = app
        .oneshot(
            Request::builder()
                .uri("/srs/domains/quran/progress")
                .header(header::AUTHORIZATION, auth_header(user_id))
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(progress.status(), StatusCode::OK);
    let progress_json: Value =
        serde_json::from_slice(&to_bytes(progress.into_body(), 1024 * 1024).await?)?;
    assert_eq!(progress_json[0]["status"], "grasped");

    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn review_without_auth_is_rejected(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_router(test_state(pool));

    let resp = app
        .oneshot(with_peer_addr(
            Request::builder()
                .method("POST")
                .uri("/srs/reviews")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json!({
                    "node_id": 1,
                    "node_type": "exercise",
                    "success": true,
                    "quality": 4
                }))?))?,
        ))
        .await?;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn review_of_unregistered_node_is_not_found(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_router(test_state(pool));
    let user_id = Uuid::new_v4();

    let resp = app
        .oneshot(with_peer_addr(
            Request::builder()
                .method("POST")
                .uri("/srs/reviews")
                .header(header::AUTHORIZATION, auth_header(user_id))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json!({
                    "node_id": 999,
                    "node_type": "exercise",
                    "success": true,
                    "quality": 4
                }))?))?,
        ))
        .await?;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    Ok(())
}

/// A diamond graph (C requires B1 and B2, both require A) must sum the
/// credit A receives from both converging paths instead of dropping one.
#[sqlx::test(migrations = "../../migrations")]
async fn credit_propagation_sums_converging_paths(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
    seed_node(&pool, "exercise", 1, "quran", Some(2)).await; // C
    seed_node(&pool, "exercise", 2, "quran", Some(2)).await; // B1
    seed_node(&pool, "exercise", 3, "quran", Some(2)).await; // B2
    seed_node(&pool, "definition", 4, "quran", None).await; // A

    for (node_type, node_id, prereq_type, prereq_id) in [
        ("exercise", 1, "exercise", 2),
        ("exercise", 1, "exercise", 3),
        ("exercise", 2, "definition", 4),
        ("exercise", 3, "definition", 4),
    ] {
        sqlx::query(
            "INSERT INTO node_prerequisites (domain_id, node_type, node_id, prerequisite_type, prerequisite_id, weight, is_manual) \
             VALUES ('quran', $1, $2, $3, $4, 1.0, false)",
        )
        .bind(node_type)
        .bind(node_id)
        .bind(prereq_type)
        .bind(prereq_id)
        .execute(&pool)
        .await?;
    }

    let app = build_router(test_state(pool.clone()));
    let user_id = Uuid::new_v4();

    let resp = app
        .oneshot(with_peer_addr(
            Request::builder()
                .method("POST")
                .uri("/srs/reviews")
                .header(header::AUTHORIZATION, auth_header(user_id))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json!({
                    "node_id": 1,
                    "node_type": "exercise",
                    "success": true,
                    "quality": 4
                }))?))?,
        ))
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);

    let row: (f64,) = sqlx::query_as(
        "SELECT accumulated_credit FROM progress WHERE user_id = $1 AND node_type = 'definition' AND node_id = 4",
    )
    .bind(user_id)
    .fetch_one(&pool)
    .await?;
    assert!(
        (row.0 - 1.0).abs() < 1e-9,
        "A should receive the summed credit of both B1->A and B2->A paths, got {}",
        row.0
    );

    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn status_change_cascades_to_prerequisites(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
    seed_node(&pool, "exercise", 1, "quran", Some(2)).await;
    seed_node(&pool, "definition", 2, "quran", None).await;

    sqlx::query(
        "INSERT INTO node_prerequisites (domain_id, node_type, node_id, prerequisite_type, prerequisite_id, weight, is_manual) \
         VALUES ('quran', 'exercise', 1, 'definition', 2, 0.8, false)",
    )
    .execute(&pool)
    .await?;

    let app = build_router(test_state(pool.clone()));
    let user_id = Uuid::new_v4();

    let resp = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/srs/nodes/status")
                .header(header::AUTHORIZATION, auth_header(user_id))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json!({
                    "node_id": 1,
                    "node_type": "exercise",
                    "status": "grasped"
                }))?))?,
        )
        .await?;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(&to_bytes(resp.into_body(), 1024 * 1024).await?)?;
    let updated = body["updatedNodes"].as_array().unwrap();
    assert_eq!(updated.len(), 2, "origin plus the fresh prerequisite it promotes");

    let row: (String,) = sqlx::query_as(
        "SELECT status FROM progress WHERE user_id = $1 AND node_type = 'definition' AND node_id = 2",
    )
    .bind(user_id)
    .fetch_one(&pool)
    .await?;
    assert_eq!(row.0, "grasped");

    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn admin_audit_requires_admin_key(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_router(test_state(pool));

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/srs/admin/domains/quran/audit")
                .body(Body::empty())?,
        )
        .await?;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn health_and_ready_report_ok(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_router(test_state(pool));

    let health = app
        .clone()
        .oneshot(Request::builder().uri("/srs/health").body(Body::empty())?)
        .await?;
    assert_eq!(health.status(), StatusCode::OK);

    let ready = app
        .oneshot(Request::builder().uri("/srs/ready").body(Body::empty())?)
        .await?;
    assert_eq!(ready.status(), StatusCode::OK);
    let ready_json: Value = serde_json::from_slice(&to_bytes(ready.into_body(), 1024 * 1024).await?)?;
    assert_eq!(ready_json["database"], "connected");

    Ok(())
}
