//! `/srs/reviews` and `/srs/reviews/history` handlers (spec §4.7, §6.1).

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use validator::Validate;

use srs_backend_domain::{DomainError, HistoryQuery, ReviewRecordDto, ReviewRequest, ReviewResponse};
use srs_backend_engine::ReviewInput;

use crate::middleware::auth::AuthUser;
use crate::AppState;

pub async fn submit_review(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<ReviewRequest>,
) -> Result<Json<ReviewResponse>, DomainError> {
    req.validate().map_err(DomainError::from_validation_errors)?;

    let node = req.node();
    let domain = state
        .graph_repo
        .resolve_domain_for_node(node)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("node {} not found", node.node_id)))?;

    tracing::info!(
        user_id = %user_id,
        node_id = req.node_id,
        quality = req.quality,
        success = req.success,
        "review submitted"
    );

    let response = state
        .review_service
        .review(
            user_id,
            &domain,
            ReviewInput {
                node: req.node(),
                success: req.success,
                quality: req.quality,
                time_taken_sec: req.time_taken,
                session_id: req.session_id,
            },
        )
        .await?;

    Ok(Json(response))
}

pub async fn review_history(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<ReviewRecordDto>>, DomainError> {
    let node = match (query.node_id, query.node_type) {
        (Some(id), Some(node_type)) => Some(srs_backend_domain::NodeRef::new(node_type, id)),
        _ => None,
    };

    let records = state
        .history_repo
        .query(user_id, node, query.resolved_limit())
        .await?;

    Ok(Json(records.into_iter().map(Into::into).collect()))
}
