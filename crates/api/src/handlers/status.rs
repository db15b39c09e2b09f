//! `PUT /srs/nodes/status` handler (spec §4.6, §6.1).

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use validator::Validate;

use srs_backend_domain::{
    Clock, DomainError, NodeRef, Status, StatusChangeRequest, StatusChangeResponse,
};
use srs_backend_engine::status_propagator;

use crate::middleware::auth::AuthUser;
use crate::AppState;

pub async fn change_status(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<StatusChangeRequest>,
) -> Result<Json<StatusChangeResponse>, DomainError> {
    req.validate().map_err(DomainError::from_validation_errors)?;

    let node = NodeRef::new(req.node_type, req.node_id);
    let new_status = Status::from_str(&req.status)?;

    let domain = state
        .graph_repo
        .resolve_domain_for_node(node)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("node {} not found", node.node_id)))?;

    let now = state.clock.now();
    let mut tx = state
        .pool
        .begin()
        .await
        .map_err(srs_backend_storage::StorageError::Query)?;

    let touched = status_propagator::change_status(
        &mut tx,
        &state.graph_repo,
        &state.progress_repo,
        user_id,
        &domain,
        node,
        new_status,
        now,
    )
    .await?;

    tx.commit()
        .await
        .map_err(srs_backend_storage::StorageError::Query)?;

    Ok(Json(StatusChangeResponse {
        updated_nodes: touched.iter().map(Into::into).collect(),
    }))
}
