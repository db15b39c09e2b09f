//! `/srs/prerequisites` handlers (spec §4.1, §6.1).

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use validator::Validate;

use srs_backend_domain::{
    CreatePrerequisiteRequest, DomainError, EdgeWeight, NodeRef, PrerequisiteEdgeDto,
};

use crate::middleware::auth::AuthUser;
use crate::AppState;

pub async fn create_prerequisite(
    State(state): State<Arc<AppState>>,
    AuthUser(_user_id): AuthUser,
    Json(req): Json<CreatePrerequisiteRequest>,
) -> Result<Json<PrerequisiteEdgeDto>, DomainError> {
    req.validate().map_err(DomainError::from_validation_errors)?;

    let node = NodeRef::new(req.node_type, req.node_id);
    let prerequisite = NodeRef::new(req.prerequisite_type, req.prerequisite_id);
    let weight = EdgeWeight::new(req.weight)?;

    let domain = state
        .graph_repo
        .resolve_domain_for_node(node)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("node {} not found", node.node_id)))?;

    let edge = state
        .graph_repo
        .upsert_edge(&domain, node, prerequisite, weight, req.is_manual)
        .await?;

    Ok(Json(to_dto(edge)))
}

pub async fn list_prerequisites(
    State(state): State<Arc<AppState>>,
    AuthUser(_user_id): AuthUser,
    Path(domain_id): Path<String>,
) -> Result<Json<Vec<PrerequisiteEdgeDto>>, DomainError> {
    let edges = state.graph_repo.list_domain_edges(&domain_id).await?;
    Ok(Json(edges.into_iter().map(to_dto).collect()))
}

pub async fn delete_prerequisite(
    State(state): State<Arc<AppState>>,
    AuthUser(_user_id): AuthUser,
    Path(edge_id): Path<i64>,
) -> Result<StatusCode, DomainError> {
    state.graph_repo.delete_edge(edge_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn to_dto(edge: srs_backend_domain::PrerequisiteEdge) -> PrerequisiteEdgeDto {
    PrerequisiteEdgeDto {
        id: edge.id,
        node_id: edge.node.node_id,
        node_type: edge.node.node_type,
        prerequisite_id: edge.prerequisite.node_id,
        prerequisite_type: edge.prerequisite.node_type,
        weight: edge.weight.value(),
        is_manual: edge.is_manual,
    }
}
