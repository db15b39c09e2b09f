//! `GET /srs/domains/{domainId}/due` handler (spec §4.8, §6.1).

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;

use srs_backend_domain::{Clock, DomainError, DueQuery, ProgressRowDto, SessionType};

use crate::middleware::auth::AuthUser;
use crate::AppState;

pub async fn due(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(domain_id): Path<String>,
    Query(query): Query<DueQuery>,
) -> Result<Json<Vec<ProgressRowDto>>, DomainError> {
    let session_type = query
        .session_type
        .as_deref()
        .map(SessionType::from_str)
        .transpose()?;

    let now = state.clock.now();
    let rows = state
        .due_queue
        .due(user_id, &domain_id, session_type, now)
        .await?;

    Ok(Json(rows.iter().map(Into::into).collect()))
}
