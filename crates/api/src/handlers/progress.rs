//! `GET /srs/domains/{domainId}/progress` handler (spec §6.1).

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;

use srs_backend_domain::{DomainError, ProgressRowDto};

use crate::middleware::auth::AuthUser;
use crate::AppState;

pub async fn list_progress(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(domain_id): Path<String>,
) -> Result<Json<Vec<ProgressRowDto>>, DomainError> {
    let rows = state.progress_repo.list_by_domain(user_id, &domain_id).await?;
    Ok(Json(rows.iter().map(Into::into).collect()))
}
