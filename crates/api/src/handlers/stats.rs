//! `GET /srs/domains/{domainId}/stats` handler (spec §6.1).

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;

use srs_backend_domain::{Clock, DomainError, DomainStatsResponse};

use crate::middleware::auth::AuthUser;
use crate::AppState;

pub async fn stats(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(domain_id): Path<String>,
) -> Result<Json<DomainStatsResponse>, DomainError> {
    let now = state.clock.now();
    let today_start = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always valid")
        .and_utc();

    let (counts_by_status, due_count, success_rate) = state
        .progress_repo
        .domain_stats(user_id, &domain_id, now)
        .await?;
    let completed_today = state
        .history_repo
        .count_since(user_id, &domain_id, today_start)
        .await?;

    Ok(Json(DomainStatsResponse {
        counts_by_status,
        due_count,
        completed_today,
        success_rate,
    }))
}
