//! `/srs/sessions` handlers (spec §4.9, §6.1).

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use srs_backend_domain::{Clock, DomainError, SessionDto, SessionType, StartSessionRequest};

use crate::middleware::auth::AuthUser;
use crate::AppState;

pub async fn start_session(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<StartSessionRequest>,
) -> Result<Json<SessionDto>, DomainError> {
    let session_type = SessionType::from_str(&req.session_type)?;
    let now = state.clock.now();
    let session = state
        .session_tracker
        .start(user_id, &req.domain_id, session_type, now)
        .await?;

    Ok(Json(to_dto(session)))
}

pub async fn end_session(
    State(state): State<Arc<AppState>>,
    AuthUser(_user_id): AuthUser,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, DomainError> {
    let now = state.clock.now();
    state.session_tracker.end(session_id, now).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct ListSessionsQuery {
    pub limit: Option<usize>,
}

pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<ListSessionsQuery>,
) -> Result<Json<Vec<SessionDto>>, DomainError> {
    let limit = query.limit.unwrap_or(100).min(1000);
    let sessions = state.session_tracker.list(user_id, limit).await?;
    Ok(Json(sessions.into_iter().map(to_dto).collect()))
}

fn to_dto(session: srs_backend_domain::Session) -> SessionDto {
    SessionDto {
        id: session.id,
        domain: session.domain,
        session_type: session.session_type,
        start_time: session.start_time,
        end_time: session.end_time,
        total_reviews: session.total_reviews,
        successful_reviews: session.successful_reviews,
    }
}
