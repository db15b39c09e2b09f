//! Session Tracker (C9): opens/closes study sessions (spec §4.9).

use chrono::{DateTime, Utc};
use uuid::Uuid;

use srs_backend_domain::{DomainError, Session, SessionType};
use srs_backend_storage::SessionRepository;

#[derive(Clone)]
pub struct SessionTracker {
    sessions: SessionRepository,
}

impl SessionTracker {
    pub fn new(sessions: SessionRepository) -> Self {
        Self { sessions }
    }

    pub async fn start(
        &self,
        user_id: Uuid,
        domain: &str,
        session_type: SessionType,
        now: DateTime<Utc>,
    ) -> Result<Session, DomainError> {
        Ok(self.sessions.start(user_id, domain, session_type, now).await?)
    }

    /// Idempotent: ending an already-closed session is a no-op (spec §4.9).
    pub async fn end(&self, session_id: Uuid, now: DateTime<Utc>) -> Result<(), DomainError> {
        let existing = self
            .sessions
            .get(session_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("session {session_id}")))?;

        if existing.end_time.is_some() {
            return Ok(());
        }

        self.sessions.end(session_id, now).await?;
        Ok(())
    }

    pub async fn get(&self, session_id: Uuid) -> Result<Option<Session>, DomainError> {
        Ok(self.sessions.get(session_id).await?)
    }

    pub async fn list(&self, user_id: Uuid, limit: usize) -> Result<Vec<Session>, DomainError> {
        Ok(self.sessions.list_by_user(user_id, limit).await?)
    }
}
