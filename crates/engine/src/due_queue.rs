//! Due-Queue Service (C8): ordered list of nodes due for review (spec §4.8).

use chrono::{DateTime, Utc};
use uuid::Uuid;

use srs_backend_domain::{kernel, NodeType, ProgressRow, SessionType, Status};
use srs_backend_storage::{GraphRepository, ProgressRepository, StorageError};

#[derive(Clone)]
pub struct DueQueueService {
    graph: GraphRepository,
    progress: ProgressRepository,
}

impl DueQueueService {
    pub fn new(graph: GraphRepository, progress: ProgressRepository) -> Self {
        Self { graph, progress }
    }

    /// Rows due at `now`, filtered by `status ∈ {grasped, learned}`, ordered
    /// per the §4.4.2 comparator. `session_type` narrows the node type;
    /// `Mixed` (or `None`) returns both.
    pub async fn due(
        &self,
        user_id: Uuid,
        domain: &str,
        session_type: Option<SessionType>,
        now: DateTime<Utc>,
    ) -> Result<Vec<ProgressRow>, StorageError> {
        let mut rows: Vec<ProgressRow> = self
            .progress
            .list_due(user_id, domain, now)
            .await?
            .into_iter()
            .filter(|r| matches!(r.status, Status::Grasped | Status::Learned))
            .filter(|r| match session_type {
                None | Some(SessionType::Mixed) => true,
                Some(SessionType::Definition) => r.node.node_type == NodeType::Definition,
                Some(SessionType::Exercise) => r.node.node_type == NodeType::Exercise,
            })
            .collect();

        let difficulties = self.graph.node_difficulties(domain).await?;

        let mut keyed: Vec<(ProgressRow, Option<i32>)> = rows
            .drain(..)
            .map(|r| {
                let difficulty = difficulties.get(&r.node).copied();
                (r, difficulty)
            })
            .collect();

        kernel::sort_due(&mut keyed, now);

        Ok(keyed.into_iter().map(|(row, _)| row).collect())
    }
}
