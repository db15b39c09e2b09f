//! Request/response DTOs for the `/srs/*` HTTP surface (spec §6.2).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::entities::{NodeRef, NodeType, ProgressRow, SessionType, Status};

/// Convenience mapping from the source system's string labels to numeric
/// quality, per spec §9 ("a mapping again=1, hard=3, good=4, easy=5 is
/// provided only for convenience"). The numeric form is what the API
/// actually accepts.
pub fn quality_from_label(label: &str) -> Option<u8> {
    match label {
        "again" => Some(1),
        "hard" => Some(3),
        "good" => Some(4),
        "easy" => Some(5),
        _ => None,
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReviewRequest {
    pub node_id: i64,
    pub node_type: NodeType,
    pub success: bool,
    #[validate(range(min = 0, max = 5))]
    pub quality: u8,
    pub time_taken: Option<i32>,
    pub session_id: Option<Uuid>,
}

impl ReviewRequest {
    pub fn node(&self) -> NodeRef {
        NodeRef::new(self.node_type, self.node_id)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRowDto {
    pub node_id: i64,
    pub node_type: NodeType,
    pub status: Status,
    pub easiness_factor: f64,
    pub interval_days: f64,
    pub repetitions: i32,
    pub last_review: Option<DateTime<Utc>>,
    pub next_review: Option<DateTime<Utc>>,
    pub accumulated_credit: f64,
    pub credit_postponed: bool,
    pub total_reviews: i64,
    pub successful_reviews: i64,
}

impl From<&ProgressRow> for ProgressRowDto {
    fn from(row: &ProgressRow) -> Self {
        Self {
            node_id: row.node.node_id,
            node_type: row.node.node_type,
            status: row.status,
            easiness_factor: row.easiness_factor,
            interval_days: row.interval_days,
            repetitions: row.repetitions,
            last_review: row.last_review,
            next_review: row.next_review,
            accumulated_credit: row.accumulated_credit,
            credit_postponed: row.credit_postponed,
            total_reviews: row.total_reviews,
            successful_reviews: row.successful_reviews,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditFlowType {
    Explicit,
    Implicit,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditFlowEntry {
    pub node_id: i64,
    pub node_type: NodeType,
    pub credit: f64,
    #[serde(rename = "type")]
    pub flow_type: CreditFlowType,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    pub success: bool,
    pub message: String,
    pub updated_nodes: Vec<ProgressRowDto>,
    pub credit_flow: Vec<CreditFlowEntry>,
}

#[derive(Debug, Deserialize)]
pub struct DueQuery {
    #[serde(rename = "type")]
    pub session_type: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct StatusChangeRequest {
    pub node_id: i64,
    pub node_type: NodeType,
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangeResponse {
    pub updated_nodes: Vec<ProgressRowDto>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePrerequisiteRequest {
    pub node_id: i64,
    pub node_type: NodeType,
    pub prerequisite_id: i64,
    pub prerequisite_type: NodeType,
    #[validate(range(min = 0.0001, max = 1.0))]
    pub weight: f64,
    #[serde(default)]
    pub is_manual: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrerequisiteEdgeDto {
    pub id: i64,
    pub node_id: i64,
    pub node_type: NodeType,
    pub prerequisite_id: i64,
    pub prerequisite_type: NodeType,
    pub weight: f64,
    pub is_manual: bool,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub node_id: Option<i64>,
    pub node_type: Option<NodeType>,
    pub limit: Option<usize>,
}

impl HistoryQuery {
    pub const DEFAULT_LIMIT: usize = 100;
    pub const MAX_LIMIT: usize = 1000;

    pub fn resolved_limit(&self) -> usize {
        self.limit.unwrap_or(Self::DEFAULT_LIMIT).min(Self::MAX_LIMIT)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecordDto {
    pub id: i64,
    pub node_id: i64,
    pub node_type: NodeType,
    pub review_time: DateTime<Utc>,
    pub review_type: crate::entities::ReviewType,
    pub success: bool,
    pub quality: Option<i32>,
    pub time_taken_sec: Option<i32>,
    pub credit_applied: f64,
    pub ef_before: f64,
    pub ef_after: f64,
    pub interval_before: f64,
    pub interval_after: f64,
}

impl From<crate::entities::ReviewRecord> for ReviewRecordDto {
    fn from(record: crate::entities::ReviewRecord) -> Self {
        Self {
            id: record.id,
            node_id: record.node.node_id,
            node_type: record.node.node_type,
            review_time: record.review_time,
            review_type: record.review_type,
            success: record.success,
            quality: record.quality,
            time_taken_sec: record.time_taken_sec,
            credit_applied: record.credit_applied,
            ef_before: record.ef_before,
            ef_after: record.ef_after,
            interval_before: record.interval_before,
            interval_after: record.interval_after,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    pub domain_id: String,
    pub session_type: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDto {
    pub id: Uuid,
    pub domain: String,
    pub session_type: SessionType,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub total_reviews: i32,
    pub successful_reviews: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainStatsResponse {
    pub counts_by_status: std::collections::HashMap<String, i64>,
    pub due_count: i64,
    pub completed_today: i64,
    pub success_rate: f64,
}
