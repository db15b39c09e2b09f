//! Core entities: nodes, edges, progress rows, review records, sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;

/// Whether a node is a definition (read-only fact) or an exercise (graded).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Definition,
    Exercise,
}

/// Identifies a node within a domain: `(node_type, node_id)` per spec §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeRef {
    pub node_type: NodeType,
    pub node_id: i64,
}

impl NodeRef {
    pub fn new(node_type: NodeType, node_id: i64) -> Self {
        Self { node_type, node_id }
    }
}

/// A knowledge node. Exercises carry a difficulty; definitions do not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub node_type: NodeType,
    pub node_id: i64,
    pub domain: String,
    pub difficulty: Option<i32>,
}

/// Prerequisite edge weight, restricted to `(0, 1]` at construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeWeight(f64);

impl EdgeWeight {
    pub fn new(value: f64) -> Result<Self, DomainError> {
        if value > 0.0 && value <= 1.0 {
            Ok(Self(value))
        } else {
            Err(DomainError::Validation(format!(
                "edge weight must be in (0, 1], got {value}"
            )))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

/// `(node, prerequisite, weight, is_manual)` per spec §3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrerequisiteEdge {
    pub id: i64,
    pub domain: String,
    pub node: NodeRef,
    pub prerequisite: NodeRef,
    pub weight: EdgeWeight,
    pub is_manual: bool,
}

/// Lifecycle status of a user's relation to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Fresh,
    Tackling,
    Grasped,
    Learned,
}

impl Status {
    /// Ordering priority used by the due-queue comparator (§4.4.2).
    /// Higher priority reviews sooner.
    pub fn priority(self) -> i32 {
        match self {
            Status::Tackling => 3,
            Status::Grasped => 2,
            Status::Learned => 1,
            Status::Fresh => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Fresh => "fresh",
            Status::Tackling => "tackling",
            Status::Grasped => "grasped",
            Status::Learned => "learned",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, DomainError> {
        match s {
            "fresh" => Ok(Status::Fresh),
            "tackling" => Ok(Status::Tackling),
            "grasped" => Ok(Status::Grasped),
            "learned" => Ok(Status::Learned),
            other => Err(DomainError::Validation(format!("unknown status: {other}"))),
        }
    }
}

/// Per-(user, node) scheduling state (spec §3 "Progress row").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRow {
    pub user_id: Uuid,
    pub node: NodeRef,
    pub domain: String,
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

impl ProgressRow {
    /// A fresh progress row, lazily created on first contact with a node.
    pub fn fresh(user_id: Uuid, node: NodeRef, domain: impl Into<String>) -> Self {
        Self {
            user_id,
            node,
            domain: domain.into(),
            status: Status::Fresh,
            easiness_factor: 2.5,
            interval_days: 0.0,
            repetitions: 0,
            last_review: None,
            next_review: None,
            accumulated_credit: 0.0,
            credit_postponed: false,
            total_reviews: 0,
            successful_reviews: 0,
        }
    }
}

/// Whether a review was user-initiated or credit-flow-induced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewType {
    Explicit,
    Implicit,
}

/// Append-only review record (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub id: i64,
    pub user_id: Uuid,
    pub node: NodeRef,
    pub review_time: DateTime<Utc>,
    pub review_type: ReviewType,
    pub success: bool,
    pub quality: Option<i32>,
    pub time_taken_sec: Option<i32>,
    pub credit_applied: f64,
    pub ef_before: f64,
    pub ef_after: f64,
    pub interval_before: f64,
    pub interval_after: f64,
    pub session_id: Option<Uuid>,
}

/// Type of study session, matching the `/due` session-type filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    Definition,
    Exercise,
    Mixed,
}

impl SessionType {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionType::Definition => "definition",
            SessionType::Exercise => "exercise",
            SessionType::Mixed => "mixed",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, DomainError> {
        match s {
            "definition" => Ok(SessionType::Definition),
            "exercise" => Ok(SessionType::Exercise),
            "mixed" => Ok(SessionType::Mixed),
            other => Err(DomainError::Validation(format!(
                "unknown session type: {other}"
            ))),
        }
    }
}

/// A study session (spec §3 "Session").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub domain: String,
    pub session_type: SessionType,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub total_reviews: i32,
    pub successful_reviews: i32,
}
