//! Credit Propagator (C5): BFS credit-flow across prerequisite edges.
//!
//! Grounded on the mobile core's `propagate_energy` BFS, generalized from a
//! single random-sampled edge weight to the server's deterministic
//! `weight * decay^(depth-1)` rule (spec §4.5.1).

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use sqlx::{Postgres, Transaction};

use srs_backend_domain::{NodeRef, ProgressRow, Status};
use srs_backend_storage::{GraphRepository, ProgressRepository, StorageError};

/// Decay applied per additional hop (spec §4.5.1).
pub const DECAY: f64 = 0.5;
/// Propagation stops once `|credit|` at a node drops below this (spec §4.5.1).
pub const MIN_CREDIT: f64 = 0.01;

/// One neighbor's credit delta and the resulting progress row, ready to be
/// batched into a single write by the caller.
pub struct CreditUpdate {
    pub node: NodeRef,
    pub credit: f64,
    pub row: ProgressRow,
}

/// Walk the graph from `origin`, summing decayed credit at each reached
/// neighbor, and apply it to each neighbor's progress row.
///
/// `outcome` is `+1.0` on a successful review (walks prerequisites) or
/// `-1.0` on failure (walks dependents), per spec §4.5.1. A node reached via
/// more than one path in the same traversal has its credit summed across
/// every path before the update is applied (spec §4.5.1): the frontier is
/// walked one depth at a time, and a node's contributions from all of that
/// depth's parents are collected before it is settled and expanded further.
/// Returns the updated rows in discovery order; the caller is responsible
/// for writing them inside its own transaction (spec §5, §4.7 step 6).
pub async fn propagate(
    tx: &mut Transaction<'_, Postgres>,
    graph: &GraphRepository,
    progress: &ProgressRepository,
    user_id: uuid::Uuid,
    domain: &str,
    origin: NodeRef,
    outcome: f64,
    now: DateTime<Utc>,
    decay: f64,
    min_credit: f64,
) -> Result<Vec<CreditUpdate>, StorageError> {
    let mut visited: HashSet<NodeRef> = HashSet::new();
    visited.insert(origin);

    let mut frontier: Vec<(NodeRef, f64)> = vec![(origin, outcome)];
    let mut order: Vec<NodeRef> = Vec::new();
    let mut credits: HashMap<NodeRef, f64> = HashMap::new();
    let mut depth: u32 = 0;

    while !frontier.is_empty() {
        let mut next_level: HashMap<NodeRef, f64> = HashMap::new();

        for (node, credit) in &frontier {
            let edges = if outcome > 0.0 {
                graph.get_prerequisites_tx(tx, domain, *node).await?
            } else {
                graph.get_dependents_tx(tx, domain, *node).await?
            };

            for (neighbor, weight) in edges {
                if visited.contains(&neighbor) {
                    continue;
                }

                let contribution = credit * weight * decay.powi(depth as i32);
                *next_level.entry(neighbor).or_insert(0.0) += contribution;
            }
        }

        let mut next_frontier = Vec::new();
        for (neighbor, total_credit) in next_level {
            if total_credit.abs() < min_credit {
                continue;
            }

            visited.insert(neighbor);
            order.push(neighbor);
            credits.insert(neighbor, total_credit);
            next_frontier.push((neighbor, total_credit));
        }

        frontier = next_frontier;
        depth += 1;
    }

    let mut updates = Vec::with_capacity(order.len());
    for node in order {
        let credit = credits[&node];
        let mut row = progress
            .get_tx(tx, user_id, domain, node)
            .await?
            .unwrap_or_else(|| ProgressRow::fresh(user_id, node, domain));

        apply_credit(&mut row, credit, now);
        updates.push(CreditUpdate { node, credit, row });
    }

    Ok(updates)
}

/// Apply a single credit delta to a neighbor's accumulator, triggering the
/// postpone/anticipate side-effect when it crosses +-1.0 (spec §4.5.2).
///
/// This is the single-step reference behavior: at most one postpone or
/// anticipate fires per propagation step, even if simultaneous paths push
/// the accumulator past the threshold by more than 1.0 (spec §9).
pub fn apply_credit(row: &mut ProgressRow, credit: f64, now: DateTime<Utc>) {
    row.accumulated_credit += credit;

    let scheduled = matches!(row.status, Status::Grasped | Status::Learned);
    if !scheduled {
        return;
    }

    if row.accumulated_credit >= 1.0 {
        let interval = row.interval_days;
        row.next_review = Some(row.next_review.unwrap_or(now) + chrono::Duration::seconds((interval * 86_400.0).round() as i64));
        row.credit_postponed = true;
        row.accumulated_credit -= 1.0;
    } else if row.accumulated_credit <= -1.0 {
        row.next_review = Some(now);
        row.accumulated_credit += 1.0;
    }
}
