//! Status Propagator (C6): status transitions and their graph-wide cascade
//! (spec §4.6).

use std::collections::{HashSet, VecDeque};

use chrono::{DateTime, Utc};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use srs_backend_domain::{kernel, DomainError, NodeRef, ProgressRow, Status};
use srs_backend_storage::{GraphRepository, ProgressRepository};

/// Apply a status change to `origin` and cascade it across the graph,
/// returning every progress row touched (origin first).
///
/// The cascade never leaves `domain` and always terminates because the
/// prerequisite graph is a DAG (spec §4.6).
pub async fn change_status(
    tx: &mut Transaction<'_, Postgres>,
    graph: &GraphRepository,
    progress: &ProgressRepository,
    user_id: Uuid,
    domain: &str,
    origin: NodeRef,
    new_status: Status,
    now: DateTime<Utc>,
) -> Result<Vec<ProgressRow>, DomainError> {
    let mut origin_row = progress
        .get_tx(tx, user_id, domain, origin)
        .await?
        .unwrap_or_else(|| ProgressRow::fresh(user_id, origin, domain));

    apply_transition(&mut origin_row, new_status, now);

    let mut touched = vec![origin_row];

    match new_status {
        Status::Tackling | Status::Fresh => {
            // Demote every dependent transitively reachable that is currently
            // grasped or learned — the user is no longer ready for them.
            let demoted = cascade(
                tx,
                graph,
                progress,
                user_id,
                domain,
                origin,
                CascadeDirection::Dependents,
                |row| matches!(row.status, Status::Grasped | Status::Learned),
                |row, now| apply_transition(row, Status::Tackling, now),
                now,
            )
            .await?;
            touched.extend(demoted);
        }
        Status::Grasped | Status::Learned => {
            // Promote every prerequisite transitively reachable that is still
            // fresh — the user implicitly knows them.
            let promoted = cascade(
                tx,
                graph,
                progress,
                user_id,
                domain,
                origin,
                CascadeDirection::Prerequisites,
                |row| row.status == Status::Fresh,
                |row, now| apply_transition(row, Status::Grasped, now),
                now,
            )
            .await?;
            touched.extend(promoted);
        }
    }

    progress.upsert_many_tx(tx, &touched).await?;

    Ok(touched)
}

pub(crate) enum CascadeDirection {
    Prerequisites,
    Dependents,
}

#[allow(clippy::too_many_arguments)]
pub(crate) async fn cascade(
    tx: &mut Transaction<'_, Postgres>,
    graph: &GraphRepository,
    progress: &ProgressRepository,
    user_id: Uuid,
    domain: &str,
    origin: NodeRef,
    direction: CascadeDirection,
    should_touch: impl Fn(&ProgressRow) -> bool,
    mutate: impl Fn(&mut ProgressRow, DateTime<Utc>),
    now: DateTime<Utc>,
) -> Result<Vec<ProgressRow>, DomainError> {
    let mut visited: HashSet<NodeRef> = HashSet::new();
    visited.insert(origin);

    let mut queue: VecDeque<NodeRef> = VecDeque::new();
    queue.push_back(origin);

    let mut touched = Vec::new();

    while let Some(current) = queue.pop_front() {
        let neighbors = match direction {
            CascadeDirection::Prerequisites => {
                graph.get_prerequisites_tx(tx, domain, current).await?
            }
            CascadeDirection::Dependents => graph.get_dependents_tx(tx, domain, current).await?,
        };

        for (neighbor, _weight) in neighbors {
            if !visited.insert(neighbor) {
                continue;
            }

            let mut row = progress
                .get_tx(tx, user_id, domain, neighbor)
                .await?
                .unwrap_or_else(|| ProgressRow::fresh(user_id, neighbor, domain));

            if should_touch(&row) {
                mutate(&mut row, now);
                touched.push(row);
            }

            queue.push_back(neighbor);
        }
    }

    Ok(touched)
}

/// Apply a single node's status transition in place (spec §4.6 table).
pub(crate) fn apply_transition(row: &mut ProgressRow, new_status: Status, now: DateTime<Utc>) {
    match new_status {
        Status::Tackling => {
            row.status = Status::Tackling;
            row.next_review = None;
        }
        Status::Grasped | Status::Learned => {
            if row.repetitions == 0 {
                let seeded = kernel::seeded_sm2(now);
                row.easiness_factor = seeded.easiness_factor;
                row.interval_days = seeded.interval_days;
                row.repetitions = seeded.repetitions;
                row.last_review = Some(now);
                row.next_review = Some(seeded.next_review);
            }
            row.status = new_status;
        }
        Status::Fresh => {
            row.status = Status::Fresh;
            row.easiness_factor = 2.5;
            row.interval_days = 0.0;
            row.repetitions = 0;
            row.last_review = None;
            row.next_review = None;
            row.accumulated_credit = 0.0;
            row.credit_postponed = false;
        }
    }
}
