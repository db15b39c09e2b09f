//! Scheduling Kernel (C4): pure, deterministic, side-effect-free functions.
//!
//! Nothing in this module performs I/O or logs — it is unit-tested in
//! isolation and called by `engine::review_service` inside the review
//! transaction.

use chrono::{DateTime, Duration, Utc};

use crate::entities::{NodeRef, ProgressRow, Status};

pub const MIN_EASINESS_FACTOR: f64 = 1.3;
pub const INITIAL_EASINESS_FACTOR: f64 = 2.5;

/// Output of applying the modified SM-2 update (spec §4.4.1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sm2Outcome {
    pub easiness_factor: f64,
    pub interval_days: f64,
    pub repetitions: i32,
    pub next_review: DateTime<Utc>,
}

/// Round half away from zero, matching spec §4.4.1's `round_half_up` on
/// positive interval values.
pub fn round_half_up(value: f64) -> f64 {
    value.round()
}

/// Apply the modified SM-2 update described in spec §4.4.1.
///
/// `success` and `quality` are both consulted: a review is a failure when
/// `success` is false OR `quality < 3`, even if the caller's `success` flag
/// disagrees with the quality rating.
pub fn apply_sm2(
    easiness_factor: f64,
    interval_days: f64,
    repetitions: i32,
    quality: u8,
    success: bool,
    now: DateTime<Utc>,
) -> Sm2Outcome {
    let q = f64::from(quality.min(5));
    let delta = 0.1 - (5.0 - q) * (0.08 + (5.0 - q) * 0.02);
    let ef = (easiness_factor + delta).max(MIN_EASINESS_FACTOR);

    let failed = !success || quality < 3;

    let (reps, interval) = if failed {
        (0, 1.0)
    } else {
        let interval = match repetitions {
            0 => 1.0,
            1 => 6.0,
            _ => round_half_up(interval_days * ef).max(1.0),
        };
        (repetitions + 1, interval)
    };

    let next_review = now + Duration::seconds((interval * 86_400.0).round() as i64);

    Sm2Outcome {
        easiness_factor: ef,
        interval_days: interval,
        repetitions: reps,
        next_review,
    }
}

/// Sort key for the due-queue comparator (spec §4.4.2). Lower ⇒ sooner.
///
/// Tuple order: `(-overdue_days, -status_priority, -difficulty, node_id)`.
/// Using negated fields lets a plain ascending sort on the tuple implement
/// "most overdue, most urgent status, most difficult, then node id" without
/// a custom `Ord` impl.
pub fn due_sort_key(
    row: &ProgressRow,
    difficulty: Option<i32>,
    now: DateTime<Utc>,
) -> (i64, i32, i32, i64) {
    let overdue_days = row
        .next_review
        .map(|next| (now - next).num_seconds())
        .unwrap_or(0);
    (
        -overdue_days,
        -row.status.priority(),
        -difficulty.unwrap_or(0),
        row.node.node_id,
    )
}

/// Sort a due list in place per §4.4.2, given each row's difficulty (exercises
/// only; `None` for definitions).
pub fn sort_due(rows: &mut [(ProgressRow, Option<i32>)], now: DateTime<Utc>) {
    rows.sort_by_key(|(row, difficulty)| due_sort_key(row, *difficulty, now));
}

/// Seed values applied when a node is promoted directly into `grasped`/`learned`
/// without having gone through an explicit review (spec §4.6).
pub fn seeded_sm2(now: DateTime<Utc>) -> Sm2Outcome {
    Sm2Outcome {
        easiness_factor: INITIAL_EASINESS_FACTOR,
        interval_days: 1.0,
        repetitions: 1,
        next_review: now + Duration::days(1),
    }
}

/// A (status, node) pair the status propagator has just touched, returned to
/// the caller for inclusion in the response / history.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub node: NodeRef,
    pub new_status: Status,
}
