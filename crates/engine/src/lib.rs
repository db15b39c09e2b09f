//! Orchestration layer for the SRS backend: the Credit Propagator (C5),
//! Status Propagator (C6), Review Service (C7), Due-Queue Service (C8), and
//! Session Tracker (C9). Everything here composes storage repositories
//! inside transaction boundaries owned by this crate.

pub mod credit_propagator;
pub mod due_queue;
pub mod review_service;
pub mod session_tracker;
pub mod status_propagator;

pub use due_queue::DueQueueService;
pub use review_service::{ReviewInput, ReviewService};
pub use session_tracker::SessionTracker;
