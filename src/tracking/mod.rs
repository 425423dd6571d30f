//! Experiment-tracking service client
//!
//! ## Shape
//!
//! ```text
//! TrackingClient ──runs()──▶ RunStream ──▶ Run (1 per pull)
//!                                           │
//!                                           └─history()──▶ HistoryStream ──▶ HistoryRow
//! ```
//!
//! Both streams are finite, forward-only, pull-based lazy sequences:
//! each pull may issue a network call (the service is paginated), so
//! enumeration has observable side effects. A failed pull consumes
//! nothing and is safe to re-issue.

mod client;
mod row;

pub use client::{HistoryStream, Run, RunStream, TrackingClient};
pub use row::{filter_row, HistoryRow};
