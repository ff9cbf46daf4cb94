//! Compliance cycle reference data.
//!
//! A cycle is a recurring compliance period with a submission due date. It is
//! external to this engine: the server owns it, and the engine only reads it
//! (via [`crate::client::BulkState`]) to decide whether work is permitted and
//! how much time remains.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Open/closed status of a compliance cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CycleStatus {
    /// The cycle is accepting submissions.
    Open,
    /// The cycle is closed; no further submissions are accepted.
    Closed,
}

/// A compliance cycle. Immutable from this engine's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cycle {
    /// Server-assigned cycle id.
    pub id: i64,
    /// Human-readable cycle name (e.g. "2026 H1 Model Attestation").
    pub name: String,
    /// Date by which all attestations must be submitted.
    pub due_date: NaiveDate,
    /// Whether the cycle is open for submissions.
    pub status: CycleStatus,
}

impl Cycle {
    /// Returns `true` if the cycle is accepting submissions.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == CycleStatus::Open
    }

    /// Signed number of days until the due date. Negative once overdue.
    #[must_use]
    pub fn days_until_due(&self, today: NaiveDate) -> i64 {
        (self.due_date - today).num_days()
    }
}
