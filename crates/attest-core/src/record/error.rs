//! Attestation record transition errors.

use thiserror::Error;

use crate::validation::Violation;

use super::state::AttestationStatus;

/// Errors that can occur during record lifecycle transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// Attempted a transition the current state does not permit.
    #[error("invalid transition from {from:?} via {action}")]
    InvalidTransition {
        /// The record's current status.
        from: AttestationStatus,
        /// The attempted action name.
        action: &'static str,
    },

    /// Submit guard failed: one or more responses violate the rules.
    ///
    /// The violation list is exhaustive (all failures surface together) and
    /// the record is left unchanged.
    #[error("submission blocked by {} validation violation(s)", .violations.len())]
    ValidationFailed {
        /// The full, ordered violation list.
        violations: Vec<Violation>,
    },

    /// Rejection without a justification comment is not permitted.
    #[error("a review comment is required to reject an attestation")]
    ReviewCommentRequired,
}
