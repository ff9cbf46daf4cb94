//! Attestation record lifecycle state machine.
//!
//! One record tracks one model's confirmation obligation within one cycle.
//! Records progress through states via guarded transitions:
//!
//! ```text
//!               submit                accept
//!  ┌─────────┐ ───────> ┌───────────┐ ───────> ┌──────────┐
//!  │ Pending │          │ Submitted │          │ Accepted │ (terminal)
//!  └─────────┘          └─────┬─────┘          └──────────┘
//!                  escalate │ │ reject
//!                           ▼ │
//!                ┌─────────────┴┐    reject    ┌──────────┐
//!                │ AdminReview  │ ───────────> │ Rejected │
//!                └──────────────┘   (accept    └────┬─────┘
//!                                    also ok)       │ submit
//!                                                   ▼
//!                                              Submitted
//! ```
//!
//! # Valid Transitions
//!
//! | From | Action | To | Guard |
//! |------|--------|----|----|
//! | Pending, Rejected | `submit` | Submitted | responses pass validation |
//! | Submitted | `escalate` | AdminReview | — |
//! | Submitted, AdminReview | `accept` | Accepted | — |
//! | Submitted, AdminReview | `reject` | Rejected | review comment non-empty |
//!
//! Invalid transitions return [`RecordError::InvalidTransition`]; guard
//! failures on `submit` return the full field-level violation list without
//! changing state.

mod error;
mod state;


pub use error::RecordError;
pub use state::{AttestationRecord, AttestationStatus, Decision, ReviewMetadata};
