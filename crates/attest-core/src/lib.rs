//! Attestation lifecycle and bulk-submission engine for model governance.
//!
//! This crate implements the stateful core of a model-governance workflow:
//! during a compliance cycle, a steward re-affirms (or flags for correction)
//! a set of model inventory records, persisting partial work as a draft and
//! submitting the whole batch once validation passes.
//!
//! # Architecture
//!
//! ```text
//! GetBulkState ──> BulkSession::reconcile ──> BulkSession (in-memory truth)
//!                                                │
//!                   mutations (toggle/answer) ───┤──> validation::validate
//!                                                │
//!                   AutosaveTimer (debounce) ────┤──> SaveDraft
//!                                                │
//!                   submit ──> Submit ──> full reload
//! ```
//!
//! # Key Concepts
//!
//! - **Cycle**: a recurring compliance period with a submission due date.
//! - **Attestation Record**: one model's confirmation obligation within one
//!   cycle, advanced through `PENDING -> SUBMITTED -> {ACCEPTED | REJECTED}`.
//! - **Bulk Session**: the working set for processing many records at once,
//!   reconciled from server state and any saved draft.
//! - **Draft**: a durable, resumable snapshot of in-progress session state.
//! - **Change Link**: an evidentiary association between an attestation and
//!   an inventory change request. Append-only.
//!
//! The engine is single-threaded and event-driven: all local mutations
//! complete synchronously; network effects go through the
//! [`client::GovernanceClient`] port and are orchestrated by
//! [`service::SessionService`].

pub mod client;
pub mod config;
pub mod cycle;
pub mod draft;
pub mod linkage;
pub mod questionnaire;
pub mod record;
pub mod service;
pub mod session;
pub mod validation;

pub use client::{GovernanceClient, Operation, TransportError};
pub use config::{ConfigError, EngineConfig};
pub use cycle::{Cycle, CycleStatus};
pub use draft::{AutosaveTimer, Draft};
pub use linkage::{ChangeLink, ChangeLinkTracker, ChangeReference};
pub use questionnaire::{Answer, Question, Response, ResponseSet};
pub use record::{
    AttestationRecord, AttestationStatus, Decision, RecordError, ReviewMetadata,
};
pub use service::{LoadTicket, SaveOutcome, ServiceError, SessionService};
pub use session::{BulkSession, ModelRow};
pub use validation::{RuleKind, Violation, can_submit, validate};
