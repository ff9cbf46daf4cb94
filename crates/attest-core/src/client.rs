//! Logical operations port and transport error taxonomy.
//!
//! The engine is agnostic to the transport behind these operations; exact
//! wire shapes belong to the excluded API layer. [`GovernanceClient`] is the
//! seam: production code implements it over HTTP, tests implement it
//! in-memory.
//!
//! # Server Error Extraction
//!
//! Server failures arrive as structured payloads in one of three recognized
//! shapes, tried in order:
//!
//! 1. `{"detail": "..."}` — a string detail.
//! 2. `{"detail": [...]}` — a list of field-level messages, joined.
//! 3. `{"message": "..."}` — an object with a message field.
//!
//! Anything else falls back to a generic per-operation message.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cycle::Cycle;
use crate::draft::Draft;
use crate::linkage::{ChangeLink, ChangeReference};
use crate::questionnaire::{Question, Response};
use crate::record::{AttestationRecord, Decision};
use crate::session::ModelRow;

/// Per-cycle record status counts, reported alongside the bulk state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CycleSummary {
    /// Total records in the cycle.
    pub total: u64,
    /// Records still awaiting attestation.
    pub pending: u64,
    /// Records submitted and awaiting review.
    pub submitted: u64,
    /// Records accepted.
    pub accepted: u64,
    /// Records rejected.
    pub rejected: u64,
}

/// Everything needed to start (or resume) a bulk session for one cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkState {
    /// The cycle being worked.
    pub cycle: Cycle,
    /// All models in the cycle with their attestation status and the
    /// server-reported exclusion flag.
    pub models: Vec<ModelRow>,
    /// Active question set for the cycle.
    pub questions: Vec<Question>,
    /// Saved draft, if one exists.
    #[serde(default)]
    pub draft: Option<Draft>,
    /// Status counts for display.
    #[serde(default)]
    pub summary: Option<CycleSummary>,
}

/// Body of a `SaveDraft` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveDraftRequest {
    /// Currently selected model ids.
    pub selected_model_ids: Vec<i64>,
    /// Currently excluded model ids.
    pub excluded_model_ids: Vec<i64>,
    /// Working responses, answered or not.
    pub responses: Vec<Response>,
    /// Overall comment. Null when empty.
    pub comment: Option<String>,
}

/// Server acknowledgement of a draft save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveDraftResponse {
    /// The backing submission id. Stable across saves for one draft.
    pub bulk_submission_id: Uuid,
    /// Server-side save timestamp.
    pub last_saved: DateTime<Utc>,
}

/// Body of a bulk `Submit` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitRequest {
    /// Model ids being attested.
    pub selected_model_ids: Vec<i64>,
    /// One response per active question.
    pub responses: Vec<Response>,
    /// Overall comment. Null when empty.
    pub decision_comment: Option<String>,
}

/// Server acknowledgement of a bulk submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    /// Human-readable summary (e.g. "12 attestations submitted").
    pub message: String,
}

/// Body of a single-record submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSubmitRequest {
    /// One response per active question.
    pub responses: Vec<Response>,
    /// Derived decision.
    pub decision: Decision,
    /// Steward's overall comment.
    pub decision_comment: Option<String>,
}

/// Body of an accept/reject review call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRequest {
    /// Reviewer's comment. Mandatory for rejections.
    pub review_comment: Option<String>,
}

/// The logical operation a transport error came from. Determines the
/// fallback message when the server payload is not in a recognized shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `GetBulkState`
    LoadBulkState,
    /// `SaveDraft`
    SaveDraft,
    /// `DiscardDraft`
    DiscardDraft,
    /// Bulk `Submit`
    Submit,
    /// `SubmitRecord`
    SubmitRecord,
    /// `AcceptRecord`
    AcceptRecord,
    /// `RejectRecord`
    RejectRecord,
    /// `CreateChangeLink`
    CreateChangeLink,
}

impl Operation {
    /// The generic user-facing failure message for this operation.
    #[must_use]
    pub fn fallback_message(self) -> &'static str {
        match self {
            Self::LoadBulkState => "Failed to load attestation data",
            Self::SaveDraft => "Failed to save draft",
            Self::DiscardDraft => "Failed to discard draft",
            Self::Submit => "Failed to submit attestations",
            Self::SubmitRecord => "Failed to submit attestation",
            Self::AcceptRecord => "Failed to accept attestation",
            Self::RejectRecord => "Failed to reject attestation",
            Self::CreateChangeLink => "Failed to create change link",
        }
    }
}

/// A network or server failure, mapped to a single user-facing message.
///
/// Transport errors never corrupt session state: a failed save leaves the
/// session dirty (so autosave retries), a failed submit leaves it untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    /// The operation that failed.
    pub operation: Operation,
    /// Detail extracted from the server's structured error payload, if the
    /// payload was in a recognized shape.
    pub detail: Option<String>,
}

impl TransportError {
    /// A transport error with no usable server detail.
    #[must_use]
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            detail: None,
        }
    }

    /// Builds an error from a structured server payload, extracting the
    /// detail when the payload is in a recognized shape.
    #[must_use]
    pub fn from_payload(operation: Operation, payload: &serde_json::Value) -> Self {
        Self {
            operation,
            detail: extract_detail(payload),
        }
    }

    /// The user-facing message: server detail when available, otherwise the
    /// per-operation fallback.
    #[must_use]
    pub fn message(&self) -> &str {
        self.detail
            .as_deref()
            .unwrap_or_else(|| self.operation.fallback_message())
    }
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for TransportError {}

/// Extracts a human-readable detail from a structured server error payload.
fn extract_detail(payload: &serde_json::Value) -> Option<String> {
    match payload.get("detail") {
        Some(serde_json::Value::String(s)) if !s.is_empty() => {
            return Some(s.clone());
        },
        Some(serde_json::Value::Array(items)) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| {
                    item.as_str().or_else(|| {
                        item.get("message")
                            .or_else(|| item.get("msg"))
                            .and_then(serde_json::Value::as_str)
                    })
                })
                .collect();
            if !messages.is_empty() {
                return Some(messages.join("; "));
            }
        },
        _ => {},
    }
    payload
        .get("message")
        .and_then(serde_json::Value::as_str)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Port over the governance server's logical operations.
///
/// Implementations are expected to be request/response only: no retries, no
/// caching. Retry policy lives with the user (every failure surfaced by the
/// engine is retryable).
pub trait GovernanceClient {
    /// Fetches the cycle, model list, question list, draft, and summary.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] on network or server failure.
    fn get_bulk_state(&mut self, cycle_id: i64) -> Result<BulkState, TransportError>;

    /// Persists the draft for a cycle. Creates it on first save.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] on network or server failure.
    fn save_draft(
        &mut self,
        cycle_id: i64,
        request: &SaveDraftRequest,
    ) -> Result<SaveDraftResponse, TransportError>;

    /// Deletes the persisted draft for a cycle.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] on network or server failure.
    fn discard_draft(&mut self, cycle_id: i64) -> Result<(), TransportError>;

    /// Submits the selected records, advancing each to `SUBMITTED`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] on network or server failure.
    fn submit(
        &mut self,
        cycle_id: i64,
        request: &SubmitRequest,
    ) -> Result<SubmitResponse, TransportError>;

    /// Submits a single record.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] on network or server failure.
    fn submit_record(
        &mut self,
        record_id: i64,
        request: &RecordSubmitRequest,
    ) -> Result<AttestationRecord, TransportError>;

    /// Accepts a submitted record.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] on network or server failure.
    fn accept_record(
        &mut self,
        record_id: i64,
        request: &ReviewRequest,
    ) -> Result<AttestationRecord, TransportError>;

    /// Rejects a submitted record. The server enforces the comment guard as
    /// well; callers should run the local guard first.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] on network or server failure.
    fn reject_record(
        &mut self,
        record_id: i64,
        request: &ReviewRequest,
    ) -> Result<AttestationRecord, TransportError>;

    /// Creates a change link for a record. Append-only.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] on network or server failure.
    fn create_change_link(
        &mut self,
        record_id: i64,
        reference: &ChangeReference,
    ) -> Result<ChangeLink, TransportError>;
}
