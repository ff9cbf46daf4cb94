//! Bulk session state and mutation implementations.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::client::{SaveDraftRequest, SubmitRequest};
use crate::cycle::Cycle;
use crate::draft::Draft;
use crate::questionnaire::{Answer, Question, ResponseSet};
use crate::record::AttestationStatus;
use crate::validation::{self, Violation};

/// One model row as reported by the server for a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRow {
    /// The model's inventory id.
    pub model_id: i64,
    /// Model name.
    pub name: String,
    /// Risk tier label.
    pub risk_tier: String,
    /// The model's attestation record status in this cycle.
    pub attestation_status: AttestationStatus,
    /// Server-side default exclusion flag. Overridden by a draft.
    pub is_excluded: bool,
}

/// In-memory working state for one cycle's bulk attestation.
///
/// The session is the authoritative truth while the cycle is being worked;
/// the draft is a durable mirror it writes to and reads from on load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkSession {
    cycle: Cycle,
    rows: Vec<ModelRow>,
    questions: Vec<Question>,
    selected: BTreeSet<i64>,
    excluded: BTreeSet<i64>,
    responses: ResponseSet,
    decision_comment: String,
    submission_id: Option<Uuid>,
    last_saved: Option<DateTime<Utc>>,
    is_dirty: bool,
}

impl BulkSession {
    /// Builds a session from server state and an optional draft.
    ///
    /// When a draft exists its selection, responses, and comment win over
    /// the server's `is_excluded` flags. Draft ids that are no longer in the
    /// pending set are dropped; pending models the draft never saw fall back
    /// to their server flag. Without a draft, a pending model goes to
    /// `selected` unless `is_excluded` is set.
    ///
    /// The session is clean (`is_dirty == false`) after construction.
    #[must_use]
    pub fn reconcile(
        cycle: Cycle,
        rows: Vec<ModelRow>,
        questions: Vec<Question>,
        draft: Option<&Draft>,
    ) -> Self {
        let mut session = Self {
            cycle,
            rows,
            questions,
            selected: BTreeSet::new(),
            excluded: BTreeSet::new(),
            responses: ResponseSet::new(),
            decision_comment: String::new(),
            submission_id: None,
            last_saved: None,
            is_dirty: false,
        };
        match draft {
            Some(draft) => session.hydrate_from_draft(draft),
            None => session.apply_server_defaults(),
        }
        session.responses.ensure_questions(&session.questions);
        session
    }

    fn hydrate_from_draft(&mut self, draft: &Draft) {
        let pending = self.pending_model_ids();
        self.selected = draft
            .selected_model_ids
            .iter()
            .copied()
            .filter(|id| pending.contains(id))
            .collect();
        self.excluded = draft
            .excluded_model_ids
            .iter()
            .copied()
            .filter(|id| pending.contains(id) && !self.selected.contains(id))
            .collect();
        // Pending models the draft never saw fall back to the server flag.
        for row in &self.rows {
            let id = row.model_id;
            if pending.contains(&id) && !self.selected.contains(&id) && !self.excluded.contains(&id)
            {
                if row.is_excluded {
                    self.excluded.insert(id);
                } else {
                    self.selected.insert(id);
                }
            }
        }
        self.responses.hydrate(&draft.responses);
        self.decision_comment = draft.comment.clone().unwrap_or_default();
        self.submission_id = draft.submission_id;
        self.last_saved = draft.last_saved;
    }

    fn apply_server_defaults(&mut self) {
        self.selected.clear();
        self.excluded.clear();
        for row in &self.rows {
            if row.attestation_status != AttestationStatus::Pending {
                continue;
            }
            if row.is_excluded {
                self.excluded.insert(row.model_id);
            } else {
                self.selected.insert(row.model_id);
            }
        }
    }

    /// Resets the session to the no-draft defaults, clearing responses,
    /// comment, and draft bookkeeping. Used after a draft discard.
    pub fn reset_to_defaults(&mut self) {
        self.apply_server_defaults();
        self.responses = ResponseSet::new();
        self.responses.ensure_questions(&self.questions);
        self.decision_comment.clear();
        self.submission_id = None;
        self.last_saved = None;
        self.is_dirty = false;
    }

    // ------------------------------------------------------------------
    // Mutations. Each marks the session dirty.
    // ------------------------------------------------------------------

    /// Moves a pending model between `selected` and `excluded`.
    ///
    /// Toggling a non-pending or unknown id is a no-op and does not mark
    /// the session dirty.
    pub fn toggle_model(&mut self, model_id: i64) {
        if self.selected.remove(&model_id) {
            self.excluded.insert(model_id);
        } else if self.excluded.remove(&model_id) {
            self.selected.insert(model_id);
        } else {
            return;
        }
        self.is_dirty = true;
    }

    /// Selects every pending model, emptying `excluded`.
    pub fn select_all(&mut self) {
        self.selected = self.pending_model_ids();
        self.excluded.clear();
        self.is_dirty = true;
    }

    /// Excludes every pending model, emptying `selected`.
    pub fn deselect_all(&mut self) {
        self.excluded = self.pending_model_ids();
        self.selected.clear();
        self.is_dirty = true;
    }

    /// Upserts the answer for a question. When `comment` is `None` any
    /// existing comment is preserved.
    pub fn set_response(&mut self, question_id: i64, answer: Answer, comment: Option<&str>) {
        self.responses.set_answer(question_id, answer, comment);
        self.is_dirty = true;
    }

    /// Upserts the comment for a question, preserving the existing answer.
    pub fn set_response_comment(&mut self, question_id: i64, comment: &str) {
        self.responses.set_comment(question_id, comment);
        self.is_dirty = true;
    }

    /// Overwrites the overall decision comment.
    pub fn set_decision_comment(&mut self, text: &str) {
        self.decision_comment = text.to_string();
        self.is_dirty = true;
    }

    // ------------------------------------------------------------------
    // Derived views.
    // ------------------------------------------------------------------

    /// Ids of models whose attestation status is `PENDING` — the
    /// denominator for selection completeness.
    #[must_use]
    pub fn pending_model_ids(&self) -> BTreeSet<i64> {
        self.rows
            .iter()
            .filter(|r| r.attestation_status == AttestationStatus::Pending)
            .map(|r| r.model_id)
            .collect()
    }

    /// Current validation violations. Recomputed per call; exhaustive.
    #[must_use]
    pub fn violations(&self) -> Vec<Violation> {
        validation::validate(self.selected.len(), &self.questions, &self.responses)
    }

    /// Debug invariant: `selected` and `excluded` are disjoint and together
    /// cover exactly the pending id set.
    #[must_use]
    pub fn partition_holds(&self) -> bool {
        let pending = self.pending_model_ids();
        self.selected.is_disjoint(&self.excluded)
            && self
                .selected
                .union(&self.excluded)
                .copied()
                .collect::<BTreeSet<i64>>()
                == pending
    }

    /// Returns `true` if any working answer is "No". Drives the change-link
    /// soft gate before submission.
    #[must_use]
    pub fn any_no_answer(&self) -> bool {
        self.responses.any_no()
    }

    // ------------------------------------------------------------------
    // Payloads.
    // ------------------------------------------------------------------

    /// Serializes the working state for a `SaveDraft` call.
    #[must_use]
    pub fn draft_payload(&self) -> SaveDraftRequest {
        SaveDraftRequest {
            selected_model_ids: self.selected.iter().copied().collect(),
            excluded_model_ids: self.excluded.iter().copied().collect(),
            responses: self.responses.to_vec(),
            comment: self.comment_or_none(),
        }
    }

    /// Serializes the working state for a bulk `Submit` call. Every active
    /// question is present with its current answer/comment.
    #[must_use]
    pub fn submit_payload(&self) -> SubmitRequest {
        SubmitRequest {
            selected_model_ids: self.selected.iter().copied().collect(),
            responses: self.responses.to_vec(),
            decision_comment: self.comment_or_none(),
        }
    }

    fn comment_or_none(&self) -> Option<String> {
        if self.decision_comment.trim().is_empty() {
            None
        } else {
            Some(self.decision_comment.clone())
        }
    }

    // ------------------------------------------------------------------
    // Draft bookkeeping.
    // ------------------------------------------------------------------

    /// Records a successful save: keeps the first-assigned submission id,
    /// updates `last_saved`, and clears the dirty flag.
    pub fn mark_saved(&mut self, submission_id: Uuid, last_saved: DateTime<Utc>) {
        if self.submission_id.is_none() {
            self.submission_id = Some(submission_id);
        }
        self.last_saved = Some(last_saved);
        self.is_dirty = false;
    }

    // ------------------------------------------------------------------
    // Accessors.
    // ------------------------------------------------------------------

    /// The cycle being worked.
    #[must_use]
    pub fn cycle(&self) -> &Cycle {
        &self.cycle
    }

    /// All model rows, pending or not.
    #[must_use]
    pub fn rows(&self) -> &[ModelRow] {
        &self.rows
    }

    /// The active question set.
    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Currently selected model ids.
    #[must_use]
    pub fn selected(&self) -> &BTreeSet<i64> {
        &self.selected
    }

    /// Currently excluded model ids.
    #[must_use]
    pub fn excluded(&self) -> &BTreeSet<i64> {
        &self.excluded
    }

    /// Number of selected models.
    #[must_use]
    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// The working responses.
    #[must_use]
    pub fn responses(&self) -> &ResponseSet {
        &self.responses
    }

    /// The overall decision comment (empty when unset).
    #[must_use]
    pub fn decision_comment(&self) -> &str {
        &self.decision_comment
    }

    /// The backing submission id, once a draft has been saved.
    #[must_use]
    pub fn submission_id(&self) -> Option<Uuid> {
        self.submission_id
    }

    /// When the draft was last saved.
    #[must_use]
    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }

    /// Returns `true` if the session has unsaved changes.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }
}
