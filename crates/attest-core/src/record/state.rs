//! Attestation record state and transition implementations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::questionnaire::{Question, Response, ResponseSet};
use crate::validation;

use super::error::RecordError;

/// Lifecycle status of an attestation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttestationStatus {
    /// Awaiting the steward's attestation. Initial state.
    Pending,
    /// Attested; awaiting review.
    Submitted,
    /// Escalated by a reviewer before deciding. Optional intermediate state.
    AdminReview,
    /// Review accepted. Terminal.
    Accepted,
    /// Review rejected. Re-enterable via resubmission.
    Rejected,
}

impl AttestationStatus {
    /// Returns `true` if `submit` is permitted from this state.
    #[must_use]
    pub fn can_submit(self) -> bool {
        matches!(self, Self::Pending | Self::Rejected)
    }

    /// Returns `true` if a review decision (`accept`/`reject`) is permitted
    /// from this state.
    #[must_use]
    pub fn can_review(self) -> bool {
        matches!(self, Self::Submitted | Self::AdminReview)
    }

    /// Returns `true` for terminal states.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self == Self::Accepted
    }
}

/// Overall decision derived from the submitted answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// All answers were "Yes": the record is affirmed as-is.
    Attested,
    /// At least one answer was "No" or carried corrections.
    AttestedWithUpdates,
}

impl Decision {
    fn derive(questions: &[Question], responses: &ResponseSet) -> Self {
        if responses.all_yes(questions) {
            Self::Attested
        } else {
            Self::AttestedWithUpdates
        }
    }
}

/// Review outcome metadata, recorded by `accept`/`reject`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewMetadata {
    /// The reviewing user.
    pub reviewer: String,
    /// Reviewer's comment. Mandatory for rejections.
    pub comment: Option<String>,
    /// When the review decision was made.
    pub reviewed_at: DateTime<Utc>,
}

/// One model's confirmation obligation within one cycle.
///
/// `responses` is meaningful only once `status >= Submitted`; before that,
/// responses live in the bulk session's working state, not on the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationRecord {
    /// Server-assigned record id.
    pub id: i64,
    /// Owning cycle.
    pub cycle_id: i64,
    /// The model under attestation.
    pub model_id: i64,
    /// Denormalized model name snapshot.
    pub model_name: String,
    /// Denormalized risk tier snapshot.
    pub risk_tier: String,
    /// The assigned attesting user.
    pub attester: String,
    /// Current lifecycle status.
    pub status: AttestationStatus,
    /// Submitted responses. Empty until first submission.
    #[serde(default)]
    pub responses: Vec<Response>,
    /// Decision derived at submission time.
    #[serde(default)]
    pub decision: Option<Decision>,
    /// Steward's overall comment supplied at submission.
    #[serde(default)]
    pub decision_comment: Option<String>,
    /// When the record was last submitted.
    #[serde(default)]
    pub attested_at: Option<DateTime<Utc>>,
    /// Review outcome, present once reviewed.
    #[serde(default)]
    pub review: Option<ReviewMetadata>,
}

impl AttestationRecord {
    /// Creates a fresh pending record.
    #[must_use]
    pub fn new(
        id: i64,
        cycle_id: i64,
        model_id: i64,
        model_name: impl Into<String>,
        risk_tier: impl Into<String>,
        attester: impl Into<String>,
    ) -> Self {
        Self {
            id,
            cycle_id,
            model_id,
            model_name: model_name.into(),
            risk_tier: risk_tier.into(),
            attester: attester.into(),
            status: AttestationStatus::Pending,
            responses: Vec::new(),
            decision: None,
            decision_comment: None,
            attested_at: None,
            review: None,
        }
    }

    /// Submits (or resubmits) the record with the given responses.
    ///
    /// Allowed from `Pending` or `Rejected`. The response set must pass the
    /// answer-completeness and comment-if-no rules for every active
    /// question.
    ///
    /// On success the responses replace any previous set, `attested_at` is
    /// set, and the decision is derived: all answers "Yes" yields
    /// [`Decision::Attested`], anything else [`Decision::AttestedWithUpdates`].
    ///
    /// # Errors
    ///
    /// - [`RecordError::InvalidTransition`] when the current status does not
    ///   permit submission.
    /// - [`RecordError::ValidationFailed`] with the full violation list when
    ///   the guard fails. The record is unchanged.
    pub fn submit(
        &mut self,
        responses: ResponseSet,
        decision_comment: Option<String>,
        questions: &[Question],
        now: DateTime<Utc>,
    ) -> Result<(), RecordError> {
        if !self.status.can_submit() {
            return Err(RecordError::InvalidTransition {
                from: self.status,
                action: "submit",
            });
        }
        let violations = validation::validate_responses(questions, &responses);
        if !violations.is_empty() {
            return Err(RecordError::ValidationFailed { violations });
        }
        self.decision = Some(Decision::derive(questions, &responses));
        self.responses = responses.to_vec();
        self.decision_comment = decision_comment;
        self.attested_at = Some(now);
        self.status = AttestationStatus::Submitted;
        Ok(())
    }

    /// Escalates a submitted record for admin review before deciding.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::InvalidTransition`] unless the record is
    /// `Submitted`.
    pub fn escalate(&mut self) -> Result<(), RecordError> {
        if self.status != AttestationStatus::Submitted {
            return Err(RecordError::InvalidTransition {
                from: self.status,
                action: "escalate",
            });
        }
        self.status = AttestationStatus::AdminReview;
        Ok(())
    }

    /// Accepts the attestation. Allowed from `Submitted` or `AdminReview`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::InvalidTransition`] from any other state.
    pub fn accept(
        &mut self,
        reviewer: impl Into<String>,
        comment: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), RecordError> {
        if !self.status.can_review() {
            return Err(RecordError::InvalidTransition {
                from: self.status,
                action: "accept",
            });
        }
        self.review = Some(ReviewMetadata {
            reviewer: reviewer.into(),
            comment,
            reviewed_at: now,
        });
        self.status = AttestationStatus::Accepted;
        Ok(())
    }

    /// Rejects the attestation. Allowed from `Submitted` or `AdminReview`.
    ///
    /// Rejection without justification is not permitted: `comment` must be
    /// non-empty after trimming.
    ///
    /// # Errors
    ///
    /// - [`RecordError::ReviewCommentRequired`] when the comment is empty.
    /// - [`RecordError::InvalidTransition`] from a non-reviewable state.
    pub fn reject(
        &mut self,
        reviewer: impl Into<String>,
        comment: &str,
        now: DateTime<Utc>,
    ) -> Result<(), RecordError> {
        if comment.trim().is_empty() {
            return Err(RecordError::ReviewCommentRequired);
        }
        if !self.status.can_review() {
            return Err(RecordError::InvalidTransition {
                from: self.status,
                action: "reject",
            });
        }
        self.review = Some(ReviewMetadata {
            reviewer: reviewer.into(),
            comment: Some(comment.to_string()),
            reviewed_at: now,
        });
        self.status = AttestationStatus::Rejected;
        Ok(())
    }

    /// Returns `true` if any submitted response answered "No".
    ///
    /// The change-link soft gate reads this together with the link list to
    /// decide whether to prompt for an inventory change request.
    #[must_use]
    pub fn has_negative_response(&self) -> bool {
        self.responses
            .iter()
            .any(|r| r.answer == crate::questionnaire::Answer::No)
    }
}
