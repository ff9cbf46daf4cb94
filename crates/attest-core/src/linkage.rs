//! Change-linkage tracker.
//!
//! A change link associates an attestation record with an inventory change
//! request: a model edit, a new version, a new registration, or a
//! decommission request. Links are historical evidence: append-only, never
//! mutated or deleted, and never cleared by any lifecycle transition — they
//! survive rejection and resubmission by construction.
//!
//! The tracker blocks nothing. Its one behavioral contribution beyond
//! storage is the soft gate: when a record carries a "No" answer and has no
//! links, the workflow should prompt the user to create one before
//! finalizing submission. The user may bypass the prompt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::record::AttestationRecord;

/// A discriminated reference to exactly one kind of inventory change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeReference {
    /// An edit to an existing model's inventory entry.
    ModelEdit {
        /// The model being edited.
        model_id: i64,
    },
    /// A new version of an existing model.
    NewModelVersion {
        /// The model gaining a version.
        model_id: i64,
        /// The proposed version label.
        version: String,
    },
    /// Registration of a model not yet in the inventory.
    NewModelRegistration {
        /// Working title for the model under registration.
        proposed_name: String,
    },
    /// A request to decommission a model.
    Decommission {
        /// The model to decommission.
        model_id: i64,
    },
}

/// One evidentiary association between an attestation and a change request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeLink {
    /// Link id.
    pub id: Uuid,
    /// The attestation record this evidence belongs to.
    pub attestation_id: i64,
    /// What kind of change the link points at.
    pub reference: ChangeReference,
    /// When the link was created.
    pub created_at: DateTime<Utc>,
}

/// Append-only collection of change links, as seen by one session.
///
/// Mirrors what the server has accepted; [`crate::client::GovernanceClient`]
/// owns durability, this tracker owns the in-session view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeLinkTracker {
    links: Vec<ChangeLink>,
}

impl ChangeLinkTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the tracker from links already known to the server.
    #[must_use]
    pub fn with_links(links: Vec<ChangeLink>) -> Self {
        Self { links }
    }

    /// Records a new link. Append-only; returns the stored link.
    pub fn record(&mut self, link: ChangeLink) -> &ChangeLink {
        self.links.push(link);
        self.links.last().unwrap_or_else(|| unreachable!())
    }

    /// Links for one attestation record, in creation order.
    pub fn links_for(&self, attestation_id: i64) -> impl Iterator<Item = &ChangeLink> {
        self.links
            .iter()
            .filter(move |l| l.attestation_id == attestation_id)
    }

    /// Returns `true` if the record has at least one link.
    #[must_use]
    pub fn has_links(&self, attestation_id: i64) -> bool {
        self.links_for(attestation_id).next().is_some()
    }

    /// Total number of links across all records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Returns `true` when no links exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Soft gate: `true` when the record carries a "No" answer and no
    /// change link exists for it. The prompt is advisory; submission is
    /// never blocked on it.
    #[must_use]
    pub fn needs_change_prompt(&self, record: &AttestationRecord) -> bool {
        record.has_negative_response() && !self.has_links(record.id)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use crate::questionnaire::{Answer, Question, ResponseSet};
    use crate::record::AttestationRecord;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 9, 1, 9, 0, 0).unwrap()
    }

    fn link(attestation_id: i64, reference: ChangeReference) -> ChangeLink {
        ChangeLink {
            id: Uuid::new_v4(),
            attestation_id,
            reference,
            created_at: now(),
        }
    }

    fn submitted_record_with_no_answer() -> AttestationRecord {
        let questions = vec![Question {
            id: 101,
            code: "Q1-USE".into(),
            label: "Still in use?".into(),
            requires_comment_if_no: true,
        }];
        let mut record =
            AttestationRecord::new(1, 7, 500, "credit-risk-pd", "TIER_1", "steward@bank");
        let mut rs = ResponseSet::new();
        rs.set_answer(101, Answer::No, Some("superseded by v3"));
        record.submit(rs, None, &questions, now()).unwrap();
        record
    }

    #[test]
    fn links_accumulate_per_record() {
        let mut tracker = ChangeLinkTracker::new();
        tracker.record(link(1, ChangeReference::ModelEdit { model_id: 500 }));
        tracker.record(link(
            2,
            ChangeReference::Decommission { model_id: 600 },
        ));
        tracker.record(link(
            1,
            ChangeReference::NewModelVersion {
                model_id: 500,
                version: "3.0".into(),
            },
        ));
        assert_eq!(tracker.links_for(1).count(), 2);
        assert_eq!(tracker.links_for(2).count(), 1);
        assert_eq!(tracker.len(), 3);
    }

    #[test]
    fn soft_gate_prompts_only_without_links() {
        let record = submitted_record_with_no_answer();
        let mut tracker = ChangeLinkTracker::new();
        assert!(tracker.needs_change_prompt(&record));

        tracker.record(link(
            record.id,
            ChangeReference::Decommission { model_id: 500 },
        ));
        assert!(!tracker.needs_change_prompt(&record));
    }

    #[test]
    fn all_yes_record_never_prompts() {
        let questions = vec![Question {
            id: 101,
            code: "Q1-USE".into(),
            label: "Still in use?".into(),
            requires_comment_if_no: true,
        }];
        let mut record =
            AttestationRecord::new(3, 7, 500, "credit-risk-pd", "TIER_1", "steward@bank");
        let mut rs = ResponseSet::new();
        rs.set_answer(101, Answer::Yes, None);
        record.submit(rs, None, &questions, now()).unwrap();
        assert!(!ChangeLinkTracker::new().needs_change_prompt(&record));
    }

    #[test]
    fn links_survive_reject_and_resubmit() {
        let questions = vec![Question {
            id: 101,
            code: "Q1-USE".into(),
            label: "Still in use?".into(),
            requires_comment_if_no: true,
        }];
        let mut record = submitted_record_with_no_answer();
        let mut tracker = ChangeLinkTracker::new();
        tracker.record(link(
            record.id,
            ChangeReference::Decommission { model_id: 500 },
        ));

        record.reject("reviewer@bank", "wrong reference", now()).unwrap();
        let mut rs = ResponseSet::new();
        rs.set_answer(101, Answer::No, Some("still superseded"));
        record.submit(rs, None, &questions, now()).unwrap();

        assert!(tracker.has_links(record.id));
        assert!(!tracker.needs_change_prompt(&record));
    }

    #[test]
    fn reference_serializes_with_kind_tag() {
        let json = serde_json::to_value(ChangeReference::NewModelVersion {
            model_id: 500,
            version: "3.0".into(),
        })
        .unwrap();
        assert_eq!(json["kind"], "new_model_version");
        assert_eq!(json["model_id"], 500);
    }
}
