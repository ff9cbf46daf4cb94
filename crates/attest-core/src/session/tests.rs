//! Bulk session reconciliation tests.
//!
//! Covers draft precedence, no-draft defaults, the mutation contract, and a
//! property test that the pending partition invariant holds under arbitrary
//! mutation sequences.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use proptest::prelude::*;

use crate::cycle::{Cycle, CycleStatus};
use crate::draft::Draft;
use crate::questionnaire::{Answer, Question};
use crate::record::AttestationStatus;

use super::{BulkSession, ModelRow};

fn cycle() -> Cycle {
    Cycle {
        id: 7,
        name: "2026 H2".into(),
        due_date: NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
        status: CycleStatus::Open,
    }
}

fn row(model_id: i64, status: AttestationStatus, is_excluded: bool) -> ModelRow {
    ModelRow {
        model_id,
        name: format!("model-{model_id}"),
        risk_tier: "TIER_2".into(),
        attestation_status: status,
        is_excluded,
    }
}

fn questions() -> Vec<Question> {
    vec![
        Question {
            id: 101,
            code: "Q1-USE".into(),
            label: "Still in use?".into(),
            requires_comment_if_no: true,
        },
        Question {
            id: 102,
            code: "Q2-DOC".into(),
            label: "Docs current?".into(),
            requires_comment_if_no: false,
        },
    ]
}

fn ids(set: &BTreeSet<i64>) -> Vec<i64> {
    set.iter().copied().collect()
}

#[test]
fn no_draft_defaults_follow_server_exclusion_flags() {
    let rows = vec![
        row(10, AttestationStatus::Pending, false),
        row(20, AttestationStatus::Pending, true),
        row(30, AttestationStatus::Pending, false),
    ];
    let s = BulkSession::reconcile(cycle(), rows, questions(), None);
    assert_eq!(ids(s.selected()), vec![10, 30]);
    assert_eq!(ids(s.excluded()), vec![20]);
    assert!(!s.is_dirty());
    assert!(s.partition_holds());
    // Every question starts unanswered with no comment.
    assert_eq!(s.responses().get(101).unwrap().answer, Answer::Unanswered);
    assert_eq!(s.responses().get(102).unwrap().answer, Answer::Unanswered);
}

#[test]
fn draft_overrides_contradictory_server_flags() {
    // Server flags contradict the draft on every model.
    let rows = vec![
        row(10, AttestationStatus::Pending, true),
        row(20, AttestationStatus::Pending, false),
        row(30, AttestationStatus::Pending, false),
    ];
    let draft = Draft {
        submission_id: Some(uuid::Uuid::nil()),
        selected_model_ids: vec![10],
        excluded_model_ids: vec![20, 30],
        responses: vec![],
        comment: Some("carried over".into()),
        last_saved: None,
    };
    let s = BulkSession::reconcile(cycle(), rows, questions(), Some(&draft));
    assert_eq!(ids(s.selected()), vec![10]);
    assert_eq!(ids(s.excluded()), vec![20, 30]);
    assert_eq!(s.decision_comment(), "carried over");
    assert_eq!(s.submission_id(), Some(uuid::Uuid::nil()));
    assert!(!s.is_dirty());
    assert!(s.partition_holds());
}

#[test]
fn stale_draft_ids_are_dropped_and_new_models_use_server_flag() {
    let rows = vec![
        row(10, AttestationStatus::Pending, false),
        // 40 arrived after the draft was saved; server wants it excluded.
        row(40, AttestationStatus::Pending, true),
        // 20 was submitted since the draft was saved.
        row(20, AttestationStatus::Submitted, false),
    ];
    let draft = Draft {
        submission_id: None,
        selected_model_ids: vec![10, 20],
        excluded_model_ids: vec![99],
        responses: vec![],
        comment: None,
        last_saved: None,
    };
    let s = BulkSession::reconcile(cycle(), rows, questions(), Some(&draft));
    assert_eq!(ids(s.selected()), vec![10]);
    assert_eq!(ids(s.excluded()), vec![40]);
    assert!(s.partition_holds());
}

#[test]
fn draft_responses_hydrate_and_gaps_are_unanswered() {
    let rows = vec![row(10, AttestationStatus::Pending, false)];
    let draft = Draft {
        submission_id: None,
        selected_model_ids: vec![10],
        excluded_model_ids: vec![],
        responses: vec![crate::questionnaire::Response {
            question_id: 101,
            answer: Answer::No,
            comment: Some("replaced by v2".into()),
        }],
        comment: None,
        last_saved: None,
    };
    let s = BulkSession::reconcile(cycle(), rows, questions(), Some(&draft));
    assert_eq!(s.responses().get(101).unwrap().answer, Answer::No);
    assert_eq!(s.responses().get(102).unwrap().answer, Answer::Unanswered);
}

#[test]
fn non_pending_models_are_in_neither_set() {
    let rows = vec![
        row(10, AttestationStatus::Pending, false),
        row(20, AttestationStatus::Submitted, false),
        row(30, AttestationStatus::Accepted, true),
    ];
    let s = BulkSession::reconcile(cycle(), rows, questions(), None);
    assert_eq!(ids(s.selected()), vec![10]);
    assert!(s.excluded().is_empty());
}

#[test]
fn toggle_round_trip_restores_both_sets() {
    let rows = vec![
        row(10, AttestationStatus::Pending, false),
        row(20, AttestationStatus::Pending, true),
    ];
    let mut s = BulkSession::reconcile(cycle(), rows, questions(), None);
    let before_selected = s.selected().clone();
    let before_excluded = s.excluded().clone();
    s.toggle_model(10);
    assert_eq!(ids(s.excluded()), vec![10, 20]);
    s.toggle_model(10);
    assert_eq!(s.selected(), &before_selected);
    assert_eq!(s.excluded(), &before_excluded);
    assert!(s.is_dirty());
}

#[test]
fn toggle_unknown_or_non_pending_id_is_a_clean_no_op() {
    let rows = vec![
        row(10, AttestationStatus::Pending, false),
        row(20, AttestationStatus::Submitted, false),
    ];
    let mut s = BulkSession::reconcile(cycle(), rows, questions(), None);
    s.toggle_model(20);
    s.toggle_model(999);
    assert!(!s.is_dirty());
    assert!(s.partition_holds());
}

#[test]
fn select_all_and_deselect_all_move_the_whole_pending_set() {
    let rows = vec![
        row(10, AttestationStatus::Pending, true),
        row(20, AttestationStatus::Pending, true),
        row(30, AttestationStatus::Pending, false),
    ];
    let mut s = BulkSession::reconcile(cycle(), rows, questions(), None);
    s.select_all();
    assert_eq!(ids(s.selected()), vec![10, 20, 30]);
    assert!(s.excluded().is_empty());
    s.deselect_all();
    assert!(s.selected().is_empty());
    assert_eq!(ids(s.excluded()), vec![10, 20, 30]);
    assert!(s.partition_holds());
}

#[test]
fn mutations_mark_dirty_and_reset_clears_everything() {
    let rows = vec![
        row(10, AttestationStatus::Pending, false),
        row(20, AttestationStatus::Pending, false),
        row(30, AttestationStatus::Pending, false),
    ];
    let mut s = BulkSession::reconcile(cycle(), rows, questions(), None);
    s.deselect_all();
    s.toggle_model(10);
    s.set_response(101, Answer::Yes, None);
    s.set_decision_comment("halfway done");
    assert!(s.is_dirty());
    assert_eq!(ids(s.selected()), vec![10]);

    s.reset_to_defaults();
    assert_eq!(ids(s.selected()), vec![10, 20, 30]);
    assert!(s.excluded().is_empty());
    assert_eq!(s.decision_comment(), "");
    assert_eq!(s.responses().get(101).unwrap().answer, Answer::Unanswered);
    assert!(!s.is_dirty());
    assert!(s.submission_id().is_none());
}

#[test]
fn payloads_carry_the_current_working_state() {
    let rows = vec![
        row(10, AttestationStatus::Pending, false),
        row(20, AttestationStatus::Pending, false),
    ];
    let mut s = BulkSession::reconcile(cycle(), rows, questions(), None);
    s.toggle_model(20);
    s.set_response(101, Answer::Yes, None);
    s.set_response(102, Answer::Yes, None);

    let draft = s.draft_payload();
    assert_eq!(draft.selected_model_ids, vec![10]);
    assert_eq!(draft.excluded_model_ids, vec![20]);
    assert_eq!(draft.responses.len(), 2);
    assert_eq!(draft.comment, None);

    let submit = s.submit_payload();
    assert_eq!(submit.selected_model_ids, vec![10]);
    assert_eq!(submit.responses.len(), 2);
    assert!(submit
        .responses
        .iter()
        .all(|r| r.answer == Answer::Yes));
}

#[test]
fn mark_saved_keeps_first_submission_id() {
    let rows = vec![row(10, AttestationStatus::Pending, false)];
    let mut s = BulkSession::reconcile(cycle(), rows, questions(), None);
    s.set_decision_comment("x");
    let first = uuid::Uuid::new_v4();
    let t1 = chrono::Utc::now();
    s.mark_saved(first, t1);
    assert!(!s.is_dirty());
    assert_eq!(s.submission_id(), Some(first));

    s.set_decision_comment("y");
    let t2 = t1 + chrono::Duration::seconds(30);
    s.mark_saved(uuid::Uuid::new_v4(), t2);
    assert_eq!(s.submission_id(), Some(first));
    assert_eq!(s.last_saved(), Some(t2));
}

/// A session mutation for property testing.
#[derive(Debug, Clone)]
enum Mutation {
    Toggle(i64),
    SelectAll,
    DeselectAll,
}

proptest! {
    /// The pending partition invariant holds after any mutation sequence:
    /// `selected` and `excluded` stay disjoint and together cover exactly
    /// the pending id set.
    #[test]
    fn partition_invariant_under_arbitrary_mutations(
        excluded_flags in prop::collection::vec(any::<bool>(), 1..12),
        mutation_seed in prop::collection::vec(any::<prop::sample::Index>(), 0..40),
        select in any::<bool>(),
    ) {
        let rows: Vec<ModelRow> = excluded_flags
            .iter()
            .enumerate()
            .map(|(i, &excl)| row(i as i64 + 1, AttestationStatus::Pending, excl))
            .collect();
        let model_ids: Vec<i64> = rows.iter().map(|r| r.model_id).collect();
        let mut s = BulkSession::reconcile(cycle(), rows, questions(), None);
        prop_assert!(s.partition_holds());

        for index in mutation_seed {
            let mutation = match index.index(model_ids.len() + 2) {
                n if n < model_ids.len() => Mutation::Toggle(model_ids[n]),
                n if n == model_ids.len() && select => Mutation::SelectAll,
                _ => Mutation::DeselectAll,
            };
            match mutation {
                Mutation::Toggle(id) => s.toggle_model(id),
                Mutation::SelectAll => s.select_all(),
                Mutation::DeselectAll => s.deselect_all(),
            }
            prop_assert!(s.partition_holds());
        }
    }

    /// Toggling the same pending id twice is an involution.
    #[test]
    fn toggle_is_an_involution(
        excluded_flags in prop::collection::vec(any::<bool>(), 1..8),
        pick in any::<prop::sample::Index>(),
    ) {
        let rows: Vec<ModelRow> = excluded_flags
            .iter()
            .enumerate()
            .map(|(i, &excl)| row(i as i64 + 1, AttestationStatus::Pending, excl))
            .collect();
        let id = rows[pick.index(rows.len())].model_id;
        let mut s = BulkSession::reconcile(cycle(), rows, questions(), None);
        let selected = s.selected().clone();
        let excluded = s.excluded().clone();
        s.toggle_model(id);
        s.toggle_model(id);
        prop_assert_eq!(s.selected(), &selected);
        prop_assert_eq!(s.excluded(), &excluded);
    }
}
