//! Submission validation rules.
//!
//! A pure function of `(selected_count, questions, responses)` producing an
//! ordered, exhaustive list of violations. Recomputed on every relevant state
//! change; all violations surface together, never just the first.
//!
//! # Rules
//!
//! | Rule | Emits |
//! |------|-------|
//! | selection non-empty | "At least one model must be selected." |
//! | answer completeness | "Question \"{code}\" must be answered." |
//! | comment-if-no | "Question \"{code}\" requires a comment when answered \"No\"." |
//!
//! Ordering: the selection rule first, then per-question completeness, then
//! per-question comment-if-no, each in question order.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::questionnaire::{Answer, Question, ResponseSet};

/// Which rule a violation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// At least one model must be selected for submission.
    SelectionNonEmpty,
    /// Every active question must carry an answer.
    AnswerCompleteness,
    /// A "No" answer on a flagged question must carry a comment.
    CommentRequiredIfNo,
}

/// One human-readable validation violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// The rule that produced this violation.
    pub rule: RuleKind,
    /// The question code, for question-scoped rules.
    pub question_code: Option<String>,
}

impl Violation {
    fn selection() -> Self {
        Self {
            rule: RuleKind::SelectionNonEmpty,
            question_code: None,
        }
    }

    fn unanswered(code: &str) -> Self {
        Self {
            rule: RuleKind::AnswerCompleteness,
            question_code: Some(code.to_string()),
        }
    }

    fn comment_required(code: &str) -> Self {
        Self {
            rule: RuleKind::CommentRequiredIfNo,
            question_code: Some(code.to_string()),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = self.question_code.as_deref().unwrap_or("");
        match self.rule {
            RuleKind::SelectionNonEmpty => {
                write!(f, "At least one model must be selected.")
            },
            RuleKind::AnswerCompleteness => {
                write!(f, "Question \"{code}\" must be answered.")
            },
            RuleKind::CommentRequiredIfNo => {
                write!(
                    f,
                    "Question \"{code}\" requires a comment when answered \"No\"."
                )
            },
        }
    }
}

/// Validates a bulk submission. Exhaustive: all violations are returned.
#[must_use]
pub fn validate(
    selected_count: usize,
    questions: &[Question],
    responses: &ResponseSet,
) -> Vec<Violation> {
    let mut violations = Vec::new();
    if selected_count == 0 {
        violations.push(Violation::selection());
    }
    violations.extend(validate_responses(questions, responses));
    violations
}

/// Validates only the response rules (completeness and comment-if-no).
///
/// The single-record submit guard uses this form: the selection rule does
/// not apply when one record is submitted on its own.
#[must_use]
pub fn validate_responses(questions: &[Question], responses: &ResponseSet) -> Vec<Violation> {
    let mut violations = Vec::new();
    for q in questions {
        let answered = responses.get(q.id).is_some_and(|r| r.answer.is_answered());
        if !answered {
            violations.push(Violation::unanswered(&q.code));
        }
    }
    for q in questions {
        if !q.requires_comment_if_no {
            continue;
        }
        let Some(r) = responses.get(q.id) else { continue };
        if r.answer == Answer::No && !r.has_comment() {
            violations.push(Violation::comment_required(&q.code));
        }
    }
    violations
}

/// Returns `true` when submission is permitted: no violations and no submit
/// already in flight.
#[must_use]
pub fn can_submit(violations: &[Violation], is_submitting: bool) -> bool {
    violations.is_empty() && !is_submitting
}
