//! Attestation questions and responses.
//!
//! Questions are immutable reference data for a cycle; a record's required
//! answer set is exactly the active question set at submission time.
//!
//! Answers are an explicit tri-state ([`Answer`]) rather than an
//! `Option<bool>`: the comment-required rule distinguishes "answered No"
//! from "not answered yet", and a nullable boolean invites exactly the
//! null-as-falsy bug this type exists to prevent. On the wire the tri-state
//! maps to JSON `true` / `false` / `null`.

use std::collections::BTreeMap;

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Tri-state answer to an attestation question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Answer {
    /// No answer recorded yet. Wire form: `null`.
    #[default]
    Unanswered,
    /// Affirmative answer. Wire form: `true`.
    Yes,
    /// Negative answer. Wire form: `false`.
    No,
}

impl Answer {
    /// Returns `true` if an answer (either way) has been recorded.
    #[must_use]
    pub fn is_answered(self) -> bool {
        self != Self::Unanswered
    }

    /// Converts from the wire's nullable boolean.
    #[must_use]
    pub fn from_wire(value: Option<bool>) -> Self {
        match value {
            None => Self::Unanswered,
            Some(true) => Self::Yes,
            Some(false) => Self::No,
        }
    }

    /// Converts to the wire's nullable boolean.
    #[must_use]
    pub fn to_wire(self) -> Option<bool> {
        match self {
            Self::Unanswered => None,
            Self::Yes => Some(true),
            Self::No => Some(false),
        }
    }
}

impl Serialize for Answer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_wire().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Answer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self::from_wire(Option::<bool>::deserialize(deserializer)?))
    }
}

/// An attestation question. Immutable reference data for the cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Server-assigned question id.
    pub id: i64,
    /// Short stable code (e.g. "Q1-USE"). Used in validation messages.
    pub code: String,
    /// Full question text.
    pub label: String,
    /// When `true`, a "No" answer must carry a non-empty comment at
    /// submission time.
    pub requires_comment_if_no: bool,
}

/// One answer (with optional comment) to one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// The question being answered.
    pub question_id: i64,
    /// Tri-state answer.
    #[serde(default)]
    pub answer: Answer,
    /// Optional free-text comment. Nullable on the wire.
    #[serde(default)]
    pub comment: Option<String>,
}

impl Response {
    /// An unanswered response for the given question.
    #[must_use]
    pub fn unanswered(question_id: i64) -> Self {
        Self {
            question_id,
            answer: Answer::Unanswered,
            comment: None,
        }
    }

    /// Returns `true` if the comment is present and not whitespace-only.
    #[must_use]
    pub fn has_comment(&self) -> bool {
        self.comment
            .as_deref()
            .is_some_and(|c| !c.trim().is_empty())
    }
}

/// Working set of responses for a session, keyed by question id.
///
/// Upsert semantics follow the session mutation contract: setting an answer
/// without a comment preserves any existing comment, and setting a comment
/// preserves the existing answer (which may still be unset).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResponseSet {
    responses: BTreeMap<i64, Response>,
}

impl ResponseSet {
    /// Creates an empty response set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Initializes one unanswered response per question, preserving any
    /// response already present (draft hydration uses this to fill gaps).
    pub fn ensure_questions(&mut self, questions: &[Question]) {
        for q in questions {
            self.responses
                .entry(q.id)
                .or_insert_with(|| Response::unanswered(q.id));
        }
    }

    /// Hydrates from a saved list of responses, replacing current contents.
    pub fn hydrate(&mut self, saved: &[Response]) {
        self.responses = saved
            .iter()
            .map(|r| (r.question_id, r.clone()))
            .collect();
    }

    /// Upserts the answer for a question. When `comment` is `None`, any
    /// existing comment is preserved.
    pub fn set_answer(&mut self, question_id: i64, answer: Answer, comment: Option<&str>) {
        let entry = self
            .responses
            .entry(question_id)
            .or_insert_with(|| Response::unanswered(question_id));
        entry.answer = answer;
        if let Some(c) = comment {
            entry.comment = Some(c.to_string());
        }
    }

    /// Upserts the comment for a question, preserving the existing answer.
    pub fn set_comment(&mut self, question_id: i64, comment: &str) {
        let entry = self
            .responses
            .entry(question_id)
            .or_insert_with(|| Response::unanswered(question_id));
        entry.comment = Some(comment.to_string());
    }

    /// Returns the response for a question, if any has been recorded.
    #[must_use]
    pub fn get(&self, question_id: i64) -> Option<&Response> {
        self.responses.get(&question_id)
    }

    /// Returns `true` if any recorded answer is [`Answer::No`].
    #[must_use]
    pub fn any_no(&self) -> bool {
        self.responses.values().any(|r| r.answer == Answer::No)
    }

    /// Returns `true` if every given question has a recorded `Yes` answer.
    #[must_use]
    pub fn all_yes(&self, questions: &[Question]) -> bool {
        questions
            .iter()
            .all(|q| self.get(q.id).map(|r| r.answer) == Some(Answer::Yes))
    }

    /// Snapshot of the responses in question-id order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Response> {
        self.responses.values().cloned().collect()
    }

    /// Number of recorded responses (answered or not).
    #[must_use]
    pub fn len(&self) -> usize {
        self.responses.len()
    }

    /// Returns `true` if no responses are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }
}
