//! Draft snapshots and autosave scheduling.
//!
//! A draft is a durable mirror of the bulk session's working state, keyed by
//! cycle. It is created on first save, updated on subsequent saves, and
//! deleted on discard (or naturally superseded by a final submission).
//!
//! Autosave is debounce, not throttle: every mutation restarts a fixed delay
//! timer, and the save fires only after the delay elapses with no further
//! mutation. The timer is an explicit schedulable value ([`AutosaveTimer`])
//! rather than an ambient wall-clock callback, so tests can drive it
//! deterministically.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::questionnaire::Response;

/// A serialized bulk-session snapshot, as stored server-side per cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    /// The backing submission id, assigned by the server on first save.
    pub submission_id: Option<Uuid>,
    /// Model ids the steward has selected for attestation.
    #[serde(default)]
    pub selected_model_ids: Vec<i64>,
    /// Model ids the steward has excluded from this submission.
    #[serde(default)]
    pub excluded_model_ids: Vec<i64>,
    /// Saved responses.
    #[serde(default)]
    pub responses: Vec<Response>,
    /// Saved overall comment.
    #[serde(default)]
    pub comment: Option<String>,
    /// When the draft was last written.
    #[serde(default)]
    pub last_saved: Option<DateTime<Utc>>,
}

/// Debounced autosave timer.
///
/// Holds at most one pending deadline. [`schedule`](Self::schedule) while
/// armed replaces the deadline (restarting the delay); [`fire`](Self::fire)
/// disarms and reports whether the deadline had been reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutosaveTimer {
    delay: Duration,
    deadline: Option<DateTime<Utc>>,
}

impl AutosaveTimer {
    /// Creates a disarmed timer with the given debounce delay.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Arms (or re-arms) the timer: the deadline becomes `now + delay`.
    pub fn schedule(&mut self, now: DateTime<Utc>) {
        self.deadline = Some(now + self.delay);
    }

    /// Disarms the timer without firing.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Returns `true` while a deadline is pending.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// The pending deadline, if armed.
    #[must_use]
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    /// Returns `true` if armed and the deadline has been reached.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.deadline.is_some_and(|d| now >= d)
    }

    /// Fires the timer if due: disarms and returns `true`. Otherwise leaves
    /// the timer as-is and returns `false`.
    pub fn fire(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_due(now) {
            self.deadline = None;
            true
        } else {
            false
        }
    }

    /// Forces the timer to fire regardless of the deadline, disarming it.
    /// Returns `true` if it was armed.
    pub fn fire_now(&mut self) -> bool {
        self.deadline.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn t(seconds: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 9, 1, 12, 0, 0).unwrap() + Duration::seconds(seconds)
    }

    #[test]
    fn schedule_restarts_the_delay() {
        let mut timer = AutosaveTimer::new(Duration::seconds(5));
        timer.schedule(t(0));
        assert!(!timer.is_due(t(4)));
        // Second mutation inside the window pushes the deadline out.
        timer.schedule(t(4));
        assert!(!timer.is_due(t(5)));
        assert!(timer.is_due(t(9)));
    }

    #[test]
    fn fire_disarms_only_when_due() {
        let mut timer = AutosaveTimer::new(Duration::seconds(5));
        timer.schedule(t(0));
        assert!(!timer.fire(t(3)));
        assert!(timer.is_armed());
        assert!(timer.fire(t(5)));
        assert!(!timer.is_armed());
        // Firing again with no deadline is a no-op.
        assert!(!timer.fire(t(10)));
    }

    #[test]
    fn cancel_and_fire_now() {
        let mut timer = AutosaveTimer::new(Duration::seconds(5));
        timer.schedule(t(0));
        timer.cancel();
        assert!(!timer.is_armed());
        assert!(!timer.fire_now());

        timer.schedule(t(0));
        assert!(timer.fire_now());
        assert!(!timer.is_armed());
    }
}
