//! Session service orchestration.
//!
//! [`SessionService`] owns one [`BulkSession`] for one cycle and wires it to
//! the network port: load, debounced draft autosave, explicit save, discard,
//! and final submission.
//!
//! # Concurrency Model
//!
//! Single-threaded and event-driven. Local mutations complete synchronously;
//! network effects are bracketed by explicit begin/complete pairs so the two
//! in-flight guards are observable state, not ambient scheduler behavior:
//!
//! - **Save guard**: at most one outstanding draft write. A second save
//!   attempt while one is in flight is dropped, not queued.
//! - **Load generation**: each load bumps a generation counter; a result
//!   arriving for a superseded generation is discarded rather than applied.
//!
//! A failed save leaves the session dirty and re-arms the autosave timer so
//! the write retries. A failed submit leaves the session exactly as it was.
//! Submission success triggers a full reload against the now-updated server
//! state instead of mutating local state optimistically.


use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::client::{
    BulkState, GovernanceClient, SaveDraftRequest, SaveDraftResponse, TransportError,
};
use crate::config::EngineConfig;
use crate::draft::AutosaveTimer;
use crate::questionnaire::Answer;
use crate::session::BulkSession;
use crate::validation::Violation;

/// Errors surfaced by session service operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Submission blocked by local validation. Never sent to the network.
    #[error("submission blocked by {} validation violation(s)", .0.len())]
    Validation(Vec<Violation>),

    /// A submit is already in flight.
    #[error("a submission is already in progress")]
    SubmitInFlight,

    /// Network or server failure. Retryable by the user.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// No session has been loaded yet.
    #[error("no session loaded")]
    NoSession,
}

/// Result of a save attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The draft was written.
    Saved,
    /// A save was already in flight; this attempt was dropped.
    Dropped,
    /// The autosave timer was not due; no write issued.
    NotDue,
}

/// Ticket identifying one load attempt. Results carrying a stale ticket are
/// discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    cycle_id: i64,
}

/// Orchestrates one bulk session over a [`GovernanceClient`].
#[derive(Debug)]
pub struct SessionService<C> {
    client: C,
    session: Option<BulkSession>,
    autosave: AutosaveTimer,
    max_comment_len: usize,
    cycle_id: Option<i64>,
    load_generation: u64,
    is_loading: bool,
    is_saving: bool,
    is_submitting: bool,
    status_message: Option<String>,
    error_message: Option<String>,
}

impl<C: GovernanceClient> SessionService<C> {
    /// Creates a service with no session loaded.
    #[must_use]
    pub fn new(client: C, config: &EngineConfig) -> Self {
        Self {
            client,
            session: None,
            autosave: AutosaveTimer::new(config.autosave_delay()),
            max_comment_len: config.max_comment_len,
            cycle_id: None,
            load_generation: 0,
            is_loading: false,
            is_saving: false,
            is_submitting: false,
            status_message: None,
            error_message: None,
        }
    }

    // ------------------------------------------------------------------
    // Load.
    // ------------------------------------------------------------------

    /// Starts a load for a cycle, superseding any load still in flight.
    pub fn begin_load(&mut self, cycle_id: i64) -> LoadTicket {
        self.load_generation += 1;
        self.is_loading = true;
        self.autosave.cancel();
        debug!(cycle_id, generation = self.load_generation, "load started");
        LoadTicket {
            generation: self.load_generation,
            cycle_id,
        }
    }

    /// Applies a load result. Results for a superseded ticket are discarded
    /// without touching session state.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Transport`] when the load itself failed.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<BulkState, TransportError>,
    ) -> Result<(), ServiceError> {
        if ticket.generation != self.load_generation {
            debug!(
                stale = ticket.generation,
                current = self.load_generation,
                "discarding stale load result"
            );
            return Ok(());
        }
        self.is_loading = false;
        match result {
            Ok(state) => {
                let session = BulkSession::reconcile(
                    state.cycle,
                    state.models,
                    state.questions,
                    state.draft.as_ref(),
                );
                info!(
                    cycle_id = ticket.cycle_id,
                    pending = session.pending_model_ids().len(),
                    selected = session.selected_count(),
                    "session loaded"
                );
                self.session = Some(session);
                self.cycle_id = Some(ticket.cycle_id);
                self.error_message = None;
                Ok(())
            },
            Err(err) => {
                warn!(cycle_id = ticket.cycle_id, error = %err, "load failed");
                self.error_message = Some(err.message().to_string());
                Err(err.into())
            },
        }
    }

    /// Loads (or reloads) the session for a cycle.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Transport`] on network or server failure.
    pub fn load(&mut self, cycle_id: i64) -> Result<(), ServiceError> {
        let ticket = self.begin_load(cycle_id);
        let result = self.client.get_bulk_state(cycle_id);
        self.complete_load(ticket, result)
    }

    // ------------------------------------------------------------------
    // Mutations. Each re-arms the autosave debounce.
    // ------------------------------------------------------------------

    /// Moves a pending model between selected and excluded.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NoSession`] before the first load.
    pub fn toggle_model(&mut self, model_id: i64, now: DateTime<Utc>) -> Result<(), ServiceError> {
        self.session_mut()?.toggle_model(model_id);
        self.after_mutation(now);
        Ok(())
    }

    /// Selects every pending model.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NoSession`] before the first load.
    pub fn select_all(&mut self, now: DateTime<Utc>) -> Result<(), ServiceError> {
        self.session_mut()?.select_all();
        self.after_mutation(now);
        Ok(())
    }

    /// Excludes every pending model.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NoSession`] before the first load.
    pub fn deselect_all(&mut self, now: DateTime<Utc>) -> Result<(), ServiceError> {
        self.session_mut()?.deselect_all();
        self.after_mutation(now);
        Ok(())
    }

    /// Upserts an answer (and optionally a comment) for a question.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NoSession`] before the first load.
    pub fn set_response(
        &mut self,
        question_id: i64,
        answer: Answer,
        comment: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), ServiceError> {
        let comment = comment.map(|c| clamp_comment(c, self.max_comment_len));
        self.session_mut()?.set_response(question_id, answer, comment);
        self.after_mutation(now);
        Ok(())
    }

    /// Upserts only the comment for a question.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NoSession`] before the first load.
    pub fn set_response_comment(
        &mut self,
        question_id: i64,
        comment: &str,
        now: DateTime<Utc>,
    ) -> Result<(), ServiceError> {
        let comment = clamp_comment(comment, self.max_comment_len);
        self.session_mut()?.set_response_comment(question_id, comment);
        self.after_mutation(now);
        Ok(())
    }

    /// Overwrites the overall decision comment.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NoSession`] before the first load.
    pub fn set_decision_comment(
        &mut self,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<(), ServiceError> {
        let text = clamp_comment(text, self.max_comment_len);
        self.session_mut()?.set_decision_comment(text);
        self.after_mutation(now);
        Ok(())
    }

    fn after_mutation(&mut self, now: DateTime<Utc>) {
        let dirty = self.session.as_ref().is_some_and(BulkSession::is_dirty);
        if dirty && !self.is_loading {
            // Debounce: every mutation restarts the delay.
            self.autosave.schedule(now);
        }
    }

    // ------------------------------------------------------------------
    // Draft persistence.
    // ------------------------------------------------------------------

    /// Fires the autosave timer if due, running one draft save.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Transport`] when the save fails. The session
    /// stays dirty and the timer is re-armed so the write retries.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Result<SaveOutcome, ServiceError> {
        if !self.autosave.fire(now) {
            return Ok(SaveOutcome::NotDue);
        }
        self.save_draft(now)
    }

    /// Begins a draft save, returning the payload to persist.
    ///
    /// Returns `None` when a save is already in flight: the attempt is
    /// dropped, not queued.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NoSession`] before the first load.
    pub fn begin_save(&mut self) -> Result<Option<SaveDraftRequest>, ServiceError> {
        let session = self.session.as_ref().ok_or(ServiceError::NoSession)?;
        if self.is_saving {
            debug!("save already in flight; dropping attempt");
            return Ok(None);
        }
        self.is_saving = true;
        self.autosave.cancel();
        Ok(Some(session.draft_payload()))
    }

    /// Applies the result of a draft save started by [`begin_save`].
    ///
    /// On success the submission id (first save only) and `last_saved` are
    /// recorded and the dirty flag clears. On failure the session stays
    /// dirty and the autosave timer is re-armed.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Transport`] when the save failed.
    ///
    /// [`begin_save`]: Self::begin_save
    pub fn complete_save(
        &mut self,
        result: Result<SaveDraftResponse, TransportError>,
        now: DateTime<Utc>,
    ) -> Result<SaveOutcome, ServiceError> {
        self.is_saving = false;
        match result {
            Ok(response) => {
                if let Some(session) = self.session.as_mut() {
                    session.mark_saved(response.bulk_submission_id, response.last_saved);
                }
                debug!(submission_id = %response.bulk_submission_id, "draft saved");
                self.error_message = None;
                Ok(SaveOutcome::Saved)
            },
            Err(err) => {
                warn!(error = %err, "draft save failed; will retry");
                self.error_message = Some(err.message().to_string());
                self.autosave.schedule(now);
                Err(err.into())
            },
        }
    }

    /// Saves the draft now. Dropped (not queued) if a save is in flight.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NoSession`] before the first load, or
    /// [`ServiceError::Transport`] when the write fails.
    pub fn save_draft(&mut self, now: DateTime<Utc>) -> Result<SaveOutcome, ServiceError> {
        let cycle_id = self.cycle_id.ok_or(ServiceError::NoSession)?;
        let Some(request) = self.begin_save()? else {
            return Ok(SaveOutcome::Dropped);
        };
        let result = self.client.save_draft(cycle_id, &request);
        self.complete_save(result, now)
    }

    /// Deletes the persisted draft and resets the session to the no-draft
    /// defaults. Returns the confirmation message.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NoSession`] before the first load, or
    /// [`ServiceError::Transport`] when the delete fails (session state is
    /// left untouched).
    pub fn discard_draft(&mut self) -> Result<String, ServiceError> {
        let cycle_id = self.cycle_id.ok_or(ServiceError::NoSession)?;
        if self.session.is_none() {
            return Err(ServiceError::NoSession);
        }
        if let Err(err) = self.client.discard_draft(cycle_id) {
            warn!(cycle_id, error = %err, "draft discard failed");
            self.error_message = Some(err.message().to_string());
            return Err(err.into());
        }
        if let Some(session) = self.session.as_mut() {
            session.reset_to_defaults();
        }
        self.autosave.cancel();
        info!(cycle_id, "draft discarded");
        let message = "Draft discarded. Selections and answers reset.".to_string();
        self.status_message = Some(message.clone());
        self.error_message = None;
        Ok(message)
    }

    // ------------------------------------------------------------------
    // Submission.
    // ------------------------------------------------------------------

    /// Submits the selected records, then fully reloads the session so the
    /// post-submit view reflects authoritative server state.
    ///
    /// Returns the server's summary message.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::Validation`] when local validation fails; nothing
    ///   is sent to the network.
    /// - [`ServiceError::SubmitInFlight`] when a submit is outstanding.
    /// - [`ServiceError::Transport`] on server failure; the session is left
    ///   exactly as it was pre-submit.
    pub fn submit(&mut self) -> Result<String, ServiceError> {
        let session = self.session.as_ref().ok_or(ServiceError::NoSession)?;
        let cycle_id = self.cycle_id.ok_or(ServiceError::NoSession)?;
        if self.is_submitting {
            return Err(ServiceError::SubmitInFlight);
        }
        let violations = session.violations();
        if !violations.is_empty() {
            return Err(ServiceError::Validation(violations));
        }
        let request = session.submit_payload();
        self.is_submitting = true;
        self.autosave.cancel();
        let result = self.client.submit(cycle_id, &request);
        self.is_submitting = false;
        match result {
            Ok(response) => {
                info!(
                    cycle_id,
                    submitted = request.selected_model_ids.len(),
                    "bulk submission accepted"
                );
                self.status_message = Some(response.message.clone());
                // Reload rather than mutate locally: the server is now the
                // system of record for the submitted statuses.
                self.load(cycle_id)?;
                Ok(response.message)
            },
            Err(err) => {
                warn!(cycle_id, error = %err, "bulk submission failed");
                self.error_message = Some(err.message().to_string());
                Err(err.into())
            },
        }
    }

    // ------------------------------------------------------------------
    // Accessors.
    // ------------------------------------------------------------------

    /// The loaded session, if any.
    #[must_use]
    pub fn session(&self) -> Option<&BulkSession> {
        self.session.as_ref()
    }

    fn session_mut(&mut self) -> Result<&mut BulkSession, ServiceError> {
        self.session.as_mut().ok_or(ServiceError::NoSession)
    }

    /// The autosave timer, for deadline inspection.
    #[must_use]
    pub fn autosave(&self) -> &AutosaveTimer {
        &self.autosave
    }

    /// Returns `true` while a load is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Returns `true` while a draft save is in flight.
    #[must_use]
    pub fn is_saving(&self) -> bool {
        self.is_saving
    }

    /// Returns `true` while a submit is in flight.
    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.is_submitting
    }

    /// The most recent success/confirmation message.
    #[must_use]
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    /// The most recent transport error message.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// The underlying client, for record-level operations that bypass the
    /// bulk session (single submit, review decisions, change links).
    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }
}

/// Truncates a comment to the configured limit on a char boundary.
fn clamp_comment(text: &str, max_len: usize) -> &str {
    if text.len() <= max_len {
        return text;
    }
    let mut end = max_len;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
