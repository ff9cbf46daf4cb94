//! Bulk session reconciliation engine.
//!
//! A bulk session is the in-memory working state for attesting many records
//! at once within one cycle. Its job is to produce one consistent selection
//! state from two independent sources of truth:
//!
//! 1. the server-reported `is_excluded` flag per model, and
//! 2. a previously saved draft,
//!
//! with the draft always taking precedence when present.
//!
//! # Partition Invariant
//!
//! For every model whose attestation status is `PENDING`, the model id is in
//! exactly one of `selected` or `excluded`. Non-pending models appear in
//! neither set and are not eligible for submission. The union of the two
//! sets always covers the full pending id set: no pending model is ever
//! forgotten. Every mutation preserves this invariant.
//!
//! # Mutations
//!
//! Each mutation is a synchronous reducer-style method that marks the
//! session dirty: `toggle_model`, `select_all`, `deselect_all`,
//! `set_response`, `set_response_comment`, `set_decision_comment`. Dirty
//! state drives the autosave debounce in [`crate::service`].

mod state;

#[cfg(test)]
mod tests;

pub use state::{BulkSession, ModelRow};
