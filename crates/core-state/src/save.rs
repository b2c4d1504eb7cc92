//! Save-status tracker.
//!
//! `Idle -> Saving -> {Saved | Error} -> Idle`. The terminal states revert on
//! their own after a fixed delay; the loop drives reversion by calling
//! `tick(now)` on every `Event::Tick`. Entering `Saving` again clears any
//! pending reversion.

use core_model::{SaveFailure, SaveState};
use std::time::{Duration, Instant};
use thiserror::Error;

pub const SAVED_REVERT: Duration = Duration::from_millis(1500);
pub const ERROR_REVERT: Duration = Duration::from_millis(3000);

/// Why a save request never reached the store.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveRejected {
    #[error("Save already in progress")]
    InProgress,
    #[error("No project to save")]
    NoProject,
    #[error("No content to save")]
    EmptyContent,
}

#[derive(Debug, Clone)]
pub struct SaveStatus {
    state: SaveState,
    revert_at: Option<Instant>,
    saved_ttl: Duration,
    error_ttl: Duration,
}

impl Default for SaveStatus {
    fn default() -> Self {
        Self::new(SAVED_REVERT, ERROR_REVERT)
    }
}

impl SaveStatus {
    pub fn new(saved_ttl: Duration, error_ttl: Duration) -> Self {
        Self {
            state: SaveState::Idle,
            revert_at: None,
            saved_ttl,
            error_ttl,
        }
    }

    pub fn state(&self) -> SaveState {
        self.state
    }

    pub fn control_enabled(&self) -> bool {
        self.state.control_enabled()
    }

    /// Deadline of the pending auto-revert, if any.
    pub fn revert_at(&self) -> Option<Instant> {
        self.revert_at
    }

    /// Enter `Saving`. Rejected while a save is already in flight.
    pub fn begin(&mut self) -> Result<(), SaveRejected> {
        if self.state == SaveState::Saving {
            return Err(SaveRejected::InProgress);
        }
        if self.revert_at.take().is_some() {
            tracing::trace!(target: "save", from = self.state.as_str(), "pending_revert_cancelled");
        }
        self.state = SaveState::Saving;
        Ok(())
    }

    /// Record the store's answer. Ignored unless a save is in flight.
    pub fn complete(&mut self, outcome: Result<(), &SaveFailure>, now: Instant) -> SaveState {
        if self.state != SaveState::Saving {
            tracing::warn!(target: "save", state = self.state.as_str(), "completion_without_save");
            return self.state;
        }
        let (state, ttl) = match outcome {
            Ok(()) => (SaveState::Saved, self.saved_ttl),
            Err(_) => (SaveState::Error, self.error_ttl),
        };
        self.state = state;
        self.revert_at = Some(now + ttl);
        state
    }

    /// Revert to `Idle` once the deadline passed; returns true on reversion.
    pub fn tick(&mut self, now: Instant) -> bool {
        if let Some(deadline) = self.revert_at
            && now >= deadline
        {
            self.revert_at = None;
            self.state = SaveState::Idle;
            return true;
        }
        false
    }
}
