//! Quiet-period debouncing of edits.
//!
//! Each edit replaces the pending text and restarts a single timer. Timers are
//! spawned tasks that emit `Event::DebounceElapsed { generation }`; an edit
//! aborts the previous timer and bumps the generation, so a timer that raced
//! its abort and still delivered is recognised as stale by the loop.

use core_events::{Event, emit};
use std::time::Duration;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(300);

/// What an elapsed quiet period asks the session to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Debounced {
    /// Compile this (trimmed, non-empty) source.
    Compile(String),
    /// The latest text is blank; show the placeholder without compiling.
    Placeholder,
}

pub struct DebounceScheduler {
    quiet_period: Duration,
    generation: u64,
    pending: Option<String>,
    timer: Option<JoinHandle<()>>,
    tx: Sender<Event>,
}

impl DebounceScheduler {
    pub fn new(quiet_period: Duration, tx: Sender<Event>) -> Self {
        Self {
            quiet_period,
            generation: 0,
            pending: None,
            timer: None,
            tx,
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    /// Record the latest text and restart the quiet period.
    pub fn on_edit(&mut self, text: &str) {
        self.abort_timer();
        self.generation = self.generation.wrapping_add(1);
        self.pending = Some(text.to_string());

        let generation = self.generation;
        let quiet = self.quiet_period;
        let tx = self.tx.clone();
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            emit(&tx, Event::DebounceElapsed { generation }).await;
        }));
        trace!(target: "pipeline.debounce", generation, size_bytes = text.len(), "timer_restarted");
    }

    /// Resolve an elapsed timer. Returns `None` for superseded generations.
    pub fn on_elapsed(&mut self, generation: u64) -> Option<Debounced> {
        if generation != self.generation {
            trace!(
                target: "pipeline.debounce",
                generation,
                current = self.generation,
                "stale_timer_ignored"
            );
            return None;
        }
        self.timer = None;
        let text = self.pending.take()?;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            debug!(target: "pipeline.debounce", generation, "quiet_period_blank");
            Some(Debounced::Placeholder)
        } else {
            debug!(
                target: "pipeline.debounce",
                generation,
                size_bytes = trimmed.len(),
                "quiet_period_elapsed"
            );
            Some(Debounced::Compile(trimmed.to_string()))
        }
    }

    /// Drop the pending edit without compiling it.
    pub fn cancel(&mut self) {
        self.abort_timer();
        if self.pending.take().is_some() {
            self.generation = self.generation.wrapping_add(1);
            trace!(target: "pipeline.debounce", "pending_edit_cancelled");
        }
    }

    fn abort_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for DebounceScheduler {
    fn drop(&mut self) {
        self.abort_timer();
    }
}
