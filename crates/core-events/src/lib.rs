//! Core event types and channel helpers for livepage.
//!
//! Every piece of work in the preview session is an `Event` on one bounded
//! channel consumed by a single loop. Background tasks (debounce timers,
//! in-flight compiles, saves, exports, file watchers) only ever *produce*
//! events; all shared state is mutated by the loop while handling them.

use core_model::{CompileFailure, SaveFailure, VectorSurface};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;

// -------------------------------------------------------------------------------------------------
// Channel Policy
// -------------------------------------------------------------------------------------------------
// Bounded mpsc channel sized by `EVENT_CHANNEL_CAP`. Producers await capacity rather than drop
// events: an edit or compile result silently lost would leave the preview stale. Producers living
// on foreign threads (notify callbacks) hand off to an async task instead of sending directly.
// -------------------------------------------------------------------------------------------------
pub const EVENT_CHANNEL_CAP: usize = 1024;

// -------------------------------------------------------------------------------------------------
// Telemetry
// -------------------------------------------------------------------------------------------------
pub static CHANNEL_SEND_FAILURES: AtomicU64 = AtomicU64::new(0);

/// Top-level event enum consumed by the session loop.
#[derive(Debug, Clone)]
pub enum Event {
    /// Full snapshot of the document text after an edit.
    Edit(String),
    /// A debounce timer ran to completion. Only the timer with the current
    /// generation may trigger a compile; older generations were cancelled.
    DebounceElapsed { generation: u64 },
    /// An issued compile finished (in any order relative to other compiles).
    CompileFinished {
        seq: u64,
        result: Result<VectorSurface, CompileFailure>,
    },
    Command(CommandEvent),
    SaveFinished(Result<(), SaveFailure>),
    /// PDF export finished; carries the written path or a printable failure.
    ExportFinished(Result<PathBuf, String>),
    /// Periodic monotonic tick used to drive timed state reversion.
    Tick,
    Shutdown,
}

impl Event {
    /// Stable short name for logs (never includes payloads).
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Edit(_) => "edit",
            Event::DebounceElapsed { .. } => "debounce_elapsed",
            Event::CompileFinished { .. } => "compile_finished",
            Event::Command(_) => "command",
            Event::SaveFinished(_) => "save_finished",
            Event::ExportFinished(_) => "export_finished",
            Event::Tick => "tick",
            Event::Shutdown => "shutdown",
        }
    }
}

/// User commands issued outside the editing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandEvent {
    Save,
    Export,
    Quit,
}

/// Send from an async task, counting failures. Returns `false` once the
/// consumer is gone so the caller can stop.
pub async fn emit(tx: &Sender<Event>, event: Event) -> bool {
    let kind = event.kind();
    if tx.send(event).await.is_err() {
        CHANNEL_SEND_FAILURES.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(target: "runtime.events", kind, "send_after_close");
        return false;
    }
    true
}

// -------------------------------------------------------------------------------------------------
// Event Transform Hooks
// -------------------------------------------------------------------------------------------------
/// Optional hooks that can observe events at the loop boundary. These must not block.
pub trait EventHooks: Send + Sync + 'static {
    fn pre_handle(&self, _event: &Event) {}
    fn post_handle(&self, _event: &Event) {}
}

/// Default no-op hooks implementation.
pub struct NoopEventHooks;

impl EventHooks for NoopEventHooks {}

// -------------------------------------------------------------------------------------------------
// Async Event Sources
// -------------------------------------------------------------------------------------------------

/// Trait implemented by any async event producer. Implementors usually hold configuration and
/// spawn one background task that pushes `Event`s into the shared channel.
pub trait AsyncEventSource: Send + 'static {
    /// Human-readable stable identifier (used for logging / diagnostics).
    fn name(&self) -> &'static str;
    /// Consume self and spawn the background task. Implementors stop when the channel closes.
    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()>;
}

/// Registry of event sources spawned together at startup.
pub struct EventSourceRegistry {
    sources: Vec<Box<dyn AsyncEventSource>>,
}

impl Default for EventSourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSourceRegistry {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    pub fn register<S: AsyncEventSource>(&mut self, src: S) {
        self.sources.push(Box::new(src));
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Spawn all registered sources, returning their JoinHandles. Each source receives its own
    /// `Sender` clone; the caller should drop its final clone before awaiting the handles during
    /// shutdown so the sources observe the closed channel.
    pub fn spawn_all(&mut self, tx: &Sender<Event>) -> Vec<JoinHandle<()>> {
        let mut out = Vec::with_capacity(self.sources.len());
        for src in self.sources.drain(..) {
            let name = src.name();
            tracing::info!(target: "runtime.events", source = name, "spawning event source");
            out.push(src.spawn(tx.clone()));
        }
        out
    }
}

/// Built-in monotonic tick source. Emits `Event::Tick` every configured interval.
pub struct TickEventSource {
    interval: std::time::Duration,
}

impl TickEventSource {
    pub fn new(interval: std::time::Duration) -> Self {
        Self { interval }
    }
}

impl AsyncEventSource for TickEventSource {
    fn name(&self) -> &'static str {
        "tick"
    }

    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()> {
        let dur = self.interval;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(dur);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = tx.closed() => break,
                    _ = interval.tick() => {
                        if !emit(&tx, Event::Tick).await {
                            break;
                        }
                    }
                }
            }
        })
    }
}
