//! Compile invocation with sequence-gated results.
//!
//! Every request gets the next sequence number (starting at 0) and runs on
//! its own task; completions arrive as `Event::CompileFinished` in any order.
//! A result is presented only when its number is strictly greater than every
//! number presented before it. A failure must also come from the most recently
//! issued request: an error for text the user has already edited is dropped
//! rather than shown while the newer compile is still running.

use crate::compiler::DocumentCompiler;
use core_events::{Event, emit};
use core_model::{CompileFailure, CompileRequest, VectorSurface};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::mpsc::Sender;
use tracing::{debug, info, warn};

/// Monotonic admission gate over sequence numbers.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SequenceGate {
    highest: Option<u64>,
}

impl SequenceGate {
    pub fn highest(&self) -> Option<u64> {
        self.highest
    }

    /// Admit `seq` if it beats everything admitted so far.
    pub fn admit(&mut self, seq: u64) -> bool {
        match self.highest {
            Some(h) if seq <= h => false,
            _ => {
                self.highest = Some(seq);
                true
            }
        }
    }

    /// Mark everything up to and including `seq` as superseded.
    pub fn close_through(&mut self, seq: u64) {
        if self.highest.is_none_or(|h| h < seq) {
            self.highest = Some(seq);
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InvokerStats {
    pub issued: u64,
    pub accepted: u64,
    pub failed: u64,
    pub stale: u64,
}

pub struct CompileInvoker<C> {
    compiler: Arc<C>,
    tx: Sender<Event>,
    next_seq: u64,
    gate: SequenceGate,
    in_flight: BTreeSet<u64>,
    stats: InvokerStats,
}

impl<C: DocumentCompiler> CompileInvoker<C> {
    pub fn new(compiler: Arc<C>, tx: Sender<Event>) -> Self {
        Self {
            compiler,
            tx,
            next_seq: 0,
            gate: SequenceGate::default(),
            in_flight: BTreeSet::new(),
            stats: InvokerStats::default(),
        }
    }

    pub fn compiler(&self) -> &Arc<C> {
        &self.compiler
    }

    pub fn stats(&self) -> InvokerStats {
        self.stats
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Highest sequence number whose result was presented.
    pub fn last_accepted(&self) -> Option<u64> {
        self.gate.highest()
    }

    /// Issue a compile of `source`; returns the assigned request.
    pub fn compile(&mut self, source: impl Into<Arc<str>>) -> CompileRequest {
        let request = CompileRequest::new(self.next_seq, source);
        self.next_seq += 1;
        self.in_flight.insert(request.seq);
        self.stats.issued += 1;
        debug!(
            target: "pipeline.compile",
            seq = request.seq,
            in_flight = self.in_flight.len(),
            size_bytes = request.source.len(),
            "compile_issued"
        );

        let compiler = Arc::clone(&self.compiler);
        let tx = self.tx.clone();
        let job = request.clone();
        tokio::spawn(async move {
            let result = compiler.render_vector(&job.source).await;
            emit(&tx, Event::CompileFinished { seq: job.seq, result }).await;
        });
        request
    }

    /// Gate a completion. Returns the result only if it should be presented.
    pub fn accept(
        &mut self,
        seq: u64,
        result: Result<VectorSurface, CompileFailure>,
    ) -> Option<Result<VectorSurface, CompileFailure>> {
        self.in_flight.remove(&seq);
        let superseded_failure = result.is_err() && !self.is_latest(seq);
        if superseded_failure || !self.gate.admit(seq) {
            self.stats.stale += 1;
            debug!(
                target: "pipeline.compile",
                seq,
                highest = self.gate.highest(),
                ok = result.is_ok(),
                "stale_result_dropped"
            );
            return None;
        }
        match &result {
            Ok(surface) => {
                self.stats.accepted += 1;
                info!(
                    target: "pipeline.compile",
                    seq,
                    height = surface.height(),
                    "compile_accepted"
                );
            }
            Err(failure) => {
                self.stats.failed += 1;
                warn!(target: "pipeline.compile", seq, error = %failure, "compile_failed");
            }
        }
        Some(result)
    }

    fn is_latest(&self, seq: u64) -> bool {
        self.next_seq.checked_sub(1) == Some(seq)
    }

    /// Make every request issued so far ineligible for presentation.
    pub fn supersede_in_flight(&mut self) {
        let Some(last) = self.next_seq.checked_sub(1) else {
            return;
        };
        self.gate.close_through(last);
        if !self.in_flight.is_empty() {
            debug!(
                target: "pipeline.compile",
                superseded = self.in_flight.len(),
                through = last,
                "in_flight_superseded"
            );
        }
    }
}
