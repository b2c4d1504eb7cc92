//! The preview session: one loop that owns all mutable state.
//!
//! Edits feed the debouncer, elapsed quiet periods issue compiles, and gated
//! compile results are paginated and presented. Saves and exports run on
//! background tasks and report back through the same channel.

use crate::compiler::DocumentCompiler;
use crate::debounce::{DebounceScheduler, Debounced};
use crate::export::export_pdf;
use crate::invoker::CompileInvoker;
use core_events::{CommandEvent, Event, EventHooks, NoopEventHooks, emit};
use core_model::{CompileFailure, SaveFailure, SaveState, VectorSurface};
use core_render::PreviewRenderer;
use core_render::display::{DisplaySurface, Preview};
use core_render::paginate::Paginator;
use core_state::{SaveRejected, SessionState};
use core_store::DocumentStore;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{Receiver, Sender};
use tracing::{Instrument, debug, error, info, trace, warn};

pub const SAVED_ALERT: &str = "Saved!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Break { reason: ShutdownReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    CommandQuit,
    ShutdownEvent,
    ChannelClosed,
}

impl ShutdownReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShutdownReason::CommandQuit => "command_quit",
            ShutdownReason::ShutdownEvent => "shutdown_event",
            ShutdownReason::ChannelClosed => "channel_closed",
        }
    }
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub quiet_period: Duration,
    pub export_dir: PathBuf,
    pub paginator: Paginator,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            quiet_period: crate::debounce::DEFAULT_QUIET_PERIOD,
            export_dir: PathBuf::from("."),
            paginator: Paginator::standard(),
        }
    }
}

pub struct PreviewSession<C, S, D> {
    state: SessionState,
    debounce: DebounceScheduler,
    invoker: CompileInvoker<C>,
    renderer: PreviewRenderer,
    store: Arc<S>,
    display: D,
    tx: Sender<Event>,
    export_dir: PathBuf,
    hooks: Box<dyn EventHooks>,
}

impl<C, S, D> PreviewSession<C, S, D>
where
    C: DocumentCompiler,
    S: DocumentStore,
    D: DisplaySurface,
{
    pub fn new(
        compiler: Arc<C>,
        store: Arc<S>,
        display: D,
        state: SessionState,
        settings: SessionSettings,
        tx: Sender<Event>,
    ) -> Self {
        Self {
            state,
            debounce: DebounceScheduler::new(settings.quiet_period, tx.clone()),
            invoker: CompileInvoker::new(compiler, tx.clone()),
            renderer: PreviewRenderer::new(settings.paginator),
            store,
            display,
            tx,
            export_dir: settings.export_dir,
            hooks: Box::new(NoopEventHooks),
        }
    }

    pub fn with_hooks(mut self, hooks: Box<dyn EventHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn invoker(&self) -> &CompileInvoker<C> {
        &self.invoker
    }

    pub fn renderer(&self) -> &PreviewRenderer {
        &self.renderer
    }

    pub fn into_display(self) -> D {
        self.display
    }

    /// Consume events until quit, shutdown, or channel close.
    pub async fn run(&mut self, rx: &mut Receiver<Event>) -> ShutdownReason {
        self.present(self.renderer.placeholder());

        let reason = self
            .event_loop(rx)
            .instrument(tracing::debug_span!(target: "runtime", "event_loop"))
            .await;
        self.debounce.cancel();
        info!(
            target: "runtime",
            reason = reason.as_str(),
            in_flight = self.invoker.in_flight(),
            "session_stopped"
        );
        reason
    }

    async fn event_loop(&mut self, rx: &mut Receiver<Event>) -> ShutdownReason {
        while let Some(event) = rx.recv().await {
            self.hooks.pre_handle(&event);
            match self.handle_event(&event) {
                LoopControl::Break { reason } => return reason,
                LoopControl::Continue => self.hooks.post_handle(&event),
            }
        }
        ShutdownReason::ChannelClosed
    }

    pub fn handle_event(&mut self, event: &Event) -> LoopControl {
        trace!(target: "runtime", kind = event.kind(), "event");
        match event {
            Event::Edit(text) => self.handle_edit(text),
            Event::DebounceElapsed { generation } => self.handle_debounce(*generation),
            Event::CompileFinished { seq, result } => self.handle_compiled(*seq, result.clone()),
            Event::Command(cmd) => return self.handle_command(*cmd),
            Event::SaveFinished(result) => self.handle_save_finished(result.as_ref()),
            Event::ExportFinished(result) => self.handle_export_finished(result),
            Event::Tick => self.handle_tick(),
            Event::Shutdown => {
                return LoopControl::Break {
                    reason: ShutdownReason::ShutdownEvent,
                };
            }
        }
        LoopControl::Continue
    }

    fn handle_edit(&mut self, text: &str) {
        self.state.document.replace(text);
        self.debounce.on_edit(text);
    }

    fn handle_debounce(&mut self, generation: u64) {
        match self.debounce.on_elapsed(generation) {
            Some(Debounced::Compile(source)) => {
                self.invoker.compile(source);
                self.present(Preview::Compiling);
            }
            Some(Debounced::Placeholder) => {
                // Compiles issued for earlier text must not replace the placeholder.
                self.invoker.supersede_in_flight();
                self.present(self.renderer.placeholder());
            }
            None => {}
        }
    }

    fn handle_compiled(&mut self, seq: u64, result: Result<VectorSurface, CompileFailure>) {
        let preview = match self.invoker.accept(seq, result) {
            Some(Ok(surface)) => self.renderer.render(&surface),
            Some(Err(failure)) => self.renderer.error(&failure),
            None => return,
        };
        self.present(preview);
    }

    fn handle_command(&mut self, cmd: CommandEvent) -> LoopControl {
        match cmd {
            CommandEvent::Save => self.start_save(),
            CommandEvent::Export => self.start_export(),
            CommandEvent::Quit => {
                return LoopControl::Break {
                    reason: ShutdownReason::CommandQuit,
                };
            }
        }
        LoopControl::Continue
    }

    fn start_save(&mut self) {
        let ticket = match self.state.prepare_save() {
            Ok(ticket) => ticket,
            Err(SaveRejected::InProgress) => {
                debug!(target: "save", "save_ignored_in_progress");
                return;
            }
            Err(rejected) => {
                warn!(target: "save", reason = %rejected, "save_rejected");
                self.display.alert(&rejected.to_string());
                return;
            }
        };
        self.display.save_status(SaveState::Saving);
        info!(
            target: "save",
            project_id = ticket.project.project_id.as_str(),
            size_bytes = ticket.text.len(),
            "save_started"
        );

        let store = Arc::clone(&self.store);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = store
                .save(&ticket.project.project_id, &ticket.project.path, &ticket.text)
                .await
                .map_err(SaveFailure::from);
            emit(&tx, Event::SaveFinished(result)).await;
        });
    }

    fn handle_save_finished(&mut self, result: Result<&(), &SaveFailure>) {
        let now = tokio::time::Instant::now().into_std();
        let state = self.state.save.complete(result.map(|_| ()), now);
        self.display.save_status(state);
        match result {
            Ok(_) if state == SaveState::Saved => {
                info!(target: "save", "save_succeeded");
                self.display.alert(SAVED_ALERT);
            }
            Err(failure) if state == SaveState::Error => {
                error!(target: "save", error = %failure, "save_failed");
                self.display.alert(&format!("Save failed: {failure}"));
            }
            _ => {}
        }
    }

    fn start_export(&mut self) {
        let source = self.state.document.text().to_string();
        let compiler = Arc::clone(self.invoker.compiler());
        let out_dir = self.export_dir.clone();
        let tx = self.tx.clone();
        debug!(target: "pipeline.export", size_bytes = source.len(), "export_started");
        tokio::spawn(async move {
            let result = export_pdf(compiler.as_ref(), &source, &out_dir)
                .await
                .map_err(|e| format!("{e:#}"));
            emit(&tx, Event::ExportFinished(result)).await;
        });
    }

    fn handle_export_finished(&mut self, result: &Result<PathBuf, String>) {
        match result {
            Ok(path) => self.display.alert(&format!("Exported {}", path.display())),
            Err(message) => {
                error!(target: "pipeline.export", error = message.as_str(), "export_failed");
                self.display.alert(message);
            }
        }
    }

    fn handle_tick(&mut self) {
        let now = tokio::time::Instant::now().into_std();
        if self.state.save.tick(now) {
            trace!(target: "save", "save_status_reverted");
            self.display.save_status(self.state.save.state());
        }
    }

    fn present(&mut self, preview: Preview) {
        if let Err(err) = self.display.present(&preview) {
            error!(target: "render.display", kind = preview.kind(), ?err, "present_failed");
        }
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }
}
