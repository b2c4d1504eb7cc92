//! `watch` runtime: wires event sources, compiler, store, and display into a
//! preview session and tears them down in order.

use anyhow::Result;
use core_config::Config;
use core_events::{
    AsyncEventSource, EVENT_CHANNEL_CAP, Event, EventSourceRegistry, TickEventSource, emit,
};
use core_input::{CommandLineSource, FileWatchSource};
use core_pipeline::{CommandCompiler, PreviewSession, SessionSettings, ShutdownReason};
use core_render::display::DirectoryDisplay;
use core_render::paginate::{PageSize, Paginator};
use core_state::{ProjectBinding, SaveStatus, SessionState};
use core_store::FsStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, Sender};
use tokio::task::JoinHandle;
use tracing::{error, info, trace, warn};

pub struct WatchOptions {
    pub path: PathBuf,
    pub binding: Option<ProjectBinding>,
    pub out: PathBuf,
}

/// Turns Ctrl-C into `Event::Shutdown`.
struct CtrlCSource;

impl AsyncEventSource for CtrlCSource {
    fn name(&self) -> &'static str {
        "ctrl_c"
    }

    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()> {
        tokio::spawn(async move {
            tokio::select! {
                _ = tx.closed() => {}
                res = tokio::signal::ctrl_c() => {
                    if let Err(err) = res {
                        warn!(target: "runtime", %err, "ctrl_c_listener_failed");
                        return;
                    }
                    emit(&tx, Event::Shutdown).await;
                }
            }
        })
    }
}

fn session_settings(config: &Config, out: &Path) -> SessionSettings {
    let sizes = config
        .effective_page_sizes
        .iter()
        .map(|s| PageSize::new(s.name.as_str(), s.height))
        .collect();
    SessionSettings {
        quiet_period: config.file.debounce.quiet_period(),
        export_dir: out.to_path_buf(),
        paginator: Paginator::new(sizes),
    }
}

pub async fn watch(config: &Config, store: FsStore, opts: WatchOptions) -> Result<()> {
    let display = DirectoryDisplay::new(&opts.out)?;
    let compiler = Arc::new(CommandCompiler::new(
        config.file.compiler.program.clone(),
        config.file.compiler.vector_args.clone(),
        config.file.compiler.bytes_args.clone(),
    ));
    let save = SaveStatus::new(
        Duration::from_millis(config.file.save.saved_revert_ms),
        Duration::from_millis(config.file.save.error_revert_ms),
    );
    let has_project = opts.binding.is_some();
    let state = SessionState::new(opts.binding, save);

    let (tx, mut rx) = mpsc::channel::<Event>(EVENT_CHANNEL_CAP);
    let mut registry = EventSourceRegistry::new();
    registry.register(FileWatchSource::new(opts.path.clone()));
    registry.register(CommandLineSource::stdin());
    registry.register(TickEventSource::new(config.file.runtime.tick_interval()));
    registry.register(CtrlCSource);
    let source_handles = registry.spawn_all(&tx);

    let mut session = PreviewSession::new(
        compiler,
        Arc::new(store),
        display,
        state,
        session_settings(config, &opts.out),
        tx,
    );
    info!(
        target: "runtime",
        path = %opts.path.display(),
        out = %opts.out.display(),
        has_project,
        "watch_started"
    );
    eprintln!(
        "Watching {} -> {}  (:w save, :export, :q quit)",
        opts.path.display(),
        opts.out.join("preview.html").display()
    );

    let reason = session.run(&mut rx).await;
    let stats = session.invoker().stats();
    info!(
        target: "runtime",
        issued = stats.issued,
        accepted = stats.accepted,
        failed = stats.failed,
        stale = stats.stale,
        "compile_totals"
    );
    // Dropping the session releases its senders; closing the receiver stops the sources.
    drop(session);
    rx.close();
    finalize_shutdown(reason, source_handles).await;
    Ok(())
}

fn log_shutdown_stage(reason: ShutdownReason, stage: &'static str) {
    info!(
        target: "runtime.shutdown",
        reason = reason.as_str(),
        stage = stage,
        "shutdown_stage"
    );
}

async fn finalize_shutdown(reason: ShutdownReason, mut handles: Vec<JoinHandle<()>>) {
    log_shutdown_stage(reason, "begin");
    while let Some(handle) = handles.pop() {
        match tokio::time::timeout(Duration::from_millis(200), handle).await {
            Ok(Ok(_)) => trace!(
                target: "runtime.shutdown",
                reason = reason.as_str(),
                "event_source_task_stopped"
            ),
            Ok(Err(err)) if err.is_cancelled() => trace!(
                target: "runtime.shutdown",
                reason = reason.as_str(),
                "event_source_task_cancelled"
            ),
            Ok(Err(err)) => error!(
                target: "runtime.shutdown",
                reason = reason.as_str(),
                ?err,
                "event_source_task_error"
            ),
            Err(_) => warn!(
                target: "runtime.shutdown",
                reason = reason.as_str(),
                "event_source_task_timeout"
            ),
        }
    }
    log_shutdown_stage(reason, "complete");
}
