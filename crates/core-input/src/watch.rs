//! File watch source: every content change of one file becomes `Event::Edit`.
//!
//! The directory containing the file is watched (editors commonly replace
//! files by rename, which a watch on the file itself would lose). Notify
//! callbacks only signal "something changed"; the task then re-reads the file
//! and forwards the full text if it differs from what was last sent. Bursts of
//! notifications collapse into one read.

use core_events::{AsyncEventSource, Event, emit};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::{self, Sender};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

pub struct FileWatchSource {
    path: PathBuf,
}

impl FileWatchSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn watch_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn start_watcher(&self, signal: mpsc::Sender<()>) -> notify::Result<RecommendedWatcher> {
        let file_name = self.path.file_name().map(|n| n.to_os_string());
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            match res {
                Ok(event) if touches(&event, file_name.as_ref()) => {
                    // Full channel means a re-read is already pending.
                    let _ = signal.try_send(());
                }
                Ok(_) => {}
                Err(err) => warn!(target: "input.watch", %err, "watch_error"),
            }
        })?;
        watcher.watch(&self.watch_dir(), RecursiveMode::NonRecursive)?;
        Ok(watcher)
    }

    async fn run(self, tx: Sender<Event>) {
        let (signal_tx, mut signal_rx) = mpsc::channel::<()>(1);
        let _watcher = match self.start_watcher(signal_tx) {
            Ok(watcher) => watcher,
            Err(err) => {
                error!(
                    target: "input.watch",
                    path = %self.path.display(),
                    %err,
                    "watch_start_failed"
                );
                return;
            }
        };
        info!(target: "input.watch", path = %self.path.display(), "watch_started");

        let mut last_sent: Option<String> = None;
        // Initial contents go through the edit path like any other change.
        if !self.forward_if_changed(&tx, &mut last_sent).await {
            return;
        }
        loop {
            tokio::select! {
                biased;
                _ = tx.closed() => break,
                signal = signal_rx.recv() => {
                    if signal.is_none() {
                        break;
                    }
                    if !self.forward_if_changed(&tx, &mut last_sent).await {
                        break;
                    }
                }
            }
        }
        info!(target: "input.watch", path = %self.path.display(), "watch_stopped");
    }

    /// Returns false once the consumer is gone.
    async fn forward_if_changed(&self, tx: &Sender<Event>, last_sent: &mut Option<String>) -> bool {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(target: "input.watch", path = %self.path.display(), "file_missing");
                return true;
            }
            Err(err) => {
                warn!(target: "input.watch", path = %self.path.display(), %err, "read_failed");
                return true;
            }
        };
        if last_sent.as_deref() == Some(text.as_str()) {
            trace!(target: "input.watch", "content_unchanged");
            return true;
        }
        log_edit_forwarded(&self.path, &text);
        *last_sent = Some(text.clone());
        emit(tx, Event::Edit(text)).await
    }
}

impl AsyncEventSource for FileWatchSource {
    fn name(&self) -> &'static str {
        "file_watch"
    }

    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()> {
        tokio::spawn(self.run(tx))
    }
}

/// Whether a notify event concerns the watched file name.
pub(crate) fn touches(event: &notify::Event, file_name: Option<&OsString>) -> bool {
    if matches!(event.kind, EventKind::Access(_)) {
        return false;
    }
    let Some(name) = file_name else {
        return false;
    };
    event
        .paths
        .iter()
        .any(|p| p.file_name() == Some(name.as_os_str()))
}

#[inline]
pub(crate) fn log_edit_forwarded(path: &Path, text: &str) {
    debug!(
        target: "input.watch",
        path = %path.display(),
        size_bytes = text.len(),
        lines = text.lines().count(),
        "edit_forwarded"
    );
}
