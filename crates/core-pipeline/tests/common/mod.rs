#![allow(dead_code)]

use core_events::{EVENT_CHANNEL_CAP, Event};
use core_model::{CompileFailure, SaveState, VectorSurface, ViewBox};
use core_pipeline::{DocumentCompiler, PreviewSession, SessionSettings, ShutdownReason};
use core_render::display::{DisplaySurface, Preview};
use core_state::{ProjectBinding, SaveStatus, SessionState};
use core_store::{DEFAULT_CONTENT, DocumentStore, Project, StoreError};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::{self, Receiver, Sender};

pub const PAGE_WIDTH: f64 = 595.0;

/// Compiler whose latency and outcome are scripted per source text.
/// Unscripted sources compile instantly to a 700pt-tall surface.
#[derive(Default)]
pub struct FakeCompiler {
    delays: Mutex<HashMap<String, Duration>>,
    failures: Mutex<HashMap<String, String>>,
    heights: Mutex<HashMap<String, f64>>,
    calls: Mutex<Vec<String>>,
}

impl FakeCompiler {
    pub fn delay(&self, source: &str, delay: Duration) -> &Self {
        self.delays.lock().unwrap().insert(source.into(), delay);
        self
    }

    pub fn fail(&self, source: &str, message: &str) -> &Self {
        self.failures
            .lock()
            .unwrap()
            .insert(source.into(), message.into());
        self
    }

    pub fn height(&self, source: &str, height: f64) -> &Self {
        self.heights.lock().unwrap().insert(source.into(), height);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn script(&self, source: &str) -> (Duration, Option<String>, f64) {
        self.calls.lock().unwrap().push(source.to_string());
        let delay = self
            .delays
            .lock()
            .unwrap()
            .get(source)
            .copied()
            .unwrap_or_default();
        let failure = self.failures.lock().unwrap().get(source).cloned();
        let height = self
            .heights
            .lock()
            .unwrap()
            .get(source)
            .copied()
            .unwrap_or(700.0);
        (delay, failure, height)
    }
}

impl DocumentCompiler for FakeCompiler {
    async fn render_vector(&self, source: &str) -> Result<VectorSurface, CompileFailure> {
        let (delay, failure, height) = self.script(source);
        tokio::time::sleep(delay).await;
        match failure {
            Some(message) => Err(CompileFailure::new(message)),
            None => Ok(VectorSurface::from_parts(
                ViewBox::new(0.0, 0.0, PAGE_WIDTH, height),
                format!("<text>{source}</text>"),
            )),
        }
    }

    async fn render_bytes(&self, source: &str) -> Result<Vec<u8>, CompileFailure> {
        let (delay, failure, _) = self.script(source);
        tokio::time::sleep(delay).await;
        match failure {
            Some(message) => Err(CompileFailure::new(message)),
            None => Ok(format!("%PDF {source}").into_bytes()),
        }
    }
}

/// In-memory store with optional latency and a failure switch.
#[derive(Default)]
pub struct MemoryStore {
    files: Mutex<HashMap<String, String>>,
    save_delay: Mutex<Duration>,
    fail_saves: Mutex<Option<String>>,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn with_save_delay(self, delay: Duration) -> Self {
        *self.save_delay.lock().unwrap() = delay;
        self
    }

    pub fn failing(self, message: &str) -> Self {
        *self.fail_saves.lock().unwrap() = Some(message.into());
        self
    }

    pub fn file(&self, path: &str) -> Option<String> {
        self.files.lock().unwrap().get(path).cloned()
    }

    pub fn save_calls(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl DocumentStore for MemoryStore {
    async fn save(&self, _project_id: &str, path: &str, text: &str) -> Result<(), StoreError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        let delay = *self.save_delay.lock().unwrap();
        tokio::time::sleep(delay).await;
        let failure = self.fail_saves.lock().unwrap().clone();
        if let Some(message) = failure {
            return Err(StoreError::Io(std::io::Error::other(message)));
        }
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), text.to_string());
        Ok(())
    }

    async fn load(&self, path: &str) -> Result<String, StoreError> {
        Ok(self.file(path).unwrap_or_else(|| DEFAULT_CONTENT.to_string()))
    }

    async fn create(&self, owner_id: &str, title: &str) -> Result<Project, StoreError> {
        let id = format!("p{}", self.files.lock().unwrap().len());
        let path = format!("{owner_id}/{id}/main.typ");
        self.files
            .lock()
            .unwrap()
            .insert(path.clone(), DEFAULT_CONTENT.to_string());
        Ok(Project {
            id,
            owner: owner_id.into(),
            title: title.into(),
            path,
            updated_at: 0,
        })
    }

    async fn delete(&self, project_id: &str, path: &str) -> Result<(), StoreError> {
        self.files
            .lock()
            .unwrap()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(project_id.into()))
    }

    async fn list(&self, _owner_id: &str) -> Result<Vec<Project>, StoreError> {
        Ok(Vec::new())
    }
}

/// Display that records everything it is asked to show.
#[derive(Debug, Default)]
pub struct RecordingDisplay {
    pub previews: Vec<Preview>,
    pub statuses: Vec<SaveState>,
    pub alerts: Vec<String>,
}

impl RecordingDisplay {
    pub fn last_preview(&self) -> &Preview {
        self.previews.last().expect("at least one preview")
    }

    /// Text of every page-bearing preview, in presentation order.
    pub fn page_sources(&self) -> Vec<String> {
        self.previews
            .iter()
            .filter_map(|p| match p {
                Preview::Pages(fragments) => Some(fragments[0].content.to_string()),
                _ => None,
            })
            .collect()
    }
}

impl DisplaySurface for RecordingDisplay {
    fn present(&mut self, preview: &Preview) -> anyhow::Result<()> {
        self.previews.push(preview.clone());
        Ok(())
    }

    fn save_status(&mut self, state: SaveState) {
        self.statuses.push(state);
    }

    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }
}

pub type TestSession = PreviewSession<FakeCompiler, MemoryStore, RecordingDisplay>;

pub struct Harness {
    pub session: TestSession,
    pub rx: Receiver<Event>,
    pub tx: Sender<Event>,
    pub compiler: Arc<FakeCompiler>,
    pub store: Arc<MemoryStore>,
}

pub fn harness(compiler: FakeCompiler, store: MemoryStore, project: bool) -> Harness {
    harness_with(compiler, store, project, SessionSettings::default())
}

pub fn harness_with(
    compiler: FakeCompiler,
    store: MemoryStore,
    project: bool,
    settings: SessionSettings,
) -> Harness {
    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAP);
    let compiler = Arc::new(compiler);
    let store = Arc::new(store);
    let binding = project.then(|| ProjectBinding::new("p1", "me/p1/main.typ"));
    let session = PreviewSession::new(
        Arc::clone(&compiler),
        Arc::clone(&store),
        RecordingDisplay::default(),
        SessionState::new(binding, SaveStatus::default()),
        settings,
        tx.clone(),
    );
    Harness {
        session,
        rx,
        tx,
        compiler,
        store,
    }
}

impl Harness {
    /// Run the session loop alongside `script`; the script must end the
    /// session (usually by sending `Command(Quit)`).
    pub async fn drive<F, Fut>(&mut self, script: F) -> ShutdownReason
    where
        F: FnOnce(Sender<Event>) -> Fut,
        Fut: Future<Output = ()>,
    {
        let script = script(self.tx.clone());
        let (reason, ()) = tokio::join!(self.session.run(&mut self.rx), script);
        reason
    }

    pub fn display(&self) -> &RecordingDisplay {
        self.session.display()
    }
}

pub async fn send(tx: &Sender<Event>, event: Event) {
    tx.send(event).await.expect("session loop alive");
}

pub async fn edit(tx: &Sender<Event>, text: &str) {
    send(tx, Event::Edit(text.to_string())).await;
}

pub async fn sleep_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
