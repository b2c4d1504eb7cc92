//! Filesystem-backed project store.
//!
//! Layout under `root`:
//! `<owner>/<project>/main.typ` (the document) and
//! `<owner>/<project>/project.toml` (metadata).

use crate::{DEFAULT_CONTENT, DocumentStore, MAIN_FILE, Project, StoreError};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

const META_FILE: &str = "project.toml";

static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store-relative path of a project's main file.
    pub fn project_path(owner_id: &str, project_id: &str) -> String {
        format!("{owner_id}/{project_id}/{MAIN_FILE}")
    }

    /// Map a store-relative path to disk, refusing anything that could escape `root`.
    fn resolve(&self, rel: &str) -> Result<PathBuf, StoreError> {
        let path = Path::new(rel);
        let plain = path
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if rel.is_empty() || !plain {
            return Err(StoreError::InvalidPath(rel.to_string()));
        }
        Ok(self.root.join(path))
    }

    fn meta_path(file: &Path) -> PathBuf {
        file.with_file_name(META_FILE)
    }

    async fn read_meta(path: &Path) -> Result<Project, StoreError> {
        let raw = fs::read_to_string(path).await?;
        toml::from_str(&raw).map_err(|e| StoreError::Metadata(e.to_string()))
    }

    async fn write_meta(path: &Path, project: &Project) -> Result<(), StoreError> {
        let raw = toml::to_string(project).map_err(|e| StoreError::Metadata(e.to_string()))?;
        fs::write(path, raw).await?;
        Ok(())
    }

    async fn touch_meta(meta: &Path, project_id: &str) -> Result<(), StoreError> {
        let mut project = Self::read_meta(meta).await?;
        if project.id != project_id {
            return Err(StoreError::Metadata(format!(
                "record belongs to {}, not {project_id}",
                project.id
            )));
        }
        project.updated_at = now_secs();
        Self::write_meta(meta, &project).await
    }
}

impl DocumentStore for FsStore {
    async fn save(&self, project_id: &str, path: &str, text: &str) -> Result<(), StoreError> {
        let file = self.resolve(path)?;
        debug!(target: "store", path, size_bytes = text.len(), "save_begin");
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&file, text).await?;

        // The file is the source of truth; a stale timestamp is tolerable.
        if let Err(err) = Self::touch_meta(&Self::meta_path(&file), project_id).await {
            warn!(target: "store", project_id, %err, "metadata_refresh_failed");
        }
        info!(target: "store", project_id, "project_saved");
        Ok(())
    }

    async fn load(&self, path: &str) -> Result<String, StoreError> {
        let file = self.resolve(path)?;
        match fs::read_to_string(&file).await {
            Ok(content) => {
                debug!(target: "store", path, size_bytes = content.len(), "load_ok");
                Ok(content)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(target: "store", path, "load_missing_using_default");
                Ok(DEFAULT_CONTENT.to_string())
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn create(&self, owner_id: &str, title: &str) -> Result<Project, StoreError> {
        let id = next_project_id();
        let path = Self::project_path(owner_id, &id);
        let file = self.resolve(&path)?;
        let meta = Self::meta_path(&file);
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent).await?;
        }

        let project = Project {
            id,
            owner: owner_id.to_string(),
            title: title.to_string(),
            path,
            updated_at: now_secs(),
        };
        Self::write_meta(&meta, &project).await?;

        let written = async {
            let mut f = fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&file)
                .await?;
            f.write_all(DEFAULT_CONTENT.as_bytes()).await?;
            f.flush().await
        }
        .await;
        if let Err(err) = written {
            warn!(target: "store", project_id = project.id.as_str(), %err, "initial_file_failed");
            let _ = fs::remove_file(&meta).await;
            if let Some(parent) = file.parent() {
                let _ = fs::remove_dir(parent).await;
            }
            return Err(err.into());
        }

        info!(
            target: "store",
            project_id = project.id.as_str(),
            owner = owner_id,
            "project_created"
        );
        Ok(project)
    }

    async fn delete(&self, project_id: &str, path: &str) -> Result<(), StoreError> {
        let file = self.resolve(path)?;
        let meta = Self::meta_path(&file);
        match Self::read_meta(&meta).await {
            Ok(project) if project.id != project_id => {
                return Err(StoreError::InvalidPath(path.to_string()));
            }
            Ok(_) => {}
            Err(StoreError::Io(err)) if err.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(project_id.to_string()));
            }
            Err(err) => return Err(err),
        }

        match fs::remove_file(&file).await {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(target: "store", path, "delete_file_already_missing");
            }
            Err(err) => return Err(err.into()),
        }
        fs::remove_file(&meta).await?;
        if let Some(parent) = file.parent()
            && let Err(err) = fs::remove_dir(parent).await
        {
            debug!(target: "store", %err, "project_dir_not_removed");
        }
        info!(target: "store", project_id, "project_deleted");
        Ok(())
    }

    async fn list(&self, owner_id: &str) -> Result<Vec<Project>, StoreError> {
        let owner_dir = self.resolve(owner_id)?;
        let mut entries = match fs::read_dir(&owner_dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let mut projects = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let meta = entry.path().join(META_FILE);
            match Self::read_meta(&meta).await {
                Ok(project) => projects.push(project),
                Err(err) => {
                    debug!(target: "store", path = %meta.display(), %err, "list_skip_entry");
                }
            }
        }
        projects.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
        Ok(projects)
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn next_project_id() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let seq = ID_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{nanos:x}-{seq:04x}")
}
