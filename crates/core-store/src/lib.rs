//! Project persistence and identity capabilities.
//!
//! The session only ever talks to the `DocumentStore` and `IdentityProvider`
//! traits; `FsStore` and `LocalIdentity` are the implementations the CLI
//! wires in, and tests substitute their own fakes.

pub mod fs_store;
pub mod identity;

use core_model::SaveFailure;
use serde::{Deserialize, Serialize};
use std::future::Future;
use thiserror::Error;

pub use fs_store::FsStore;
pub use identity::{DomainAllowList, IdentityError, IdentityProvider, LocalIdentity, User};

/// Content given to new projects and to files that do not exist yet.
pub const DEFAULT_CONTENT: &str = r#"= New Document

Welcome to livepage!

Start writing your document here. You can use:

== Headings
Create headings with = symbols.

== Lists
- Bullet points work like this
- Another item
- Third item

== Math
You can write math like $x^2 + y^2 = z^2$.

== Code
```python
def hello():
    print("Hello, Typst!")
```

Happy writing!
"#;

pub const DEFAULT_TITLE: &str = "Untitled Document";
pub const MAIN_FILE: &str = "main.typ";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid project path: {0}")]
    InvalidPath(String),
    #[error("Project metadata error: {0}")]
    Metadata(String),
    #[error("Project not found: {0}")]
    NotFound(String),
}

impl From<StoreError> for SaveFailure {
    fn from(err: StoreError) -> Self {
        SaveFailure::new(err.to_string())
    }
}

/// Metadata of one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub owner: String,
    pub title: String,
    /// Store-relative path of the project's main file (`<owner>/<id>/main.typ`).
    pub path: String,
    /// Seconds since the Unix epoch.
    pub updated_at: u64,
}

/// CRUD against the project/file store.
pub trait DocumentStore: Send + Sync + 'static {
    /// Upsert the file at `path` and refresh the project's `updated_at`.
    fn save(
        &self,
        project_id: &str,
        path: &str,
        text: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Read the file at `path`; a missing file yields `DEFAULT_CONTENT`.
    fn load(&self, path: &str) -> impl Future<Output = Result<String, StoreError>> + Send;

    /// Create a project with an initial file holding `DEFAULT_CONTENT`.
    fn create(
        &self,
        owner_id: &str,
        title: &str,
    ) -> impl Future<Output = Result<Project, StoreError>> + Send;

    /// Remove the file, then the project record.
    fn delete(
        &self,
        project_id: &str,
        path: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Projects owned by `owner_id`, most recently updated first.
    fn list(&self, owner_id: &str) -> impl Future<Output = Result<Vec<Project>, StoreError>> + Send;
}
