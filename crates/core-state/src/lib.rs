//! Session state: the document being previewed, the project it saves into,
//! and the save-status tracker.

pub mod save;

use core_model::Document;
pub use save::{ERROR_REVERT, SAVED_REVERT, SaveRejected, SaveStatus};

/// Where explicit saves go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectBinding {
    pub project_id: String,
    pub path: String,
}

impl ProjectBinding {
    pub fn new<I: Into<String>, P: Into<String>>(project_id: I, path: P) -> Self {
        Self {
            project_id: project_id.into(),
            path: path.into(),
        }
    }
}

/// Snapshot handed to the store for one save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveTicket {
    pub project: ProjectBinding,
    pub text: String,
}

#[derive(Debug, Default)]
pub struct SessionState {
    pub document: Document,
    pub project: Option<ProjectBinding>,
    pub save: SaveStatus,
}

impl SessionState {
    pub fn new(project: Option<ProjectBinding>, save: SaveStatus) -> Self {
        Self {
            document: Document::default(),
            project,
            save,
        }
    }

    /// Validate a save request and enter `Saving`.
    ///
    /// Checks run in control order: a disabled control first, then a missing
    /// project, then blank content. Rejections leave the save state untouched.
    pub fn prepare_save(&mut self) -> Result<SaveTicket, SaveRejected> {
        if !self.save.control_enabled() {
            return Err(SaveRejected::InProgress);
        }
        let project = self.project.clone().ok_or(SaveRejected::NoProject)?;
        if self.document.is_blank() {
            return Err(SaveRejected::EmptyContent);
        }
        self.save.begin()?;
        Ok(SaveTicket {
            project,
            text: self.document.text().to_string(),
        })
    }
}
