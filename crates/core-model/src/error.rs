use thiserror::Error;

/// The compiler rejected (or crashed on) the given text.
///
/// Rendered verbatim in place of the page preview; never propagated upward.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct CompileFailure {
    pub message: String,
}

impl CompileFailure {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The persistence capability failed while saving the document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct SaveFailure {
    pub message: String,
}

impl SaveFailure {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }
}
