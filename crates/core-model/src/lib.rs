//! Shared data model for the live preview pipeline.
//!
//! Everything here is plain data: the editable `Document`, the immutable
//! `CompileRequest` snapshot handed to the compiler, the compiler's
//! `VectorSurface` output, the `SaveState` enumeration surfaced to the save
//! control, and the failure taxonomy that crosses crate boundaries.
//!
//! Ownership rules:
//! * `Document` is owned by the session; every edit replaces its text.
//! * `CompileRequest` is created once per debounce fire and never mutated.
//! * `VectorSurface` content is reference counted so page fragments can share
//!   it without copying the markup.

mod document;
mod error;
mod surface;

pub use document::{CompileRequest, Document};
pub use error::{CompileFailure, SaveFailure};
pub use surface::{VectorSurface, ViewBox};

/// Outcome of explicit save operations as presented by the save control.
///
/// `Saved` and `Error` are transient: the tracker in `core-state` reverts
/// them to `Idle` after a fixed delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SaveState {
    #[default]
    Idle,
    Saving,
    Saved,
    Error,
}

impl SaveState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaveState::Idle => "idle",
            SaveState::Saving => "saving",
            SaveState::Saved => "saved",
            SaveState::Error => "error",
        }
    }

    /// Glyph shown on the save control.
    pub fn glyph(&self) -> &'static str {
        match self {
            SaveState::Idle => "💾",
            SaveState::Saving => "💭",
            SaveState::Saved => "✓",
            SaveState::Error => "⚠️",
        }
    }

    /// The triggering control is disabled only while a save is in flight.
    pub fn control_enabled(&self) -> bool {
        !matches!(self, SaveState::Saving)
    }
}

impl std::fmt::Display for SaveState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_saving_disables_control() {
        assert!(SaveState::Idle.control_enabled());
        assert!(!SaveState::Saving.control_enabled());
        assert!(SaveState::Saved.control_enabled());
        assert!(SaveState::Error.control_enabled());
    }

    #[test]
    fn default_is_idle() {
        assert_eq!(SaveState::default(), SaveState::Idle);
        assert_eq!(SaveState::default().to_string(), "idle");
    }
}
