use std::sync::Arc;

/// Current editable text of the session.
///
/// `revision` increments on every replacement so observers can tell two
/// identical texts from two distinct edits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    text: String,
    revision: u64,
}

impl Document {
    pub fn new<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            revision: 0,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Replace the whole text (editor surfaces report full snapshots, not patches).
    pub fn replace<S: Into<String>>(&mut self, text: S) {
        self.text = text.into();
        self.revision += 1;
    }

    /// Text with surrounding whitespace removed; what the compiler receives.
    pub fn trimmed(&self) -> &str {
        self.text.trim()
    }

    /// True when trimming leaves nothing to compile.
    pub fn is_blank(&self) -> bool {
        self.trimmed().is_empty()
    }
}

/// Immutable snapshot of document text tagged with its compile sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileRequest {
    pub seq: u64,
    pub source: Arc<str>,
}

impl CompileRequest {
    pub fn new(seq: u64, source: impl Into<Arc<str>>) -> Self {
        Self {
            seq,
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_bumps_revision() {
        let mut doc = Document::new("= Title");
        assert_eq!(doc.revision(), 0);
        doc.replace("= Title\nbody");
        doc.replace("= Title\nbody");
        assert_eq!(doc.revision(), 2);
        assert_eq!(doc.text(), "= Title\nbody");
    }

    #[test]
    fn blank_detection_ignores_whitespace() {
        assert!(Document::new("").is_blank());
        assert!(Document::new("  \n\t \n").is_blank());
        let doc = Document::new("\n  hello \n");
        assert!(!doc.is_blank());
        assert_eq!(doc.trimmed(), "hello");
    }
}
