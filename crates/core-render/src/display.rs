//! Display contract and the directory-backed display used by the CLI.

use crate::mapper::PageFragment;
use crate::markup::{fragment_svg, preview_html};
use anyhow::{Context, Result};
use core_model::SaveState;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::runtime::{Handle, RuntimeFlavor};

/// What the preview currently shows. Each accepted result replaces the
/// previous value wholesale.
#[derive(Debug, Clone, PartialEq)]
pub enum Preview {
    /// No content (blank document or zero-height output).
    Placeholder,
    /// A compile was issued and its result has not been presented yet.
    Compiling,
    /// Compiler failure text, shown verbatim.
    Error(String),
    /// Ordered fragments, index 1..=N.
    Pages(Vec<PageFragment>),
}

impl Preview {
    pub fn kind(&self) -> &'static str {
        match self {
            Preview::Placeholder => "placeholder",
            Preview::Compiling => "compiling",
            Preview::Error(_) => "error",
            Preview::Pages(_) => "pages",
        }
    }

    pub fn page_count(&self) -> usize {
        match self {
            Preview::Pages(fragments) => fragments.len(),
            _ => 0,
        }
    }
}

/// Surface the session presents to: the page preview, the save control, and
/// user-facing alerts.
pub trait DisplaySurface {
    fn present(&mut self, preview: &Preview) -> Result<()>;
    fn save_status(&mut self, _state: SaveState) {}
    fn alert(&mut self, _message: &str) {}
}

impl<T: DisplaySurface + ?Sized> DisplaySurface for &mut T {
    fn present(&mut self, preview: &Preview) -> Result<()> {
        (**self).present(preview)
    }
    fn save_status(&mut self, state: SaveState) {
        (**self).save_status(state)
    }
    fn alert(&mut self, message: &str) {
        (**self).alert(message)
    }
}

const PREVIEW_FILE: &str = "preview.html";

/// Writes `preview.html` and one `page-NNN.svg` per fragment into a directory.
/// Page files left over from a longer previous result are removed.
///
/// Writes are blocking `std::fs` calls. On a multi-thread runtime they run
/// under `block_in_place` so other tasks keep their worker threads.
pub struct DirectoryDisplay {
    root: PathBuf,
    written_pages: usize,
}

impl DirectoryDisplay {
    pub fn new<P: Into<PathBuf>>(root: P) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .with_context(|| format!("creating preview directory {}", root.display()))?;
        Ok(Self {
            root,
            written_pages: 0,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn page_path(&self, index: usize) -> PathBuf {
        self.root.join(format!("page-{index:03}.svg"))
    }

    fn write_preview(&mut self, preview: &Preview) -> Result<()> {
        match preview {
            Preview::Pages(fragments) => self.write_pages(fragments)?,
            _ => {
                self.remove_pages_after(0);
                self.written_pages = 0;
            }
        }
        let path = self.root.join(PREVIEW_FILE);
        fs::write(&path, preview_html(preview))
            .with_context(|| format!("writing {}", path.display()))?;
        tracing::debug!(
            target: "render.display",
            kind = preview.kind(),
            pages = preview.page_count(),
            "preview_written"
        );
        Ok(())
    }

    fn write_pages(&mut self, fragments: &[PageFragment]) -> Result<()> {
        for fragment in fragments {
            let path = self.page_path(fragment.index);
            fs::write(&path, fragment_svg(fragment))
                .with_context(|| format!("writing {}", path.display()))?;
        }
        self.remove_pages_after(fragments.len());
        self.written_pages = fragments.len();
        Ok(())
    }

    fn remove_pages_after(&mut self, keep: usize) {
        for index in keep + 1..=self.written_pages {
            let path = self.page_path(index);
            if let Err(err) = fs::remove_file(&path) {
                tracing::debug!(
                    target: "render.display",
                    ?err,
                    path = %path.display(),
                    "stale_page_remove_failed"
                );
            }
        }
    }
}

/// Run blocking file I/O without stalling a multi-thread runtime's workers.
fn blocking_io<T>(f: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}

impl DisplaySurface for DirectoryDisplay {
    fn present(&mut self, preview: &Preview) -> Result<()> {
        blocking_io(|| self.write_preview(preview))
    }

    fn save_status(&mut self, state: SaveState) {
        tracing::info!(target: "render.display", state = state.as_str(), "save_status");
        eprintln!("[save] {} {}", state.glyph(), state);
    }

    fn alert(&mut self, message: &str) {
        eprintln!("{message}");
    }
}
