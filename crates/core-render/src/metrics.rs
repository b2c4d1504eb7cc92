//! Render path counters.

use std::sync::atomic::{AtomicU64, Ordering::Relaxed};

/// Simple atomic counters for the kinds of previews produced.
#[derive(Debug, Default)]
pub struct RenderMetrics {
    placeholder: AtomicU64,
    error: AtomicU64,
    single_page: AtomicU64,
    multi_page: AtomicU64,
    adaptive: AtomicU64,
    unbounded: AtomicU64,
    fragments: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderMetricsSnapshot {
    pub placeholder: u64,
    pub error: u64,
    pub single_page: u64,
    pub multi_page: u64,
    /// Multi-page results that used the adaptive fallback (also counted in `multi_page`).
    pub adaptive: u64,
    /// Results without a usable bounding box, shown unpaginated.
    pub unbounded: u64,
    pub fragments: u64,
}

impl RenderMetricsSnapshot {
    pub fn frames(&self) -> u64 {
        self.placeholder + self.error + self.single_page + self.multi_page + self.unbounded
    }
}

impl RenderMetrics {
    pub fn snapshot(&self) -> RenderMetricsSnapshot {
        RenderMetricsSnapshot {
            placeholder: self.placeholder.load(Relaxed),
            error: self.error.load(Relaxed),
            single_page: self.single_page.load(Relaxed),
            multi_page: self.multi_page.load(Relaxed),
            adaptive: self.adaptive.load(Relaxed),
            unbounded: self.unbounded.load(Relaxed),
            fragments: self.fragments.load(Relaxed),
        }
    }

    pub(crate) fn incr_placeholder(&self) {
        self.placeholder.fetch_add(1, Relaxed);
    }

    pub(crate) fn incr_error(&self) {
        self.error.fetch_add(1, Relaxed);
    }

    pub(crate) fn incr_unbounded(&self) {
        self.unbounded.fetch_add(1, Relaxed);
        self.fragments.fetch_add(1, Relaxed);
    }

    pub(crate) fn incr_pages(&self, pages: usize, adaptive: bool) {
        if pages > 1 {
            self.multi_page.fetch_add(1, Relaxed);
        } else {
            self.single_page.fetch_add(1, Relaxed);
        }
        if adaptive {
            self.adaptive.fetch_add(1, Relaxed);
        }
        self.fragments.fetch_add(pages as u64, Relaxed);
    }
}
