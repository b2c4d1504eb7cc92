//! Preview rendering: pagination, slicing, and presentation.
//!
//! Flow for one accepted compile result:
//! `VectorSurface` -> `Paginator::layout(height)` -> `mapper::slice` ->
//! `Preview::Pages` -> `DisplaySurface::present`.
//!
//! `PreviewRenderer` bundles the first three steps and keeps counters; the
//! session decides *whether* a surface is presented (sequence gating lives in
//! `core-pipeline`).

pub mod display;
pub mod mapper;
pub mod markup;
pub mod metrics;
pub mod paginate;

use core_model::{CompileFailure, VectorSurface};
use display::Preview;
use mapper::{PageFragment, slice};
use metrics::{RenderMetrics, RenderMetricsSnapshot};
use paginate::{Paginator, Rationale};

#[derive(Debug, Default)]
pub struct PreviewRenderer {
    paginator: Paginator,
    metrics: RenderMetrics,
}

impl PreviewRenderer {
    pub fn new(paginator: Paginator) -> Self {
        Self {
            paginator,
            metrics: RenderMetrics::default(),
        }
    }

    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    pub fn metrics_snapshot(&self) -> RenderMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Turn a compile result into the preview to present.
    ///
    /// A zero-height surface has nothing to show and yields the placeholder.
    pub fn render(&self, surface: &VectorSurface) -> Preview {
        let Some(height) = surface.height() else {
            self.metrics.incr_unbounded();
            return Preview::Pages(vec![PageFragment::whole(surface)]);
        };
        if height <= 0.0 {
            return self.placeholder();
        }
        let layout = self.paginator.layout(height);
        tracing::debug!(
            target: "render.paginate",
            height,
            pages = layout.pages,
            page_height = layout.page_height,
            rationale = %layout.rationale,
            "layout_decided"
        );
        let fragments = slice(surface, &layout);
        self.metrics.incr_pages(
            fragments.len(),
            matches!(layout.rationale, Rationale::Adaptive),
        );
        Preview::Pages(fragments)
    }

    pub fn placeholder(&self) -> Preview {
        self.metrics.incr_placeholder();
        Preview::Placeholder
    }

    pub fn error(&self, failure: &CompileFailure) -> Preview {
        self.metrics.incr_error();
        Preview::Error(failure.message.clone())
    }
}
