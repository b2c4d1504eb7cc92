//! Render mapper: cut a vector surface into per-page fragments.
//!
//! Fragments never copy the surface markup; each holds an `Arc` to the shared
//! content plus the window it shows. A fresh fragment sequence replaces the
//! previous one wholesale for every accepted compile.

use crate::paginate::PageLayout;
use core_model::{VectorSurface, ViewBox};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    /// The surface shown as-is (single page or unpaginated output).
    Whole,
    /// A cropped window re-based into the surface's coordinate frame.
    Cropped,
}

/// One displayable page.
///
/// `start_y`/`end_y` are offsets from the top of the surface; `view_box` is
/// the window in the surface's own coordinates (`y = origin.y + start_y`).
#[derive(Debug, Clone, PartialEq)]
pub struct PageFragment {
    /// 1-based page number.
    pub index: usize,
    pub start_y: f64,
    pub end_y: f64,
    pub view_box: Option<ViewBox>,
    pub kind: FragmentKind,
    pub content: Arc<str>,
}

impl PageFragment {
    pub fn height(&self) -> f64 {
        self.end_y - self.start_y
    }

    /// Fragment for a surface shown without pagination.
    pub fn whole(surface: &VectorSurface) -> Self {
        let view_box = surface.view_box();
        Self {
            index: 1,
            start_y: 0.0,
            end_y: view_box.map(|vb| vb.height).unwrap_or(0.0),
            view_box,
            kind: FragmentKind::Whole,
            content: surface.source().clone(),
        }
    }
}

/// Slice `surface` according to `layout`.
///
/// `pages == 1` (or a surface without a bounding box) yields the surface
/// unmodified as a single fragment. Otherwise the span `[0, height)` is split
/// into `layout.pages` consecutive windows of `layout.page_height`, the last
/// one clipped to the remaining height.
pub fn slice(surface: &VectorSurface, layout: &PageLayout) -> Vec<PageFragment> {
    let Some(bounds) = surface.view_box() else {
        return vec![PageFragment::whole(surface)];
    };
    if layout.pages <= 1 || layout.page_height.is_nan() || layout.page_height <= 0.0 {
        return vec![PageFragment::whole(surface)];
    }

    let total = bounds.height;
    let mut fragments = Vec::with_capacity(layout.pages);
    for i in 0..layout.pages {
        let start_y = (i as f64 * layout.page_height).min(total);
        let end_y = if i + 1 == layout.pages {
            total
        } else {
            ((i + 1) as f64 * layout.page_height).min(total)
        };
        fragments.push(PageFragment {
            index: i + 1,
            start_y,
            end_y,
            view_box: Some(ViewBox::new(
                bounds.x,
                bounds.y + start_y,
                bounds.width,
                end_y - start_y,
            )),
            kind: FragmentKind::Cropped,
            content: surface.content().clone(),
        });
    }
    tracing::trace!(
        target: "render.mapper",
        pages = fragments.len(),
        page_height = layout.page_height,
        total,
        "surface_sliced"
    );
    fragments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paginate::layout;
    use pretty_assertions::assert_eq;

    fn surface(y: f64, height: f64) -> VectorSurface {
        VectorSurface::from_parts(ViewBox::new(5.0, y, 595.0, height), "<g/>")
    }

    #[test]
    fn single_page_is_unmodified() {
        let s = surface(0.0, 700.0);
        let frags = slice(&s, &layout(700.0));
        assert_eq!(frags.len(), 1);
        assert_eq!(frags[0].kind, FragmentKind::Whole);
        assert!(Arc::ptr_eq(&frags[0].content, s.source()));
        assert_eq!(frags[0].end_y, 700.0);
    }

    #[test]
    fn multi_page_windows_are_rebased() {
        let s = surface(40.0, 2000.0);
        let l = layout(2000.0);
        let frags = slice(&s, &l);
        assert_eq!(frags.len(), 3);
        let indices: Vec<usize> = frags.iter().map(|f| f.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert_eq!(frags[1].view_box, Some(ViewBox::new(5.0, 832.0, 595.0, 792.0)));
        assert_eq!(frags[2].start_y, 1584.0);
        assert_eq!(frags[2].height(), 416.0);
        assert_eq!(frags[2].view_box.map(|vb| vb.y), Some(40.0 + 1584.0));
        for f in &frags {
            assert_eq!(f.kind, FragmentKind::Cropped);
            assert!(Arc::ptr_eq(&f.content, s.content()), "content is shared, not copied");
        }
    }

    #[test]
    fn surface_without_bounds_is_single_fragment() {
        let s = VectorSurface::from_svg("<svg><g/></svg>");
        let frags = slice(&s, &layout(5000.0));
        assert_eq!(frags.len(), 1);
        assert_eq!(frags[0].view_box, None);
        assert_eq!(frags[0].kind, FragmentKind::Whole);
    }

    #[test]
    fn adaptive_layout_yields_two_halves() {
        let s = surface(0.0, 205.0);
        let l = crate::paginate::Paginator::new(vec![crate::paginate::PageSize::new("Card", 100.0)])
            .layout(205.0);
        let frags = slice(&s, &l);
        assert_eq!(frags.len(), 2);
        assert_eq!(frags[0].end_y, 102.5);
        assert_eq!(frags[1].start_y, 102.5);
        assert_eq!(frags[1].end_y, 205.0);
    }
}
