//! Pagination engine.
//!
//! Decides how many standard pages an arbitrary-height vector surface spans.
//! Pure function of the total height and the ordered size list: no state, no
//! I/O, deterministic.
//!
//! Algorithm (first match wins, so list order is the tie-break):
//! 1. Single-page fit: `height <= size + size * SINGLE_PAGE_TOLERANCE`.
//! 2. Multi-page: `n = ceil(height / size)`; accept when the final page
//!    carries at least `size * MIN_LAST_PAGE_FRACTION`.
//! 3. Fallback: two pages of `height / 2`.
//!
//! Examples with the standard list `[Letter 792, A4 841.89, Legal 1008]`:
//! - `700`  => 1 Letter page (within `950.4`).
//! - `951`  => 1 A4 page (Letter band exceeded, A4 band is `1010.268`).
//! - `1600` => 2 A4 pages (Letter leaves a 16pt last page; A4 leaves 758.11).
//! - `1684` => 2 Legal pages (Letter leaves 100, A4 leaves 0.22, Legal leaves 676).

use std::fmt;

/// Slack above a page's height still considered a single page.
pub const SINGLE_PAGE_TOLERANCE: f64 = 0.2;
/// Minimum share of a full page the last page of a multi-page layout must carry.
pub const MIN_LAST_PAGE_FRACTION: f64 = 0.3;
/// Page count used by the adaptive fallback.
pub const FALLBACK_PAGES: usize = 2;

/// Reference sizes in priority order (heights in points).
pub const STANDARD_PAGE_SIZES: [(&str, f64); 3] =
    [("Letter", 792.0), ("A4", 841.89), ("Legal", 1008.0)];

#[derive(Debug, Clone, PartialEq)]
pub struct PageSize {
    pub name: String,
    pub height: f64,
}

impl PageSize {
    pub fn new<S: Into<String>>(name: S, height: f64) -> Self {
        Self {
            name: name.into(),
            height,
        }
    }

    fn is_usable(&self) -> bool {
        self.height.is_finite() && self.height > 0.0
    }
}

/// Why a layout was chosen; renders as the human-readable reason.
#[derive(Debug, Clone, PartialEq)]
pub enum Rationale {
    SinglePage { size: String },
    MultiPage { size: String, pages: usize },
    Adaptive,
}

impl fmt::Display for Rationale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rationale::SinglePage { size } => write!(f, "Content fits in single {size} page"),
            Rationale::MultiPage { size, pages } => write!(f, "{pages} {size} pages"),
            Rationale::Adaptive => f.write_str("Adaptive sizing"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    pub pages: usize,
    pub page_height: f64,
    pub rationale: Rationale,
}

/// Ordered list of standard sizes plus the layout decision over it.
#[derive(Debug, Clone, PartialEq)]
pub struct Paginator {
    sizes: Vec<PageSize>,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::standard()
    }
}

impl Paginator {
    /// Build from an ordered size list. Non-positive or non-finite heights are
    /// dropped (they would divide by zero); an empty result only ever hits the
    /// fallback branch.
    pub fn new(sizes: Vec<PageSize>) -> Self {
        let before = sizes.len();
        let sizes: Vec<PageSize> = sizes.into_iter().filter(PageSize::is_usable).collect();
        if sizes.len() != before {
            tracing::warn!(
                target: "render.paginate",
                dropped = before - sizes.len(),
                "unusable_page_sizes_dropped"
            );
        }
        Self { sizes }
    }

    pub fn standard() -> Self {
        Self {
            sizes: STANDARD_PAGE_SIZES
                .iter()
                .map(|&(name, height)| PageSize::new(name, height))
                .collect(),
        }
    }

    pub fn sizes(&self) -> &[PageSize] {
        &self.sizes
    }

    /// Decide page count and per-page height for a surface `total_height` tall.
    ///
    /// Negative or non-finite heights are treated as zero.
    pub fn layout(&self, total_height: f64) -> PageLayout {
        let total = if total_height.is_finite() {
            total_height.max(0.0)
        } else {
            0.0
        };

        for size in &self.sizes {
            let tolerance = size.height * SINGLE_PAGE_TOLERANCE;
            if total <= size.height + tolerance {
                return PageLayout {
                    pages: 1,
                    page_height: size.height,
                    rationale: Rationale::SinglePage {
                        size: size.name.clone(),
                    },
                };
            }
        }

        for size in &self.sizes {
            let possible = (total / size.height).ceil() as usize;
            let last_page = total - (possible.saturating_sub(1) as f64) * size.height;
            let min_last_page = size.height * MIN_LAST_PAGE_FRACTION;
            if last_page >= min_last_page {
                return PageLayout {
                    pages: possible,
                    page_height: size.height,
                    rationale: Rationale::MultiPage {
                        size: size.name.clone(),
                        pages: possible,
                    },
                };
            }
            tracing::trace!(
                target: "render.paginate",
                size = size.name.as_str(),
                possible,
                last_page,
                min_last_page,
                "multi_page_rejected"
            );
        }

        PageLayout {
            pages: FALLBACK_PAGES,
            page_height: total / FALLBACK_PAGES as f64,
            rationale: Rationale::Adaptive,
        }
    }
}

/// Layout over the standard size list.
pub fn layout(total_height: f64) -> PageLayout {
    Paginator::standard().layout(total_height)
}
