//! # Preview pagination
//!
//! Splits an ordered list of line items across fixed-size printable pages.
//! The first page reserves room for the document header, every page
//! reserves room for the table header, and the last page must also hold
//! the footer (totals, signature block, bank details).
//!
//! Heights come from a measurement render of the real content. Any height
//! that is missing or not a usable number falls back to a constant, so a
//! preview is always produced.
//!
//! Packing is first-fit in order: items are never reordered, never split
//! and never dropped.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// A4 at 96 dpi, in CSS pixels.
pub const PAGE_HEIGHT: f64 = 1123.0;
pub const PAGE_PADDING: f64 = 48.0;
pub const FIRST_PAGE_SAFETY_MARGIN: f64 = 40.0;
pub const PAGE_MARGIN: f64 = 40.0;

pub const DEFAULT_HEADER_HEIGHT: f64 = 420.0;
pub const DEFAULT_HEADER_SPACER_HEIGHT: f64 = 60.0;
pub const DEFAULT_TABLE_HEADER_HEIGHT: f64 = 50.0;
pub const DEFAULT_ROW_HEIGHT: f64 = 70.0;
pub const DEFAULT_FOOTER_HEIGHT: f64 = 260.0;

/// Rendered block heights. `rows[i]` is the height of item `i`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Measurements {
    pub header: Option<f64>,
    pub header_spacer: Option<f64>,
    pub table_header: Option<f64>,
    pub footer: Option<f64>,
    pub rows: Vec<f64>,
}

/// Fixed geometry of the page template.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub page_height: f64,
    pub padding_top: f64,
    pub padding_bottom: f64,
    /// Slack kept free on the first page.
    pub safety_margin: f64,
    /// Slack kept free on later pages and around the footer.
    pub margin: f64,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            page_height: PAGE_HEIGHT,
            padding_top: PAGE_PADDING,
            padding_bottom: PAGE_PADDING,
            safety_margin: FIRST_PAGE_SAFETY_MARGIN,
            margin: PAGE_MARGIN,
        }
    }
}

impl PageGeometry {
    pub fn printable_height(&self) -> f64 {
        self.page_height - self.padding_top - self.padding_bottom
    }
}

/// Heights used when nothing (or garbage) was measured.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallbackHeights {
    pub header: f64,
    pub header_spacer: f64,
    pub table_header: f64,
    pub row: f64,
    pub footer: f64,
}

impl Default for FallbackHeights {
    fn default() -> Self {
        Self {
            header: DEFAULT_HEADER_HEIGHT,
            header_spacer: DEFAULT_HEADER_SPACER_HEIGHT,
            table_header: DEFAULT_TABLE_HEADER_HEIGHT,
            row: DEFAULT_ROW_HEIGHT,
            footer: DEFAULT_FOOTER_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// Half-open index range into the item list.
    pub items: Range<usize>,
    pub is_first_page: bool,
    pub is_last_page: bool,
}

impl Page {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[self.items.clone()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub pages: Vec<Page>,
    /// True when an item-free page was appended to host the footer.
    pub footer_on_own_page: bool,
}

impl Pagination {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn item_count(&self) -> usize {
        self.pages.iter().map(Page::len).sum()
    }
}

/// Block heights after fallbacks have been applied.
#[derive(Debug, Clone, PartialEq)]
struct ResolvedHeights<'a> {
    header: f64,
    header_spacer: f64,
    table_header: f64,
    footer: f64,
    rows: &'a [f64],
    row_fallback: f64,
}

impl<'a> ResolvedHeights<'a> {
    fn resolve(measurements: &'a Measurements, fallback: &FallbackHeights) -> Self {
        Self {
            header: usable(measurements.header, fallback.header),
            header_spacer: usable(measurements.header_spacer, fallback.header_spacer),
            table_header: usable(measurements.table_header, fallback.table_header),
            footer: usable(measurements.footer, fallback.footer),
            rows: &measurements.rows,
            row_fallback: fallback.row,
        }
    }

    fn row(&self, index: usize) -> f64 {
        usable(self.rows.get(index).copied(), self.row_fallback)
    }
}

fn usable(measured: Option<f64>, fallback: f64) -> f64 {
    match measured {
        Some(value) if value.is_finite() && value >= 0.0 => value,
        _ => fallback,
    }
}

/// Paginates `item_count` items with the default A4 template and fallbacks.
pub fn paginate(item_count: usize, measurements: &Measurements) -> Pagination {
    paginate_with(
        item_count,
        measurements,
        &PageGeometry::default(),
        &FallbackHeights::default(),
    )
}

pub fn paginate_with(
    item_count: usize,
    measurements: &Measurements,
    geometry: &PageGeometry,
    fallback: &FallbackHeights,
) -> Pagination {
    if item_count == 0 {
        return Pagination {
            pages: vec![Page {
                items: 0..0,
                is_first_page: true,
                is_last_page: true,
            }],
            footer_on_own_page: false,
        };
    }

    let heights = ResolvedHeights::resolve(measurements, fallback);
    let printable = geometry.printable_height();
    let first_budget = printable - heights.header - heights.table_header - geometry.safety_margin;
    let next_budget =
        printable - heights.header_spacer - heights.table_header - geometry.margin;

    let mut ranges = Vec::new();
    let mut start = 0;
    let mut used = 0.0;
    let mut budget = first_budget;

    for index in 0..item_count {
        let row = heights.row(index);
        // A row taller than a whole page still gets a page to itself.
        if index > start && used + row > budget {
            ranges.push(start..index);
            start = index;
            used = 0.0;
            budget = next_budget;
        }
        used += row;
    }
    ranges.push(start..item_count);

    // Ties go to an extra page.
    let footer_fits = budget - used > heights.footer + geometry.margin;
    if !footer_fits {
        ranges.push(item_count..item_count);
    }

    let last = ranges.len() - 1;
    let pages = ranges
        .into_iter()
        .enumerate()
        .map(|(index, items)| Page {
            items,
            is_first_page: index == 0,
            is_last_page: index == last,
        })
        .collect();

    Pagination {
        pages,
        footer_on_own_page: !footer_fits,
    }
}
