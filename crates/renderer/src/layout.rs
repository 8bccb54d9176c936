//! Page geometry and pagination, in PDF points with the origin at the bottom left.
//!
//! The layout only depends on the number of rows, so the same input always
//! produces the same pages in the same order.

pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;
pub const MARGIN_X: f32 = 50.0;

pub const TITLE_RULE_Y: f32 = PAGE_HEIGHT - 60.0;
pub const TITLE_Y: f32 = PAGE_HEIGHT - 100.0;
pub const HEADER_Y: f32 = PAGE_HEIGHT - 150.0;
pub const HEADER_RULE_Y: f32 = HEADER_Y - 5.0;

pub const FIRST_ROW_Y: f32 = HEADER_Y - 30.0;
/// Continuation pages have no header band, so rows start higher up.
pub const CONTINUATION_ROW_Y: f32 = PAGE_HEIGHT - 130.0;
pub const ROW_SPACING: f32 = 25.0;
/// A row is never placed below this line; the next page starts instead.
pub const MIN_ROW_Y: f32 = 80.0;

/// x positions of the name, cycles, profit and breakdown columns.
pub const COLUMNS: [f32; 4] = [50.0, 180.0, 250.0, 380.0];

/// A row placed on a page: its index in the input and its baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedRow {
    pub index: usize,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    /// Only the first page carries the column header band.
    pub has_header: bool,
    pub rows: Vec<PlacedRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub pages: Vec<PageLayout>,
}

impl Layout {
    /// Places `row_count` rows top to bottom, breaking pages below `MIN_ROW_Y`.
    pub fn paginate(row_count: usize) -> Self {
        let mut pages = vec![PageLayout {
            has_header: true,
            rows: Vec::new(),
        }];
        let mut current = 0;
        let mut y = FIRST_ROW_Y;

        for index in 0..row_count {
            if y < MIN_ROW_Y {
                pages.push(PageLayout {
                    has_header: false,
                    rows: Vec::new(),
                });
                current += 1;
                y = CONTINUATION_ROW_Y;
            }
            pages[current].rows.push(PlacedRow { index, y });
            y -= ROW_SPACING;
        }

        Self { pages }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Input indices in the order they appear in the document.
    pub fn row_order(&self) -> Vec<usize> {
        self.pages
            .iter()
            .flat_map(|page| page.rows.iter().map(|row| row.index))
            .collect()
    }
}
