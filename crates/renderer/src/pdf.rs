use crate::error::RenderError;
use crate::layout::{
    COLUMNS, HEADER_RULE_Y, HEADER_Y, Layout, MARGIN_X, PAGE_HEIGHT, PAGE_WIDTH, TITLE_RULE_Y,
    TITLE_Y,
};
use core_types::SummaryRow;
use printpdf::path::PaintMode;
use printpdf::*;
use rust_decimal::Decimal;

const BACKGROUND: u32 = 0x020617;
const ACCENT: u32 = 0xd946ef;
const TITLE_TEXT: u32 = 0xffffff;
const HEADER_TEXT: u32 = 0x94a3b8;
const GAIN: u32 = 0x10b981;
const LOSS: u32 = 0xf43f5e;
const DETAIL_TEXT: u32 = 0xcbd5e1;

const HEADERS: [&str; 4] = ["OPERATOR", "CYCLES", "TOTAL PROFIT", "METRICS (DEP|WD|RED)"];

/// Static text of the document.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub title: String,
    pub currency: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            title: "CPA PRO - CONSOLIDATED REPORT".to_string(),
            currency: "R$".to_string(),
        }
    }
}

/// A finished document.
#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub bytes: Vec<u8>,
    pub pages: usize,
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

/// Draws summary rows into a dark-themed, paginated PDF.
#[derive(Debug, Clone, Default)]
pub struct ReportRenderer {
    options: RenderOptions,
}

impl ReportRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Renders `rows` in the given order. An empty slice yields one page with
    /// the title and header bands only.
    pub fn render(&self, rows: &[SummaryRow]) -> Result<RenderedReport, RenderError> {
        let layout = Layout::paginate(rows.len());

        let (doc, first_page, first_layer) = PdfDocument::new(
            self.options.title.clone(),
            mm(PAGE_WIDTH),
            mm(PAGE_HEIGHT),
            "Layer 1",
        );
        let fonts = Fonts {
            regular: doc
                .add_builtin_font(BuiltinFont::Helvetica)
                .map_err(|e| RenderError::Pdf(e.to_string()))?,
            bold: doc
                .add_builtin_font(BuiltinFont::HelveticaBold)
                .map_err(|e| RenderError::Pdf(e.to_string()))?,
        };

        for (number, page) in layout.pages.iter().enumerate() {
            let layer = if number == 0 {
                doc.get_page(first_page).get_layer(first_layer)
            } else {
                let (page_index, layer_index) =
                    doc.add_page(mm(PAGE_WIDTH), mm(PAGE_HEIGHT), "Layer 1");
                doc.get_page(page_index).get_layer(layer_index)
            };

            draw_background(&layer);
            self.draw_title(&layer, &fonts);
            if page.has_header {
                draw_header(&layer, &fonts);
            }
            for placed in &page.rows {
                let row = rows.get(placed.index).ok_or(RenderError::RowOutOfRange(placed.index))?;
                self.draw_row(&layer, &fonts, row, placed.y);
            }
        }

        let bytes = doc
            .save_to_bytes()
            .map_err(|e| RenderError::Pdf(e.to_string()))?;
        tracing::debug!(rows = rows.len(), pages = layout.page_count(), size = bytes.len(), "Report rendered.");

        Ok(RenderedReport {
            bytes,
            pages: layout.page_count(),
        })
    }

    fn draw_title(&self, layer: &PdfLayerReference, fonts: &Fonts) {
        layer.set_fill_color(rgb(ACCENT));
        layer.add_rect(band(TITLE_RULE_Y, 2.0));

        layer.set_fill_color(rgb(TITLE_TEXT));
        layer.use_text(self.options.title.clone(), 20.0, mm(MARGIN_X), mm(TITLE_Y), &fonts.bold);
    }

    fn draw_row(&self, layer: &PdfLayerReference, fonts: &Fonts, row: &SummaryRow, y: f32) {
        layer.set_fill_color(rgb(TITLE_TEXT));
        layer.use_text(row.display_name.clone(), 10.0, mm(COLUMNS[0]), mm(y), &fonts.bold);
        layer.use_text(row.cycles.to_string(), 10.0, mm(COLUMNS[1]), mm(y), &fonts.regular);

        let shown = round_amount(row.profit);
        layer.set_fill_color(rgb(profit_color(shown)));
        layer.use_text(
            format!("{} {}", self.options.currency, shown),
            10.0,
            mm(COLUMNS[2]),
            mm(y),
            &fonts.regular,
        );

        layer.set_fill_color(rgb(DETAIL_TEXT));
        layer.use_text(row.breakdown.clone(), 8.0, mm(COLUMNS[3]), mm(y), &fonts.regular);
    }
}

fn draw_background(layer: &PdfLayerReference) {
    layer.set_fill_color(rgb(BACKGROUND));
    layer.add_rect(Rect::new(mm(0.0), mm(0.0), mm(PAGE_WIDTH), mm(PAGE_HEIGHT)).with_mode(PaintMode::Fill));
}

fn draw_header(layer: &PdfLayerReference, fonts: &Fonts) {
    layer.set_fill_color(rgb(HEADER_TEXT));
    for (label, x) in HEADERS.iter().zip(COLUMNS) {
        layer.use_text(*label, 10.0, mm(x), mm(HEADER_Y), &fonts.bold);
    }
    layer.add_rect(band(HEADER_RULE_Y, 1.0));
}

/// A horizontal rule between the page margins, drawn as a thin filled band.
fn band(y: f32, thickness: f32) -> Rect {
    Rect::new(mm(MARGIN_X), mm(y - thickness / 2.0), mm(PAGE_WIDTH - MARGIN_X), mm(y + thickness / 2.0))
        .with_mode(PaintMode::Fill)
}

fn mm(points: f32) -> Mm {
    Mm::from(Pt(points))
}

fn rgb(hex: u32) -> Color {
    let channel = |shift: u32| ((hex >> shift) & 0xff) as f32 / 255.0;
    Color::Rgb(Rgb::new(channel(16), channel(8), channel(0), None))
}

/// Two-decimal amount, banker's rounded: `70` → `70.00`, `-10.5` → `-10.50`.
pub fn format_amount(value: Decimal) -> String {
    round_amount(value).to_string()
}

fn round_amount(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp(2);
    rounded.rescale(2);
    if rounded.is_zero() {
        // Drop the sign of a negative value that rounds away.
        rounded.set_sign_positive(true);
    }
    rounded
}

/// Colour of a printed amount, decided on the value as displayed.
fn profit_color(shown: Decimal) -> u32 {
    if shown >= Decimal::ZERO { GAIN } else { LOSS }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(name: &str, profit: Decimal) -> SummaryRow {
        SummaryRow {
            display_name: name.to_string(),
            cycles: 2,
            profit,
            breakdown: "Dep: 100 | Wd: 150 | Red: 20".to_string(),
        }
    }

    #[test]
    fn amounts_always_carry_two_decimals() {
        assert_eq!(format_amount(dec!(70)), "70.00");
        assert_eq!(format_amount(dec!(-10.5)), "-10.50");
        assert_eq!(format_amount(dec!(1.005)), "1.00");
        assert_eq!(format_amount(dec!(2.675)), "2.68");
    }

    #[test]
    fn amounts_that_round_to_zero_are_neither_negative_nor_red() {
        let shown = round_amount(dec!(-0.004));
        assert_eq!(shown.to_string(), "0.00");
        assert_eq!(profit_color(shown), GAIN);
        assert_eq!(profit_color(round_amount(dec!(-0.005))), GAIN);
        assert_eq!(profit_color(round_amount(dec!(-0.006))), LOSS);
    }

    #[test]
    fn empty_rows_still_produce_a_one_page_pdf() {
        let report = ReportRenderer::default().render(&[]).unwrap();
        assert_eq!(report.pages, 1);
        assert!(report.bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn rendering_twice_gives_the_same_page_count() {
        let rows: Vec<_> = (0..50)
            .map(|i| row(&format!("USER{i}"), Decimal::from(i) - dec!(25)))
            .collect();
        let renderer = ReportRenderer::new(RenderOptions::default());

        let first = renderer.render(&rows).unwrap();
        let second = renderer.render(&rows).unwrap();
        assert_eq!(first.pages, 3);
        assert_eq!(first.pages, second.pages);
    }
}
