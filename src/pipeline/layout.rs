//! Page layout: the Zahlungsplan as a pure page model.
//!
//! [`compose`] turns a schedule into pages of positioned text runs and cell
//! borders, in millimetres from the top-left corner. Nothing here touches
//! pdfium; [`super::paint`] only replays the model. That keeps pagination,
//! column choice and the payee boilerplate testable without the native
//! library.
//!
//! Geometry follows the classic single-page form: A4, 10 mm margins, 20 mm
//! bottom margin, 8 mm table rows, 6 mm boilerplate lines. Table cells are
//! never wrapped or truncated; a value wider than its column overflows.

use crate::config::{Payee, PayeeKind, PlanConfig, TableLayout};
use crate::money::format_cell;
use crate::request::TenantIdentity;
use crate::schedule::{Schedule, ScheduleRow};
use serde::Serialize;
use textwrap::core::Fragment;
use textwrap::wrap_algorithms::wrap_first_fit;

pub const A4_SHORT_MM: f32 = 210.0;
pub const A4_LONG_MM: f32 = 297.0;
pub const MARGIN_MM: f32 = 10.0;
pub const BOTTOM_MARGIN_MM: f32 = 20.0;
/// Horizontal padding inside a cell.
pub const CELL_PADDING_MM: f32 = 1.0;

const ROW_HEIGHT_MM: f32 = 8.0;
const TABLE_FONT_PT: f32 = 9.0;
const BOILERPLATE_LINE_MM: f32 = 6.0;
const BOILERPLATE_WIDTH_MM: f32 = 180.0;
const GAP_BEFORE_BOILERPLATE_MM: f32 = 6.0;

/// Heading of the payment-instruction block.
pub const PAYMENT_HEADING: &str = "Zahlungsempfänger & Kontoverbindungen:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FontStyle {
    Regular,
    Bold,
    Oblique,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// A single line of text. `baseline` is measured from the top edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextRun {
    pub x: f32,
    pub baseline: f32,
    pub size_pt: f32,
    pub style: FontStyle,
    pub text: String,
}

/// A stroked cell rectangle; `y` is the top edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CellBorder {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageLayout {
    pub width: f32,
    pub height: f32,
    pub texts: Vec<TextRun>,
    pub borders: Vec<CellBorder>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentLayout {
    pub orientation: Orientation,
    pub pages: Vec<PageLayout>,
}

impl DocumentLayout {
    /// Every text run in reading order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.pages
            .iter()
            .flat_map(|p| p.texts.iter().map(|t| t.text.as_str()))
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts().any(|t| t.contains(needle))
    }
}

// ── Table ─────────────────────────────────────────────────────────────────

/// What a column shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnContent {
    Month,
    Rent,
    Advertising,
    FoodFee,
    Total,
    /// Left empty; ticked off by hand once the transfer is made.
    Transfer,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Column {
    pub label: &'static str,
    pub width: f32,
    pub content: ColumnContent,
}

const fn col(label: &'static str, width: f32, content: ColumnContent) -> Column {
    Column {
        label,
        width,
        content,
    }
}

/// Fixed column set and widths for `layout`, with or without food fee.
pub fn columns(layout: TableLayout, with_food_fee: bool) -> Vec<Column> {
    use ColumnContent::*;
    match (layout, with_food_fee) {
        (TableLayout::TransferColumns, true) => vec![
            col("Monat", 30.0, Month),
            col("Miete + Nebenkosten", 32.0, Rent),
            col("Überwiesen", 20.0, Transfer),
            col("Werbebeitrag", 32.0, Advertising),
            col("Überwiesen", 20.0, Transfer),
            col("Gastro (Fettabluft)", 32.0, FoodFee),
            col("Überwiesen", 20.0, Transfer),
            col("Monatlich insgesamt", 34.0, Total),
        ],
        (TableLayout::TransferColumns, false) => vec![
            col("Monat", 30.0, Month),
            col("Miete + Nebenkosten", 32.0, Rent),
            col("Überwiesen", 20.0, Transfer),
            col("Werbebeitrag", 32.0, Advertising),
            col("Überwiesen", 20.0, Transfer),
            col("Monatlich insgesamt", 34.0, Total),
        ],
        (TableLayout::Compact, true) => vec![
            col("Monat", 30.0, Month),
            col("Miete + Nebenkosten", 36.0, Rent),
            col("Werbebeitrag", 36.0, Advertising),
            col("Gastro (Fettabluft)", 36.0, FoodFee),
            col("Monatlich insgesamt", 40.0, Total),
        ],
        (TableLayout::Compact, false) => vec![
            col("Monat", 34.0, Month),
            col("Miete + Nebenkosten", 44.0, Rent),
            col("Werbebeitrag", 44.0, Advertising),
            col("Monatlich insgesamt", 48.0, Total),
        ],
    }
}

/// The schedule as header labels plus twelve rows of cell strings.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(schedule: &Schedule, layout: TableLayout) -> Self {
        let columns = columns(layout, schedule.has_food_fee());
        let rows = schedule
            .rows()
            .iter()
            .map(|row| columns.iter().map(|c| cell_text(row, c.content)).collect())
            .collect();
        Self { columns, rows }
    }

    pub fn width(&self) -> f32 {
        self.columns.iter().map(|c| c.width).sum()
    }

    /// Monospace rendering for terminals.
    pub fn to_text(&self) -> String {
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| {
                self.rows
                    .iter()
                    .map(|r| r[i].chars().count())
                    .chain(std::iter::once(c.label.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let line = |cells: Vec<&str>| -> String {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, w)| format!("{cell:>w$}", w = *w))
                .collect::<Vec<_>>()
                .join(" | ")
        };

        let mut out = line(self.columns.iter().map(|c| c.label).collect());
        out.push('\n');
        out.push_str(
            &widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("-+-"),
        );
        for row in &self.rows {
            out.push('\n');
            out.push_str(&line(row.iter().map(String::as_str).collect()));
        }
        out.push('\n');
        out
    }
}

fn cell_text(row: &ScheduleRow, content: ColumnContent) -> String {
    match content {
        ColumnContent::Month => row.month.name().to_string(),
        ColumnContent::Rent => format_cell(Some(&row.rent)),
        ColumnContent::Advertising => format_cell(row.advertising.as_ref()),
        ColumnContent::FoodFee => format_cell(row.food_fee.as_ref()),
        ColumnContent::Total => format_cell(Some(&row.total())),
        ColumnContent::Transfer => String::new(),
    }
}

// ── Boilerplate ───────────────────────────────────────────────────────────

/// Payment instructions: heading, then one block per payee. The food-fee
/// payee is printed only when the schedule carries a food fee.
pub fn payment_lines(schedule: &Schedule, identity: &TenantIdentity, payees: &[Payee]) -> Vec<String> {
    let mut lines = vec![PAYMENT_HEADING.to_string(), String::new()];
    let printed = payees
        .iter()
        .filter(|p| p.kind != PayeeKind::FoodFee || schedule.has_food_fee());
    for (i, payee) in printed.enumerate() {
        if i > 0 {
            lines.push(String::new());
        }
        lines.extend(payee.block_lines(i + 1, &identity.contract_reference));
    }
    lines
}

// ── Composition ───────────────────────────────────────────────────────────

/// Lay out the whole document.
pub fn compose(schedule: &Schedule, identity: &TenantIdentity, config: &PlanConfig) -> DocumentLayout {
    let table = Table::new(schedule, config.table_layout);
    let orientation = if table.width() > A4_SHORT_MM - 2.0 * MARGIN_MM {
        Orientation::Landscape
    } else {
        Orientation::Portrait
    };
    let (width, height) = match orientation {
        Orientation::Portrait => (A4_SHORT_MM, A4_LONG_MM),
        Orientation::Landscape => (A4_LONG_MM, A4_SHORT_MM),
    };

    let mut c = Composer {
        width,
        height,
        y: MARGIN_MM,
        pages: Vec::new(),
        identity,
        disclaimer: &config.disclaimer,
    };
    c.add_page();

    c.table_header(&table);
    for row in &table.rows {
        if c.would_overflow(ROW_HEIGHT_MM) {
            c.add_page();
            c.table_header(&table);
        }
        c.table_row(&table.columns, row, FontStyle::Regular);
    }

    c.y += GAP_BEFORE_BOILERPLATE_MM;
    for line in payment_lines(schedule, identity, &config.payees) {
        c.paragraph(&line, FontStyle::Regular, TABLE_FONT_PT, BOILERPLATE_WIDTH_MM);
    }

    DocumentLayout {
        orientation,
        pages: c.pages,
    }
}

struct Composer<'a> {
    width: f32,
    height: f32,
    /// Top of the next cell on the current page.
    y: f32,
    pages: Vec<PageLayout>,
    identity: &'a TenantIdentity,
    disclaimer: &'a str,
}

impl Composer<'_> {
    fn add_page(&mut self) {
        self.pages.push(PageLayout {
            width: self.width,
            height: self.height,
            texts: Vec::new(),
            borders: Vec::new(),
        });
        self.y = MARGIN_MM;
        self.page_header();
    }

    /// Tenant block repeated at the top of every page.
    fn page_header(&mut self) {
        let (identity, disclaimer) = (self.identity, self.disclaimer);
        self.line(&identity.tenant_name, FontStyle::Bold, 12.0, 10.0);
        self.line(&identity.address, FontStyle::Regular, 10.0, 8.0);
        self.line(disclaimer, FontStyle::Oblique, 10.0, 8.0);
        self.y += 4.0;
    }

    fn would_overflow(&self, h: f32) -> bool {
        self.y + h > self.height - BOTTOM_MARGIN_MM
    }

    fn page(&mut self) -> &mut PageLayout {
        self.pages.last_mut().expect("add_page runs before any content")
    }

    /// Left-aligned single line of height `h`.
    fn line(&mut self, text: &str, style: FontStyle, size_pt: f32, h: f32) {
        if !text.is_empty() {
            let run = TextRun {
                x: MARGIN_MM + CELL_PADDING_MM,
                baseline: baseline(self.y, h, size_pt),
                size_pt,
                style,
                text: text.to_string(),
            };
            self.page().texts.push(run);
        }
        self.y += h;
    }

    /// Wrapped text, breaking pages between lines.
    fn paragraph(&mut self, text: &str, style: FontStyle, size_pt: f32, width: f32) {
        for piece in wrap_to_width(text, style, size_pt, width - 2.0 * CELL_PADDING_MM) {
            if self.would_overflow(BOILERPLATE_LINE_MM) {
                self.add_page();
            }
            self.line(&piece, style, size_pt, BOILERPLATE_LINE_MM);
        }
    }

    fn table_header(&mut self, table: &Table) {
        let labels: Vec<String> = table.columns.iter().map(|c| c.label.to_string()).collect();
        self.table_row(&table.columns, &labels, FontStyle::Bold);
    }

    /// One bordered row of centred cells.
    fn table_row(&mut self, columns: &[Column], cells: &[String], style: FontStyle) {
        let top = self.y;
        let mut x = MARGIN_MM;
        for (column, text) in columns.iter().zip(cells) {
            let page = self.page();
            page.borders.push(CellBorder {
                x,
                y: top,
                width: column.width,
                height: ROW_HEIGHT_MM,
            });
            if !text.is_empty() {
                let text_width = text_width_mm(text, style, TABLE_FONT_PT);
                page.texts.push(TextRun {
                    x: x + (column.width - text_width) / 2.0,
                    baseline: baseline(top, ROW_HEIGHT_MM, TABLE_FONT_PT),
                    size_pt: TABLE_FONT_PT,
                    style,
                    text: text.clone(),
                });
            }
            x += column.width;
        }
        self.y += ROW_HEIGHT_MM;
    }
}

fn pt_to_mm(pt: f32) -> f32 {
    pt * 25.4 / 72.0
}

/// Vertical centring of a text line inside a cell of height `h`.
fn baseline(top: f32, h: f32, size_pt: f32) -> f32 {
    top + 0.5 * h + 0.3 * pt_to_mm(size_pt)
}

// ── Font metrics ──────────────────────────────────────────────────────────

/// Helvetica advance widths for ASCII 32..=126, in 1/1000 em.
#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// Helvetica-Bold advance widths for ASCII 32..=126, in 1/1000 em.
#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

fn char_width(c: char, style: FontStyle) -> u16 {
    let table = match style {
        FontStyle::Bold => &HELVETICA_BOLD,
        FontStyle::Regular | FontStyle::Oblique => &HELVETICA,
    };
    let base = match c {
        'ä' | 'á' | 'à' | 'â' => 'a',
        'ö' | 'ó' | 'ò' | 'ô' => 'o',
        'ü' | 'ú' | 'ù' | 'û' => 'u',
        'é' | 'è' | 'ê' => 'e',
        'Ä' => 'A',
        'Ö' => 'O',
        'Ü' => 'U',
        'ß' => return 611,
        '€' => return 556,
        other => other,
    };
    match base as u32 {
        code @ 32..=126 => table[(code - 32) as usize],
        _ => 556,
    }
}

/// Width of `text` in millimetres at `size_pt`.
pub fn text_width_mm(text: &str, style: FontStyle, size_pt: f32) -> f32 {
    let units: u32 = text.chars().map(|c| u32::from(char_width(c, style))).sum();
    pt_to_mm(units as f32 * size_pt / 1000.0)
}

#[derive(Debug)]
struct Word<'a> {
    text: &'a str,
    width: f64,
    space: f64,
}

impl Fragment for Word<'_> {
    fn width(&self) -> f64 {
        self.width
    }

    fn whitespace_width(&self) -> f64 {
        self.space
    }

    fn penalty_width(&self) -> f64 {
        0.0
    }
}

/// Greedy word wrap against real glyph widths. Always yields at least one
/// (possibly empty) line.
pub fn wrap_to_width(text: &str, style: FontStyle, size_pt: f32, max_width_mm: f32) -> Vec<String> {
    let space = f64::from(text_width_mm(" ", style, size_pt));
    let words: Vec<Word<'_>> = text
        .split_whitespace()
        .map(|w| Word {
            text: w,
            width: f64::from(text_width_mm(w, style, size_pt)),
            space,
        })
        .collect();
    if words.is_empty() {
        return vec![String::new()];
    }

    wrap_first_fit(&words, &[f64::from(max_width_mm)])
        .into_iter()
        .map(|line| line.iter().map(|w| w.text).collect::<Vec<_>>().join(" "))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ZeroFeePolicy;
    use crate::money::MonetaryAmount;
    use crate::schedule::{build_schedule, PlanAmounts};

    fn eur(s: &str) -> MonetaryAmount {
        s.parse().unwrap()
    }

    fn schedule(food: Option<&str>) -> Schedule {
        build_schedule(
            &PlanAmounts {
                rent: eur("1234.5"),
                advertising: Some(eur("600")),
                food_fee: food.map(eur),
            },
            &PlanConfig::default(),
        )
    }

    fn identity() -> TenantIdentity {
        TenantIdentity {
            tenant_name: "Café Sonnenschein UG".into(),
            address: "Hauptstraße 12, 20095 Hamburg".into(),
            contract_reference: "MV-2023-118".into(),
        }
    }

    #[test]
    fn column_counts_per_layout() {
        assert_eq!(columns(TableLayout::TransferColumns, true).len(), 8);
        assert_eq!(columns(TableLayout::TransferColumns, false).len(), 6);
        assert_eq!(columns(TableLayout::Compact, true).len(), 5);
        assert_eq!(columns(TableLayout::Compact, false).len(), 4);
    }

    #[test]
    fn food_fee_column_only_when_present() {
        let without = Table::new(&schedule(None), TableLayout::TransferColumns);
        assert!(without.columns.iter().all(|c| c.content != ColumnContent::FoodFee));

        let with = Table::new(&schedule(Some("45")), TableLayout::TransferColumns);
        assert!(with.columns.iter().any(|c| c.label == "Gastro (Fettabluft)"));
    }

    #[test]
    fn table_cells_are_formatted() {
        let t = Table::new(&schedule(None), TableLayout::Compact);
        assert_eq!(t.rows.len(), 12);
        assert_eq!(t.rows[0], vec!["Januar", "1.234,50 EUR", "600,00 EUR", "1.834,50 EUR"]);
        assert_eq!(t.rows[1], vec!["Februar", "1.234,50 EUR", "", "1.234,50 EUR"]);
    }

    #[test]
    fn transfer_columns_stay_empty() {
        let t = Table::new(&schedule(Some("45")), TableLayout::TransferColumns);
        for row in &t.rows {
            for (cell, col) in row.iter().zip(&t.columns) {
                if col.content == ColumnContent::Transfer {
                    assert!(cell.is_empty());
                }
            }
        }
    }

    #[test]
    fn third_payee_only_with_food_fee() {
        let payees = Payee::defaults();

        let without = payment_lines(&schedule(None), &identity(), &payees);
        assert!(!without.iter().any(|l| l.starts_with("3. ")));
        assert!(!without.iter().any(|l| l.contains("Betreuungsgesellschaft")));

        let with = payment_lines(&schedule(Some("45")), &identity(), &payees);
        assert!(with.contains(&"3. Gastro - Kontoinhaber: HBB Betreuungsgesellschaft mbH".to_string()));
    }

    #[test]
    fn contract_reference_appears_twice() {
        let lines = payment_lines(&schedule(Some("45")), &identity(), &Payee::defaults());
        let refs = lines
            .iter()
            .filter(|l| *l == "Verwendungszweck: MV-2023-118")
            .count();
        assert_eq!(refs, 2);
        assert_eq!(lines[0], PAYMENT_HEADING);
        assert_eq!(lines[1], "");
    }

    #[test]
    fn zero_food_fee_shown_brings_back_third_payee() {
        let config = PlanConfig::builder()
            .zero_food_fee(ZeroFeePolicy::Show)
            .build()
            .unwrap();
        let s = build_schedule(
            &PlanAmounts {
                rent: eur("100"),
                advertising: None,
                food_fee: Some(MonetaryAmount::zero()),
            },
            &config,
        );
        let doc = compose(&s, &identity(), &config);
        assert!(doc.contains_text("3. Gastro"));
        assert!(doc.contains_text("0,00 EUR"));
    }

    #[test]
    fn compact_document_fits_one_portrait_page() {
        let config = PlanConfig::builder()
            .table_layout(TableLayout::Compact)
            .build()
            .unwrap();
        let doc = compose(&schedule(Some("45")), &identity(), &config);
        assert_eq!(doc.orientation, Orientation::Portrait);
        assert_eq!(doc.pages.len(), 1);
        assert!(doc.contains_text("Die Beträge sind brutto."));
        assert!(doc.contains_text("Dezember"));
        // header row + 12 rows, 5 columns each
        assert_eq!(doc.pages[0].borders.len(), 13 * 5);
    }

    #[test]
    fn eight_columns_switch_to_landscape_and_paginate() {
        let doc = compose(&schedule(Some("45")), &identity(), &PlanConfig::default());
        assert_eq!(doc.orientation, Orientation::Landscape);
        assert!(doc.pages.len() >= 2);
        for page in &doc.pages {
            assert_eq!(page.width, A4_LONG_MM);
            // tenant block repeats on every page
            assert!(page.texts.iter().any(|t| t.text == "Café Sonnenschein UG"));
            for t in &page.texts {
                assert!(t.baseline <= page.height - BOTTOM_MARGIN_MM + 1.0);
            }
        }
        assert!(doc.contains_text("Hamburger Sparkasse"));
    }

    #[test]
    fn empty_identity_draws_no_empty_runs() {
        let doc = compose(&schedule(None), &TenantIdentity::default(), &PlanConfig::default());
        assert!(doc.texts().all(|t| !t.is_empty()));
        // wrapping drops the trailing blank of an empty reference
        assert!(doc.texts().any(|t| t == "Verwendungszweck:"));
    }

    #[test]
    fn cells_are_centred() {
        let config = PlanConfig::builder()
            .table_layout(TableLayout::Compact)
            .build()
            .unwrap();
        let doc = compose(&schedule(None), &identity(), &config);
        let run = doc.pages[0]
            .texts
            .iter()
            .find(|t| t.text == "Januar")
            .unwrap();
        let w = text_width_mm("Januar", FontStyle::Regular, 9.0);
        let left_gap = run.x - MARGIN_MM;
        let right_gap = MARGIN_MM + 34.0 - (run.x + w);
        assert!((left_gap - right_gap).abs() < 0.01);
    }

    #[test]
    fn text_width_uses_font_metrics() {
        // "0,00 EUR" at 1000 pt = 556*3 + 278 + 278 + 667 + 722 + 722
        let w = text_width_mm("0,00 EUR", FontStyle::Regular, 1000.0);
        assert!((w - pt_to_mm(4335.0)).abs() < 0.01);
        assert!(text_width_mm("Monat", FontStyle::Bold, 9.0) > text_width_mm("Monat", FontStyle::Regular, 9.0));
        assert_eq!(text_width_mm("Ä", FontStyle::Regular, 9.0), text_width_mm("A", FontStyle::Regular, 9.0));
    }

    #[test]
    fn wraps_long_lines() {
        let long = "1. Miete + Nebenkosten - Kontoinhaber: ".repeat(6);
        let lines = wrap_to_width(&long, FontStyle::Regular, 9.0, 178.0);
        assert!(lines.len() > 1);
        for l in &lines {
            assert!(text_width_mm(l, FontStyle::Regular, 9.0) <= 178.0);
        }
        assert_eq!(wrap_to_width("", FontStyle::Regular, 9.0, 178.0), vec![String::new()]);
    }

    #[test]
    fn text_preview_lists_all_months() {
        let text = Table::new(&schedule(None), TableLayout::Compact).to_text();
        assert_eq!(text.lines().count(), 14);
        assert!(text.contains("März"));
        assert!(text.lines().next().unwrap().contains("Monatlich insgesamt"));
    }
}
