//! A4 bill documents rendered with printpdf's built-in Helvetica.

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use printpdf::{BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point};
use tracing::info;

use crate::domain::bill_document::{BillDocument, BillRenderer};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const SIDE_MARGIN: f32 = 21.0;
const QUANTITY_X: f32 = 140.0;
const PRICE_X: f32 = 170.0;
const LINE_HEIGHT: f32 = 6.0;

/// Writes `<bills_dir>/<bill_nr>.pdf`
pub struct PdfBillRenderer {
    bills_dir: PathBuf,
}

impl PdfBillRenderer {
    pub fn new(bills_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&bills_dir)
            .with_context(|| format!("Failed to create bill directory {:?}", bills_dir))?;
        Ok(Self { bills_dir })
    }
}

#[async_trait]
impl BillRenderer for PdfBillRenderer {
    async fn render(&self, document: &BillDocument) -> Result<PathBuf> {
        let bytes = render_pdf(document)?;
        let path = self.document_path(document.bill_nr);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write bill {:?}", path))?;

        info!(bill_nr = document.bill_nr, "Rendered bill to {:?}", path);
        Ok(path)
    }

    fn document_path(&self, bill_nr: i64) -> PathBuf {
        self.bills_dir.join(format!("{}.pdf", bill_nr))
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

/// Writes text top to bottom, tracking the cursor in millimetres from the top edge
struct Cursor {
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    top: f32,
}

impl Cursor {
    fn text(&self, text: &str, size: f32, x: f32, bold: bool) {
        let font = if bold { &self.bold } else { &self.regular };
        self.layer.use_text(text, size, Mm(x), Mm(PAGE_HEIGHT - self.top), font);
    }

    fn row(&mut self, columns: &[(&str, f32)], size: f32, bold: bool) {
        for (text, x) in columns {
            self.text(text, size, *x, bold);
        }
        self.top += LINE_HEIGHT;
    }

    fn skip(&mut self, lines: f32) {
        self.top += LINE_HEIGHT * lines;
    }

    fn rule(&self, top: f32) {
        let y = Mm(PAGE_HEIGHT - top);
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(SIDE_MARGIN), y), false),
                (Point::new(Mm(PAGE_WIDTH - SIDE_MARGIN), y), false),
            ],
            is_closed: false,
        });
    }
}

fn render_pdf(document: &BillDocument) -> Result<Vec<u8>> {
    let title = format!("Bill {}", document.bill_nr);
    let (doc, page, layer) = PdfDocument::new(&title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Bill");
    let mut cursor = Cursor {
        layer: doc.get_page(page).get_layer(layer),
        regular: doc.add_builtin_font(BuiltinFont::Helvetica).context("Failed to load Helvetica")?,
        bold: doc.add_builtin_font(BuiltinFont::HelveticaBold).context("Failed to load Helvetica-Bold")?,
        top: 25.0,
    };

    cursor.text(document.contact_name.as_str(), 22.0, SIDE_MARGIN, true);
    cursor.skip(1.5);
    cursor.row(&[(document.contact_email.as_str(), SIDE_MARGIN)], 11.0, false);
    cursor.skip(3.0);

    let label_x = SIDE_MARGIN;
    let value_x = SIDE_MARGIN + 65.0;
    let bill_nr = document.bill_nr.to_string();
    let issued = format_date(document.issued_on);
    let due = format_date(document.due_date);
    cursor.row(&[("Bill number:", label_x), (bill_nr.as_str(), value_x)], 11.0, false);
    cursor.row(&[("Bill date:", label_x), (issued.as_str(), value_x)], 11.0, false);
    match document.final_deadline {
        Some(deadline) => {
            let deadline = format_date(deadline);
            cursor.row(&[("Booking fee due:", label_x), (due.as_str(), value_x)], 11.0, false);
            cursor.row(&[("Camp fee due:", label_x), (deadline.as_str(), value_x)], 11.0, false);
        }
        None => cursor.row(&[("Payment due:", label_x), (due.as_str(), value_x)], 11.0, false),
    }
    cursor.skip(0.5);
    cursor.row(
        &[(
            "Please include the bill number and each child's name and shift in the payment explanation.",
            SIDE_MARGIN,
        )],
        10.0,
        false,
    );
    cursor.skip(3.0);

    cursor.row(&[("Description", SIDE_MARGIN), ("Quantity", QUANTITY_X), ("Price", PRICE_X)], 12.0, true);
    for line in &document.lines {
        let quantity = format!("{} pcs", line.quantity);
        let price = format!("{} €", line.unit_price);
        cursor.row(
            &[(line.description.as_str(), SIDE_MARGIN), (quantity.as_str(), QUANTITY_X), (price.as_str(), PRICE_X)],
            10.0,
            false,
        );
    }
    cursor.skip(1.0);

    let totals_x = QUANTITY_X - 10.0;
    let booking = format!("Booking fee: {} €", document.booking_total);
    let camp = format!("Camp fee: {} €", document.camp_total);
    let gross = format!("Total: {} €", document.gross_total());
    cursor.row(&[(booking.as_str(), totals_x)], 11.0, false);
    cursor.row(&[(camp.as_str(), totals_x)], 11.0, false);
    cursor.row(&[(gross.as_str(), totals_x)], 11.0, false);
    if document.discount != 0 {
        cursor.skip(0.5);
        let discount = format!("Discount: {} €", document.discount);
        cursor.row(&[(discount.as_str(), totals_x)], 11.0, false);
    }
    cursor.skip(0.5);
    let amount_due = format!("Amount due: {} €", document.amount_due);
    cursor.row(&[(amount_due.as_str(), totals_x)], 12.0, true);

    cursor.skip(3.0);
    cursor.row(&[("Explanation", SIDE_MARGIN)], 11.0, true);
    cursor.row(&[(document.explanation.as_str(), SIDE_MARGIN)], 10.0, false);

    let terms = &document.terms;
    let third = (PAGE_WIDTH - 2.0 * SIDE_MARGIN) / 3.0;
    cursor.rule(PAGE_HEIGHT - 39.0);
    cursor.top = PAGE_HEIGHT - 32.0;
    cursor.row(
        &[
            (terms.issuer_name.as_str(), SIDE_MARGIN),
            ("Contact", SIDE_MARGIN + third),
            ("Bank", SIDE_MARGIN + 2.0 * third),
        ],
        9.0,
        true,
    );
    cursor.row(
        &[
            (terms.issuer_address.as_str(), SIDE_MARGIN),
            (terms.issuer_email.as_str(), SIDE_MARGIN + third),
            (terms.bank_account.as_str(), SIDE_MARGIN + 2.0 * third),
        ],
        9.0,
        false,
    );
    cursor.row(
        &[
            ("", SIDE_MARGIN),
            (terms.issuer_phone.as_str(), SIDE_MARGIN + third),
            (terms.bank_bic.as_str(), SIDE_MARGIN + 2.0 * third),
        ],
        9.0,
        false,
    );

    drop(cursor);
    doc.save_to_bytes().context("Failed to serialize bill PDF")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bill_document::BillingTerms;
    use crate::domain::pricing::PriceTable;
    use crate::test_utils::bill_camper;

    #[tokio::test]
    async fn test_renders_pdf_into_bills_dir() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = PdfBillRenderer::new(dir.path().join("bills")).unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let document = BillDocument::compose(
            12,
            &[bill_camper(1, "Mari", 2, false, 360), bill_camper(2, "Jaan", 2, true, 300)],
            &PriceTable::default(),
            &BillingTerms::default(),
            NaiveDate::from_ymd_opt(2025, 6, 10),
            today,
        );

        let path = renderer.render(&document).await.unwrap();

        assert_eq!(path, dir.path().join("bills").join("12.pdf"));
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_bill_dates_use_day_first_format() {
        assert_eq!(format_date(NaiveDate::from_ymd_opt(2025, 6, 9).unwrap()), "09.06.2025");
    }
}
