//! # Receipt
//!
//! Receipt view-model for a recorded sale and its plain-text layout for an
//! 80 mm thermal printer.
//!
//! ## Layout
//! ```text
//! ┌──────────────────────────────────────────┐
//! │          MESHA INVESTMENTS LTD           │  store header (centered)
//! │           P.O. BOX 8447-00100            │
//! │                 NAIROBI                  │
//! │01 OPERATOR                               │
//! │PIN: P051435448H                          │
//! │          --- FISCAL RECEIPT ---          │
//! │Milk                          1 @ 65.00 A │  one row per line
//! │Sugar                        2 @ 150.00 A │
//! │------------------------------------------│
//! │TOTAL                          Ksh 365.00 │
//! │TOTAL A-16.00                  Ksh 365.00 │
//! │TOTAL TAXABLE A                Ksh 314.66 │
//! │TOTAL TAX A                     Ksh 50.34 │
//! │TOTAL TAXES                     Ksh 50.34 │
//! │------------------------------------------│
//! │CASH                           Ksh 500.00 │  tender
//! │CHANGE                         Ksh 135.00 │
//! │2 ARTICLES                                │
//! │------------------------------------------│
//! │Control Unit Info                         │
//! │CU SERIAL NO: KRAMW0042022070949889       │
//! │CU INVOICE NUMBER: 20240305103000F00D     │
//! │  FISCAL RECEIPT N: 20240305-103000-F00D  │
//! │           05/03/2024 13:30:00            │
//! │              FISCAL RECEIPT              │
//! └──────────────────────────────────────────┘
//! ```
//!
//! The fiscal-looking fields are cosmetic. Nothing here talks to a fiscal
//! device or tax authority.

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{Money, VAT_RATE};
use crate::types::{PaymentMethod, Sale};

/// Narrowest layout that still fits the longest fixed labels.
pub const MIN_RECEIPT_WIDTH: usize = 32;

/// Character columns of an 80 mm thermal roll in the default font.
pub const DEFAULT_RECEIPT_WIDTH: usize = 42;

// =============================================================================
// Store Profile
// =============================================================================

/// Shop details printed on every receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct StoreProfile {
    pub name: String,
    pub address_lines: Vec<String>,
    pub pin: String,
    pub operator_id: String,
    pub cu_serial: String,
    /// Offset from UTC for the printed date and time, in hours.
    pub utc_offset_hours: i32,
}

impl Default for StoreProfile {
    fn default() -> Self {
        StoreProfile {
            name: "MESHA INVESTMENTS LTD".to_string(),
            address_lines: vec!["P.O. BOX 8447-00100".to_string(), "NAIROBI".to_string()],
            pin: "P051435448H".to_string(),
            operator_id: "01".to_string(),
            cu_serial: "KRAMW0042022070949889".to_string(),
            utc_offset_hours: 3,
        }
    }
}

impl StoreProfile {
    fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_hours.saturating_mul(3600))
            .unwrap_or_else(|| Utc.fix())
    }
}

// =============================================================================
// Receipt
// =============================================================================

/// A label / value row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReceiptRow {
    pub label: String,
    pub value: String,
}

impl ReceiptRow {
    fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        ReceiptRow {
            label: label.into(),
            value: value.into(),
        }
    }

    fn amount(label: impl Into<String>, amount: Money) -> Self {
        ReceiptRow::new(label, format!("Ksh {}", amount.to_plain_string()))
    }
}

/// Everything printed on a receipt, already formatted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Receipt {
    /// Store name then address lines.
    pub header: Vec<String>,
    pub operator: String,
    pub pin: String,
    /// One row per sale line: name / `qty @ price A`.
    pub lines: Vec<ReceiptRow>,
    pub totals: Vec<ReceiptRow>,
    pub tender: Vec<ReceiptRow>,
    /// Number of distinct lines.
    pub articles: usize,
    pub cu_serial: String,
    pub cu_invoice_number: String,
    pub receipt_number: String,
    /// `dd/mm/yyyy HH:MM:SS` in the store's time zone.
    pub issued_at: String,
}

impl Receipt {
    /// Builds the receipt of a recorded sale.
    pub fn from_sale(sale: &Sale, store: &StoreProfile) -> Self {
        let mut header = vec![store.name.clone()];
        header.extend(store.address_lines.iter().cloned());

        let lines = sale
            .items
            .iter()
            .map(|line| {
                ReceiptRow::new(
                    line.name.clone(),
                    format!("{} @ {} A", line.quantity, line.unit_price.to_plain_string()),
                )
            })
            .collect();

        let totals = vec![
            ReceiptRow::amount("TOTAL", sale.total),
            ReceiptRow::amount(format!("TOTAL A-{}", VAT_RATE.percentage()), sale.total),
            ReceiptRow::amount("TOTAL TAXABLE A", sale.net_amount),
            ReceiptRow::amount("TOTAL TAX A", sale.vat),
            ReceiptRow::amount("TOTAL TAXES", sale.vat),
        ];

        let label = sale.payment_method.receipt_label();
        let tender = match sale.payment_method {
            PaymentMethod::Cash => vec![
                ReceiptRow::amount(label, sale.cash_received),
                ReceiptRow::amount("CHANGE", sale.change),
            ],
            PaymentMethod::Card => vec![ReceiptRow::amount(label, sale.total)],
            PaymentMethod::Mpesa => vec![
                ReceiptRow::amount(label, sale.total),
                ReceiptRow::new(format!("{label} CODE"), sale.mpesa_code.clone()),
            ],
        };

        let local = sale.timestamp.with_timezone(&store.offset());

        Receipt {
            header,
            operator: format!("{} OPERATOR", store.operator_id),
            pin: format!("PIN: {}", store.pin),
            lines,
            totals,
            tender,
            articles: sale.items.len(),
            cu_serial: store.cu_serial.clone(),
            cu_invoice_number: sale.receipt_number.replace('-', ""),
            receipt_number: sale.receipt_number.clone(),
            issued_at: local.format("%d/%m/%Y %H:%M:%S").to_string(),
        }
    }

    /// Lays the receipt out as monospaced text, `width` columns wide
    /// (clamped to at least [`MIN_RECEIPT_WIDTH`]).
    pub fn render_text(&self, width: usize) -> String {
        let width = width.max(MIN_RECEIPT_WIDTH);
        let divider = "-".repeat(width);
        let mut out: Vec<String> = Vec::new();

        out.extend(self.header.iter().map(|h| center(h, width)));
        out.push(self.operator.clone());
        out.push(self.pin.clone());
        out.push(center("--- FISCAL RECEIPT ---", width));
        out.extend(self.lines.iter().map(|row| two_columns(row, width)));
        out.push(divider.clone());
        out.extend(self.totals.iter().map(|row| two_columns(row, width)));
        out.push(divider.clone());
        out.extend(self.tender.iter().map(|row| two_columns(row, width)));
        out.push(format!("{} ARTICLES", self.articles));
        out.push(divider);
        out.push("Control Unit Info".to_string());
        out.push(format!("CU SERIAL NO: {}", self.cu_serial));
        out.push(format!("CU INVOICE NUMBER: {}", self.cu_invoice_number));
        out.push(center(&format!("FISCAL RECEIPT N: {}", self.receipt_number), width));
        out.push(center(&self.issued_at, width));
        out.push(center("FISCAL RECEIPT", width));

        let mut text = out.join("\n");
        text.push('\n');
        text
    }
}

fn center(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.to_string();
    }
    format!("{}{}", " ".repeat((width - len) / 2), text)
}

/// Label left, value right. A label too long for the row is cut short; the
/// value is never cut.
fn two_columns(row: &ReceiptRow, width: usize) -> String {
    let value_len = row.value.chars().count();
    let room = width.saturating_sub(value_len + 1);
    let label: String = row.label.chars().take(room).collect();
    let gap = width.saturating_sub(label.chars().count() + value_len).max(1);
    format!("{}{}{}", label, " ".repeat(gap), row.value)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::vat_breakdown;
    use crate::types::SaleLine;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn line(name: &str, qty: u32, price: i64) -> SaleLine {
        SaleLine {
            item_id: format!("id-{name}"),
            name: name.to_string(),
            quantity: qty,
            unit_price: Money::from_major(price),
            line_total: Money::from_major(price) * qty,
            notification: None,
        }
    }

    fn cash_sale() -> Sale {
        let items = vec![line("Milk", 1, 65), line("Sugar", 2, 150)];
        let total: Money = items.iter().map(|l| l.line_total).sum();
        let vat = vat_breakdown(total, VAT_RATE);
        Sale {
            id: "f00dbabe".to_string(),
            receipt_number: "20240305-103000-F00D".to_string(),
            items,
            net_amount: vat.net,
            vat: vat.vat,
            total,
            payment_method: PaymentMethod::Cash,
            cash_received: Money::from_major(500),
            change: Money::from_major(135),
            mpesa_code: String::new(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 5, 10, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_receipt_fields() {
        let receipt = Receipt::from_sale(&cash_sale(), &StoreProfile::default());

        assert_eq!(receipt.header, ["MESHA INVESTMENTS LTD", "P.O. BOX 8447-00100", "NAIROBI"]);
        assert_eq!(receipt.operator, "01 OPERATOR");
        assert_eq!(receipt.lines[1], ReceiptRow::new("Sugar", "2 @ 150.00 A"));
        assert_eq!(receipt.totals[1], ReceiptRow::new("TOTAL A-16.00", "Ksh 365.00"));
        assert_eq!(receipt.totals[2], ReceiptRow::new("TOTAL TAXABLE A", "Ksh 314.66"));
        assert_eq!(receipt.totals[3], ReceiptRow::new("TOTAL TAX A", "Ksh 50.34"));
        assert_eq!(receipt.tender[1], ReceiptRow::new("CHANGE", "Ksh 135.00"));
        assert_eq!(receipt.articles, 2);
        assert_eq!(receipt.cu_invoice_number, "20240305103000F00D");
        // 10:30 UTC printed in Nairobi time
        assert_eq!(receipt.issued_at, "05/03/2024 13:30:00");
    }

    #[test]
    fn test_mpesa_tender_rows() {
        let sale = Sale {
            payment_method: PaymentMethod::Mpesa,
            cash_received: Money::zero(),
            change: Money::zero(),
            mpesa_code: "QAB12CD34E".to_string(),
            ..cash_sale()
        };
        let receipt = Receipt::from_sale(&sale, &StoreProfile::default());
        assert_eq!(
            receipt.tender,
            [
                ReceiptRow::new("M-PESA", "Ksh 365.00"),
                ReceiptRow::new("M-PESA CODE", "QAB12CD34E"),
            ]
        );
    }

    #[test]
    fn test_render_text_widths() {
        let receipt = Receipt::from_sale(&cash_sale(), &StoreProfile::default());
        let text = receipt.render_text(DEFAULT_RECEIPT_WIDTH);

        assert!(text.contains("--- FISCAL RECEIPT ---"));
        assert!(text.contains("2 ARTICLES"));
        for row in text.lines().filter(|l| l.starts_with("TOTAL") || l.starts_with("Sugar")) {
            assert_eq!(row.chars().count(), DEFAULT_RECEIPT_WIDTH, "row: {row:?}");
        }
        assert!(text
            .lines()
            .any(|l| l == "TOTAL TAX A                      Ksh 50.34"));
    }

    #[test]
    fn test_long_names_are_truncated_not_values() {
        let row = ReceiptRow::new("A".repeat(60), "3 @ 1000.00 A");
        let rendered = two_columns(&row, 32);
        assert_eq!(rendered.chars().count(), 32);
        assert!(rendered.ends_with(" 3 @ 1000.00 A"));
    }

    #[test]
    fn test_fractional_price_on_line() {
        let mut sale = cash_sale();
        sale.items[0].unit_price = Money::new(dec!(64.5));
        let receipt = Receipt::from_sale(&sale, &StoreProfile::default());
        assert_eq!(receipt.lines[0].value, "1 @ 64.50 A");
    }
}
