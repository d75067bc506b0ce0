//! Contents of a printed bill, independent of how it is rendered.
//!
//! Camp-fee lines are priced net of the booking fee so that the booking line
//! plus the camp-fee lines add up to the list price of every camper. Manual
//! price changes on a registration show up as a discount against that sum.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::models::bill::BillCamper;
use crate::domain::pricing::PriceTable;

/// Payment terms and the issuer details printed in the footer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingTerms {
    pub booking_fee: i64,
    pub payment_days: i64,
    pub issuer_name: String,
    pub issuer_address: String,
    pub issuer_email: String,
    pub issuer_phone: String,
    pub bank_account: String,
    pub bank_bic: String,
}

impl Default for BillingTerms {
    fn default() -> Self {
        Self {
            booking_fee: 100,
            payment_days: 3,
            issuer_name: String::new(),
            issuer_address: String::new(),
            issuer_email: String::new(),
            issuer_phone: String::new(),
            bank_account: String::new(),
            bank_bic: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillLine {
    pub description: String,
    pub quantity: i64,
    pub unit_price: i64,
}

impl BillLine {
    pub fn total(&self) -> i64 {
        self.quantity * self.unit_price
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BillDocument {
    pub bill_nr: i64,
    pub contact_name: String,
    pub contact_email: String,
    pub issued_on: NaiveDate,
    pub due_date: NaiveDate,
    /// `None` when only the due date applies
    pub final_deadline: Option<NaiveDate>,
    pub lines: Vec<BillLine>,
    pub booking_total: i64,
    pub camp_total: i64,
    pub discount: i64,
    pub amount_due: i64,
    pub explanation: String,
    pub terms: BillingTerms,
}

impl BillDocument {
    /// Lay out the bill for a group of registered campers.
    ///
    /// `first_shift_start` is the start of the lowest-numbered shift on the
    /// bill; the final deadline is one month before it.
    pub fn compose(
        bill_nr: i64,
        campers: &[BillCamper],
        prices: &PriceTable,
        terms: &BillingTerms,
        first_shift_start: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Self {
        let (contact_name, contact_email) = campers
            .first()
            .map(|c| (c.contact_name.clone(), c.contact_email.clone()))
            .unwrap_or_default();

        let mut counts: BTreeMap<(i32, bool), i64> = BTreeMap::new();
        for camper in campers {
            *counts.entry((camper.shift_nr, camper.is_old)).or_default() += 1;
        }

        let mut lines: Vec<BillLine> = counts
            .into_iter()
            .map(|((shift_nr, is_old), quantity)| BillLine {
                description: format!(
                    "Shift {}, {}",
                    shift_nr,
                    if is_old { "returning camper" } else { "new camper" }
                ),
                quantity,
                unit_price: (prices.price_or_fallback(shift_nr, is_old) - terms.booking_fee).max(0),
            })
            .collect();
        let camp_total: i64 = lines.iter().map(BillLine::total).sum();

        let booking = BillLine {
            description: "Booking fee".to_string(),
            quantity: campers.len() as i64,
            unit_price: terms.booking_fee,
        };
        let booking_total = booking.total();
        if booking.quantity > 0 {
            lines.push(booking);
        }

        let amount_due: i64 = campers.iter().map(|c| c.price_to_pay).sum();
        let discount = camp_total + booking_total - amount_due;

        let due_date = today + Duration::days(terms.payment_days);
        let final_deadline = first_shift_start
            .and_then(|start| start.checked_sub_months(Months::new(1)))
            .filter(|deadline| due_date <= *deadline);

        let names: Vec<String> = campers.iter().map(|c| format!("{} {}v", c.child_name, c.shift_nr)).collect();
        let explanation = format!("Bill {}, {}", bill_nr, names.join(", "));

        Self {
            bill_nr,
            contact_name,
            contact_email,
            issued_on: today,
            due_date,
            final_deadline,
            lines,
            booking_total,
            camp_total,
            discount,
            amount_due,
            explanation,
            terms: terms.clone(),
        }
    }

    pub fn gross_total(&self) -> i64 {
        self.camp_total + self.booking_total
    }
}

/// Turns a [`BillDocument`] into a stored file
#[async_trait]
pub trait BillRenderer: Send + Sync {
    /// Write the document and return where it was stored
    async fn render(&self, document: &BillDocument) -> Result<PathBuf>;

    /// Where the document for `bill_nr` lives, whether or not it exists yet
    fn document_path(&self, bill_nr: i64) -> PathBuf;
}
