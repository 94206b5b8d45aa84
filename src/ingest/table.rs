use chrono::{Datelike, NaiveDateTime, Weekday};
use rust_decimal::Decimal;
use std::collections::HashSet;

use super::dates;

/// One validated transaction line together with its derived columns.
///
/// Invariants held by construction: `quantity > 0`, `unit_price > 0`, and
/// `total_price == quantity * unit_price`.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanRecord {
    pub invoice_no: String,
    pub stock_code: String,
    pub description: String,
    pub quantity: i64,
    pub invoice_date: NaiveDateTime,
    pub unit_price: Decimal,
    pub customer_id: String,
    pub country: String,
    /// Revenue of this line: `quantity * unit_price`.
    pub total_price: Decimal,
    /// `YYYY-MM` month bucket of the invoice timestamp.
    pub year_month: String,
    pub day_of_week: Weekday,
}

impl CleanRecord {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        invoice_no: String,
        stock_code: String,
        description: String,
        quantity: i64,
        invoice_date: NaiveDateTime,
        unit_price: Decimal,
        customer_id: String,
        country: String,
    ) -> Self {
        let total_price = Decimal::from(quantity) * unit_price;
        let year_month = dates::year_month(invoice_date);
        let day_of_week = invoice_date.weekday();
        Self {
            invoice_no,
            stock_code,
            description,
            quantity,
            invoice_date,
            unit_price,
            customer_id,
            country,
            total_price,
            year_month,
            day_of_week,
        }
    }

    /// Full English weekday name of the invoice timestamp.
    pub fn day_name(&self) -> &'static str {
        dates::day_name(self.day_of_week)
    }
}

/// Immutable snapshot of cleaned rows, in source order.
///
/// This is the single source of truth for a session: filtered views are
/// derived copies and never mutate it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanTable {
    rows: Vec<CleanRecord>,
}

impl CleanTable {
    pub fn new(rows: Vec<CleanRecord>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[CleanRecord] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CleanRecord> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Headline facts about the dataset, or `None` for an empty table.
    pub fn info(&self) -> Option<DatasetInfo> {
        let first_invoice = self.rows.iter().map(|r| r.invoice_date).min()?;
        let last_invoice = self.rows.iter().map(|r| r.invoice_date).max()?;
        let countries = self
            .rows
            .iter()
            .map(|r| r.country.as_str())
            .collect::<HashSet<_>>()
            .len();
        Some(DatasetInfo {
            rows: self.rows.len(),
            first_invoice,
            last_invoice,
            countries,
        })
    }
}

/// Row count, invoice span, and distinct-country count of a loaded dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetInfo {
    pub rows: usize,
    pub first_invoice: NaiveDateTime,
    pub last_invoice: NaiveDateTime,
    pub countries: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_table_has_no_info() {
        assert!(CleanTable::default().info().is_none());
    }
}
