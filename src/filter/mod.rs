//! Filter application.
//!
//! Narrows a [`CleanTable`] to the rows matching the user-selected country,
//! date range, and minimum quantity. Pure and stable: the output is always a
//! subset of the input in the original order, and an empty result is a
//! legitimate state, not an error.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;
use tracing::debug;

use crate::ingest::{CleanRecord, CleanTable};

/// Country restriction: everything, or an exact, case-sensitive match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountryFilter {
    All,
    Only(String),
}

impl CountryFilter {
    fn matches(&self, country: &str) -> bool {
        match self {
            CountryFilter::All => true,
            CountryFilter::Only(name) => name == country,
        }
    }
}

/// User-selected filter parameters.
///
/// The date range is inclusive on both calendar days: a row qualifies when
/// `date_start <= InvoiceDate < date_end + 1 day`.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterParams {
    pub country: CountryFilter,
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    pub min_quantity: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    /// User-input validation failure, rejected before any row is inspected.
    #[error("start date {start} is after end date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
}

impl FilterParams {
    /// Parameters that keep every row of `table`: full invoice span, all
    /// countries, minimum quantity 1. `None` for an empty table.
    pub fn full_range(table: &CleanTable) -> Option<Self> {
        let info = table.info()?;
        Some(Self {
            country: CountryFilter::All,
            date_start: info.first_invoice.date(),
            date_end: info.last_invoice.date(),
            min_quantity: 1,
        })
    }

    pub fn validate(&self) -> Result<(), FilterError> {
        if self.date_start > self.date_end {
            return Err(FilterError::InvalidDateRange {
                start: self.date_start,
                end: self.date_end,
            });
        }
        Ok(())
    }

    fn matches(&self, row: &CleanRecord) -> bool {
        self.country.matches(&row.country)
            && in_range(row.invoice_date, self.date_start, self.date_end)
            && row.quantity >= self.min_quantity
    }
}

fn in_range(ts: NaiveDateTime, start: NaiveDate, end: NaiveDate) -> bool {
    if ts < start.and_time(NaiveTime::MIN) {
        return false;
    }
    match end.succ_opt() {
        Some(upper) => ts < upper.and_time(NaiveTime::MIN),
        // `end` is the last representable date; nothing lies beyond it.
        None => true,
    }
}

/// Apply all three predicates conjunctively, preserving row order.
pub fn apply(table: &CleanTable, params: &FilterParams) -> Result<CleanTable, FilterError> {
    params.validate()?;
    let rows: Vec<CleanRecord> = table
        .iter()
        .filter(|row| params.matches(row))
        .cloned()
        .collect();
    debug!(
        input = table.len(),
        output = rows.len(),
        "applied filters"
    );
    Ok(CleanTable::new(rows))
}
