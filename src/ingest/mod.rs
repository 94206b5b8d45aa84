//! CSV ingestion and cleaning.
//!
//! Reads the raw invoice log, repairs the encoding (UTF-8 with a Latin-1
//! fallback), parses timestamps, drops rows that fail validation, and derives
//! the computed columns. The result is an immutable [`CleanTable`]; loading an
//! unchanged source twice yields an equal table.

pub(crate) mod dates;
mod table;

pub use table::{CleanRecord, CleanTable, DatasetInfo};

use csv::{ReaderBuilder, Trim};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, warn};

/// Columns the header row must carry for a load to proceed.
pub const REQUIRED_COLUMNS: [&str; 8] = [
    "InvoiceNo",
    "StockCode",
    "Description",
    "Quantity",
    "InvoiceDate",
    "UnitPrice",
    "CustomerID",
    "Country",
];

#[derive(Debug, Error)]
pub enum LoadError {
    /// The raw source is absent. Terminal for the session; the caller is
    /// expected to surface this to the end user rather than show a partial
    /// dashboard.
    #[error("source file not found: {path}")]
    SourceNotFound { path: PathBuf },

    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("header row is missing required column `{0}`")]
    MissingColumn(&'static str),

    /// One unparseable timestamp fails the whole load; rows are never
    /// silently skipped over date problems.
    #[error("line {line}: invoice date `{value}` does not match MM/DD/YYYY HH:MM")]
    MalformedTimestamp { line: u64, value: String },

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// One row as it appears in the raw feed. Every field may be absent; the
/// cleaning pass decides what that means per column.
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "InvoiceNo")]
    invoice_no: Option<String>,
    #[serde(rename = "StockCode")]
    stock_code: Option<String>,
    #[serde(rename = "Description")]
    description: Option<String>,
    #[serde(rename = "Quantity")]
    quantity: Option<i64>,
    #[serde(rename = "InvoiceDate")]
    invoice_date: Option<String>,
    #[serde(rename = "UnitPrice")]
    unit_price: Option<Decimal>,
    #[serde(rename = "CustomerID")]
    customer_id: Option<String>,
    #[serde(rename = "Country")]
    country: Option<String>,
}

/// Load the invoice log at `path`, clean it, and derive the computed columns.
///
/// Expensive relative to the downstream filter/aggregate steps; callers that
/// re-run on every parameter change should go through
/// [`crate::cache::TableCache`] instead of calling this directly.
pub fn load_clean(path: impl AsRef<Path>) -> Result<CleanTable, LoadError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => LoadError::SourceNotFound {
            path: path.to_path_buf(),
        },
        _ => LoadError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })?;
    debug!(path = %path.display(), bytes = bytes.len(), "read raw source");
    clean_from_str(&decode(bytes))
}

/// Decode as UTF-8, retrying as Latin-1. Latin-1 maps every byte to the code
/// point of the same value, so the fallback cannot fail.
fn decode(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            warn!("source is not valid UTF-8, re-decoding as Latin-1");
            e.into_bytes().iter().map(|&b| b as char).collect()
        }
    }
}

/// Clean an already-decoded CSV document into a [`CleanTable`].
///
/// Row handling, in order:
/// 1. `InvoiceDate` must parse; a bad value is fatal for the entire load,
///    even in a row the later checks would have dropped.
/// 2. Rows missing `CustomerID`, `InvoiceNo`, or `Country` are dropped.
/// 3. Rows with non-positive or missing `Quantity`/`UnitPrice` are dropped.
pub fn clean_from_str(text: &str) -> Result<CleanTable, LoadError> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let headers = rdr.headers()?.clone();
    for col in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == col) {
            return Err(LoadError::MissingColumn(col));
        }
    }

    let mut rows = Vec::new();
    let mut dropped_missing = 0u64;
    let mut dropped_nonpositive = 0u64;

    for (idx, result) in rdr.deserialize::<RawRecord>().enumerate() {
        // +2: one for the header row, one for 1-based numbering.
        let line = idx as u64 + 2;
        let raw = result?;

        let date_field = raw.invoice_date.unwrap_or_default();
        let invoice_date = match dates::parse_invoice_datetime(&date_field) {
            Some(ts) => ts,
            None => {
                return Err(LoadError::MalformedTimestamp {
                    line,
                    value: date_field,
                })
            }
        };

        let (Some(invoice_no), Some(customer_id), Some(country)) = (
            present(raw.invoice_no),
            present(raw.customer_id),
            present(raw.country),
        ) else {
            dropped_missing += 1;
            continue;
        };

        let Some(quantity) = raw.quantity.filter(|q| *q > 0) else {
            dropped_nonpositive += 1;
            continue;
        };
        let Some(unit_price) = raw.unit_price.filter(|p| *p > Decimal::ZERO) else {
            dropped_nonpositive += 1;
            continue;
        };

        rows.push(CleanRecord::new(
            invoice_no,
            raw.stock_code.unwrap_or_default(),
            raw.description.unwrap_or_default(),
            quantity,
            invoice_date,
            unit_price,
            customer_id,
            country,
        ));
    }

    debug!(
        kept = rows.len(),
        dropped_missing, dropped_nonpositive, "cleaning pass finished"
    );
    Ok(CleanTable::new(rows))
}

fn present(field: Option<String>) -> Option<String> {
    field.filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,salesdash::ingest=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    const SAMPLE: &str = "\
InvoiceNo,StockCode,Description,Quantity,InvoiceDate,UnitPrice,CustomerID,Country
536365,85123A,WHITE HANGING HEART T-LIGHT HOLDER,6,12/1/2010 8:26,2.55,17850,United Kingdom
536366,71053,WHITE METAL LANTERN,6,12/1/2010 8:28,3.39,17850,United Kingdom
C536367,22633,HAND WARMER UNION JACK,-5,12/1/2010 8:34,2.00,17850,United Kingdom
536368,22960,JAM MAKING SET WITH JARS,3,12/1/2010 8:34,4.25,,United Kingdom
536370,21756,BATH BUILDING BLOCK WORD,0,12/1/2010 8:45,5.95,12431,United Kingdom
536371,22086,PAPER CHAIN KIT,4,12/2/2010 9:01,0.00,12583,France
536372,21791,VINTAGE HEADS AND TAILS CARD GAME,12,12/5/2010 10:03,1.25,12583,France
";

    #[test]
    fn drops_invalid_rows_and_derives_columns() {
        init_test_logging();
        let table = clean_from_str(SAMPLE).unwrap();

        // Dropped: negative quantity, missing customer, zero quantity, zero price.
        let kept: Vec<&str> = table.iter().map(|r| r.invoice_no.as_str()).collect();
        assert_eq!(kept, vec!["536365", "536366", "536372"]);

        let first = &table.rows()[0];
        assert_eq!(first.total_price, dec!(15.30));
        assert_eq!(first.year_month, "2010-12");
        assert_eq!(first.day_name(), "Wednesday");
        assert_eq!(first.customer_id, "17850");
    }

    #[test]
    fn clean_rows_hold_positivity_invariants() {
        let table = clean_from_str(SAMPLE).unwrap();
        for row in table.iter() {
            assert!(row.quantity > 0);
            assert!(row.unit_price > Decimal::ZERO);
            assert_eq!(row.total_price, Decimal::from(row.quantity) * row.unit_price);
        }
    }

    #[test]
    fn cleaning_is_idempotent() {
        let a = clean_from_str(SAMPLE).unwrap();
        let b = clean_from_str(SAMPLE).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn malformed_timestamp_fails_whole_load() {
        let doc = "\
InvoiceNo,StockCode,Description,Quantity,InvoiceDate,UnitPrice,CustomerID,Country
536365,85123A,HOLDER,6,2010-12-01 08:26,2.55,17850,United Kingdom
";
        match clean_from_str(doc) {
            Err(LoadError::MalformedTimestamp { line, value }) => {
                assert_eq!(line, 2);
                assert_eq!(value, "2010-12-01 08:26");
            }
            other => panic!("expected MalformedTimestamp, got {other:?}"),
        }
    }

    #[test]
    fn bad_date_in_droppable_row_is_still_fatal() {
        // The row would be dropped for its missing CustomerID, but the date
        // check comes first.
        let doc = "\
InvoiceNo,StockCode,Description,Quantity,InvoiceDate,UnitPrice,CustomerID,Country
536365,85123A,HOLDER,6,12/1/2010 8:26,2.55,17850,United Kingdom
536366,71053,LANTERN,6,not a date,3.39,,United Kingdom
";
        assert!(matches!(
            clean_from_str(doc),
            Err(LoadError::MalformedTimestamp { line: 3, .. })
        ));
    }

    #[test]
    fn empty_invoice_date_is_fatal() {
        let doc = "\
InvoiceNo,StockCode,Description,Quantity,InvoiceDate,UnitPrice,CustomerID,Country
536365,85123A,HOLDER,6,,2.55,17850,United Kingdom
";
        assert!(matches!(
            clean_from_str(doc),
            Err(LoadError::MalformedTimestamp { line: 2, .. })
        ));
    }

    #[test]
    fn missing_required_column_is_rejected() {
        let doc = "\
InvoiceNo,StockCode,Description,Quantity,InvoiceDate,UnitPrice,Country
536365,85123A,HOLDER,6,12/1/2010 8:26,2.55,United Kingdom
";
        assert!(matches!(
            clean_from_str(doc),
            Err(LoadError::MissingColumn("CustomerID"))
        ));
    }

    #[test]
    fn loads_from_disk_and_reports_info() {
        init_test_logging();
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(SAMPLE.as_bytes()).unwrap();

        let table = load_clean(tmp.path()).unwrap();
        let info = table.info().unwrap();
        assert_eq!(info.rows, 3);
        assert_eq!(info.countries, 2);
        assert_eq!(
            info.first_invoice,
            dates::parse_invoice_datetime("12/1/2010 8:26").unwrap()
        );
        assert_eq!(
            info.last_invoice,
            dates::parse_invoice_datetime("12/5/2010 10:03").unwrap()
        );
    }

    #[test]
    fn missing_source_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-such-file.csv");
        assert!(matches!(
            load_clean(&path),
            Err(LoadError::SourceNotFound { .. })
        ));
    }

    #[test]
    fn falls_back_to_latin1_on_invalid_utf8() {
        let mut raw = Vec::new();
        raw.extend_from_slice(
            b"InvoiceNo,StockCode,Description,Quantity,InvoiceDate,UnitPrice,CustomerID,Country\n",
        );
        // 0xC9 is 'E with acute' in Latin-1 and invalid as a UTF-8 start byte here.
        raw.extend_from_slice(b"536365,85123A,D\xC9COR,6,12/1/2010 8:26,2.55,17850,France\n");

        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(&raw).unwrap();

        let table = load_clean(tmp.path()).unwrap();
        assert_eq!(table.rows()[0].description, "D\u{c9}COR");
    }
}
