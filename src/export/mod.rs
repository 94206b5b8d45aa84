//! Export of the current filtered table.
//!
//! Full, uncompressed serializations of all visible columns, consumed by the
//! surrounding download/UI layer. CSV is always available; the spreadsheet
//! rendering sits behind the optional `xlsx` cargo feature and degrades to an
//! informative error when compiled out.

use std::io;
use thiserror::Error;
use tracing::debug;

use crate::ingest::{CleanRecord, CleanTable};

/// Column order of both export formats. `YearMonth` and `Month` carry the
/// same month-bucket value.
pub const EXPORT_COLUMNS: [&str; 12] = [
    "InvoiceNo",
    "StockCode",
    "Description",
    "Quantity",
    "InvoiceDate",
    "UnitPrice",
    "CustomerID",
    "Country",
    "TotalPrice",
    "YearMonth",
    "Month",
    "DayOfWeek",
];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("flushing export output: {0}")]
    Io(#[from] io::Error),

    #[cfg(feature = "xlsx")]
    #[error("writing spreadsheet: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// Spreadsheet export was compiled out; the CSV path stays available.
    #[cfg(not(feature = "xlsx"))]
    #[error("spreadsheet export is disabled; rebuild with the `xlsx` feature")]
    SpreadsheetSupportDisabled,
}

fn render_row(row: &CleanRecord) -> [String; 12] {
    [
        row.invoice_no.clone(),
        row.stock_code.clone(),
        row.description.clone(),
        row.quantity.to_string(),
        row.invoice_date.format("%Y-%m-%d %H:%M:%S").to_string(),
        row.unit_price.to_string(),
        row.customer_id.clone(),
        row.country.clone(),
        row.total_price.to_string(),
        row.year_month.clone(),
        row.year_month.clone(),
        row.day_name().to_string(),
    ]
}

/// Write `table` as CSV with a header row.
pub fn write_csv<W: io::Write>(table: &CleanTable, writer: W) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(EXPORT_COLUMNS)?;
    for row in table.iter() {
        wtr.write_record(render_row(row))?;
    }
    wtr.flush()?;
    debug!(rows = table.len(), "wrote csv export");
    Ok(())
}

/// Render `table` as an in-memory `.xlsx` workbook.
#[cfg(feature = "xlsx")]
pub fn write_xlsx(table: &CleanTable) -> Result<Vec<u8>, ExportError> {
    use rust_decimal::prelude::ToPrimitive;
    use rust_xlsxwriter::Workbook;

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, name) in EXPORT_COLUMNS.iter().enumerate() {
        sheet.write_string(0, col as u16, *name)?;
    }
    for (idx, row) in table.iter().enumerate() {
        let r = idx as u32 + 1;
        sheet.write_string(r, 0, row.invoice_no.as_str())?;
        sheet.write_string(r, 1, row.stock_code.as_str())?;
        sheet.write_string(r, 2, row.description.as_str())?;
        sheet.write_number(r, 3, row.quantity as f64)?;
        sheet.write_string(r, 4, row.invoice_date.format("%Y-%m-%d %H:%M:%S").to_string())?;
        sheet.write_number(r, 5, row.unit_price.to_f64().unwrap_or_default())?;
        sheet.write_string(r, 6, row.customer_id.as_str())?;
        sheet.write_string(r, 7, row.country.as_str())?;
        sheet.write_number(r, 8, row.total_price.to_f64().unwrap_or_default())?;
        sheet.write_string(r, 9, row.year_month.as_str())?;
        sheet.write_string(r, 10, row.year_month.as_str())?;
        sheet.write_string(r, 11, row.day_name())?;
    }
    let buffer = workbook.save_to_buffer()?;
    debug!(rows = table.len(), bytes = buffer.len(), "wrote xlsx export");
    Ok(buffer)
}

/// Without the `xlsx` feature the spreadsheet path reports itself disabled.
#[cfg(not(feature = "xlsx"))]
pub fn write_xlsx(_table: &CleanTable) -> Result<Vec<u8>, ExportError> {
    Err(ExportError::SpreadsheetSupportDisabled)
}
