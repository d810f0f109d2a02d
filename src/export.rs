use std::path::Path;

use log::debug;

use crate::error::{InsightError, Result};
use crate::forecast::Forecast;
use crate::models::{NormalizedTable, Record, Value};

pub const FILTERED_SHEET: &str = "Filtered Data";
pub const FORECAST_SHEET: &str = "Forecast Data";
pub const FORECAST_HEADER: [&str; 2] = ["Date", "Forecasted Sales"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Csv,
    Xlsx,
}

impl ExportKind {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(Self::Csv),
            "xlsx" => Ok(Self::Xlsx),
            _ => Err(InsightError::UnsupportedFormat(format!(
                "cannot export to {} (use .csv or .xlsx)",
                path.display()
            ))),
        }
    }
}

/// Canonical columns first, then dimensions, then whatever else the file had.
pub fn header(table: &NormalizedTable) -> Vec<String> {
    let mut cols: Vec<String> = vec!["Date".into(), "Amount".into(), "Type".into()];
    cols.extend(table.mapping.dimensions.iter().map(|(d, _)| d.label().to_string()));
    cols.extend(table.extra_columns.iter().cloned());
    cols
}

fn text_fields(table: &NormalizedTable, r: &Record) -> Vec<String> {
    let mut fields = vec![
        r.date.format("%Y-%m-%d %H:%M:%S").to_string(),
        r.amount.to_string(),
        r.kind.clone(),
    ];
    fields.extend(
        table
            .mapping
            .dimensions
            .iter()
            .map(|(d, _)| r.dimension(*d).unwrap_or_default().to_string()),
    );
    fields.extend(r.extra.iter().map(Value::to_string));
    fields
}

pub fn write_csv(table: &NormalizedTable, path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(header(table))?;
    for r in &table.records {
        wtr.write_record(text_fields(table, r))?;
    }
    wtr.flush()?;
    debug!("wrote {} rows to {}", table.len(), path.display());
    Ok(())
}

#[cfg(feature = "xlsx")]
pub fn write_workbook(table: &NormalizedTable, forecast: Option<&Forecast>, path: &Path) -> Result<()> {
    use rust_xlsxwriter::{Format, Workbook};

    use crate::importer::datetime_to_excel_serial;

    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let datetime_fmt = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");
    let date_fmt = Format::new().set_num_format("yyyy-mm-dd");

    let sheet = workbook.add_worksheet();
    sheet.set_name(FILTERED_SHEET)?;
    for (col, name) in header(table).iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, name, &bold)?;
    }
    let dims = table.mapping.dimensions.len();
    for (i, r) in table.records.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_number_with_format(row, 0, datetime_to_excel_serial(r.date), &datetime_fmt)?;
        sheet.write_number(row, 1, r.amount)?;
        sheet.write_string(row, 2, &r.kind)?;
        for (j, (d, _)) in table.mapping.dimensions.iter().enumerate() {
            if let Some(v) = r.dimension(*d) {
                sheet.write_string(row, (3 + j) as u16, v)?;
            }
        }
        for (j, v) in r.extra.iter().enumerate() {
            let col = (3 + dims + j) as u16;
            match v {
                Value::Empty => {}
                Value::Number(n) => {
                    sheet.write_number(row, col, *n)?;
                }
                Value::Bool(b) => {
                    sheet.write_boolean(row, col, *b)?;
                }
                Value::DateTime(dt) => {
                    sheet.write_number_with_format(row, col, datetime_to_excel_serial(*dt), &datetime_fmt)?;
                }
                Value::Text(s) => {
                    sheet.write_string(row, col, s)?;
                }
            }
        }
    }

    if let Some(f) = forecast {
        let sheet = workbook.add_worksheet();
        sheet.set_name(FORECAST_SHEET)?;
        for (col, name) in FORECAST_HEADER.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, *name, &bold)?;
        }
        for (i, p) in f.points.iter().enumerate() {
            let row = i as u32 + 1;
            let serial = p.date.and_hms_opt(0, 0, 0).map(datetime_to_excel_serial).unwrap_or_default();
            sheet.write_number_with_format(row, 0, serial, &date_fmt)?;
            sheet.write_number(row, 1, p.amount)?;
        }
    }

    workbook.save(path)?;
    debug!("wrote workbook {}", path.display());
    Ok(())
}

#[cfg(not(feature = "xlsx"))]
pub fn write_workbook(_table: &NormalizedTable, _forecast: Option<&Forecast>, path: &Path) -> Result<()> {
    Err(InsightError::UnsupportedFormat(format!(
        "{}: spreadsheet export requires the 'xlsx' feature",
        path.display()
    )))
}

/// Write the filtered table to `path`, picking the format from its extension.
/// CSV output carries no forecast; use `.xlsx` for the two-sheet export.
pub fn export(table: &NormalizedTable, forecast: Option<&Forecast>, path: &Path) -> Result<ExportKind> {
    let kind = ExportKind::from_path(path)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    match kind {
        ExportKind::Csv => write_csv(table, path)?,
        ExportKind::Xlsx => write_workbook(table, forecast, path)?,
    }
    Ok(kind)
}
