use std::path::Path;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime};
use log::debug;

use crate::error::{InsightError, Result};
use crate::models::{RawTable, Value};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%d-%b-%Y", "%d %b %Y", "%b %d, %Y"];

/// Largest serial Excel accepts (9999-12-31).
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

const MAX_YEAR: i32 = 9999;

/// 9999-12-31T23:59:59.999Z in epoch milliseconds.
const MAX_EPOCH_MILLIS: f64 = 253_402_300_799_999.0;

/// Parse a currency-ish amount. `None` means the cell is not a number; callers
/// must not treat that as zero.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let s = raw.replace(&[',', '"', '$', '€', '£'][..], "");
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        return inner.trim().parse::<f64>().ok().filter(|v| v.is_finite()).map(|v| -v);
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    None
}

pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !(0.0..=MAX_EXCEL_SERIAL).contains(&serial) {
        return None;
    }
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let seconds = (serial * 86_400.0).round() as i64;
    base.checked_add_signed(Duration::seconds(seconds))
}

pub fn datetime_to_excel_serial(dt: NaiveDateTime) -> f64 {
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();
    (dt - base).num_seconds() as f64 / 86_400.0
}

/// Numbers in a date column are either epoch milliseconds (what dataframe
/// JSON exports write) or Excel serials.
fn number_to_datetime(n: f64) -> Option<NaiveDateTime> {
    if n >= 1e11 {
        if n > MAX_EPOCH_MILLIS {
            return None;
        }
        DateTime::from_timestamp_millis(n as i64).map(|dt| dt.naive_utc())
    } else {
        excel_serial_to_datetime(n)
    }
}

/// Dates past 9999-12-31 are rejected whatever the source, like Excel does.
pub fn value_to_datetime(value: &Value) -> Option<NaiveDateTime> {
    let dt = match value {
        Value::DateTime(dt) => Some(*dt),
        Value::Number(n) => number_to_datetime(*n),
        Value::Text(s) => parse_datetime(s),
        Value::Empty | Value::Bool(_) => None,
    };
    dt.filter(|dt| dt.year() <= MAX_YEAR)
}

pub fn value_to_amount(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) if n.is_finite() => Some(*n),
        Value::Text(s) => parse_amount(s),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// File formats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Excel,
    Json,
}

impl FileFormat {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Excel => "xlsx",
            Self::Json => "json",
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(Self::Csv),
            "xlsx" | "xls" | "xlsm" => Ok(Self::Excel),
            "json" => Ok(Self::Json),
            "" => Err(InsightError::UnsupportedFormat(format!(
                "{} has no file extension (expected .csv, .xlsx or .json)",
                path.display()
            ))),
            other => Err(InsightError::UnsupportedFormat(format!(
                ".{other} (expected .csv, .xlsx or .json)"
            ))),
        }
    }

    pub fn load(&self, path: &Path) -> Result<RawTable> {
        match self {
            Self::Csv => load_csv(path),
            Self::Excel => load_excel(path),
            Self::Json => load_json(path),
        }
    }
}

pub fn load_table(path: &Path) -> Result<RawTable> {
    let format = FileFormat::from_path(path)?;
    let table = format.load(path)?;
    debug!(
        "loaded {} as {}: {} columns, {} rows",
        path.display(),
        format.key(),
        table.columns.len(),
        table.rows.len()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(std::io::BufReader::new(file));

    let columns: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        rows.push(record.iter().map(Value::from_text).collect());
    }
    Ok(RawTable { columns, rows })
}

// ---------------------------------------------------------------------------
// Excel (feature-gated)
// ---------------------------------------------------------------------------

#[cfg(feature = "xlsx")]
fn load_excel(path: &Path) -> Result<RawTable> {
    use calamine::Reader;

    let mut workbook = calamine::open_workbook_auto(path)?;
    let Some(sheet) = workbook.sheet_names().first().cloned() else {
        return Ok(RawTable::default());
    };
    let range = workbook.worksheet_range(&sheet)?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(RawTable::default());
    };
    let columns = header.iter().map(|c| c.to_string().trim().to_string()).collect();
    let rows = rows
        .map(|row| row.iter().map(excel_value).collect::<Vec<_>>())
        .filter(|row| row.iter().any(|v| !v.is_empty()))
        .collect();
    Ok(RawTable { columns, rows })
}

#[cfg(feature = "xlsx")]
fn excel_value(cell: &calamine::Data) -> Value {
    use calamine::Data;
    match cell {
        Data::Empty | Data::Error(_) => Value::Empty,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Value::from_text(s),
        Data::Float(f) => Value::Number(*f),
        Data::Int(i) => Value::Number(*i as f64),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(dt) => excel_serial_to_datetime(dt.as_f64())
            .map(Value::DateTime)
            .unwrap_or(Value::Empty),
    }
}

#[cfg(not(feature = "xlsx"))]
fn load_excel(path: &Path) -> Result<RawTable> {
    Err(InsightError::UnsupportedFormat(format!(
        "{}: Excel support requires the 'xlsx' feature",
        path.display()
    )))
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

fn load_json(path: &Path) -> Result<RawTable> {
    let content = std::fs::read_to_string(path)?;
    let doc: serde_json::Value = serde_json::from_str(&content)?;
    match doc {
        serde_json::Value::Array(items) => json_records(&items),
        serde_json::Value::Object(map) => json_columns(&map),
        _ => Err(InsightError::UnsupportedFormat(
            "JSON must be an array of records or an object of columns".into(),
        )),
    }
}

/// `[{"Date": .., "Amount": ..}, ...]`. Columns appear in first-seen order.
fn json_records(items: &[serde_json::Value]) -> Result<RawTable> {
    let mut columns: Vec<String> = Vec::new();
    for item in items {
        let obj = item.as_object().ok_or_else(|| {
            InsightError::UnsupportedFormat("JSON records must be objects".into())
        })?;
        for key in obj.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }
    let rows = items
        .iter()
        .map(|item| {
            columns
                .iter()
                .map(|c| item.get(c).map(json_value).unwrap_or(Value::Empty))
                .collect()
        })
        .collect();
    Ok(RawTable { columns, rows })
}

/// `{"Date": [..], ..}` or `{"Date": {"0": .., "1": ..}, ..}`.
fn json_columns(map: &serde_json::Map<String, serde_json::Value>) -> Result<RawTable> {
    let columns: Vec<String> = map.keys().cloned().collect();
    let cells: Vec<Vec<Value>> = map
        .values()
        .map(|v| match v {
            serde_json::Value::Array(a) => Ok(a.iter().map(json_value).collect()),
            serde_json::Value::Object(o) => Ok(o.values().map(json_value).collect()),
            _ => Err(InsightError::UnsupportedFormat(
                "JSON columns must be arrays or index-keyed objects".into(),
            )),
        })
        .collect::<Result<_>>()?;

    let height = cells.iter().map(Vec::len).max().unwrap_or(0);
    let rows = (0..height)
        .map(|i| {
            cells
                .iter()
                .map(|col| col.get(i).cloned().unwrap_or(Value::Empty))
                .collect()
        })
        .collect();
    Ok(RawTable { columns, rows })
}

fn json_value(v: &serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::Empty,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Empty),
        serde_json::Value::String(s) => Value::from_text(s),
        other => Value::Text(other.to_string()),
    }
}
