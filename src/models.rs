use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub const SALES: &str = "Sales";
pub const EXPENSE: &str = "Expense";

/// A loosely typed cell as read from a CSV, XLSX or JSON source.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl Value {
    /// Blank strings collapse to `Empty` so every loader agrees on what "missing" means.
    pub fn from_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Value::Empty
        } else {
            Value::Text(trimmed.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => Ok(()),
            Value::Text(s) => f.write_str(s),
            Value::Number(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

/// Column names plus rows of cells, exactly as loaded. Rows may be shorter
/// than the header; missing trailing cells read as `Value::Empty`.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl RawTable {
    pub fn cell(&self, row: usize, col: usize) -> &Value {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&Value::Empty)
    }
}

/// Optional categorical columns used for breakdowns and filters.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Product,
    Category,
    Customer,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [Dimension::Product, Dimension::Category, Dimension::Customer];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Product => "Product",
            Self::Category => "Category",
            Self::Customer => "Customer",
        }
    }
}

/// A column picked by the normalizer: its position in the raw table and its header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub index: usize,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaMapping {
    pub date: Column,
    pub amount: Column,
    pub kind: Option<Column>,
    pub dimensions: Vec<(Dimension, Column)>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizationReport {
    pub total_rows: usize,
    pub bad_dates: usize,
    pub bad_amounts: usize,
    pub missing_types: usize,
}

impl NormalizationReport {
    pub fn dropped(&self) -> usize {
        self.bad_dates + self.bad_amounts + self.missing_types
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub date: NaiveDateTime,
    pub amount: f64,
    pub kind: String,
    pub dimensions: BTreeMap<Dimension, String>,
    /// Remaining source cells, aligned with `NormalizedTable::extra_columns`.
    pub extra: Vec<Value>,
}

impl Record {
    pub fn is_sales(&self) -> bool {
        self.kind == SALES
    }

    pub fn is_expense(&self) -> bool {
        self.kind == EXPENSE
    }

    pub fn dimension(&self, dim: Dimension) -> Option<&str> {
        self.dimensions.get(&dim).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTable {
    pub records: Vec<Record>,
    pub mapping: SchemaMapping,
    pub extra_columns: Vec<String>,
    pub report: NormalizationReport,
}

impl NormalizedTable {
    /// Same schema, different rows. Used by the filter engine.
    pub fn with_records(&self, records: Vec<Record>) -> Self {
        Self {
            records,
            mapping: self.mapping.clone(),
            extra_columns: self.extra_columns.clone(),
            report: self.report.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn kinds(&self) -> BTreeSet<String> {
        self.records.iter().map(|r| r.kind.clone()).collect()
    }

    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.records.iter().map(|r| r.date.date()).min()?;
        let max = self.records.iter().map(|r| r.date.date()).max()?;
        Some((min, max))
    }

    pub fn has_dimension(&self, dim: Dimension) -> bool {
        self.mapping.dimensions.iter().any(|(d, _)| *d == dim)
    }
}
