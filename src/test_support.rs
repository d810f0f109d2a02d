//! Builders for unit tests across the crate.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;

use crate::models::{
    Column, Dimension, NormalizationReport, NormalizedTable, Record, SchemaMapping,
};

/// `date` is `YYYY-MM-DD HH:MM`.
pub fn record(date: &str, amount: f64, kind: &str) -> Record {
    Record {
        date: NaiveDateTime::parse_from_str(date, "%Y-%m-%d %H:%M").unwrap(),
        amount,
        kind: kind.to_string(),
        dimensions: BTreeMap::new(),
        extra: Vec::new(),
    }
}

impl Record {
    pub fn with_dim(mut self, dim: Dimension, value: &str) -> Self {
        self.dimensions.insert(dim, value.to_string());
        self
    }
}

fn column(index: usize, name: &str) -> Column {
    Column {
        index,
        name: name.to_string(),
    }
}

/// Canonical Date/Amount/Type schema plus whichever dimensions the records use.
pub fn table(records: Vec<Record>) -> NormalizedTable {
    let dimensions = Dimension::ALL
        .iter()
        .filter(|d| records.iter().any(|r| r.dimensions.contains_key(d)))
        .enumerate()
        .map(|(i, d)| (*d, column(3 + i, d.label())))
        .collect();
    let report = NormalizationReport {
        total_rows: records.len(),
        ..Default::default()
    };
    NormalizedTable {
        records,
        mapping: SchemaMapping {
            date: column(0, "Date"),
            amount: column(1, "Amount"),
            kind: Some(column(2, "Type")),
            dimensions,
        },
        extra_columns: Vec::new(),
        report,
    }
}
