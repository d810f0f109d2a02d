use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use log::debug;

use crate::models::{Dimension, NormalizedTable, Record};

/// Which rows survive a dashboard refresh. Dates are inclusive on both ends
/// and compared on the calendar day, so `end` covers that whole day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub kinds: BTreeSet<String>,
    /// Dimensions absent from the map are unconstrained.
    pub dimensions: BTreeMap<Dimension, BTreeSet<String>>,
}

impl FilterSpec {
    /// A filter that accepts every row of `table`.
    pub fn covering(table: &NormalizedTable) -> Self {
        let (start, end) = table.date_span().unwrap_or((NaiveDate::MIN, NaiveDate::MAX));
        Self {
            start,
            end,
            kinds: table.kinds(),
            dimensions: BTreeMap::new(),
        }
    }

    pub fn with_range(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        if let Some(s) = start {
            self.start = s;
        }
        if let Some(e) = end {
            self.end = e;
        }
        self
    }

    pub fn with_kinds<I: IntoIterator<Item = String>>(mut self, kinds: I) -> Self {
        self.kinds = kinds.into_iter().collect();
        self
    }

    pub fn with_dimension<I: IntoIterator<Item = String>>(mut self, dim: Dimension, values: I) -> Self {
        self.dimensions.insert(dim, values.into_iter().collect());
        self
    }

    pub fn accepts(&self, record: &Record) -> bool {
        let day = record.date.date();
        if day < self.start || day > self.end {
            return false;
        }
        if !self.kinds.contains(&record.kind) {
            return false;
        }
        self.dimensions.iter().all(|(dim, accepted)| {
            record
                .dimension(*dim)
                .is_some_and(|value| accepted.contains(value))
        })
    }
}

/// Rows of `table` accepted by `spec`, in their original order.
pub fn apply(table: &NormalizedTable, spec: &FilterSpec) -> NormalizedTable {
    let records: Vec<Record> = table
        .records
        .iter()
        .filter(|r| spec.accepts(r))
        .cloned()
        .collect();
    debug!("filter kept {} of {} rows", records.len(), table.len());
    table.with_records(records)
}

/// Outcome of a filter pass, for the presentation layer. An empty result is a
/// status to display, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterStatus {
    /// The source table itself has no usable rows.
    NoData,
    /// The source has rows but the filters excluded all of them.
    Empty,
    Rows(usize),
}

impl FilterStatus {
    pub fn of(source: &NormalizedTable, filtered: &NormalizedTable) -> Self {
        if source.is_empty() {
            Self::NoData
        } else if filtered.is_empty() {
            Self::Empty
        } else {
            Self::Rows(filtered.len())
        }
    }

    pub fn has_rows(&self) -> bool {
        matches!(self, Self::Rows(_))
    }

    pub fn message(&self) -> String {
        match self {
            Self::NoData => "No data available in this file.".to_string(),
            Self::Empty => "No rows match the current filters.".to_string(),
            Self::Rows(n) => format!("{n} rows match the current filters."),
        }
    }
}
