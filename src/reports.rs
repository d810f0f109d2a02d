use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate, Timelike, Weekday};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::models::{Dimension, NormalizedTable};

// ---------------------------------------------------------------------------
// KPIs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kpis {
    pub total_sales: f64,
    pub total_expenses: f64,
    pub net_profit: f64,
    pub rows: usize,
}

pub fn kpis(table: &NormalizedTable) -> Kpis {
    let total_sales: f64 = table.records.iter().filter(|r| r.is_sales()).map(|r| r.amount).sum();
    let total_expenses: f64 = table.records.iter().filter(|r| r.is_expense()).map(|r| r.amount).sum();
    Kpis {
        total_sales,
        total_expenses,
        net_profit: total_sales - total_expenses,
        rows: table.len(),
    }
}

// ---------------------------------------------------------------------------
// Time trend
// ---------------------------------------------------------------------------

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Month,
    Week,
    Day,
}

impl Granularity {
    /// First day of the period containing `date`. Weeks start on Monday.
    pub fn bucket_start(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Self::Month => date.with_day(1).unwrap_or(date),
            Self::Week => date - Duration::days(date.weekday().num_days_from_monday() as i64),
            Self::Day => date,
        }
    }

    pub fn label(&self, start: NaiveDate) -> String {
        match self {
            Self::Month => start.format("%Y-%m").to_string(),
            Self::Week => {
                let week = start.iso_week();
                format!("{}-W{:02}", week.year(), week.week())
            }
            Self::Day => start.format("%Y-%m-%d").to_string(),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Month => "Monthly",
            Self::Week => "Weekly",
            Self::Day => "Daily",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendPoint {
    /// Period start; the sort key.
    pub bucket: NaiveDate,
    pub label: String,
    pub kind: String,
    pub amount: f64,
}

/// Sum of amounts per (period, type), oldest period first.
pub fn time_trend(table: &NormalizedTable, granularity: Granularity) -> Vec<TrendPoint> {
    let mut sums: BTreeMap<(NaiveDate, String), f64> = BTreeMap::new();
    for r in &table.records {
        let bucket = granularity.bucket_start(r.date.date());
        *sums.entry((bucket, r.kind.clone())).or_default() += r.amount;
    }
    debug!("{} trend: {} points", granularity.title().to_lowercase(), sums.len());
    sums.into_iter()
        .map(|((bucket, kind), amount)| TrendPoint {
            bucket,
            label: granularity.label(bucket),
            kind,
            amount,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Breakdown
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct BreakdownRow {
    pub value: String,
    pub kind: String,
    pub amount: f64,
}

/// Sum per (dimension value, type), ordered by value then type. Rows with no
/// value for `dim` are left out.
pub fn breakdown(table: &NormalizedTable, dim: Dimension) -> Vec<BreakdownRow> {
    let mut sums: BTreeMap<(String, String), f64> = BTreeMap::new();
    for r in &table.records {
        if let Some(value) = r.dimension(dim) {
            *sums.entry((value.to_string(), r.kind.clone())).or_default() += r.amount;
        }
    }
    sums.into_iter()
        .map(|((value, kind), amount)| BreakdownRow { value, kind, amount })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShareRow {
    pub value: String,
    pub amount: f64,
    pub pct: f64,
}

/// Single-dimension variant for proportion charts, largest share first.
pub fn share(table: &NormalizedTable, dim: Dimension) -> Vec<ShareRow> {
    let mut sums: BTreeMap<String, f64> = BTreeMap::new();
    for r in &table.records {
        if let Some(value) = r.dimension(dim) {
            *sums.entry(value.to_string()).or_default() += r.amount;
        }
    }
    let total: f64 = sums.values().sum();
    let mut rows: Vec<ShareRow> = sums
        .into_iter()
        .map(|(value, amount)| ShareRow {
            value,
            amount,
            pct: if total != 0.0 { amount / total * 100.0 } else { 0.0 },
        })
        .collect();
    rows.sort_by(|a, b| b.amount.total_cmp(&a.amount).then_with(|| a.value.cmp(&b.value)));
    rows
}

// ---------------------------------------------------------------------------
// Activity heatmap
// ---------------------------------------------------------------------------

pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Day-of-week × hour-of-day grid of summed amounts. Always dense: unseen
/// cells hold 0.
#[derive(Debug, Clone, PartialEq)]
pub struct Heatmap {
    cells: [[f64; 24]; 7],
}

impl Heatmap {
    pub fn get(&self, day: Weekday, hour: u32) -> f64 {
        self.cells[day.num_days_from_monday() as usize][hour as usize % 24]
    }

    pub fn total(&self) -> f64 {
        self.cells.iter().flatten().sum()
    }

    pub fn max(&self) -> f64 {
        self.cells.iter().flatten().copied().fold(0.0, f64::max)
    }
}

pub fn activity_heatmap(table: &NormalizedTable) -> Heatmap {
    let mut cells = [[0.0f64; 24]; 7];
    for r in &table.records {
        let day = r.date.weekday().num_days_from_monday() as usize;
        let hour = r.date.hour() as usize;
        cells[day][hour] += r.amount;
    }
    Heatmap { cells }
}
