use std::collections::BTreeMap;

use log::debug;

use crate::error::{InsightError, Result};
use crate::importer::{value_to_amount, value_to_datetime};
use crate::models::{
    Column, Dimension, NormalizationReport, NormalizedTable, RawTable, Record, SchemaMapping,
    EXPENSE, SALES,
};

// ---------------------------------------------------------------------------
// Column inference rules
// ---------------------------------------------------------------------------

/// One way of recognising a column by its header.
#[derive(Debug, Clone, Copy)]
enum ColumnRule {
    /// Header equals the name exactly.
    Exact(&'static str),
    /// Header equals the name, ignoring case and surrounding whitespace.
    IgnoreCase(&'static str),
    /// Lowercased header contains any of the needles.
    Contains(&'static [&'static str]),
}

impl ColumnRule {
    fn matches(&self, header: &str) -> bool {
        match self {
            Self::Exact(name) => header == *name,
            Self::IgnoreCase(name) => header.trim().eq_ignore_ascii_case(name),
            Self::Contains(needles) => {
                let lower = header.to_lowercase();
                needles.iter().any(|n| lower.contains(n))
            }
        }
    }
}

const DATE_RULES: &[ColumnRule] = &[ColumnRule::Exact("Date"), ColumnRule::Contains(&["date"])];

const AMOUNT_RULES: &[ColumnRule] = &[
    ColumnRule::Exact("Amount"),
    ColumnRule::Contains(&["amount", "total"]),
];

const TYPE_RULES: &[ColumnRule] = &[ColumnRule::Exact("Type"), ColumnRule::IgnoreCase("type")];

fn dimension_rules(dim: Dimension) -> &'static [ColumnRule] {
    match dim {
        Dimension::Product => &[ColumnRule::Exact("Product"), ColumnRule::Contains(&["product"])],
        Dimension::Category => &[ColumnRule::Exact("Category"), ColumnRule::Contains(&["category"])],
        Dimension::Customer => &[
            ColumnRule::Exact("Customer"),
            ColumnRule::Contains(&["customer", "client"]),
        ],
    }
}

/// Try each rule in order; the first rule that matches any unclaimed column wins,
/// and within a rule the leftmost column wins.
fn infer(rules: &[ColumnRule], columns: &[String], claimed: &[usize]) -> Option<Column> {
    rules.iter().find_map(|rule| {
        columns
            .iter()
            .enumerate()
            .filter(|(i, _)| !claimed.contains(i))
            .find(|(_, name)| rule.matches(name))
            .map(|(index, name)| Column {
                index,
                name: name.clone(),
            })
    })
}

fn explicit(columns: &[String], name: &str) -> Result<Column> {
    columns
        .iter()
        .position(|c| c == name)
        .map(|index| Column {
            index,
            name: name.to_string(),
        })
        .ok_or_else(|| InsightError::UnknownColumn(name.to_string()))
}

// ---------------------------------------------------------------------------
// Type labels
// ---------------------------------------------------------------------------

/// Trim and capitalize a type label, folding the singular/plural spellings
/// onto the two canonical labels. Blank input yields `None`.
pub fn canonical_type(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_lowercase();
    let label = match lower.as_str() {
        "sales" | "sale" => SALES.to_string(),
        "expense" | "expenses" => EXPENSE.to_string(),
        _ => {
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        }
    };
    Some(label)
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Caller-supplied answers for what inference cannot decide on its own.
#[derive(Debug, Clone, Default)]
pub struct NormalizeOptions {
    pub date_column: Option<String>,
    pub amount_column: Option<String>,
    /// Label applied to every row when the file has no Type column.
    pub type_label: Option<String>,
}

pub fn infer_schema(columns: &[String], opts: &NormalizeOptions) -> Result<SchemaMapping> {
    let date = match &opts.date_column {
        Some(name) => explicit(columns, name)?,
        None => infer(DATE_RULES, columns, &[]).ok_or(InsightError::MissingColumn("Date", "date"))?,
    };
    let amount = match &opts.amount_column {
        Some(name) => explicit(columns, name)?,
        None => infer(AMOUNT_RULES, columns, &[date.index])
            .ok_or(InsightError::MissingColumn("Amount", "amount"))?,
    };

    let mut claimed = vec![date.index, amount.index];
    let kind = infer(TYPE_RULES, columns, &claimed);
    if let Some(k) = &kind {
        claimed.push(k.index);
    }

    let mut dimensions = Vec::new();
    for dim in Dimension::ALL {
        if let Some(col) = infer(dimension_rules(dim), columns, &claimed) {
            claimed.push(col.index);
            dimensions.push((dim, col));
        }
    }

    debug!(
        "schema: date={:?} amount={:?} type={:?} dimensions={:?}",
        date.name,
        amount.name,
        kind.as_ref().map(|k| &k.name),
        dimensions.iter().map(|(d, c)| (d.label(), &c.name)).collect::<Vec<_>>()
    );

    Ok(SchemaMapping {
        date,
        amount,
        kind,
        dimensions,
    })
}

/// Turn a raw table into canonical records. Rows whose date or amount cannot
/// be parsed are dropped and counted in the report, never zero-filled.
pub fn normalize(raw: &RawTable, opts: &NormalizeOptions) -> Result<NormalizedTable> {
    let mapping = infer_schema(&raw.columns, opts)?;
    let fallback = opts.type_label.as_deref().and_then(canonical_type);
    if mapping.kind.is_none() && fallback.is_none() {
        return Err(InsightError::MissingTypeColumn);
    }

    let mut used: Vec<usize> = vec![mapping.date.index, mapping.amount.index];
    used.extend(mapping.kind.as_ref().map(|k| k.index));
    used.extend(mapping.dimensions.iter().map(|(_, c)| c.index));
    let extra_indices: Vec<usize> = (0..raw.columns.len()).filter(|i| !used.contains(i)).collect();
    let extra_columns = extra_indices.iter().map(|&i| raw.columns[i].clone()).collect();

    let mut report = NormalizationReport {
        total_rows: raw.rows.len(),
        ..Default::default()
    };
    let mut records = Vec::with_capacity(raw.rows.len());

    for row in 0..raw.rows.len() {
        let Some(date) = value_to_datetime(raw.cell(row, mapping.date.index)) else {
            report.bad_dates += 1;
            continue;
        };
        let Some(amount) = value_to_amount(raw.cell(row, mapping.amount.index)) else {
            report.bad_amounts += 1;
            continue;
        };
        let kind = match &mapping.kind {
            Some(col) => canonical_type(&raw.cell(row, col.index).to_string()).or_else(|| fallback.clone()),
            None => fallback.clone(),
        };
        let Some(kind) = kind else {
            report.missing_types += 1;
            continue;
        };

        let mut dimensions = BTreeMap::new();
        for (dim, col) in &mapping.dimensions {
            let value = raw.cell(row, col.index).to_string();
            let value = value.trim();
            if !value.is_empty() {
                dimensions.insert(*dim, value.to_string());
            }
        }

        records.push(Record {
            date,
            amount,
            kind,
            dimensions,
            extra: extra_indices.iter().map(|&i| raw.cell(row, i).clone()).collect(),
        });
    }

    if report.dropped() > 0 {
        debug!(
            "dropped {} of {} rows (bad dates: {}, bad amounts: {}, missing types: {})",
            report.dropped(),
            report.total_rows,
            report.bad_dates,
            report.bad_amounts,
            report.missing_types
        );
    }

    Ok(NormalizedTable {
        records,
        mapping,
        extra_columns,
        report,
    })
}
