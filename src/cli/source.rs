use chrono::NaiveDate;

use crate::cli::SourceArgs;
use crate::error::{InsightError, Result};
use crate::filter::FilterSpec;
use crate::importer::load_table;
use crate::models::{Dimension, NormalizedTable};
use crate::normalizer::{canonical_type, normalize, NormalizeOptions};

/// One loaded file and the filters requested for it.
pub struct Session {
    pub table: NormalizedTable,
    pub spec: FilterSpec,
}

pub fn parse_date_arg(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| InsightError::InvalidDate(raw.to_string()))
}

pub fn open(args: &SourceArgs) -> Result<Session> {
    let raw = load_table(&args.file)?;
    let opts = NormalizeOptions {
        date_column: args.date_column.clone(),
        amount_column: args.amount_column.clone(),
        type_label: args.type_label.clone(),
    };
    let table = normalize(&raw, &opts)?;
    let spec = build_spec(&table, args)?;
    Ok(Session { table, spec })
}

pub fn build_spec(table: &NormalizedTable, args: &SourceArgs) -> Result<FilterSpec> {
    let start = args.from_date.as_deref().map(parse_date_arg).transpose()?;
    let end = args.to_date.as_deref().map(parse_date_arg).transpose()?;
    if let (Some(s), Some(e)) = (start, end) {
        if s > e {
            return Err(InsightError::Other(format!("--from {s} is after --to {e}")));
        }
    }

    let mut spec = FilterSpec::covering(table).with_range(start, end);
    if !args.types.is_empty() {
        spec = spec.with_kinds(args.types.iter().filter_map(|t| canonical_type(t)));
    }
    let dimension_args = [
        (Dimension::Product, &args.products),
        (Dimension::Category, &args.categories),
        (Dimension::Customer, &args.customers),
    ];
    for (dim, values) in dimension_args {
        if !values.is_empty() {
            spec = spec.with_dimension(dim, values.iter().map(|v| v.trim().to_string()));
        }
    }
    Ok(spec)
}
