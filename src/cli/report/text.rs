use std::collections::BTreeSet;

use colored::{ColoredString, Colorize};
use comfy_table::{Cell, CellAlignment, Table};

use crate::filter::FilterStatus;
use crate::fmt::{compact, money, pct};
use crate::forecast::Forecast;
use crate::models::{NormalizedTable, EXPENSE, SALES};
use crate::pipeline::{Dashboard, DimensionBreakdown};
use crate::reports::{Granularity, Heatmap, Kpis, TrendPoint, WEEKDAYS};
use crate::settings::Theme;

// ---------------------------------------------------------------------------
// Palette
// ---------------------------------------------------------------------------

/// Colors for one render, chosen from the session theme.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    theme: Theme,
}

impl Palette {
    pub fn new(theme: Theme) -> Self {
        Self { theme }
    }

    pub fn heading(&self, s: &str) -> ColoredString {
        match self.theme {
            Theme::Dark => s.yellow().bold(),
            Theme::Light => s.blue().bold(),
            Theme::Plain => s.normal(),
        }
    }

    pub fn gain(&self, s: &str) -> ColoredString {
        match self.theme {
            Theme::Plain => s.normal(),
            _ => s.green().bold(),
        }
    }

    pub fn loss(&self, s: &str) -> ColoredString {
        match self.theme {
            Theme::Plain => s.normal(),
            _ => s.red().bold(),
        }
    }

    pub fn muted(&self, s: &str) -> ColoredString {
        match self.theme {
            Theme::Plain => s.normal(),
            _ => s.dimmed(),
        }
    }

    fn signed(&self, val: f64, s: &str) -> ColoredString {
        if val < 0.0 {
            self.loss(s)
        } else {
            self.gain(s)
        }
    }
}

fn amount_cell(val: f64) -> Cell {
    Cell::new(money(val)).set_alignment(CellAlignment::Right)
}

/// Sales first, Expense second, any other label after in name order.
fn ordered_kinds<'a, I: IntoIterator<Item = &'a str>>(kinds: I) -> Vec<String> {
    let set: BTreeSet<&str> = kinds.into_iter().collect();
    let mut out: Vec<String> = [SALES, EXPENSE]
        .into_iter()
        .filter(|k| set.contains(k))
        .map(str::to_string)
        .collect();
    out.extend(
        set.into_iter()
            .filter(|k| *k != SALES && *k != EXPENSE)
            .map(str::to_string),
    );
    out
}

// ---------------------------------------------------------------------------
// Pure formatting functions (core data → String)
// ---------------------------------------------------------------------------

pub fn format_columns(table: &NormalizedTable, p: &Palette) -> String {
    let m = &table.mapping;
    let mut t = Table::new();
    t.set_header(vec!["Field", "Source column"]);
    t.add_row(vec!["Date".to_string(), m.date.name.clone()]);
    t.add_row(vec!["Amount".to_string(), m.amount.name.clone()]);
    t.add_row(vec![
        "Type".to_string(),
        m.kind
            .as_ref()
            .map(|k| k.name.clone())
            .unwrap_or_else(|| "(whole file labelled)".to_string()),
    ]);
    for (dim, col) in &m.dimensions {
        t.add_row(vec![dim.label().to_string(), col.name.clone()]);
    }
    if !table.extra_columns.is_empty() {
        t.add_row(vec!["Other".to_string(), table.extra_columns.join(", ")]);
    }

    let r = &table.report;
    let mut out = format!("{}\n{t}\n", p.heading("Column Mapping"));
    out.push_str(&format!("{} of {} rows usable", table.len(), r.total_rows));
    if r.dropped() > 0 {
        let detail = format!(
            " ({} dropped: {} bad dates, {} bad amounts, {} missing types)",
            r.dropped(),
            r.bad_dates,
            r.bad_amounts,
            r.missing_types
        );
        out.push_str(&p.loss(&detail).to_string());
    }
    if let Some((start, end)) = table.date_span() {
        out.push_str(&format!("\nDates {start} to {end}"));
    }
    let kinds = table.kinds();
    if !kinds.is_empty() {
        let kinds: Vec<&str> = kinds.iter().map(String::as_str).collect();
        out.push_str(&format!("\nTypes: {}", ordered_kinds(kinds).join(", ")));
    }
    out
}

pub fn format_status(status: FilterStatus, p: &Palette) -> String {
    match status {
        FilterStatus::Rows(_) => p.muted(&status.message()).to_string(),
        _ => p.loss(&status.message()).to_string(),
    }
}

pub fn format_kpis(k: &Kpis, p: &Palette) -> String {
    let mut t = Table::new();
    t.set_header(vec!["Metric", "Amount"]);
    t.add_row(vec![Cell::new("Total Sales"), amount_cell(k.total_sales)]);
    t.add_row(vec![Cell::new("Total Expenses"), amount_cell(k.total_expenses)]);
    t.add_row(vec![
        Cell::new(p.signed(k.net_profit, "Net Profit")),
        amount_cell(k.net_profit),
    ]);
    format!("{}\n{t}", p.heading("Key Figures"))
}

pub fn format_trend(points: &[TrendPoint], granularity: Granularity, p: &Palette) -> String {
    let kinds = ordered_kinds(points.iter().map(|pt| pt.kind.as_str()));
    let with_net = kinds.iter().any(|k| k == SALES) && kinds.iter().any(|k| k == EXPENSE);

    let mut header = vec!["Period".to_string()];
    header.extend(kinds.iter().cloned());
    if with_net {
        header.push("Net".to_string());
    }
    let mut t = Table::new();
    t.set_header(header);

    // points are sorted by bucket, so equal buckets are adjacent
    let mut i = 0;
    while i < points.len() {
        let bucket = points[i].bucket;
        let mut j = i;
        while j < points.len() && points[j].bucket == bucket {
            j += 1;
        }
        let group = &points[i..j];
        let amount_of = |kind: &str| -> f64 {
            group.iter().filter(|pt| pt.kind == kind).map(|pt| pt.amount).sum()
        };
        let mut row = vec![Cell::new(&points[i].label)];
        row.extend(kinds.iter().map(|k| amount_cell(amount_of(k))));
        if with_net {
            row.push(amount_cell(amount_of(SALES) - amount_of(EXPENSE)));
        }
        t.add_row(row);
        i = j;
    }

    let title = format!("{} Trends: Sales vs Expenses", granularity.title());
    format!("{}\n{t}", p.heading(&title))
}

pub fn format_breakdown(b: &DimensionBreakdown, p: &Palette) -> String {
    let kinds = ordered_kinds(b.rows.iter().map(|r| r.kind.as_str()));
    let values: BTreeSet<&str> = b.rows.iter().map(|r| r.value.as_str()).collect();

    let mut header = vec![b.dimension.label().to_string()];
    header.extend(kinds.iter().cloned());
    let mut t = Table::new();
    t.set_header(header);
    for value in values {
        let mut row = vec![Cell::new(value)];
        for kind in &kinds {
            let amount: f64 = b
                .rows
                .iter()
                .filter(|r| r.value == value && &r.kind == kind)
                .map(|r| r.amount)
                .sum();
            row.push(amount_cell(amount));
        }
        t.add_row(row);
    }
    let title = format!("By {}", b.dimension.label());
    format!("{}\n{t}", p.heading(&title))
}

pub fn format_share(b: &DimensionBreakdown, p: &Palette) -> String {
    let mut t = Table::new();
    t.set_header(vec![b.dimension.label(), "Amount", "%"]);
    for row in &b.share {
        t.add_row(vec![
            Cell::new(&row.value),
            amount_cell(row.amount),
            Cell::new(pct(row.pct)).set_alignment(CellAlignment::Right),
        ]);
    }
    let title = format!("Share by {}", b.dimension.label());
    format!("{}\n{t}", p.heading(&title))
}

pub fn format_heatmap(h: &Heatmap, p: &Palette) -> String {
    let mut header = vec!["Day".to_string()];
    header.extend((0..24).map(|hour| format!("{hour:02}")));
    let mut t = Table::new();
    t.set_header(header);

    let peak = h.max();
    for day in WEEKDAYS {
        let mut row = vec![Cell::new(day.to_string())];
        for hour in 0..24 {
            let val = h.get(day, hour);
            let s = compact(val);
            let s = if peak > 0.0 && val == peak {
                p.gain(&s).to_string()
            } else if val == 0.0 {
                p.muted(&s).to_string()
            } else {
                s
            };
            row.push(Cell::new(s).set_alignment(CellAlignment::Right));
        }
        t.add_row(row);
    }
    format!(
        "{}\n{t}\nTotal {}",
        p.heading("Activity by Weekday and Hour"),
        money(h.total())
    )
}

pub fn format_forecast(f: &Forecast, p: &Palette) -> String {
    let mut t = Table::new();
    t.set_header(vec!["Date", "Forecasted Sales"]);
    for pt in &f.points {
        t.add_row(vec![Cell::new(pt.date.to_string()), amount_cell(pt.amount)]);
    }
    let title = format!("{}-Day Sales Forecast", f.points.len());
    let trend = format!("{}/day", money(f.fit.slope));
    format!(
        "{}\nFrom {} · trend {}\n{t}",
        p.heading(&title),
        f.last_observed,
        p.signed(f.fit.slope, &trend)
    )
}

pub fn format_dashboard(d: &Dashboard, p: &Palette) -> String {
    let mut sections = vec![format_status(d.status, p)];
    if d.status.has_rows() {
        sections.push(format_kpis(&d.kpis, p));
        sections.push(format_trend(&d.trend, d.granularity, p));
        if let Some(b) = &d.breakdown {
            sections.push(format_breakdown(b, p));
            sections.push(format_share(b, p));
        }
        if let Some(h) = &d.heatmap {
            sections.push(format_heatmap(h, p));
        }
        if let Some(f) = &d.forecast {
            sections.push(format_forecast(f, p));
        }
    }
    for notice in &d.notices {
        sections.push(p.muted(notice).to_string());
    }
    sections.join("\n\n")
}
