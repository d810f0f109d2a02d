use log::warn;

use crate::error::InsightError;
use crate::filter::{self, FilterSpec, FilterStatus};
use crate::forecast::{forecast_sales, Forecast, DEFAULT_HORIZON};
use crate::models::{Dimension, NormalizedTable};
use crate::reports::{self, BreakdownRow, Granularity, Heatmap, Kpis, ShareRow, TrendPoint};

/// Optional charts on top of the fixed KPI + trend core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Features {
    pub heatmap: bool,
    pub forecast: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            heatmap: true,
            forecast: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    pub granularity: Granularity,
    pub breakdown: Option<Dimension>,
    pub features: Features,
    pub forecast_horizon: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            granularity: Granularity::Month,
            breakdown: None,
            features: Features::default(),
            forecast_horizon: DEFAULT_HORIZON,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DimensionBreakdown {
    pub dimension: Dimension,
    pub rows: Vec<BreakdownRow>,
    pub share: Vec<ShareRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub status: FilterStatus,
    pub filtered: NormalizedTable,
    pub kpis: Kpis,
    pub granularity: Granularity,
    pub trend: Vec<TrendPoint>,
    pub breakdown: Option<DimensionBreakdown>,
    pub heatmap: Option<Heatmap>,
    pub forecast: Option<Forecast>,
    /// Charts that were requested but skipped, with the reason.
    pub notices: Vec<String>,
}

/// Filter once, then derive every enabled view from the same filtered rows.
pub fn build(table: &NormalizedTable, spec: &FilterSpec, config: &DashboardConfig) -> Dashboard {
    let filtered = filter::apply(table, spec);
    let status = FilterStatus::of(table, &filtered);
    let kpis = reports::kpis(&filtered);

    let mut dashboard = Dashboard {
        status,
        kpis,
        granularity: config.granularity,
        trend: Vec::new(),
        breakdown: None,
        heatmap: None,
        forecast: None,
        notices: Vec::new(),
        filtered,
    };
    if !status.has_rows() {
        return dashboard;
    }
    let filtered = &dashboard.filtered;

    dashboard.trend = reports::time_trend(filtered, config.granularity);

    if let Some(dim) = config.breakdown {
        if filtered.has_dimension(dim) {
            dashboard.breakdown = Some(DimensionBreakdown {
                dimension: dim,
                rows: reports::breakdown(filtered, dim),
                share: reports::share(filtered, dim),
            });
        } else {
            let notice = format!("No {} column in this file; breakdown skipped.", dim.label());
            warn!("{notice}");
            dashboard.notices.push(notice);
        }
    }

    if config.features.heatmap {
        dashboard.heatmap = Some(reports::activity_heatmap(filtered));
    }

    if config.features.forecast {
        match forecast_sales(filtered, config.forecast_horizon) {
            Ok(f) => dashboard.forecast = Some(f),
            Err(InsightError::InsufficientData(reason)) => {
                let notice = format!("Forecast skipped: {reason}.");
                warn!("{notice}");
                dashboard.notices.push(notice);
            }
            Err(e) => {
                let notice = format!("Forecast skipped: {e}");
                warn!("{notice}");
                dashboard.notices.push(notice);
            }
        }
    }

    dashboard
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{record, table};

    fn sample() -> NormalizedTable {
        table(vec![
            record("2024-01-01 09:00", 100.0, "Sales").with_dim(Dimension::Product, "Widget"),
            record("2024-01-02 14:00", 50.0, "Expense").with_dim(Dimension::Product, "Widget"),
            record("2024-01-03 09:00", 120.0, "Sales").with_dim(Dimension::Product, "Gadget"),
        ])
    }

    #[test]
    fn test_full_dashboard() {
        let t = sample();
        let config = DashboardConfig {
            breakdown: Some(Dimension::Product),
            ..Default::default()
        };
        let dash = build(&t, &FilterSpec::covering(&t), &config);
        assert_eq!(dash.status, FilterStatus::Rows(3));
        assert_eq!(dash.kpis.net_profit, 170.0);
        assert_eq!(dash.trend.len(), 2);
        assert_eq!(dash.breakdown.as_ref().unwrap().share[0].value, "Widget");
        assert!(dash.heatmap.is_some());
        assert_eq!(dash.forecast.as_ref().unwrap().points.len(), DEFAULT_HORIZON);
        assert!(dash.notices.is_empty());
    }

    #[test]
    fn test_optional_features_can_be_disabled() {
        let t = sample();
        let config = DashboardConfig {
            features: Features {
                heatmap: false,
                forecast: false,
            },
            ..Default::default()
        };
        let dash = build(&t, &FilterSpec::covering(&t), &config);
        assert!(dash.heatmap.is_none());
        assert!(dash.forecast.is_none());
        assert!(dash.breakdown.is_none());
    }

    #[test]
    fn test_insufficient_forecast_and_missing_dimension_become_notices() {
        let t = table(vec![
            record("2024-01-01 09:00", 100.0, "Sales"),
            record("2024-01-01 10:00", 20.0, "Expense"),
        ]);
        let config = DashboardConfig {
            breakdown: Some(Dimension::Customer),
            ..Default::default()
        };
        let dash = build(&t, &FilterSpec::covering(&t), &config);
        assert!(dash.forecast.is_none());
        assert!(dash.breakdown.is_none());
        assert_eq!(dash.notices.len(), 2);
        assert_eq!(dash.kpis.total_sales, 100.0);
    }

    #[test]
    fn test_forecast_past_last_date_becomes_notice() {
        let mut early = record("2024-01-01 09:00", 10.0, "Sales");
        early.date = (chrono::NaiveDate::MAX - chrono::Duration::days(2))
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let mut late = record("2024-01-01 09:00", 20.0, "Sales");
        late.date = chrono::NaiveDate::MAX.and_hms_opt(9, 0, 0).unwrap();
        let t = table(vec![early, late]);
        let config = DashboardConfig {
            features: Features {
                heatmap: false,
                forecast: true,
            },
            ..Default::default()
        };
        let dash = build(&t, &FilterSpec::covering(&t), &config);
        assert!(dash.forecast.is_none());
        assert_eq!(dash.notices.len(), 1);
        assert!(dash.notices[0].starts_with("Forecast skipped"));
        assert_eq!(dash.kpis.total_sales, 30.0);
    }

    #[test]
    fn test_empty_filter_result_is_a_status() {
        let t = sample();
        let spec = FilterSpec::covering(&t).with_kinds(["Refund".to_string()]);
        let dash = build(&t, &spec, &DashboardConfig::default());
        assert_eq!(dash.status, FilterStatus::Empty);
        assert!(dash.trend.is_empty());
        assert!(dash.forecast.is_none());
        assert!(dash.notices.is_empty());
    }

    #[test]
    fn test_rebuild_is_deterministic() {
        let t = sample();
        let spec = FilterSpec::covering(&t);
        let config = DashboardConfig {
            granularity: Granularity::Week,
            breakdown: Some(Dimension::Product),
            ..Default::default()
        };
        assert_eq!(build(&t, &spec, &config), build(&t, &spec, &config));
    }
}
