use chrono::{Datelike, Duration, NaiveDate};
use log::debug;

use crate::error::{InsightError, Result};
use crate::models::NormalizedTable;

pub const DEFAULT_HORIZON: usize = 30;

/// Days since 0001-01-01 (proleptic Gregorian), the regression input.
pub fn ordinal(date: NaiveDate) -> i64 {
    date.num_days_from_ce() as i64
}

/// `y = slope * x + intercept`, fitted by ordinary least squares.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn fit(points: &[(i64, f64)]) -> Result<Self> {
        let (Some(min_x), Some(max_x)) = (
            points.iter().map(|p| p.0).min(),
            points.iter().map(|p| p.0).max(),
        ) else {
            return Err(InsightError::InsufficientData("no sales rows".into()));
        };
        if min_x == max_x {
            return Err(InsightError::InsufficientData(
                "sales rows must span at least two distinct dates".into(),
            ));
        }

        let n = points.len() as f64;
        let mean_x = points.iter().map(|p| p.0 as f64).sum::<f64>() / n;
        let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;
        let (mut sxx, mut sxy) = (0.0, 0.0);
        for &(x, y) in points {
            let dx = x as f64 - mean_x;
            sxx += dx * dx;
            sxy += dx * (y - mean_y);
        }
        let slope = sxy / sxx;
        Ok(Self {
            slope,
            intercept: mean_y - slope * mean_x,
        })
    }

    pub fn predict(&self, x: i64) -> f64 {
        self.slope * x as f64 + self.intercept
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub fit: LinearFit,
    pub last_observed: NaiveDate,
    pub points: Vec<ForecastPoint>,
}

/// Fit a line through every Sales row and project `horizon` daily points.
/// The first projected date is the last observed Sales date itself.
pub fn forecast_sales(table: &NormalizedTable, horizon: usize) -> Result<Forecast> {
    let history: Vec<(i64, f64)> = table
        .records
        .iter()
        .filter(|r| r.is_sales())
        .map(|r| (ordinal(r.date.date()), r.amount))
        .collect();
    let fit = LinearFit::fit(&history)?;

    let last_observed = table
        .records
        .iter()
        .filter(|r| r.is_sales())
        .map(|r| r.date.date())
        .max()
        .ok_or_else(|| InsightError::InsufficientData("no sales rows".into()))?;

    // The last projected date must exist before any point is built.
    let fits = horizon == 0
        || i64::try_from(horizon - 1)
            .ok()
            .and_then(Duration::try_days)
            .and_then(|span| last_observed.checked_add_signed(span))
            .is_some();
    if !fits {
        return Err(InsightError::Other(format!(
            "a {horizon}-day forecast from {last_observed} runs past the last supported date"
        )));
    }

    let points = (0..horizon)
        .map(|offset| {
            let date = last_observed + Duration::days(offset as i64);
            ForecastPoint {
                date,
                amount: fit.predict(ordinal(date)),
            }
        })
        .collect();
    debug!(
        "forecast: slope {:.4}/day over {} sales rows, {} points from {}",
        fit.slope,
        history.len(),
        horizon,
        last_observed
    );

    Ok(Forecast {
        fit,
        last_observed,
        points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{record, table};

    fn linear_sales(days: i64) -> NormalizedTable {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        table(
            (0..days)
                .map(|i| {
                    let date = (start + Duration::days(i)).format("%Y-%m-%d 10:00").to_string();
                    record(&date, 10.0 * i as f64 + 100.0, "Sales")
                })
                .collect(),
        )
    }

    #[test]
    fn test_perfect_line_is_recovered() {
        let t = linear_sales(10);
        let f = forecast_sales(&t, DEFAULT_HORIZON).unwrap();
        assert!((f.fit.slope - 10.0).abs() < 1e-9);
        assert_eq!(f.points.len(), 30);
        // points[0] is day 9 (the last observed date), so day_index = 9 + k
        for k in 1..=5 {
            let expected = 10.0 * (9 + k) as f64 + 100.0;
            assert!((f.points[k].amount - expected).abs() < 1e-6, "k={k}");
        }
    }

    #[test]
    fn test_forecast_starts_at_last_sales_date_with_daily_spacing() {
        let mut t = linear_sales(3);
        // A later expense must not move the start date.
        t.records.push(record("2024-04-30 00:00", 5.0, "Expense"));
        let f = forecast_sales(&t, 4).unwrap();
        let dates: Vec<String> = f.points.iter().map(|p| p.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-03-03", "2024-03-04", "2024-03-05", "2024-03-06"]);
        assert_eq!(f.last_observed, NaiveDate::from_ymd_opt(2024, 3, 3).unwrap());
    }

    #[test]
    fn test_same_day_sales_are_insufficient() {
        let t = table(vec![
            record("2024-01-01 09:00", 10.0, "Sales"),
            record("2024-01-01 17:00", 30.0, "Sales"),
            record("2024-01-05 09:00", 99.0, "Expense"),
        ]);
        assert!(matches!(
            forecast_sales(&t, DEFAULT_HORIZON),
            Err(InsightError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_no_sales_is_insufficient() {
        let t = table(vec![record("2024-01-01 09:00", 10.0, "Expense")]);
        assert!(matches!(forecast_sales(&t, 30), Err(InsightError::InsufficientData(_))));
    }

    #[test]
    fn test_zero_horizon_yields_no_points() {
        let f = forecast_sales(&linear_sales(5), 0).unwrap();
        assert!(f.points.is_empty());
    }

    #[test]
    fn test_horizon_past_max_date_is_an_error() {
        let mut early = record("2024-01-01 09:00", 10.0, "Sales");
        early.date = (NaiveDate::MAX - Duration::days(2)).and_hms_opt(9, 0, 0).unwrap();
        let mut late = record("2024-01-01 09:00", 20.0, "Sales");
        late.date = NaiveDate::MAX.and_hms_opt(9, 0, 0).unwrap();
        let t = table(vec![early, late]);
        assert!(matches!(forecast_sales(&t, 30), Err(InsightError::Other(_))));
        assert!(matches!(forecast_sales(&t, usize::MAX), Err(InsightError::Other(_))));
        // A single point on the last date itself still fits.
        assert_eq!(forecast_sales(&t, 1).unwrap().points.len(), 1);
    }

    #[test]
    fn test_noisy_fit_matches_closed_form() {
        let fit = LinearFit::fit(&[(0, 1.0), (1, 3.0), (2, 2.0), (3, 5.0)]).unwrap();
        // mean_x 1.5, mean_y 2.75, sxy 5.5, sxx 5.0
        assert!((fit.slope - 1.1).abs() < 1e-12);
        assert!((fit.intercept - 1.1).abs() < 1e-12);
    }
}
