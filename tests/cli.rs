use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const SALES_CSV: &str = "\
Date,Amount,Type,Product,Customer
2024-01-01 09:00,100,Sales,Widget,Acme
2024-01-02 14:00,50,Expense,Widget,
2024-01-03 09:00,120,sale,Gadget,Globex
";

/// Each test gets its own HOME so saved settings never leak between runs.
fn cmd(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("insightedge").unwrap();
    cmd.env("HOME", home).env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

fn write(dir: &TempDir, name: &str, body: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn test_summary_totals() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "sales.csv", SALES_CSV);
    cmd(dir.path())
        .arg("summary")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("$220.00"))
        .stdout(predicate::str::contains("$50.00"))
        .stdout(predicate::str::contains("$170.00"));
}

#[test]
fn test_columns_shows_mapping() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "sales.csv", SALES_CSV);
    cmd(dir.path())
        .arg("columns")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("3 of 3 rows usable"))
        .stdout(predicate::str::contains("Types: Sales, Expense"));
}

#[test]
fn test_missing_type_column_needs_label() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "plain.csv", "Date,Amount\n2024-01-01,10\n2024-01-02,20\n");
    cmd(dir.path())
        .arg("summary")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--type-label"));

    cmd(dir.path())
        .args(["summary", "--type-label", "Sales"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("$30.00"));
}

#[test]
fn test_unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "notes.txt", "hello");
    cmd(dir.path())
        .arg("summary")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported file format"));
}

#[test]
fn test_filter_with_no_matches_is_not_an_error() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "sales.csv", SALES_CSV);
    cmd(dir.path())
        .args(["summary", "--from", "2025-01-01"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("No rows match the current filters."));
}

#[test]
fn test_customer_filter() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "sales.csv", SALES_CSV);
    cmd(dir.path())
        .args(["summary", "--customer", "Acme"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("$100.00"));
}

#[test]
fn test_daily_trend() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "sales.csv", SALES_CSV);
    cmd(dir.path())
        .args(["trend", "--by", "day"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Daily Trends"))
        .stdout(predicate::str::contains("2024-01-03"));
}

#[test]
fn test_breakdown_share() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "sales.csv", SALES_CSV);
    cmd(dir.path())
        .args(["breakdown", "--by", "product", "--share"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Share by Product"))
        .stdout(predicate::str::contains("Widget"));
}

#[test]
fn test_breakdown_without_column_fails() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "sales.csv", SALES_CSV);
    cmd(dir.path())
        .args(["breakdown", "--by", "category"])
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No Category column"));
}

#[test]
fn test_heatmap_lists_weekdays() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "sales.csv", SALES_CSV);
    cmd(dir.path())
        .arg("heatmap")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Mon"))
        .stdout(predicate::str::contains("Sun"));
}

#[test]
fn test_forecast_projects_line() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "sales.csv", SALES_CSV);
    cmd(dir.path())
        .arg("forecast")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("30-Day Sales Forecast"))
        .stdout(predicate::str::contains("2024-02-01"))
        .stdout(predicate::str::contains("$410.00"));
}

#[test]
fn test_forecast_single_day_fails() {
    let dir = TempDir::new().unwrap();
    let file = write(
        &dir,
        "one.csv",
        "Date,Amount,Type\n2024-01-01 09:00,10,Sales\n2024-01-01 17:00,20,Sales\n",
    );
    cmd(dir.path())
        .arg("forecast")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not enough data to forecast"));
}

#[test]
fn test_dates_beyond_year_9999_are_dropped_not_fatal() {
    let dir = TempDir::new().unwrap();
    let file = write(
        &dir,
        "far.json",
        r#"[{"Date": 8210266617600000, "Amount": 10, "Type": "Sales"},
            {"Date": 8210266704000000, "Amount": 20, "Type": "Sales"}]"#,
    );
    cmd(dir.path())
        .arg("dashboard")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("No data available in this file."));
}

#[test]
fn test_dashboard_to_file() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "sales.csv", SALES_CSV);
    let out = dir.path().join("reports").join("dash.txt");
    cmd(dir.path())
        .args(["dashboard", "--breakdown", "product", "--no-heatmap"])
        .arg(&file)
        .arg("--output")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote"));
    let body = std::fs::read_to_string(&out).unwrap();
    assert!(body.contains("Key Figures"));
    assert!(body.contains("By Product"));
    assert!(!body.contains("Activity by Weekday"));
    assert!(!body.contains('\u{1b}'));
}

#[test]
fn test_export_csv() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "sales.csv", SALES_CSV);
    let out = dir.path().join("out.csv");
    cmd(dir.path())
        .args(["export", "--type", "sales"])
        .arg(&file)
        .arg("--output")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 2 rows"));
    let body = std::fs::read_to_string(&out).unwrap();
    let mut lines = body.lines();
    assert_eq!(lines.next(), Some("Date,Amount,Type,Product,Customer"));
    assert_eq!(lines.count(), 2);
}

#[cfg(feature = "xlsx")]
#[test]
fn test_export_xlsx_with_forecast() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "sales.csv", SALES_CSV);
    let out = dir.path().join("out.xlsx");
    cmd(dir.path())
        .args(["export", "--with-forecast"])
        .arg(&file)
        .arg("--output")
        .arg(&out)
        .assert()
        .success();
    assert!(out.exists());
}

#[test]
fn test_config_set_then_show() {
    let dir = TempDir::new().unwrap();
    cmd(dir.path())
        .args(["config", "set", "--granularity", "week", "--heatmap", "false"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved"));
    cmd(dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"granularity\": \"week\""))
        .stdout(predicate::str::contains("\"heatmap\": false"));
}

#[test]
fn test_saved_granularity_drives_trend() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "sales.csv", SALES_CSV);
    cmd(dir.path())
        .args(["config", "set", "--granularity", "week"])
        .assert()
        .success();
    cmd(dir.path())
        .arg("trend")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Weekly Trends"))
        .stdout(predicate::str::contains("2024-W01"));
}
