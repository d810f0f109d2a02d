use thiserror::Error;

#[derive(Error, Debug)]
pub enum InsightError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "xlsx")]
    #[error("Excel error: {0}")]
    Excel(#[from] calamine::Error),

    #[cfg(feature = "xlsx")]
    #[error("Spreadsheet export error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("No {0} column found. Pick one explicitly with --{1}-column")]
    MissingColumn(&'static str, &'static str),

    #[error("Column not found: {0}")]
    UnknownColumn(String),

    #[error("No Type column found. Supply a label for the whole file with --type-label (e.g. Sales)")]
    MissingTypeColumn,

    #[error("Not enough data to forecast: {0}")]
    InsufficientData(String),

    #[error("Invalid date '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, InsightError>;
