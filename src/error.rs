use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("No date-like or load-like column found. Available columns: {columns:?}")]
    Schema { columns: Vec<String> },

    #[error(
        "No rows between {start} and {end}. Available range: {}",
        format_bounds(.min, .max)
    )]
    EmptyRange {
        start: NaiveDate,
        end: NaiveDate,
        min: Option<NaiveDateTime>,
        max: Option<NaiveDateTime>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_bounds(min: &Option<NaiveDateTime>, max: &Option<NaiveDateTime>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!("{} ~ {}", min, max),
        _ => "no rows".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
