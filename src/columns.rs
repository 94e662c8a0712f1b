use crate::error::{AppError, Result};
use tracing::debug;

/// Lowercase substrings identifying the timestamp column, in preference order
pub const DATE_KEYWORDS: [&str; 3] = ["time", "period", "date"];

/// Lowercase substrings identifying the load column, in preference order
pub const LOAD_KEYWORDS: [&str; 2] = ["load", "value"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub date: String,
    pub load: String,
}

/// The first column, in table order, whose lowercased name contains any keyword
fn first_matching<'a>(columns: &'a [String], keywords: &[&str]) -> Option<&'a String> {
    columns.iter().find(|column| {
        let lowered = column.to_lowercase();
        keywords.iter().any(|keyword| lowered.contains(keyword))
    })
}

/// Pick the date and load columns out of `columns`.
///
/// Fails with [`AppError::Schema`] listing every column when either is missing.
pub fn resolve_columns(columns: &[String]) -> Result<ResolvedColumns> {
    let date = first_matching(columns, &DATE_KEYWORDS);
    let load = first_matching(columns, &LOAD_KEYWORDS);

    match (date, load) {
        (Some(date), Some(load)) => {
            debug!("Resolved date column '{}' and load column '{}'", date, load);
            Ok(ResolvedColumns {
                date: date.clone(),
                load: load.clone(),
            })
        }
        _ => Err(AppError::Schema {
            columns: columns.to_vec(),
        }),
    }
}
