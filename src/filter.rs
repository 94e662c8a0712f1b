use crate::error::{AppError, Result};
use crate::table::RawTable;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use tracing::{debug, info};

/// Date-and-time layouts accepted in the source timestamp column
const DATETIME_FORMATS: [&str; 11] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// Date-only layouts, read as midnight
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

/// Inclusive `[start, end]` range of calendar days
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Ok(Self::new(parse_date(start)?, parse_date(end)?))
    }

    pub fn contains(&self, timestamp: &NaiveDateTime) -> bool {
        let day = timestamp.date();
        day >= self.start && day <= self.end
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| AppError::Parse(format!("Invalid date '{}': {}", s, e)))
}

/// Parse one cell of the source timestamp column.
///
/// Offsets (RFC 3339) are dropped and the wall-clock time kept.
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_local());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(dt);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Ok(date.and_time(NaiveTime::MIN));
        }
    }

    Err(AppError::Parse(format!("Unrecognized date/time value '{}'", s)))
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimedRow {
    pub timestamp: NaiveDateTime,
    pub cells: Vec<String>,
}

/// Rows of a [`RawTable`] inside a window, sorted by their parsed timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredTable {
    pub columns: Vec<String>,
    pub rows: Vec<TimedRow>,
}

impl FilteredTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// Parse `date_column`, sort ascending and keep the rows inside `window`.
///
/// Any unparseable timestamp fails the whole table. An empty result is an
/// [`AppError::EmptyRange`] carrying the bounds of what was available.
pub fn filter_range(table: &RawTable, date_column: &str, window: DateWindow) -> Result<FilteredTable> {
    let index = table
        .column_index(date_column)
        .ok_or_else(|| AppError::Schema {
            columns: table.columns.clone(),
        })?;

    let mut rows = table
        .rows
        .iter()
        .enumerate()
        .map(|(row_num, cells)| {
            let raw = cells.get(index).map(String::as_str).unwrap_or("");
            let timestamp = parse_timestamp(raw).map_err(|e| {
                AppError::Parse(format!("Row {} column '{}': {}", row_num + 1, date_column, e))
            })?;
            Ok(TimedRow {
                timestamp,
                cells: cells.clone(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    rows.sort_by_key(|row| row.timestamp);

    let min = rows.first().map(|row| row.timestamp);
    let max = rows.last().map(|row| row.timestamp);
    debug!("Parsed {} timestamps spanning {:?} ~ {:?}", rows.len(), min, max);

    rows.retain(|row| window.contains(&row.timestamp));

    if rows.is_empty() {
        return Err(AppError::EmptyRange {
            start: window.start,
            end: window.end,
            min,
            max,
        });
    }

    info!(
        "Kept {} rows between {} and {}",
        rows.len(),
        window.start,
        window.end
    );

    Ok(FilteredTable {
        columns: table.columns.clone(),
        rows,
    })
}
