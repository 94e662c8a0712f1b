use crate::error::{AppError, Result};
use csv::ReaderBuilder;
use tracing::debug;

pub const DEFAULT_HEADER_SCAN_LINES: usize = 20;

/// Substrings marking the header line, matched case-sensitively
const HEADER_MARKERS: [&str; 3] = ["Time", "Period", "Date"];

/// Index of the first line among the first `max_lines` that looks like a header.
///
/// Files published by EIA may carry a few lines of preamble before the
/// column names. Falls back to line 0 when no marker is found.
pub fn detect_header_row(content: &str, max_lines: usize) -> usize {
    let index = content
        .lines()
        .take(max_lines)
        .position(|line| HEADER_MARKERS.iter().any(|marker| line.contains(marker)))
        .unwrap_or(0);

    debug!("Detected header row at line {}", index);
    index
}

/// Loosely typed table as read from the source CSV
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// Parse `content` as CSV, using line `header_row` for the column names.
///
/// Lines above the header are discarded. Rows shorter than the header are
/// padded with empty cells; rows longer than the header are rejected.
pub fn load_table(content: &str, header_row: usize) -> Result<RawTable> {
    let body: String = content
        .lines()
        .skip(header_row)
        .collect::<Vec<_>>()
        .join("\n");

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| AppError::Parse(format!("Failed to read CSV headers: {}", e)))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_num, result) in reader.records().enumerate() {
        let record = result
            .map_err(|e| AppError::Parse(format!("CSV parse error at row {}: {}", row_num + 1, e)))?;

        if record.len() > columns.len() {
            return Err(AppError::Parse(format!(
                "Row {} has {} fields but the header has {}",
                row_num + 1,
                record.len(),
                columns.len()
            )));
        }

        let mut cells: Vec<String> = record.iter().map(str::to_string).collect();
        cells.resize(columns.len(), String::new());
        rows.push(cells);
    }

    debug!("Loaded {} rows with columns {:?}", rows.len(), columns);
    Ok(RawTable { columns, rows })
}
