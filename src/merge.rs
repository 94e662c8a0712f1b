use crate::error::{AppError, Result};
use crate::models::{MergedRow, PowerRow, SolarRow, TempRow};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Convert a solar trading hour (1-24) back to the clock hour (0-23) it starts at
pub fn solar_clock_hour(reported_hour: u32) -> Result<u32> {
    match reported_hour {
        1..=24 => Ok(reported_hour - 1),
        _ => Err(AppError::Parse(format!(
            "Solar hour {} outside 1-24",
            reported_hour
        ))),
    }
}

fn at_hour(date: NaiveDate, hour: u32) -> Result<NaiveDateTime> {
    NaiveTime::from_hms_opt(hour, 0, 0)
        .map(|time| date.and_time(time))
        .ok_or_else(|| AppError::Parse(format!("Hour {} outside 0-23 on {}", hour, date)))
}

/// Temperature rows are keyed on the hour they fall in
pub(crate) fn truncate_to_hour(timestamp: NaiveDateTime) -> Result<NaiveDateTime> {
    at_hour(timestamp.date(), timestamp.hour())
}

/// Full outer join of the three tables on their hourly timestamp.
///
/// Output is ascending by timestamp with one row per distinct timestamp. When
/// a source repeats a timestamp its first occurrence is kept.
pub fn merge(power: &[PowerRow], temperature: &[TempRow], solar: &[SolarRow]) -> Result<Vec<MergedRow>> {
    let mut joined: BTreeMap<NaiveDateTime, MergedRow> = BTreeMap::new();
    let mut duplicates = 0usize;

    for row in power {
        let merged = slot(&mut joined, at_hour(row.date, row.hour)?);
        if merged.nyc.is_some() {
            duplicates += 1;
            continue;
        }
        merged.nyc = Some(row.nyc);
        merged.nj = Some(row.nj);
        merged.ct = Some(row.ct);
    }

    for row in temperature {
        let merged = slot(&mut joined, truncate_to_hour(row.timestamp)?);
        if merged.temperature.is_some() {
            duplicates += 1;
            continue;
        }
        merged.temperature = Some(row.temperature);
    }

    for row in solar {
        let hour = solar_clock_hour(row.reported_hour)?;
        let merged = slot(&mut joined, at_hour(row.date, hour)?);
        if merged.solar.is_some() {
            duplicates += 1;
            continue;
        }
        merged.solar = Some(row.output);
    }

    if duplicates > 0 {
        warn!("Dropped {} rows with a repeated timestamp", duplicates);
    }

    let merged: Vec<MergedRow> = joined.into_values().collect();
    info!("Merged into {} hourly rows", merged.len());
    Ok(merged)
}

fn slot(joined: &mut BTreeMap<NaiveDateTime, MergedRow>, timestamp: NaiveDateTime) -> &mut MergedRow {
    joined.entry(timestamp).or_insert_with(|| MergedRow {
        timestamp,
        nyc: None,
        nj: None,
        ct: None,
        solar: None,
        temperature: None,
    })
}
