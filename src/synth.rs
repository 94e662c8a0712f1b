use crate::error::{AppError, Result};
use crate::filter::{FilteredTable, TimedRow};
use crate::merge::truncate_to_hour;
use crate::models::{PowerRow, SolarRow, TempRow};
use chrono::{NaiveDateTime, Timelike};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use std::f64::consts::PI;
use tracing::info;

/// Share of the total load attributed to each utility; sums to 1
pub const NYC_SHARE: f64 = 0.45;
pub const NJ_SHARE: f64 = 0.30;
pub const CT_SHARE: f64 = 0.25;

const BASE_TEMPERATURE_C: f64 = 28.0;
const TEMPERATURE_AMPLITUDE_C: f64 = 5.0;
const TEMPERATURE_PHASE_HOUR: f64 = 14.0;

pub const SOLAR_FIRST_HOUR: u32 = 6;
pub const SOLAR_LAST_HOUR: u32 = 19;
pub const SOLAR_CAPACITY: f64 = 90.0;
const SOLAR_NOON: f64 = 12.5;
const SOLAR_SPREAD: f64 = 6.0;
const CLEAR_SKY_PROBABILITY: f64 = 0.8;
const CLOUDY_FACTOR: f64 = 0.6;

#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedTables {
    pub power: Vec<PowerRow>,
    pub temperature: Vec<TempRow>,
    pub solar: Vec<SolarRow>,
}

/// Round half-to-even at one decimal place
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}

/// Clear-sky solar efficiency in `(0, 1]` for an hour inside the daylight window
pub fn solar_efficiency(hour: u32) -> f64 {
    let offset = hour as f64 - SOLAR_NOON;
    (-(offset * offset) / SOLAR_SPREAD).exp()
}

pub fn is_daylight(hour: u32) -> bool {
    (SOLAR_FIRST_HOUR..=SOLAR_LAST_HOUR).contains(&hour)
}

/// Diurnal temperature curve without noise
pub fn temperature_baseline(hour: u32) -> f64 {
    let phase = (hour as f64 - TEMPERATURE_PHASE_HOUR) * 2.0 * PI / 24.0;
    BASE_TEMPERATURE_C + TEMPERATURE_AMPLITUDE_C * phase.sin()
}

/// Generates the derived tables from one generator owned by this value
pub struct Synthesizer {
    rng: StdRng,
}

impl Synthesizer {
    /// Seeded generators reproduce their output exactly; `None` draws from OS entropy
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { rng }
    }

    pub fn synthesize(&mut self, table: &FilteredTable, load_column: &str) -> Result<SynthesizedTables> {
        let load_index = table
            .column_index(load_column)
            .ok_or_else(|| AppError::Schema {
                columns: table.columns.clone(),
            })?;

        let power = table
            .rows
            .iter()
            .map(|row| {
                let raw = row.cells.get(load_index).map(String::as_str).unwrap_or("");
                let load = parse_load(raw).map_err(|e| {
                    AppError::Parse(format!("{} at {}: {}", load_column, row.timestamp, e))
                })?;
                Ok(split_load(row.timestamp, load))
            })
            .collect::<Result<Vec<_>>>()?;

        // Draw order is all temperature noise first, then one cloud draw per daylight hour
        let temperature = self.temperature(&table.rows)?;
        let solar = self.solar(&power);

        info!(
            "Synthesized {} power, {} temperature and {} solar rows",
            power.len(),
            temperature.len(),
            solar.len()
        );

        Ok(SynthesizedTables {
            power,
            temperature,
            solar,
        })
    }

    fn temperature(&mut self, rows: &[TimedRow]) -> Result<Vec<TempRow>> {
        rows.iter()
            .map(|row| {
                let timestamp = truncate_to_hour(row.timestamp)?;
                let noise: f64 = self.rng.sample(StandardNormal);
                Ok(TempRow {
                    timestamp,
                    temperature: round1(temperature_baseline(timestamp.hour()) + noise),
                })
            })
            .collect()
    }

    fn solar(&mut self, power: &[PowerRow]) -> Vec<SolarRow> {
        power
            .iter()
            .map(|row| {
                let output = if is_daylight(row.hour) {
                    let factor = if self.rng.random_bool(CLEAR_SKY_PROBABILITY) {
                        1.0
                    } else {
                        CLOUDY_FACTOR
                    };
                    round1(solar_efficiency(row.hour) * SOLAR_CAPACITY * factor)
                } else {
                    0.0
                };
                SolarRow {
                    date: row.date,
                    reported_hour: row.hour + 1,
                    output,
                }
            })
            .collect()
    }
}

/// Run the synthesizer with a generator scoped to this call
pub fn synthesize(table: &FilteredTable, load_column: &str, seed: Option<u64>) -> Result<SynthesizedTables> {
    Synthesizer::new(seed).synthesize(table, load_column)
}

fn parse_load(raw: &str) -> Result<f64> {
    let trimmed = raw.trim();
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| AppError::Parse(format!("Invalid load value '{}'", trimmed)))
}

fn split_load(timestamp: NaiveDateTime, load: f64) -> PowerRow {
    PowerRow {
        date: timestamp.date(),
        hour: timestamp.hour(),
        nyc: load * NYC_SHARE,
        nj: load * NJ_SHARE,
        ct: load * CT_SHARE,
    }
}
