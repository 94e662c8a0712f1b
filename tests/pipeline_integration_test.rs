use chrono::{NaiveDate, Timelike};
use nyiso_synth::error::AppError;
use nyiso_synth::filter::DateWindow;
use nyiso_synth::merge::merge;
use nyiso_synth::models::{PowerRow, SolarRow, TempRow};
use nyiso_synth::pipeline::synthesize_from_text;
use std::collections::BTreeSet;

fn july(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 7, day).unwrap()
}

/// One day of constant load, bracketed by rows outside the window
fn constant_day_csv(load: f64) -> String {
    let mut content = String::from("Local Time,Value,Flag\n");
    content.push_str("2024-06-30 23:00:00,5,A\n");
    for hour in 0..24 {
        content.push_str(&format!("2024-07-01 {:02}:00:00,{},A\n", hour, load));
    }
    content.push_str("2024-07-02 00:00:00,5,A\n");
    content
}

fn single_day() -> DateWindow {
    DateWindow::new(july(1), july(1))
}

/// Test the documented scenario: flat 1000 MW day with seed 42
#[test]
fn test_constant_load_day_end_to_end() {
    let output = synthesize_from_text(&constant_day_csv(1000.0), single_day(), Some(42), 20)
        .expect("Pipeline failed");

    let power = &output.tables.power;
    assert_eq!(power.len(), 24);
    for (hour, row) in power.iter().enumerate() {
        assert_eq!(row.date, july(1));
        assert_eq!(row.hour, hour as u32);
        assert!((row.nyc - 450.0).abs() < 1e-9);
        assert!((row.nj - 300.0).abs() < 1e-9);
        assert!((row.ct - 250.0).abs() < 1e-9);
    }

    let solar = &output.tables.solar;
    assert_eq!(solar.len(), 24);
    for (hour, row) in solar.iter().enumerate() {
        assert_eq!(row.reported_hour, hour as u32 + 1);
        if hour < 6 || hour > 19 {
            assert_eq!(row.output, 0.0, "hour {} should be dark", hour);
        } else {
            assert!(row.output >= 0.0 && row.output <= 90.0);
        }
    }

    // Every hour has every field when the sources share timestamps
    let merged = &output.merged;
    assert_eq!(merged.len(), 24);
    for (hour, row) in merged.iter().enumerate() {
        assert_eq!(row.timestamp, july(1).and_hms_opt(hour as u32, 0, 0).unwrap());
        assert!(row.nyc.is_some() && row.nj.is_some() && row.ct.is_some());
        assert!(row.temperature.is_some());
        assert_eq!(row.solar, Some(solar[hour].output));
        assert_eq!(row.temperature, Some(output.tables.temperature[hour].temperature));
    }
}

/// Test the merged solar column lines up with the clock hour, not the trading hour
#[test]
fn test_merged_solar_is_dark_at_night() {
    let output = synthesize_from_text(&constant_day_csv(1000.0), single_day(), Some(42), 20)
        .expect("Pipeline failed");

    for row in &output.merged {
        let hour = row.timestamp.hour();
        let solar = row.solar.expect("solar present");
        if hour < 6 || hour > 19 {
            assert_eq!(solar, 0.0, "clock hour {} should be dark", hour);
        } else if (7..=18).contains(&hour) {
            // Hours 6 and 19 can round to 0.0 under cloud cover
            assert!(solar > 0.0, "clock hour {} should be lit", hour);
        }
    }
}

/// Test two runs with the same seed are identical
#[test]
fn test_same_seed_same_output() {
    let content = constant_day_csv(1234.0);
    let first = synthesize_from_text(&content, single_day(), Some(42), 20).unwrap();
    let second = synthesize_from_text(&content, single_day(), Some(42), 20).unwrap();

    assert_eq!(first.tables.temperature, second.tables.temperature);
    assert_eq!(first.tables.solar, second.tables.solar);
    assert_eq!(first.merged, second.merged);
}

/// Test an unseeded run still produces well-formed tables
#[test]
fn test_unseeded_run() {
    let output = synthesize_from_text(&constant_day_csv(1000.0), single_day(), None, 20).unwrap();
    assert_eq!(output.tables.temperature.len(), 24);
    assert_eq!(output.merged.len(), 24);
}

/// Test the EIA layout: preamble lines, AM/PM timestamps, descriptive headers
#[test]
fn test_eia_style_file() {
    let mut content = String::from(
        "New York Independent System Operator (NYISO)\n\
         Hourly actual load\n\
         UTC Timestamp (Interval Ending),Local Timestamp Eastern Time (Interval Beginning),NYISO Total Actual Load (MW)\n",
    );
    for hour in 0..48u32 {
        let day = 1 + hour / 24;
        let h = hour % 24;
        let (h12, ampm) = match h {
            0 => (12, "AM"),
            1..=11 => (h, "AM"),
            12 => (12, "PM"),
            _ => (h - 12, "PM"),
        };
        content.push_str(&format!(
            "07/{:02}/2024 {}:00:00 {},07/{:02}/2024 {}:00:00 {},{}\n",
            day, h12, ampm, day, h12, ampm, 15000 + hour
        ));
    }

    let window = DateWindow::new(july(2), july(2));
    let output = synthesize_from_text(&content, window, Some(7), 20).expect("Pipeline failed");

    assert_eq!(output.tables.power.len(), 24);
    assert!(output.tables.power.iter().all(|r| r.date == july(2)));
    let first = &output.tables.power[0];
    assert_eq!(first.hour, 0);
    assert!((first.nyc + first.nj + first.ct - 15024.0).abs() < 1e-9);
}

/// Test unsorted input comes out sorted
#[test]
fn test_rows_are_sorted_by_timestamp() {
    let content = "Date,Load\n\
                   2024-07-01 05:00,500\n\
                   2024-07-01 02:00,200\n\
                   2024-07-01 09:00,900\n";
    let output = synthesize_from_text(content, single_day(), Some(42), 20).unwrap();
    let hours: Vec<u32> = output.tables.power.iter().map(|r| r.hour).collect();
    assert_eq!(hours, vec![2, 5, 9]);
    assert!((output.tables.power[0].nyc - 90.0).abs() < 1e-9);
}

/// Test a window past the data fails instead of returning nothing
#[test]
fn test_window_outside_data_is_empty_range() {
    let window = DateWindow::new(july(10), july(12));
    match synthesize_from_text(&constant_day_csv(1000.0), window, Some(42), 20) {
        Err(AppError::EmptyRange { start, end, min, max }) => {
            assert_eq!(start, july(10));
            assert_eq!(end, july(12));
            assert_eq!(min.unwrap().date(), NaiveDate::from_ymd_opt(2024, 6, 30).unwrap());
            assert_eq!(max.unwrap().date(), july(2));
        }
        other => panic!("Expected EmptyRange error, got: {:?}", other),
    }
}

/// Test the error message names the available range
#[test]
fn test_empty_range_message() {
    let window = DateWindow::new(july(10), july(12));
    let err = synthesize_from_text(&constant_day_csv(1000.0), window, Some(42), 20).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("2024-07-10"));
    assert!(msg.contains("2024-06-30 23:00:00"));
}

/// Test unresolvable headers report what was found
#[test]
fn test_unknown_columns_are_schema_error() {
    let content = "X,Y\n1,2\n";
    match synthesize_from_text(content, single_day(), Some(42), 20) {
        Err(AppError::Schema { columns }) => assert_eq!(columns, vec!["X", "Y"]),
        other => panic!("Expected Schema error, got: {:?}", other),
    }
}

/// Test a bad timestamp anywhere fails the run
#[test]
fn test_bad_timestamp_is_parse_error() {
    let content = "Period,Value\n2024-07-01 00:00,1\nsoon,2\n";
    assert!(matches!(
        synthesize_from_text(content, single_day(), Some(42), 20),
        Err(AppError::Parse(_))
    ));
}

/// Test the merge keeps one row per distinct timestamp across all inputs
#[test]
fn test_merge_row_count_is_distinct_timestamp_count() {
    let power: Vec<PowerRow> = (0..10)
        .map(|hour| PowerRow {
            date: july(1),
            hour,
            nyc: 1.0,
            nj: 1.0,
            ct: 1.0,
        })
        .collect();
    let temperature: Vec<TempRow> = (5..15)
        .map(|hour| TempRow {
            timestamp: july(1).and_hms_opt(hour, 0, 0).unwrap(),
            temperature: 25.0,
        })
        .collect();
    let solar: Vec<SolarRow> = (20..=24)
        .map(|reported_hour| SolarRow {
            date: july(1),
            reported_hour,
            output: 0.0,
        })
        .chain(std::iter::once(SolarRow {
            date: july(2),
            reported_hour: 1,
            output: 0.0,
        }))
        .collect();

    let mut expected = BTreeSet::new();
    expected.extend(power.iter().map(|r| july(1).and_hms_opt(r.hour, 0, 0).unwrap()));
    expected.extend(temperature.iter().map(|r| r.timestamp));
    expected.extend(
        solar
            .iter()
            .map(|r| r.date.and_hms_opt(r.reported_hour - 1, 0, 0).unwrap()),
    );

    let merged = merge(&power, &temperature, &solar).unwrap();
    assert_eq!(merged.len(), expected.len());

    let got: Vec<_> = merged.iter().map(|r| r.timestamp).collect();
    let want: Vec<_> = expected.into_iter().collect();
    assert_eq!(got, want);

    // Overlap of power and temperature carries both
    let five = merged.iter().find(|r| r.timestamp.hour() == 5 && r.timestamp.date() == july(1)).unwrap();
    assert_eq!(five.nyc, Some(1.0));
    assert_eq!(five.temperature, Some(25.0));
    assert_eq!(five.solar, None);
}
