/// NASA POWER hourly CSV loader.
///
/// Files start with free-text header lines, then a column header row, then
/// one row per hour. Required columns (located by name, any order):
/// YEAR, MO, DY, HR, ALLSKY_SFC_SW_DWN (plane irradiance, W/m²),
/// T2M (ambient temperature, °C).
///
/// The sentinel -999 marks a missing value and is repaired by linear
/// interpolation across time; structural problems (missing columns, bad
/// timestamps, broken cadence) abort the load with no partial result.
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use thiserror::Error;

use crate::models::simulation::Observation;

const COLUMN_YEAR: &str = "YEAR";
const COLUMN_MONTH: &str = "MO";
const COLUMN_DAY: &str = "DY";
const COLUMN_HOUR: &str = "HR";
const COLUMN_IRRADIANCE: &str = "ALLSKY_SFC_SW_DWN";
const COLUMN_AIR_TEMP: &str = "T2M";

const REQUIRED_COLUMNS: [&str; 6] = [
    COLUMN_YEAR,
    COLUMN_MONTH,
    COLUMN_DAY,
    COLUMN_HOUR,
    COLUMN_IRRADIANCE,
    COLUMN_AIR_TEMP,
];

/// Values at or below this threshold are NASA POWER missing-data sentinels.
const SENTINEL: f64 = -999.0;

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("no header row with the required columns found (expected {REQUIRED_COLUMNS:?})")]
    HeaderNotFound,
    #[error("missing required columns: {0:?}")]
    MissingColumns(Vec<String>),
    #[error("line {line}: field {column} is not a number: {value:?}")]
    InvalidNumber {
        line: u64,
        column: &'static str,
        value: String,
    },
    #[error("line {line}: no valid timestamp from year={year} month={month} day={day} hour={hour}")]
    InvalidTimestamp {
        line: u64,
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
    },
    #[error("line {line}: timestamp {current} does not follow {previous} by one hour")]
    BrokenCadence {
        line: u64,
        previous: NaiveDateTime,
        current: NaiveDateTime,
    },
    #[error("column {0} holds no valid value at all")]
    ColumnAllMissing(&'static str),
    #[error("dataset holds no data rows")]
    Empty,
}

/// Load and clean one dataset file.
pub fn load_observations(path: &Path) -> Result<Vec<Observation>, LoaderError> {
    let file = std::fs::File::open(path)?;
    parse_observations(file)
}

/// Parse a NASA POWER CSV from any reader. Split out from the file wrapper
/// so tests can feed byte slices.
pub fn parse_observations(input: impl Read) -> Result<Vec<Observation>, LoaderError> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .from_reader(input);

    let mut columns: Option<HashMap<String, usize>> = None;
    let mut timestamps: Vec<NaiveDateTime> = Vec::new();
    let mut temperatures: Vec<Option<f64>> = Vec::new();
    let mut irradiances: Vec<Option<f64>> = Vec::new();

    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let cols = match &columns {
            Some(cols) => cols,
            None => {
                // Still scanning the free-text preamble for the header row.
                if record.iter().any(|f| f.trim() == COLUMN_YEAR) {
                    columns = Some(index_columns(&record)?);
                }
                continue;
            }
        };

        let year = field(&record, cols, COLUMN_YEAR, line)? as i32;
        let month = field(&record, cols, COLUMN_MONTH, line)? as u32;
        let day = field(&record, cols, COLUMN_DAY, line)? as u32;
        let hour = field(&record, cols, COLUMN_HOUR, line)? as u32;

        let timestamp = NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(hour, 0, 0))
            .ok_or(LoaderError::InvalidTimestamp {
                line,
                year,
                month,
                day,
                hour,
            })?;

        if let Some(&previous) = timestamps.last() {
            if timestamp - previous != Duration::hours(1) {
                return Err(LoaderError::BrokenCadence {
                    line,
                    previous,
                    current: timestamp,
                });
            }
        }

        timestamps.push(timestamp);
        temperatures.push(valid(field(&record, cols, COLUMN_AIR_TEMP, line)?));
        irradiances.push(valid(field(&record, cols, COLUMN_IRRADIANCE, line)?));
    }

    if columns.is_none() {
        return Err(LoaderError::HeaderNotFound);
    }
    if timestamps.is_empty() {
        return Err(LoaderError::Empty);
    }

    let temperatures = interpolate(temperatures, COLUMN_AIR_TEMP)?;
    let irradiances = interpolate(irradiances, COLUMN_IRRADIANCE)?;

    Ok(timestamps
        .into_iter()
        .zip(temperatures)
        .zip(irradiances)
        .map(|((timestamp, ambient_temp_c), irradiance_w_m2)| Observation {
            timestamp,
            ambient_temp_c,
            irradiance_w_m2,
        })
        .collect())
}

fn index_columns(record: &csv::StringRecord) -> Result<HashMap<String, usize>, LoaderError> {
    let columns: HashMap<String, usize> = record
        .iter()
        .enumerate()
        .map(|(i, name)| (name.trim().to_string(), i))
        .collect();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|name| !columns.contains_key(**name))
        .map(|name| name.to_string())
        .collect();

    if missing.is_empty() {
        Ok(columns)
    } else {
        Err(LoaderError::MissingColumns(missing))
    }
}

fn field(
    record: &csv::StringRecord,
    columns: &HashMap<String, usize>,
    column: &'static str,
    line: u64,
) -> Result<f64, LoaderError> {
    let raw = columns
        .get(column)
        .and_then(|&i| record.get(i))
        .unwrap_or("")
        .trim();
    raw.parse().map_err(|_| LoaderError::InvalidNumber {
        line,
        column,
        value: raw.to_string(),
    })
}

fn valid(value: f64) -> Option<f64> {
    (value > SENTINEL).then_some(value)
}

/// Repair missing values by linear interpolation between the nearest valid
/// neighbours; runs at either end take the nearest valid value. A column with
/// no valid value at all cannot be repaired.
fn interpolate(values: Vec<Option<f64>>, column: &'static str) -> Result<Vec<f64>, LoaderError> {
    let mut out = vec![0.0; values.len()];
    let mut previous: Option<(usize, f64)> = None;
    let mut gap_start: Option<usize> = None;

    for (i, value) in values.iter().enumerate() {
        match value {
            Some(v) => {
                if let Some(start) = gap_start.take() {
                    match previous {
                        Some((pi, pv)) => {
                            // Interior gap: straight line between the anchors
                            let span = (i - pi) as f64;
                            for j in start..i {
                                out[j] = pv + (v - pv) * ((j - pi) as f64 / span);
                            }
                        }
                        None => {
                            // Leading gap: clamp to the first valid value
                            for j in start..i {
                                out[j] = *v;
                            }
                        }
                    }
                }
                out[i] = *v;
                previous = Some((i, *v));
            }
            None => {
                if gap_start.is_none() {
                    gap_start = Some(i);
                }
            }
        }
    }

    match (gap_start, previous) {
        // Trailing gap: clamp to the last valid value
        (Some(start), Some((_, pv))) => {
            for j in start..values.len() {
                out[j] = pv;
            }
        }
        (Some(_), None) => return Err(LoaderError::ColumnAllMissing(column)),
        _ => {}
    }

    Ok(out)
}
