/// PV energy estimation core.
///
/// A single stateless pass over the cleaned hourly series:
///  1. Cell temperature – linear NOCT model, referenced to the 800 W/m²
///     standard operating condition
///  2. Temperature correction – linear derating relative to 25 °C STC
///  3. Output power – P = capacity × (G / 1000) × correction × derating,
///     clamped to ≥ 0
///
/// followed by pure reductions for the aggregate figures. Re-run in full on
/// every parameter change; it only reads its inputs and allocates fresh
/// output, so concurrent runs over the same series are safe.
use chrono::Datelike;

use crate::models::simulation::{
    DerivedRecord, EnergyBucket, Observation, SimulationSummary, SystemParameters,
};

/// Derive the full output series from observations and system parameters.
///
/// Physically implausible inputs (negative irradiance, extreme temperatures)
/// are not rejected here; the clamp on output power keeps the result
/// plausible. Input validation is the loader's job.
pub fn estimate(observations: &[Observation], params: &SystemParameters) -> Vec<DerivedRecord> {
    observations
        .iter()
        .map(|obs| {
            let cell_temp_c =
                obs.ambient_temp_c + (obs.irradiance_w_m2 / 800.0) * (params.noct_c - 20.0);
            let temp_correction = 1.0 + params.temp_coeff * (cell_temp_c - 25.0);
            let output_kw = (params.capacity_kwp
                * (obs.irradiance_w_m2 / 1000.0)
                * temp_correction
                * params.derating)
                .max(0.0);

            DerivedRecord {
                timestamp: obs.timestamp,
                ambient_temp_c: obs.ambient_temp_c,
                irradiance_w_m2: obs.irradiance_w_m2,
                cell_temp_c,
                temp_correction,
                output_kw,
            }
        })
        .collect()
}

/// Total produced energy in kWh. Each record spans one hour, so summing kW
/// values yields kWh numerically.
pub fn total_energy_kwh(records: &[DerivedRecord]) -> f64 {
    records.iter().map(|r| r.output_kw).sum()
}

/// Energy per calendar day, one bucket per distinct day present in the input.
/// No zero-filling of absent days.
pub fn daily_energy(records: &[DerivedRecord]) -> Vec<EnergyBucket> {
    resample(records, |r| r.timestamp.date().format("%Y-%m-%d").to_string())
}

/// Energy per calendar month, one bucket per distinct month present.
pub fn monthly_energy(records: &[DerivedRecord]) -> Vec<EnergyBucket> {
    resample(records, |r| {
        format!("{:04}-{:02}", r.timestamp.year(), r.timestamp.month())
    })
}

/// Group-by-key sum over an ordered series. Timestamps are strictly
/// increasing, so records sharing a calendar key are contiguous and a single
/// scan suffices.
fn resample<K>(records: &[DerivedRecord], key: K) -> Vec<EnergyBucket>
where
    K: Fn(&DerivedRecord) -> String,
{
    let mut buckets: Vec<EnergyBucket> = Vec::new();
    for record in records {
        let period = key(record);
        match buckets.last_mut() {
            Some(bucket) if bucket.period == period => bucket.energy_kwh += record.output_kw,
            _ => buckets.push(EnergyBucket {
                period,
                energy_kwh: record.output_kw,
            }),
        }
    }
    buckets
}

/// The record with the highest output power; first occurrence wins on ties.
pub fn peak_record(records: &[DerivedRecord]) -> Option<&DerivedRecord> {
    let mut best: Option<&DerivedRecord> = None;
    for record in records {
        match best {
            Some(b) if record.output_kw <= b.output_kw => {}
            _ => best = Some(record),
        }
    }
    best
}

/// All aggregate scalars the presentation layer needs, in one pass set.
/// Returns None for an empty series (the loader never produces one).
pub fn summarize(
    records: &[DerivedRecord],
    params: &SystemParameters,
) -> Option<SimulationSummary> {
    let peak = peak_record(records)?;
    let total_energy = total_energy_kwh(records);
    let daily = daily_energy(records);
    let average_daily = daily.iter().map(|b| b.energy_kwh).sum::<f64>() / daily.len() as f64;

    Some(SimulationSummary {
        total_energy_kwh: total_energy,
        specific_yield_kwh_kwp: total_energy / params.capacity_kwp,
        average_daily_energy_kwh: average_daily,
        peak_output_kw: peak.output_kw,
        peak_timestamp: peak.timestamp,
    })
}

/// Derived records belonging to the calendar day of the peak record — the
/// "best day" detail view.
pub fn peak_day<'a>(records: &'a [DerivedRecord]) -> Vec<&'a DerivedRecord> {
    match peak_record(records) {
        Some(peak) => {
            let date = peak.timestamp.date();
            records.iter().filter(|r| r.timestamp.date() == date).collect()
        }
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{NaiveDate, Timelike};

    fn at(y: i32, m: u32, d: u32, h: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn obs(timestamp: chrono::NaiveDateTime, temp: f64, irradiance: f64) -> Observation {
        Observation {
            timestamp,
            ambient_temp_c: temp,
            irradiance_w_m2: irradiance,
        }
    }

    fn params() -> SystemParameters {
        SystemParameters::new(5.0, 0.8, -0.004, 45.0).unwrap()
    }

    /// A synthetic year of hourly records: zero at night, a crude midday bump
    /// otherwise. 365 days starting 2024-01-01.
    fn synthetic_year() -> Vec<Observation> {
        let start = at(2024, 1, 1, 0);
        (0..365 * 24)
            .map(|i| {
                let ts = start + chrono::Duration::hours(i);
                let h = ts.hour() as f64;
                let irradiance = if (6.0..=18.0).contains(&h) {
                    1000.0 * (1.0 - ((h - 12.0) / 6.0).powi(2))
                } else {
                    0.0
                };
                obs(ts, 20.0 + 8.0 * (h / 24.0), irradiance)
            })
            .collect()
    }

    #[test]
    fn worked_example_matches_hand_calculation() {
        // 30 °C ambient at 800 W/m²: cell 55 °C, correction 0.88, 2.816 kW
        let records = estimate(&[obs(at(2024, 6, 1, 12), 30.0, 800.0)], &params());
        assert_relative_eq!(records[0].cell_temp_c, 55.0, epsilon = 1e-12);
        assert_relative_eq!(records[0].temp_correction, 0.88, epsilon = 1e-12);
        assert_relative_eq!(records[0].output_kw, 2.816, epsilon = 1e-12);
    }

    #[test]
    fn zero_irradiance_means_zero_output() {
        for temp in [-20.0, 0.0, 25.0, 45.0] {
            let records = estimate(&[obs(at(2024, 1, 1, 3), temp, 0.0)], &params());
            assert_eq!(records[0].output_kw, 0.0);
        }
    }

    #[test]
    fn degenerate_stc_conditions_give_nameplate_times_derating() {
        // Ambient chosen so the cell sits exactly at the 25 °C STC reference:
        // cell = ambient + (1000/800) * 25 = 25  =>  ambient = -6.25
        let p = SystemParameters::new(5.0, 0.8, -0.004, 45.0).unwrap();
        let records = estimate(&[obs(at(2024, 3, 1, 12), -6.25, 1000.0)], &p);
        assert_relative_eq!(records[0].cell_temp_c, 25.0, epsilon = 1e-12);
        assert_relative_eq!(records[0].temp_correction, 1.0, epsilon = 1e-12);
        assert_relative_eq!(
            records[0].output_kw,
            p.capacity_kwp * p.derating,
            epsilon = 1e-12
        );
    }

    #[test]
    fn output_never_negative_even_at_extreme_cell_temperatures() {
        // Steep coefficient pushes the correction factor below zero
        let p = SystemParameters::new(5.0, 0.8, -0.05, 45.0).unwrap();
        let records = estimate(&[obs(at(2024, 7, 1, 13), 60.0, 1100.0)], &p);
        assert!(records[0].temp_correction < 0.0);
        assert_eq!(records[0].output_kw, 0.0);
    }

    #[test]
    fn output_is_monotone_in_irradiance_while_correction_positive() {
        let p = params();
        let mut last = -1.0;
        for g in (0..=1200).step_by(50) {
            let records = estimate(&[obs(at(2024, 5, 1, 12), 25.0, g as f64)], &p);
            assert!(records[0].temp_correction > 0.0);
            assert!(records[0].output_kw >= last);
            last = records[0].output_kw;
        }
    }

    #[test]
    fn daily_sums_over_a_year_equal_the_total() {
        let records = estimate(&synthetic_year(), &params());
        let daily = daily_energy(&records);
        assert_eq!(daily.len(), 365);
        let daily_sum: f64 = daily.iter().map(|b| b.energy_kwh).sum();
        assert_relative_eq!(daily_sum, total_energy_kwh(&records), epsilon = 1e-9);
    }

    #[test]
    fn monthly_buckets_cover_only_months_present() {
        let series = vec![
            obs(at(2024, 1, 31, 23), 20.0, 500.0),
            obs(at(2024, 2, 1, 0), 20.0, 500.0),
            obs(at(2024, 2, 1, 1), 20.0, 0.0),
        ];
        let records = estimate(&series, &params());
        let monthly = monthly_energy(&records);
        assert_eq!(monthly.len(), 2);
        assert_eq!(monthly[0].period, "2024-01");
        assert_eq!(monthly[1].period, "2024-02");
        assert_relative_eq!(monthly[0].energy_kwh, records[0].output_kw);
        assert_relative_eq!(
            monthly[1].energy_kwh,
            records[1].output_kw + records[2].output_kw
        );
    }

    #[test]
    fn peak_dominates_every_record_and_first_wins_ties() {
        let series = vec![
            obs(at(2024, 6, 1, 11), 25.0, 900.0),
            obs(at(2024, 6, 1, 12), 25.0, 900.0), // tie with 11:00
            obs(at(2024, 6, 1, 13), 25.0, 700.0),
        ];
        let records = estimate(&series, &params());
        let peak = peak_record(&records).unwrap();
        assert!(records.iter().all(|r| peak.output_kw >= r.output_kw));
        assert_eq!(peak.timestamp, at(2024, 6, 1, 11));
    }

    #[test]
    fn peak_of_synthetic_year_dominates_series() {
        let records = estimate(&synthetic_year(), &params());
        let peak = peak_record(&records).unwrap();
        assert!(records.iter().all(|r| peak.output_kw >= r.output_kw));
    }

    #[test]
    fn summary_scalars_are_consistent() {
        let p = params();
        let records = estimate(&synthetic_year(), &p);
        let summary = summarize(&records, &p).unwrap();

        assert_relative_eq!(
            summary.specific_yield_kwh_kwp,
            summary.total_energy_kwh / p.capacity_kwp,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            summary.average_daily_energy_kwh,
            summary.total_energy_kwh / 365.0,
            epsilon = 1e-9
        );
        assert_eq!(summary.peak_output_kw, peak_record(&records).unwrap().output_kw);
    }

    #[test]
    fn summary_of_empty_series_is_none() {
        assert!(summarize(&[], &params()).is_none());
    }

    #[test]
    fn peak_day_returns_all_records_of_the_peak_date() {
        let records = estimate(&synthetic_year(), &params());
        let day = peak_day(&records);
        assert_eq!(day.len(), 24);
        let date = peak_record(&records).unwrap().timestamp.date();
        assert!(day.iter().all(|r| r.timestamp.date() == date));
    }
}
