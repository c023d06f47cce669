use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::{IntoParams, ToSchema};

// ─── Input time series ───────────────────────────────────────────────────────

/// One cleaned hourly record as produced by the loader.
/// Timestamps are strictly increasing and exactly one hour apart; sentinel
/// values have already been interpolated away.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub timestamp: NaiveDateTime,
    /// Ambient air temperature at 2 m (°C)
    pub ambient_temp_c: f64,
    /// Plane irradiance (W/m²)
    pub irradiance_w_m2: f64,
}

// ─── System parameters ───────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq)]
pub enum ParameterError {
    #[error("capacity must be a positive number of kWp, got {0}")]
    InvalidCapacity(f64),
    #[error("derating factor must be within (0, 1], got {0}")]
    InvalidDerating(f64),
    #[error("temperature coefficient must be a finite fraction per °C, got {0}")]
    InvalidTempCoeff(f64),
    #[error("NOCT must be above 20 °C, got {0}")]
    InvalidNoct(f64),
}

/// Parameters of the simulated PV system, immutable for one simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct SystemParameters {
    /// Installed DC capacity (kWp)
    pub capacity_kwp: f64,
    /// Aggregate system efficiency: inverter, wiring, soiling, mismatch
    pub derating: f64,
    /// Power loss per °C above 25 °C, as a fraction (e.g. -0.004)
    pub temp_coeff: f64,
    /// Nominal Operating Cell Temperature (°C)
    pub noct_c: f64,
}

impl SystemParameters {
    /// Validated constructor. `temp_coeff` is the fraction per °C, not percent.
    pub fn new(
        capacity_kwp: f64,
        derating: f64,
        temp_coeff: f64,
        noct_c: f64,
    ) -> Result<Self, ParameterError> {
        if !capacity_kwp.is_finite() || capacity_kwp <= 0.0 {
            return Err(ParameterError::InvalidCapacity(capacity_kwp));
        }
        if !derating.is_finite() || derating <= 0.0 || derating > 1.0 {
            return Err(ParameterError::InvalidDerating(derating));
        }
        if !temp_coeff.is_finite() {
            return Err(ParameterError::InvalidTempCoeff(temp_coeff));
        }
        if !noct_c.is_finite() || noct_c <= 20.0 {
            return Err(ParameterError::InvalidNoct(noct_c));
        }
        Ok(Self {
            capacity_kwp,
            derating,
            temp_coeff,
            noct_c,
        })
    }
}

/// Per-request parameter overrides, matching the figures a user enters:
/// capacity in kWp and the temperature coefficient in %/°C.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct SimulationQuery {
    /// Installed DC capacity (kWp)
    pub capacity_kwp: Option<f64>,
    /// Derating factor (0..1]
    pub derating: Option<f64>,
    /// Temperature coefficient in %/°C (e.g. -0.40)
    pub temp_coeff_pct: Option<f64>,
    /// NOCT (°C)
    pub noct_c: Option<f64>,
}

// ─── Derived output ──────────────────────────────────────────────────────────

/// Observation plus the quantities derived from it. Produced deterministically
/// from one Observation and one SystemParameters, nothing else.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DerivedRecord {
    pub timestamp: NaiveDateTime,
    /// Ambient air temperature (°C)
    pub ambient_temp_c: f64,
    /// Plane irradiance (W/m²)
    pub irradiance_w_m2: f64,
    /// Estimated operating cell temperature (°C)
    pub cell_temp_c: f64,
    /// Linear derating factor relative to 25 °C STC
    pub temp_correction: f64,
    /// Output power (kW), clamped to ≥ 0
    pub output_kw: f64,
}

/// One resampled energy sum, either a calendar day ("2024-09-16") or a
/// calendar month ("2024-09").
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EnergyBucket {
    pub period: String,
    pub energy_kwh: f64,
}

/// The aggregate scalars the dashboard needs from one simulation pass.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SimulationSummary {
    /// Total produced energy over the whole series (kWh)
    pub total_energy_kwh: f64,
    /// Total energy per installed kWp (kWh/kWp)
    pub specific_yield_kwh_kwp: f64,
    /// Mean of the daily energy sums (kWh)
    pub average_daily_energy_kwh: f64,
    /// Highest hourly output in the series (kW)
    pub peak_output_kw: f64,
    /// Timestamp of the peak record (first occurrence on ties)
    pub peak_timestamp: NaiveDateTime,
}

// ─── REST API response types ─────────────────────────────────────────────────

#[derive(Debug, Serialize, ToSchema)]
pub struct SummaryResponse {
    pub dataset_id: String,
    pub record_count: usize,
    pub parameters: SystemParameters,
    pub summary: SimulationSummary,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SystemConfigResponse {
    pub api_port: u16,
    pub datasets_configured: usize,
    pub default_parameters: SystemParameters,
    pub openapi_endpoint: String,
}
