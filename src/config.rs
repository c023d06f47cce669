use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::models::simulation::{ParameterError, SimulationQuery, SystemParameters};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid default parameters: {0}")]
    InvalidDefaults(#[from] ParameterError),
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub defaults: DefaultParameters,
    pub datasets: Vec<DatasetConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

/// One registered input file. Datasets are fixed at startup; there is no
/// upload endpoint.
#[derive(Debug, Deserialize, Serialize, Clone, ToSchema)]
pub struct DatasetConfig {
    pub id: String,
    pub name: String,
    pub path: String,
}

// 5 kWp rooftop system, typical crystalline silicon figures
fn default_capacity_kwp() -> f64 { 5.0 }
fn default_derating() -> f64 { 0.8 }
fn default_temp_coeff_pct() -> f64 { -0.40 }
fn default_noct_c() -> f64 { 45.0 }

/// Default simulation parameters, overridable per request. Figures match
/// what a user enters: capacity in kWp, temperature coefficient in %/°C.
/// Each field falls back independently, so a config may pin just one figure.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct DefaultParameters {
    #[serde(default = "default_capacity_kwp")]
    pub capacity_kwp: f64,
    #[serde(default = "default_derating")]
    pub derating: f64,
    #[serde(default = "default_temp_coeff_pct")]
    pub temp_coeff_pct: f64,
    #[serde(default = "default_noct_c")]
    pub noct_c: f64,
}

impl Default for DefaultParameters {
    fn default() -> Self {
        Self {
            capacity_kwp: default_capacity_kwp(),
            derating: default_derating(),
            temp_coeff_pct: default_temp_coeff_pct(),
            noct_c: default_noct_c(),
        }
    }
}

impl DefaultParameters {
    pub fn to_system_parameters(self) -> Result<SystemParameters, ParameterError> {
        self.with_overrides(&SimulationQuery::default())
    }

    /// Request-scoped parameters: query values override the configured
    /// defaults field by field, then the whole set is validated.
    pub fn with_overrides(
        self,
        query: &SimulationQuery,
    ) -> Result<SystemParameters, ParameterError> {
        SystemParameters::new(
            query.capacity_kwp.unwrap_or(self.capacity_kwp),
            query.derating.unwrap_or(self.derating),
            query.temp_coeff_pct.unwrap_or(self.temp_coeff_pct) / 100.0,
            query.noct_c.unwrap_or(self.noct_c),
        )
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        // Fail startup on defaults the estimator could never accept
        config.defaults.to_system_parameters()?;
        Ok(config)
    }

    pub fn dataset(&self, id: &str) -> Option<&DatasetConfig> {
        self.datasets.iter().find(|d| d.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_config() {
        let json = r#"{
            "server": { "port": 3000 },
            "defaults": {
                "capacity_kwp": 10.0,
                "derating": 0.85,
                "temp_coeff_pct": -0.35,
                "noct_c": 44.0
            },
            "datasets": [
                { "id": "jakarta", "name": "Jakarta 2024", "path": "data/jakarta.csv" }
            ]
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.datasets.len(), 1);
        assert_eq!(config.dataset("jakarta").unwrap().name, "Jakarta 2024");
        assert!(config.dataset("nowhere").is_none());

        let params = config.defaults.to_system_parameters().unwrap();
        assert_eq!(params.temp_coeff, -0.0035);
    }

    #[test]
    fn query_overrides_replace_only_given_fields() {
        let defaults = DefaultParameters::default();
        let query = SimulationQuery {
            capacity_kwp: Some(7.5),
            temp_coeff_pct: Some(-0.30),
            ..Default::default()
        };
        let params = defaults.with_overrides(&query).unwrap();
        assert_eq!(params.capacity_kwp, 7.5);
        assert_eq!(params.temp_coeff, -0.003);
        assert_eq!(params.derating, defaults.derating);
        assert_eq!(params.noct_c, defaults.noct_c);
    }

    #[test]
    fn out_of_range_override_is_rejected() {
        let query = SimulationQuery {
            derating: Some(1.5),
            ..Default::default()
        };
        assert!(DefaultParameters::default().with_overrides(&query).is_err());
    }

    #[test]
    fn defaults_section_is_optional() {
        let json = r#"{ "server": { "port": 3000 }, "datasets": [] }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.defaults.capacity_kwp, 5.0);
    }

    #[test]
    fn partial_defaults_pin_only_the_given_figures() {
        let json = r#"{
            "server": { "port": 3000 },
            "defaults": { "capacity_kwp": 12.0 },
            "datasets": []
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.defaults.capacity_kwp, 12.0);
        assert_eq!(config.defaults.derating, 0.8);
        assert_eq!(config.defaults.temp_coeff_pct, -0.40);
        assert_eq!(config.defaults.noct_c, 45.0);
    }
}
