use crate::config;
use crate::controllers::simulation_controller;
use crate::models::simulation;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        simulation_controller::list_datasets,
        simulation_controller::get_summary,
        simulation_controller::get_series,
        simulation_controller::get_daily_energy,
        simulation_controller::get_monthly_energy,
        simulation_controller::get_peak_day,
        simulation_controller::get_system_config
    ),
    components(
        schemas(
            config::DatasetConfig,
            simulation::SystemParameters,
            simulation::DerivedRecord,
            simulation::EnergyBucket,
            simulation::SimulationSummary,
            simulation::SummaryResponse,
            simulation::SystemConfigResponse
        )
    ),
    tags(
        (name = "pv-yield-sim", description = "PV Energy Yield Simulation API")
    )
)]
pub struct ApiDoc;
