use crate::controllers::simulation_controller::{
    // Datasets & derived series
    get_daily_energy, get_monthly_energy, get_peak_day, get_series, get_summary, list_datasets,
    // Service config
    get_system_config,
};
use crate::shared_state::SharedState;
use axum::{Router, routing::get};

/// Build the `/api/*` sub-router.
/// Handlers extract `State<SharedState>` and/or `State<Config>` via
/// `FromRef<SharedState>` — a single `.with_state(shared)` covers both.
pub fn api_routes(shared: SharedState) -> Router {
    Router::new()
        .route("/datasets", get(list_datasets))
        .route("/datasets/{id}/summary", get(get_summary))
        .route("/datasets/{id}/series", get(get_series))
        .route("/datasets/{id}/energy/daily", get(get_daily_energy))
        .route("/datasets/{id}/energy/monthly", get(get_monthly_energy))
        .route("/datasets/{id}/peak-day", get(get_peak_day))
        .route("/system/config", get(get_system_config))
        .with_state(shared)
}
