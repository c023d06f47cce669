use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::warn;

use crate::config::{Config, DatasetConfig};
use crate::models::simulation::{
    DerivedRecord, EnergyBucket, SimulationQuery, SummaryResponse, SystemConfigResponse,
    SystemParameters,
};
use crate::services::estimator;
use crate::shared_state::SharedState;

/// GET /api/datasets
/// List all registered datasets
///
/// Returns every dataset configured at startup, with its ID, display name and file path.
#[utoipa::path(
    get,
    path = "/api/datasets",
    responses(
        (status = 200, description = "List of registered datasets", body = Vec<DatasetConfig>)
    )
)]
pub async fn list_datasets(State(config): State<Config>) -> impl IntoResponse {
    Json(config.datasets).into_response()
}

/// GET /api/datasets/{id}/summary
/// Aggregate figures for one simulation run
///
/// Loads the dataset (through the content-addressed cache), runs the estimator
/// with the effective parameters and returns the aggregate scalars: total
/// energy, specific yield, average daily energy and the peak record.
#[utoipa::path(
    get,
    path = "/api/datasets/{id}/summary",
    params(
        ("id" = String, Path, description = "Dataset ID"),
        SimulationQuery
    ),
    responses(
        (status = 200, description = "Simulation summary", body = SummaryResponse),
        (status = 400, description = "Invalid simulation parameters"),
        (status = 404, description = "Dataset not found"),
        (status = 422, description = "Dataset could not be loaded")
    )
)]
pub async fn get_summary(
    Path(id): Path<String>,
    Query(query): Query<SimulationQuery>,
    State(shared): State<SharedState>,
) -> impl IntoResponse {
    let (records, params) = match simulate(&shared, &id, &query) {
        Ok(run) => run,
        Err(response) => return response,
    };

    match estimator::summarize(&records, &params) {
        Some(summary) => Json(SummaryResponse {
            dataset_id: id,
            record_count: records.len(),
            parameters: params,
            summary,
        })
        .into_response(),
        None => error_response(StatusCode::UNPROCESSABLE_ENTITY, "dataset holds no records"),
    }
}

/// GET /api/datasets/{id}/series
/// Full derived hourly series
///
/// One record per input hour with cell temperature, temperature correction
/// factor and output power. This is the charting feed.
#[utoipa::path(
    get,
    path = "/api/datasets/{id}/series",
    params(
        ("id" = String, Path, description = "Dataset ID"),
        SimulationQuery
    ),
    responses(
        (status = 200, description = "Derived hourly records", body = Vec<DerivedRecord>),
        (status = 400, description = "Invalid simulation parameters"),
        (status = 404, description = "Dataset not found"),
        (status = 422, description = "Dataset could not be loaded")
    )
)]
pub async fn get_series(
    Path(id): Path<String>,
    Query(query): Query<SimulationQuery>,
    State(shared): State<SharedState>,
) -> impl IntoResponse {
    match simulate(&shared, &id, &query) {
        Ok((records, _)) => Json(records).into_response(),
        Err(response) => response,
    }
}

/// GET /api/datasets/{id}/energy/daily
/// Energy resampled per calendar day
#[utoipa::path(
    get,
    path = "/api/datasets/{id}/energy/daily",
    params(
        ("id" = String, Path, description = "Dataset ID"),
        SimulationQuery
    ),
    responses(
        (status = 200, description = "Daily energy sums", body = Vec<EnergyBucket>),
        (status = 400, description = "Invalid simulation parameters"),
        (status = 404, description = "Dataset not found"),
        (status = 422, description = "Dataset could not be loaded")
    )
)]
pub async fn get_daily_energy(
    Path(id): Path<String>,
    Query(query): Query<SimulationQuery>,
    State(shared): State<SharedState>,
) -> impl IntoResponse {
    match simulate(&shared, &id, &query) {
        Ok((records, _)) => Json(estimator::daily_energy(&records)).into_response(),
        Err(response) => response,
    }
}

/// GET /api/datasets/{id}/energy/monthly
/// Energy resampled per calendar month
#[utoipa::path(
    get,
    path = "/api/datasets/{id}/energy/monthly",
    params(
        ("id" = String, Path, description = "Dataset ID"),
        SimulationQuery
    ),
    responses(
        (status = 200, description = "Monthly energy sums", body = Vec<EnergyBucket>),
        (status = 400, description = "Invalid simulation parameters"),
        (status = 404, description = "Dataset not found"),
        (status = 422, description = "Dataset could not be loaded")
    )
)]
pub async fn get_monthly_energy(
    Path(id): Path<String>,
    Query(query): Query<SimulationQuery>,
    State(shared): State<SharedState>,
) -> impl IntoResponse {
    match simulate(&shared, &id, &query) {
        Ok((records, _)) => Json(estimator::monthly_energy(&records)).into_response(),
        Err(response) => response,
    }
}

/// GET /api/datasets/{id}/peak-day
/// Derived records for the day containing the peak output
///
/// The detail view behind the peak figure: the full hourly curve of the
/// calendar day on which the highest output occurred.
#[utoipa::path(
    get,
    path = "/api/datasets/{id}/peak-day",
    params(
        ("id" = String, Path, description = "Dataset ID"),
        SimulationQuery
    ),
    responses(
        (status = 200, description = "Hourly records of the peak day", body = Vec<DerivedRecord>),
        (status = 400, description = "Invalid simulation parameters"),
        (status = 404, description = "Dataset not found"),
        (status = 422, description = "Dataset could not be loaded")
    )
)]
pub async fn get_peak_day(
    Path(id): Path<String>,
    Query(query): Query<SimulationQuery>,
    State(shared): State<SharedState>,
) -> impl IntoResponse {
    match simulate(&shared, &id, &query) {
        Ok((records, _)) => {
            let day: Vec<DerivedRecord> =
                estimator::peak_day(&records).into_iter().cloned().collect();
            Json(day).into_response()
        }
        Err(response) => response,
    }
}

/// GET /api/system/config
/// Effective service configuration
#[utoipa::path(
    get,
    path = "/api/system/config",
    responses(
        (status = 200, description = "Service configuration", body = SystemConfigResponse)
    )
)]
pub async fn get_system_config(State(config): State<Config>) -> impl IntoResponse {
    match config.defaults.to_system_parameters() {
        Ok(default_parameters) => Json(SystemConfigResponse {
            api_port: config.server.port,
            datasets_configured: config.datasets.len(),
            default_parameters,
            openapi_endpoint: "/scalar".to_string(),
        })
        .into_response(),
        // Defaults are validated at startup; reaching this means the config
        // changed underneath us.
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}

/// Shared handler plumbing: resolve the dataset, load it through the cache,
/// merge the request parameters over the defaults and run the estimator.
fn simulate(
    shared: &SharedState,
    id: &str,
    query: &SimulationQuery,
) -> Result<(Vec<DerivedRecord>, SystemParameters), axum::response::Response> {
    let dataset = shared
        .config
        .dataset(id)
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, "dataset not found"))?;

    let params = shared
        .config
        .defaults
        .with_overrides(query)
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, &e.to_string()))?;

    let observations = shared
        .cache
        .load(std::path::Path::new(&dataset.path))
        .map_err(|e| {
            warn!(dataset = %dataset.id, error = %e, "failed to load dataset");
            error_response(StatusCode::UNPROCESSABLE_ENTITY, &e.to_string())
        })?;

    Ok((estimator::estimate(&observations, &params), params))
}

fn error_response(status: StatusCode, message: &str) -> axum::response::Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}
