use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::Json;
use axum::Router;
use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use serde::Deserialize;
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::climate::ClimateCommand;
use crate::climate::HvacMode;
use crate::engine::ClimateState;
use crate::engine::Engine;
use crate::engine::EngineError;

/// Response for the /v1/ping endpoint and successful commands
#[derive(Serialize)]
struct StatusResponse {
    status: String,
}

impl StatusResponse {
    fn ok() -> Json<Self> {
        Json(Self {
            status: "ok".to_string(),
        })
    }
}

/// Response for the /v1/info endpoint
#[derive(Serialize)]
struct InfoResponse {
    version: String,
    hostname: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Deserialize)]
struct HvacModeRequest {
    hvac_mode: HvacMode,
}

#[derive(Debug, Deserialize)]
struct TemperatureRequest {
    /// Omitted to re-apply the current target
    #[serde(default)]
    temperature: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct FanModeRequest {
    fan_mode: String,
}

/// Why a request could not be served
#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Rejected(String),
    Unavailable(String),
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::UnknownEntity(_) => ApiError::NotFound(e.to_string()),
            EngineError::IntegrationUnavailable(_) => ApiError::Unavailable(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::NotFound(e) => (StatusCode::NOT_FOUND, e),
            ApiError::Rejected(e) => (StatusCode::BAD_REQUEST, e),
            ApiError::Unavailable(e) => (StatusCode::SERVICE_UNAVAILABLE, e),
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    version: &'static str,
    engine: Arc<Engine>,
}

impl AppState {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            engine,
        }
    }
}

/// Handler for GET /v1/ping
#[tracing::instrument]
async fn ping() -> impl IntoResponse {
    tracing::debug!("Handling /v1/ping request");
    (StatusCode::OK, StatusResponse::ok())
}

/// Handler for GET /v1/info
#[tracing::instrument(skip(state))]
async fn info(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    tracing::debug!("Handling /v1/info request");

    let hostname = hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string());

    (
        StatusCode::OK,
        Json(InfoResponse {
            version: state.version.to_string(),
            hostname,
        }),
    )
}

/// Handler for GET /v1/climate
#[tracing::instrument(skip(state))]
async fn list_climates(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.engine.state_snapshot();
    let climates: BTreeMap<String, ClimateState> = snapshot
        .climates
        .iter()
        .map(|(id, climate)| (id.clone(), climate.clone()))
        .collect();
    Json(climates)
}

/// Handler for GET /v1/climate/:entity_id
#[tracing::instrument(skip(state))]
async fn get_climate(
    State(state): State<Arc<AppState>>,
    Path(entity_id): Path<String>,
) -> Result<Json<ClimateState>, ApiError> {
    let snapshot = state.engine.state_snapshot();
    snapshot
        .climates
        .get(&entity_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Unknown climate entity: {}", entity_id)))
}

/// Handler for GET /v1/devices
#[tracing::instrument(skip(state))]
async fn list_devices(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.engine.state_snapshot().devices.clone())
}

/// Route a command to the entity and wait for the integration's verdict
async fn run_command(
    engine: &Engine,
    entity_id: String,
    command: ClimateCommand,
) -> Result<Json<StatusResponse>, ApiError> {
    tracing::debug!("Sending {:?} to {}", command, entity_id);
    let reply = engine.send_climate_command(entity_id.clone(), command)?;
    match reply.await {
        Ok(Ok(())) => Ok(StatusResponse::ok()),
        Ok(Err(e)) => Err(ApiError::Rejected(e)),
        Err(_) => Err(ApiError::Unavailable(format!(
            "No reply from the integration owning {}",
            entity_id
        ))),
    }
}

/// Handler for POST /v1/climate/:entity_id/hvac_mode
#[tracing::instrument(skip(state))]
async fn set_hvac_mode(
    State(state): State<Arc<AppState>>,
    Path(entity_id): Path<String>,
    Json(req): Json<HvacModeRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    run_command(&state.engine, entity_id, ClimateCommand::SetHvacMode(req.hvac_mode)).await
}

/// Handler for POST /v1/climate/:entity_id/temperature
#[tracing::instrument(skip(state))]
async fn set_temperature(
    State(state): State<Arc<AppState>>,
    Path(entity_id): Path<String>,
    Json(req): Json<TemperatureRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    run_command(
        &state.engine,
        entity_id,
        ClimateCommand::SetTemperature(req.temperature),
    )
    .await
}

/// Handler for POST /v1/climate/:entity_id/fan_mode
#[tracing::instrument(skip(state))]
async fn set_fan_mode(
    State(state): State<Arc<AppState>>,
    Path(entity_id): Path<String>,
    Json(req): Json<FanModeRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    run_command(&state.engine, entity_id, ClimateCommand::SetFanMode(req.fan_mode)).await
}

/// Handler for POST /v1/climate/:entity_id/turn_on
#[tracing::instrument(skip(state))]
async fn turn_on(
    State(state): State<Arc<AppState>>,
    Path(entity_id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    run_command(&state.engine, entity_id, ClimateCommand::TurnOn).await
}

/// Handler for POST /v1/climate/:entity_id/turn_off
#[tracing::instrument(skip(state))]
async fn turn_off(
    State(state): State<Arc<AppState>>,
    Path(entity_id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    run_command(&state.engine, entity_id, ClimateCommand::TurnOff).await
}

/// Create the API router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/ping", get(ping))
        .route("/v1/info", get(info))
        .route("/v1/climate", get(list_climates))
        .route("/v1/climate/:entity_id", get(get_climate))
        .route("/v1/climate/:entity_id/hvac_mode", post(set_hvac_mode))
        .route("/v1/climate/:entity_id/temperature", post(set_temperature))
        .route("/v1/climate/:entity_id/fan_mode", post(set_fan_mode))
        .route("/v1/climate/:entity_id/turn_on", post(turn_on))
        .route("/v1/climate/:entity_id/turn_off", post(turn_off))
        .route("/v1/devices", get(list_devices))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP API server
///
/// Binds to `listen:port` and serves until `shutdown_rx` fires.
pub async fn serve(
    listen: String,
    port: u16,
    engine: Arc<Engine>,
    shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) -> anyhow::Result<()> {
    let app = create_router(Arc::new(AppState::new(engine)));

    let addr: SocketAddr = format!("{}:{}", listen, port)
        .parse()
        .with_context(|| format!("Invalid API listen address {}:{}", listen, port))?;
    tracing::info!("Starting HTTP API server on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_rx.await.ok();
            tracing::info!("HTTP API server shutting down gracefully");
        })
        .await?;

    Ok(())
}
