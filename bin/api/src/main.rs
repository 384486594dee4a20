//! Factori API Server: serves indexed factory data and offline address derivation.

use alloy::primitives::{Address, B256, Bytes};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use factori_core::{AppError, Settings, telemetry};
use factori_protocol::{Proxy, address};
use factori_storage::{self as storage};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, sync::Arc};

/// Shared application state.
struct AppState {
    pool: sqlx::PgPool,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    telemetry::init();
    let settings = Settings::from_env()?;

    tracing::info!("Starting Factori API Server");

    let pool = storage::connect(&settings.database_url)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    storage::migrate(&pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    tracing::info!("Database ready");

    let state = Arc::new(AppState { pool });
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.api_port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Other(e.into()))?;
    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Other(e.into()))?;
    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/templates", get(list_templates))
        .route("/api/v1/templates/:key", get(get_template))
        .route("/api/v1/deployments", get(list_deployments))
        .route(
            "/api/v1/deployers/:address/deployments",
            get(get_deployer_deployments),
        )
        .route("/api/v1/fees", get(get_fees))
        .route("/api/v1/derive/clone", get(derive_clone))
        .route("/health", get(health))
        .with_state(state)
}

// ─── Query Params ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct PaginationParams {
    limit: Option<i64>,
}

impl PaginationParams {
    fn limit(&self) -> i64 {
        self.limit.unwrap_or(50).clamp(1, 500)
    }
}

/// Inputs of `/api/v1/derive/clone`, mirroring the factory's `compute` call.
#[derive(Debug, Clone, Deserialize)]
struct DeriveParams {
    /// Factory that would perform the CREATE2.
    factory: Address,
    /// Implementation (minimal proxy) or beacon (beacon proxy).
    target: Address,
    #[serde(default)]
    beacon: bool,
    seed: Option<String>,
    #[serde(default)]
    init_data: Bytes,
}

// ─── Response Types ─────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ApiResponse<T: Serialize> {
    success: bool,
    data: T,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct DerivedClone {
    address: Address,
    salt: B256,
    init_code_hash: B256,
}

#[derive(Serialize)]
struct FeesResponse {
    fee: Option<String>,
    fee_to: Option<String>,
    history: Vec<storage::models::FeeChange>,
}

type ApiError = (StatusCode, Json<ApiResponse<String>>);

fn json_ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        data,
    })
}

fn json_err(status: StatusCode, msg: &str) -> ApiError {
    (
        status,
        Json(ApiResponse {
            success: false,
            data: msg.to_string(),
        }),
    )
}

fn db_err(e: sqlx::Error) -> ApiError {
    tracing::error!(error = %e, "Query failed");
    json_err(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
}

/// Lower-case `0x` hex, the form the indexer stores.
fn normalise_hex(raw: &str) -> String {
    let trimmed = raw.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    format!("0x{}", body.to_ascii_lowercase())
}

fn derive(params: &DeriveParams) -> DerivedClone {
    let proxy = if params.beacon {
        Proxy::Beacon {
            beacon: params.target,
        }
    } else {
        Proxy::Minimal {
            implementation: params.target,
        }
    };
    let salt = address::deploy_salt(params.seed.as_deref(), &params.init_data);
    DerivedClone {
        address: proxy.derive(params.factory, salt),
        salt,
        init_code_hash: alloy::primitives::keccak256(proxy.init_code()),
    }
}

// ─── Handlers ───────────────────────────────────────────────────────────────

async fn health() -> &'static str {
    "ok"
}

/// GET /api/v1/templates: live templates.
async fn list_templates(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let templates = storage::repos::get_templates(&state.pool)
        .await
        .map_err(db_err)?;
    Ok(json_ok(templates))
}

/// GET /api/v1/templates/:key: a single template, deleted ones included.
async fn get_template(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let template = storage::repos::get_template(&state.pool, &normalise_hex(&key))
        .await
        .map_err(db_err)?;
    match template {
        Some(t) => Ok(json_ok(t)),
        None => Err(json_err(StatusCode::NOT_FOUND, "Template not found")),
    }
}

/// GET /api/v1/deployments: latest deployments.
async fn list_deployments(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let deployments = storage::repos::get_recent_deployments(&state.pool, params.limit())
        .await
        .map_err(db_err)?;
    Ok(json_ok(deployments))
}

/// GET /api/v1/deployers/:address/deployments
async fn get_deployer_deployments(
    State(state): State<Arc<AppState>>,
    Path(deployer): Path<String>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let deployer = deployer
        .parse::<Address>()
        .map_err(|e| json_err(StatusCode::BAD_REQUEST, &e.to_string()))?;
    let deployments = storage::repos::get_deployer_deployments(
        &state.pool,
        &format!("{deployer:#x}"),
        params.limit(),
    )
    .await
    .map_err(db_err)?;
    Ok(json_ok(deployments))
}

/// GET /api/v1/fees: current fee, recipient and change history.
async fn get_fees(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let fee = storage::repos::get_current_fee(&state.pool, "fee")
        .await
        .map_err(db_err)?;
    let fee_to = storage::repos::get_current_fee(&state.pool, "fee_to")
        .await
        .map_err(db_err)?;
    let history = storage::repos::get_fee_changes(&state.pool, params.limit())
        .await
        .map_err(db_err)?;
    Ok(json_ok(FeesResponse {
        fee,
        fee_to,
        history,
    }))
}

/// GET /api/v1/derive/clone: predicted clone address, computed without the chain.
async fn derive_clone(Query(params): Query<DeriveParams>) -> impl IntoResponse {
    json_ok(derive(&params))
}
