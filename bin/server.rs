// Park and Ride - API Server
// REST access to the rate table and parking ledger

use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
    Router,
};
use chrono::Local;
use log::{error, info};
use park_and_ride::{
    CheckoutReceipt, Config, DailySummary, FeeQuote, Leaving, ParkedVehicle, ParkingError,
    ParkingLot, RateEntry, TimeOfDay,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;

/// Shared application state
#[derive(Clone)]
struct AppState {
    lot: Arc<Mutex<ParkingLot>>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

// ============================================================================
// Request / Response bodies
// ============================================================================

#[derive(Deserialize)]
struct RateUpdate {
    /// Number or numeric string
    rate: serde_json::Value,
}

#[derive(Deserialize)]
struct CheckInRequest {
    #[serde(rename = "type", default)]
    vehicle_type: String,
    #[serde(default)]
    number: String,
}

#[derive(Deserialize, Default)]
struct FeeRequest {
    /// `HH:MM`; omitted means "now"
    #[serde(default)]
    leaving_time: Option<String>,
}

#[derive(Deserialize)]
struct CheckoutRequest {
    fee: f64,
}

#[derive(Deserialize, Default)]
struct ResetRequest {
    #[serde(default)]
    confirm: bool,
}

#[derive(Serialize)]
struct QuoteResponse {
    vehicle: ParkedVehicle,
    rate: f64,
    minutes: i64,
    fee: f64,
}

#[derive(Serialize)]
struct ReceiptResponse {
    vehicle: ParkedVehicle,
    fee: f64,
    total_revenue: f64,
}

impl From<FeeQuote> for QuoteResponse {
    fn from(quote: FeeQuote) -> Self {
        Self {
            vehicle: quote.vehicle,
            rate: quote.rate,
            minutes: quote.minutes,
            fee: quote.fee,
        }
    }
}

impl From<CheckoutReceipt> for ReceiptResponse {
    fn from(receipt: CheckoutReceipt) -> Self {
        Self {
            vehicle: receipt.vehicle,
            fee: receipt.fee,
            total_revenue: receipt.total_revenue,
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn status_for(err: &ParkingError) -> StatusCode {
    match err {
        ParkingError::VehicleNotFound(_) => StatusCode::NOT_FOUND,
        ParkingError::DuplicatePlate(_) => StatusCode::CONFLICT,
        e if e.is_validation() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: ParkingError) -> Response {
    let status = status_for(&err);
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!("Request failed: {}", err);
    }
    (status, Json(ApiResponse::<()>::err(err.to_string()))).into_response()
}

/// Run `f` against the locked lot and wrap the outcome
fn with_lot<T, F>(state: &AppState, f: F) -> Response
where
    T: Serialize,
    F: FnOnce(&ParkingLot) -> park_and_ride::Result<T>,
{
    let lot = match state.lot.lock() {
        Ok(lot) => lot,
        Err(_) => {
            return error_response(ParkingError::PersistenceFailure(anyhow::anyhow!(
                "parking lot lock poisoned"
            )))
        }
    };

    match f(&lot) {
        Ok(data) => (StatusCode::OK, Json(ApiResponse::ok(data))).into_response(),
        Err(e) => error_response(e),
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/rates - Rate table in stored order
async fn get_rates(State(state): State<AppState>) -> Response {
    with_lot(&state, |lot| lot.rates.get_all())
}

/// PUT /api/rates/:vehicle_type - Change one hourly rate
async fn update_rate(
    State(state): State<AppState>,
    Path(vehicle_type): Path<String>,
    Json(body): Json<RateUpdate>,
) -> Response {
    with_lot(&state, |lot| -> park_and_ride::Result<RateEntry> {
        match &body.rate {
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(rate) => lot.rates.set_rate(&vehicle_type, rate),
                None => Err(ParkingError::InvalidRateInput(n.to_string())),
            },
            serde_json::Value::String(text) => lot.rates.update_rate(&vehicle_type, text),
            other => Err(ParkingError::InvalidRateInput(other.to_string())),
        }
    })
}

/// GET /api/vehicles - Parked vehicles
async fn get_vehicles(State(state): State<AppState>) -> Response {
    with_lot(&state, |lot| lot.ledger.parked())
}

/// POST /api/vehicles - Check a vehicle in
async fn check_in(State(state): State<AppState>, Json(body): Json<CheckInRequest>) -> Response {
    with_lot(&state, |lot| lot.ledger.check_in(&body.vehicle_type, &body.number))
}

/// GET /api/vehicles/:plate - Look up a parked vehicle
async fn get_vehicle(State(state): State<AppState>, Path(plate): Path<String>) -> Response {
    with_lot(&state, |lot| lot.ledger.find_by_plate(&plate))
}

/// POST /api/vehicles/:plate/fee - Quote the charge without checking out
async fn quote_fee(
    State(state): State<AppState>,
    Path(plate): Path<String>,
    body: Option<Json<FeeRequest>>,
) -> Response {
    let request = body.map(|Json(b)| b).unwrap_or_default();

    with_lot(&state, |lot| {
        let record = lot.ledger.find_by_plate(&plate)?;
        let leaving = match request.leaving_time.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => Leaving::TimeOfDay(TimeOfDay::parse(text)?),
            _ => Leaving::At(Local::now()),
        };
        lot.ledger.quote(&record, leaving).map(QuoteResponse::from)
    })
}

/// POST /api/vehicles/:plate/checkout - Book the fee and release the vehicle
async fn check_out(
    State(state): State<AppState>,
    Path(plate): Path<String>,
    Json(body): Json<CheckoutRequest>,
) -> Response {
    with_lot(&state, |lot| {
        let record = lot.ledger.find_by_plate(&plate)?;
        lot.ledger
            .check_out(&record, body.fee)
            .map(ReceiptResponse::from)
    })
}

/// GET /api/revenue - Daily summary
async fn get_revenue(State(state): State<AppState>) -> Response {
    with_lot(&state, |lot| -> park_and_ride::Result<DailySummary> {
        lot.ledger.summary()
    })
}

/// POST /api/revenue/reset - Zero the counter, needs {"confirm": true}
async fn reset_revenue(State(state): State<AppState>, body: Option<Json<ResetRequest>>) -> Response {
    let confirmed = body.map(|Json(b)| b.confirm).unwrap_or(false);
    if !confirmed {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<()>::err(
                "resetting revenue requires {\"confirm\": true}".to_string(),
            )),
        )
            .into_response();
    }

    with_lot(&state, |lot| {
        lot.ledger.reset_revenue()?;
        lot.ledger.summary()
    })
}

fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/rates", get(get_rates))
        .route("/rates/:vehicle_type", put(update_rate))
        .route("/vehicles", get(get_vehicles).post(check_in))
        .route("/vehicles/:plate", get(get_vehicle))
        .route("/vehicles/:plate/fee", post(quote_fee))
        .route("/vehicles/:plate/checkout", post(check_out))
        .route("/revenue", get(get_revenue))
        .route("/revenue/reset", post(reset_revenue))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    println!("🌐 Park and Ride - API Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = Config::from_env()?;
    let lot = ParkingLot::open(&config)
        .with_context(|| format!("Failed to open {}", config.db_path.display()))?;
    println!("✓ Store opened: {:?}", config.db_path);

    let state = AppState {
        lot: Arc::new(Mutex::new(lot)),
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    info!("Listening on {}", config.bind_addr);
    println!("\n🚀 Server running on http://{}", config.bind_addr);
    println!("   API: http://{}/api/vehicles", config.bind_addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .context("Server stopped unexpectedly")?;

    Ok(())
}
