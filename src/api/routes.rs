//! API route handlers.
//!
//! All endpoints return JSON. State is shared via `Arc<ApiState>`.
//! Handlers only call into the core components and serialize results.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::clients::{AddressLookup, ValuationRequest, ValuationService};
use crate::estimator;
use crate::market::format::{format_stats, CurrencyFormatter, StatsDisplay};
use crate::market::MarketDataAggregator;
use crate::postcode;
use crate::types::{
    form_string, AddressLookupResult, BoroughRecord, MarketStats, OfferResult, PropertyAttributes,
    PropvalError, ValuationResponse,
};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct ApiState {
    pub addresses: Arc<dyn AddressLookup>,
    pub valuations: Arc<dyn ValuationService>,
    pub market: Arc<MarketDataAggregator>,
    pub formatter: Arc<dyn CurrencyFormatter>,
}

pub type AppState = Arc<ApiState>;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct PostcodeResponse {
    pub postcode: String,
    pub formatted: String,
    pub valid: bool,
}

#[derive(Debug, Deserialize)]
pub struct AddressQuery {
    #[serde(default)]
    pub postcode: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferRequest {
    #[serde(default, deserialize_with = "form_string")]
    pub property_type: String,
    #[serde(default, deserialize_with = "form_string")]
    pub bedrooms: String,
    #[serde(default, deserialize_with = "form_string")]
    pub condition: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub stats: MarketStats,
    pub display: StatsDisplay,
    /// "loaded", "fallback" or "failed".
    pub dataset: &'static str,
    pub loaded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

/// HTTP status for each domain error.
fn status_for(err: &PropvalError) -> StatusCode {
    match err {
        PropvalError::MissingInput(_) | PropvalError::ValidationError(_) => {
            StatusCode::BAD_REQUEST
        }
        PropvalError::UpstreamUnavailable(_) | PropvalError::EstimationFailed(_) => {
            StatusCode::BAD_GATEWAY
        }
        PropvalError::EmptyDataset => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn from_domain(err: PropvalError) -> ApiError {
    error_response(status_for(&err), err.to_string())
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /api/postcodes/:postcode
pub async fn check_postcode(Path(raw): Path<String>) -> Json<PostcodeResponse> {
    Json(PostcodeResponse {
        postcode: postcode::normalize(&raw),
        formatted: postcode::format(&raw),
        valid: postcode::is_valid(&raw),
    })
}

/// GET /api/addresses?postcode=
pub async fn lookup_addresses(
    State(state): State<AppState>,
    Query(query): Query<AddressQuery>,
) -> Json<AddressLookupResult> {
    Json(state.addresses.lookup(&query.postcode).await)
}

/// POST /api/offers
pub async fn estimate_offer(Json(req): Json<OfferRequest>) -> Json<OfferResult> {
    let attrs = PropertyAttributes::from_strs(&req.property_type, &req.bedrooms, &req.condition);
    let offer = estimator::estimate(&attrs);
    info!(attributes = %attrs, offer = %offer, "Offer quoted");
    Json(offer)
}

/// POST /api/valuations
pub async fn request_valuation(
    State(state): State<AppState>,
    Json(req): Json<ValuationRequest>,
) -> Result<Json<ValuationResponse>, ApiError> {
    state
        .valuations
        .get_estimate(&req)
        .await
        .map(Json)
        .map_err(from_domain)
}

/// GET /api/market/boroughs
pub async fn list_boroughs(State(state): State<AppState>) -> Json<Vec<BoroughRecord>> {
    Json(state.market.get_all().await.to_vec())
}

/// GET /api/market/boroughs/:name
pub async fn find_borough(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<BoroughRecord>, ApiError> {
    state
        .market
        .get_by_borough(&name)
        .await
        .map(|record| {
            debug!(query = %name, borough = %record, "Borough matched");
            Json(record.clone())
        })
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, format!("No borough matching '{name}'")))
}

/// GET /api/market/stats
pub async fn market_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let stats = state.market.compute_stats().await.map_err(from_domain)?;
    let dataset = state
        .market
        .load_outcome()
        .map(|o| o.kind())
        .unwrap_or("failed");

    Ok(Json(StatsResponse {
        display: format_stats(state.formatter.as_ref(), &stats),
        stats,
        dataset,
        loaded_at: state.market.loaded_at(),
    }))
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
