//! Valuation service client.
//!
//! Sends the property attributes to the upstream valuation service and
//! maps its answer into typed results. Required inputs are checked
//! locally before any request is made.
//!
//! Endpoint: `POST {base}/api/valuations/estimate`
//! Body: `{ postcode, propertyType, bedrooms, condition }`
//! Errors: `{ error, validationError? }`, HTTP 400 for bad input.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{ValuationRequest, ValuationService};
use crate::types::{OfferDetails, PropertyPriceInfo, PropvalError, ValuationResponse};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const ESTIMATE_PATH: &str = "/api/valuations/estimate";

/// Condition sent when the form leaves it blank.
const DEFAULT_CONDITION: &str = "average";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
struct EstimateBody<'a> {
    postcode: &'a str,
    property_type: &'a str,
    bedrooms: &'a str,
    condition: &'a str,
}

/// Success body before presence checks.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEstimateResponse {
    #[serde(default)]
    price_info: Option<PropertyPriceInfo>,
    #[serde(default)]
    offer_details: Option<OfferDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpstreamErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    validation_error: bool,
}

fn required<'a>(value: &'a str, field: &'static str) -> Result<&'a str, PropvalError> {
    let value = value.trim();
    if value.is_empty() {
        Err(PropvalError::MissingInput(field))
    } else {
        Ok(value)
    }
}

impl ValuationRequest {
    /// Check required fields and fill in the default condition.
    fn to_body(&self) -> Result<EstimateBody<'_>, PropvalError> {
        let postcode = required(&self.postcode, "postcode")?;
        let property_type = required(&self.property_type, "propertyType")?;
        let bedrooms = required(&self.bedrooms, "bedrooms")?;
        let condition = self
            .condition
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CONDITION);

        Ok(EstimateBody {
            postcode,
            property_type,
            bedrooms,
            condition,
        })
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP client for the valuation service.
pub struct ValuationClient {
    http: Client,
    base_url: String,
    /// Optional bearer token for the valuation service.
    api_key: Option<String>,
}

impl ValuationClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent("propval/0.1.0")
            .build()
            .context("Failed to build HTTP client for valuation service")?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Map a non-success response to the matching error.
    fn classify_failure(status: StatusCode, body: &str) -> PropvalError {
        let parsed = serde_json::from_str::<UpstreamErrorBody>(body).ok();

        match parsed {
            Some(err) if status == StatusCode::BAD_REQUEST && err.validation_error => {
                let message = if err.error.is_empty() {
                    "Invalid valuation request".to_string()
                } else {
                    err.error
                };
                PropvalError::ValidationError(message)
            }
            Some(err) if !err.error.is_empty() => PropvalError::EstimationFailed(err.error),
            _ => PropvalError::EstimationFailed(format!("upstream returned {status}")),
        }
    }

    /// Check the success body carries a price-info payload.
    fn map_success(body: &str) -> Result<ValuationResponse, PropvalError> {
        let raw: RawEstimateResponse = serde_json::from_str(body)
            .map_err(|e| PropvalError::EstimationFailed(format!("malformed response: {e}")))?;

        let price_info = raw.price_info.ok_or_else(|| {
            PropvalError::UpstreamUnavailable("response did not include price information".into())
        })?;

        Ok(ValuationResponse {
            price_info,
            offer_details: raw.offer_details,
        })
    }
}

#[async_trait]
impl ValuationService for ValuationClient {
    async fn get_estimate(
        &self,
        request: &ValuationRequest,
    ) -> Result<ValuationResponse, PropvalError> {
        let body = request.to_body()?;
        let url = format!("{}{ESTIMATE_PATH}", self.base_url);

        debug!(
            postcode = body.postcode,
            property_type = body.property_type,
            bedrooms = body.bedrooms,
            condition = body.condition,
            "Requesting valuation"
        );

        let mut req = self.http.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req.send().await.map_err(|e| {
            warn!(error = %e, "Valuation request failed");
            PropvalError::EstimationFailed(e.to_string())
        })?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| PropvalError::EstimationFailed(e.to_string()))?;

        if !status.is_success() {
            let err = Self::classify_failure(status, &text);
            warn!(status = %status, error = %err, "Valuation rejected");
            return Err(err);
        }

        let valuation = Self::map_success(&text)?;
        info!(
            postcode = body.postcode,
            estimated_value = valuation.price_info.estimated_value,
            offer_value = valuation.offer_details.as_ref().map(|o| o.offer_value),
            "Valuation received"
        );
        Ok(valuation)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{spawn_upstream, unreachable_base_url};
    use axum::http::{HeaderMap, StatusCode as AxumStatus};
    use axum::response::IntoResponse;
    use axum::routing::post;
    use axum::{Json, Router};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn client(base: &str) -> ValuationClient {
        ValuationClient::new(base, None, Duration::from_secs(5)).unwrap()
    }

    fn request() -> ValuationRequest {
        ValuationRequest::new("SW1A 1AA", "detached", "3", Some("good".into()))
    }

    fn ok_body() -> serde_json::Value {
        serde_json::json!({
            "priceInfo": {
                "estimatedValue": 528000,
                "region": "London",
                "recentSales": 14,
                "priceRange": {"min": 480000, "max": 575000},
                "source": "land-registry",
                "lastUpdated": "2026-09-30"
            },
            "offerDetails": {"offerValue": 448800}
        })
    }

    /// Upstream that answers every estimate with a fixed status and body.
    fn fixed_router(status: AxumStatus, body: serde_json::Value) -> Router {
        Router::new().route(
            ESTIMATE_PATH,
            post(move || {
                let body = body.clone();
                async move { (status, Json(body)).into_response() }
            }),
        )
    }

    // -- Input checks --

    #[test]
    fn test_to_body_defaults_condition() {
        let req = ValuationRequest::new("E1 6AN", "flat", "2", None);
        let body = req.to_body().unwrap();
        assert_eq!(body.condition, "average");

        let req = ValuationRequest::new("E1 6AN", "flat", "2", Some("  ".into()));
        assert_eq!(req.to_body().unwrap().condition, "average");
    }

    #[test]
    fn test_to_body_serializes_camel_case() {
        let req = request();
        let json = serde_json::to_value(req.to_body().unwrap()).unwrap();
        assert_eq!(json["propertyType"], "detached");
        assert_eq!(json["condition"], "good");
    }

    #[tokio::test]
    async fn test_missing_fields_make_no_request() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let router = Router::new().route(
            ESTIMATE_PATH,
            post(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Json(serde_json::json!({})) }
            }),
        );
        let base = spawn_upstream(router).await;
        let c = client(&base);

        let cases = [
            (ValuationRequest::new("", "flat", "2", None), "postcode"),
            (ValuationRequest::new("E1 6AN", " ", "2", None), "propertyType"),
            (ValuationRequest::new("E1 6AN", "flat", "", None), "bedrooms"),
        ];
        for (req, field) in cases {
            assert_eq!(
                c.get_estimate(&req).await.unwrap_err(),
                PropvalError::MissingInput(field)
            );
        }
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    // -- Upstream responses --

    #[tokio::test]
    async fn test_success_maps_payload() {
        let base = spawn_upstream(fixed_router(AxumStatus::OK, ok_body())).await;
        let v = client(&base).get_estimate(&request()).await.unwrap();

        assert_eq!(v.price_info.estimated_value, 528_000);
        assert_eq!(v.price_info.region.as_deref(), Some("London"));
        assert_eq!(v.price_info.price_range.as_ref().unwrap().max, 575_000);
        assert_eq!(v.offer_details.unwrap().offer_value, 448_800);
    }

    #[tokio::test]
    async fn test_sends_form_fields_and_bearer_token() {
        let router = Router::new().route(
            ESTIMATE_PATH,
            post(|headers: HeaderMap, Json(body): Json<serde_json::Value>| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                if auth != "Bearer secret" || body["condition"] != "average" {
                    return (AxumStatus::UNAUTHORIZED, Json(serde_json::json!({"error": "nope"})))
                        .into_response();
                }
                Json(ok_body()).into_response()
            }),
        );
        let base = spawn_upstream(router).await;
        let c = ValuationClient::new(base, Some("secret".into()), Duration::from_secs(5)).unwrap();
        let req = ValuationRequest::new("SW1A 1AA", "detached", "3", None);
        assert!(c.get_estimate(&req).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_price_info_is_upstream_unavailable() {
        let body = serde_json::json!({"offerDetails": {"offerValue": 1}});
        let base = spawn_upstream(fixed_router(AxumStatus::OK, body)).await;
        let err = client(&base).get_estimate(&request()).await.unwrap_err();
        assert!(matches!(err, PropvalError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn test_validation_error_passes_message_through() {
        let body = serde_json::json!({"error": "Postcode not covered", "validationError": true});
        let base = spawn_upstream(fixed_router(AxumStatus::BAD_REQUEST, body)).await;
        let err = client(&base).get_estimate(&request()).await.unwrap_err();
        assert_eq!(err, PropvalError::ValidationError("Postcode not covered".into()));
    }

    #[tokio::test]
    async fn test_bad_request_without_flag_is_estimation_failed() {
        let body = serde_json::json!({"error": "Something broke"});
        let base = spawn_upstream(fixed_router(AxumStatus::BAD_REQUEST, body)).await;
        let err = client(&base).get_estimate(&request()).await.unwrap_err();
        assert_eq!(err, PropvalError::EstimationFailed("Something broke".into()));
    }

    #[tokio::test]
    async fn test_server_error_is_estimation_failed() {
        let base = spawn_upstream(fixed_router(
            AxumStatus::INTERNAL_SERVER_ERROR,
            serde_json::json!(null),
        ))
        .await;
        let err = client(&base).get_estimate(&request()).await.unwrap_err();
        assert!(matches!(err, PropvalError::EstimationFailed(m) if m.contains("500")));
    }

    #[tokio::test]
    async fn test_unreachable_is_estimation_failed() {
        let base = unreachable_base_url().await;
        let err = client(&base).get_estimate(&request()).await.unwrap_err();
        assert!(matches!(err, PropvalError::EstimationFailed(_)));
    }

    // -- Pure mapping helpers --

    #[test]
    fn test_classify_failure_empty_validation_message() {
        let err = ValuationClient::classify_failure(
            StatusCode::BAD_REQUEST,
            r#"{"validationError": true}"#,
        );
        assert_eq!(err, PropvalError::ValidationError("Invalid valuation request".into()));
    }

    #[test]
    fn test_map_success_rejects_malformed_shape() {
        let err = ValuationClient::map_success(r#"{"priceInfo": {"region": "London"}}"#).unwrap_err();
        assert!(matches!(err, PropvalError::EstimationFailed(_)));
    }
}
