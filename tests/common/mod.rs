//! Mock upstream services for integration testing.
//!
//! Serves deterministic address-lookup and valuation endpoints on a local
//! ephemeral port and counts the requests each one receives.

#![allow(dead_code)]

use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Request counters shared with the mock handlers.
#[derive(Default)]
pub struct UpstreamHits {
    pub lookups: AtomicUsize,
    pub valuations: AtomicUsize,
}

impl UpstreamHits {
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn valuations(&self) -> usize {
        self.valuations.load(Ordering::SeqCst)
    }
}

/// Known postcodes: anything starting with "SW1A" resolves, "ZZ" is
/// reported invalid, everything else gets a 500.
fn lookup_response(postcode: &str) -> axum::response::Response {
    if postcode.starts_with("SW1A") {
        Json(serde_json::json!({
            "valid": true,
            "postcode": postcode,
            "region": "London",
            "district": "Westminster",
            "addresses": [
                {"addressLine1": "1 Horse Guards Road", "town": "London", "postcode": postcode},
                {"addressLine1": "2 Horse Guards Road", "town": "London", "postcode": postcode}
            ]
        }))
        .into_response()
    } else if postcode.starts_with("ZZ") {
        Json(serde_json::json!({"valid": false, "message": "Postcode not found"})).into_response()
    } else {
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}

/// Valuation rules: "ZZ" postcodes fail validation, otherwise a fixed
/// valuation is returned.
fn valuation_response(body: &serde_json::Value) -> axum::response::Response {
    let postcode = body["postcode"].as_str().unwrap_or_default();
    if postcode.starts_with("ZZ") {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Postcode outside coverage area", "validationError": true})),
        )
            .into_response();
    }

    Json(serde_json::json!({
        "priceInfo": {
            "estimatedValue": 640000,
            "region": "London",
            "recentSales": 9,
            "priceRange": {"min": 590000, "max": 700000},
            "source": "mock-hpi",
            "lastUpdated": "2026-10-01",
            "condition": body["condition"]
        },
        "offerDetails": {"offerValue": 544000}
    }))
    .into_response()
}

/// Start both mock upstreams on one local server; returns (base URL, hits).
pub async fn spawn_mock_upstream() -> (String, Arc<UpstreamHits>) {
    let hits = Arc::new(UpstreamHits::default());
    let lookup_hits = hits.clone();
    let valuation_hits = hits.clone();

    let router = Router::new()
        .route(
            "/api/addresses/lookup",
            get(move |Query(q): Query<HashMap<String, String>>| {
                lookup_hits.lookups.fetch_add(1, Ordering::SeqCst);
                async move { lookup_response(q.get("postcode").map(String::as_str).unwrap_or("")) }
            }),
        )
        .route(
            "/api/valuations/estimate",
            post(move |Json(body): Json<serde_json::Value>| {
                valuation_hits.valuations.fetch_add(1, Ordering::SeqCst);
                async move { valuation_response(&body) }
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (format!("http://{addr}"), hits)
}
