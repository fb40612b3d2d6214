//! End-to-end flows through the API router with real HTTP clients
//! talking to mock upstream services.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use propval::api::{build_router, ApiState};
use propval::clients::address::AddressResolver;
use propval::clients::valuation::ValuationClient;
use propval::market::format::GbpFormatter;
use propval::market::source::FileDatasetSource;
use propval::market::MarketDataAggregator;

async fn app() -> (axum::Router, Arc<common::UpstreamHits>) {
    let (base, hits) = common::spawn_mock_upstream().await;
    let timeout = Duration::from_secs(5);

    let state = Arc::new(ApiState {
        addresses: Arc::new(AddressResolver::new(base.clone(), timeout).unwrap()),
        valuations: Arc::new(ValuationClient::new(base, None, timeout).unwrap()),
        market: Arc::new(MarketDataAggregator::new(Box::new(FileDatasetSource::new(
            "data/london_boroughs.csv",
        )))),
        formatter: Arc::new(GbpFormatter),
    });

    (build_router(state), hits)
}

async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(resp.into_body(), 1_000_000).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, json: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_address_lookup_formats_postcode_before_calling_upstream() {
    let (app, hits) = app().await;

    let resp = app.oneshot(get("/api/addresses?postcode=sw1a1aa")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json = body_json(resp).await;
    assert_eq!(json["valid"], true);
    assert_eq!(json["postcode"], "SW1A 1AA");
    assert_eq!(json["addresses"].as_array().unwrap().len(), 2);
    assert_eq!(hits.lookups(), 1);
}

#[tokio::test]
async fn test_address_lookup_unknown_postcode() {
    let (app, _) = app().await;
    let json = body_json(app.oneshot(get("/api/addresses?postcode=ZZ99ZZZ")).await.unwrap()).await;
    assert_eq!(json["valid"], false);
    assert_eq!(json["addresses"].as_array().unwrap().len(), 0);
    assert_eq!(json["message"], "Postcode not found");
}

#[tokio::test]
async fn test_address_lookup_upstream_failure_degrades() {
    let (app, hits) = app().await;
    let resp = app.oneshot(get("/api/addresses?postcode=E16AN")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json = body_json(resp).await;
    assert_eq!(json["valid"], false);
    assert_eq!(json["message"], "Postcode validation service unavailable");
    assert_eq!(hits.lookups(), 1);
}

#[tokio::test]
async fn test_valuation_round_trip_defaults_condition() {
    let (app, hits) = app().await;
    let resp = app
        .oneshot(post(
            "/api/valuations",
            serde_json::json!({"postcode": "SW1A 1AA", "propertyType": "terraced", "bedrooms": "3"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json = body_json(resp).await;
    assert_eq!(json["priceInfo"]["estimatedValue"], 640_000);
    assert_eq!(json["priceInfo"]["condition"], "average");
    assert_eq!(json["offerDetails"]["offerValue"], 544_000);
    assert_eq!(hits.valuations(), 1);
}

#[tokio::test]
async fn test_valuation_upstream_validation_error() {
    let (app, _) = app().await;
    let resp = app
        .oneshot(post(
            "/api/valuations",
            serde_json::json!({"postcode": "ZZ1 1ZZ", "propertyType": "flat", "bedrooms": "1"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "Postcode outside coverage area");
}

#[tokio::test]
async fn test_valuation_missing_input_never_reaches_upstream() {
    let (app, hits) = app().await;
    let resp = app
        .oneshot(post(
            "/api/valuations",
            serde_json::json!({"postcode": "SW1A 1AA", "bedrooms": "2"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(resp).await["error"],
        "Missing required field: propertyType"
    );
    assert_eq!(hits.valuations(), 0);
}

#[tokio::test]
async fn test_local_offer_estimate() {
    let (app, hits) = app().await;
    let resp = app
        .oneshot(post(
            "/api/offers",
            serde_json::json!({"propertyType": "detached", "bedrooms": "3", "condition": "good"}),
        ))
        .await
        .unwrap();
    let json = body_json(resp).await;
    assert_eq!(json["estimatedValue"], 528_000);
    assert_eq!(json["offerValue"], 448_800);
    assert_eq!(hits.valuations(), 0);
}

#[tokio::test]
async fn test_market_stats_from_bundled_dataset() {
    let (app, _) = app().await;
    let resp = app.oneshot(get("/api/market/stats")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json = body_json(resp).await;
    assert_eq!(json["dataset"], "loaded");
    assert_eq!(json["stats"]["totalBoroughs"], 32);
    assert_eq!(json["stats"]["priceRange"]["maxBorough"], "Kensington & Chelsea");
    assert_eq!(json["stats"]["priceRange"]["max"], 1_463_000);
    assert_eq!(json["stats"]["priceRange"]["minBorough"], "Barking & Dagenham");
    assert_eq!(json["stats"]["crimeStats"]["safestBorough"], "Kingston upon Thames");
    assert_eq!(json["stats"]["councilTaxRange"]["min"], 952.91);
}
