mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Duration;
use serde_json::{json, Value};
use tower::ServiceExt;

use softstake::api::router::create_router;
use softstake::config::AppConfig;
use softstake::AppState;

async fn build_test_app() -> (axum::Router, sqlx::PgPool) {
    let pool = common::setup_test_db().await;
    common::seed_canonical_config(&pool).await;

    let config = AppConfig {
        database_url: String::new(),
        host: "127.0.0.1".into(),
        port: 0,
        granter_enabled: false,
        granter_interval_secs: 3600,
        seed_config: false,
        seed_min_holding_hours: 24,
        seed_min_balance_threshold: rust_decimal::Decimal::from(500),
        seed_rate_per_500_units: rust_decimal::Decimal::ONE,
        seed_max_daily_amount: rust_decimal::Decimal::from(10),
        seed_snapshot_interval_hours: 12,
        seed_tolerance_percentage: rust_decimal::Decimal::from(5),
    };

    let state = AppState {
        db: pool.clone(),
        config,
        metrics_handle: common::metrics_handle(),
    };

    (create_router(state), pool)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _pool) = build_test_app().await;

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_get_config_returns_active() {
    let (app, _pool) = build_test_app().await;

    let response = app
        .oneshot(Request::get("/api/config").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["min_balance_threshold"], json!("500"));
}

#[tokio::test]
async fn test_record_snapshot_roundtrip() {
    let (app, _pool) = build_test_app().await;
    let wallet = common::test_wallet("API");

    let event = json!({
        "wallet": wallet,
        "balance": "600",
        "observed_at": common::base_time().to_rfc3339(),
    });

    let response = app
        .clone()
        .oneshot(
            Request::post("/api/snapshots")
                .header("content-type", "application/json")
                .body(Body::from(event.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert!(body["data"]["snapshot_id"].is_string());

    // The period it opened shows up in stats.
    let response = app
        .oneshot(
            Request::get(format!("/api/wallets/{wallet}/stats"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["data"]["current_period_started_at"].is_string());
    assert_eq!(body["data"]["days_rewarded"], json!(0));
}

#[tokio::test]
async fn test_record_negative_balance_is_bad_request() {
    let (app, _pool) = build_test_app().await;

    let event = json!({
        "wallet": common::test_wallet("APINEG"),
        "balance": "-1",
        "observed_at": common::base_time().to_rfc3339(),
    });

    let response = app
        .oneshot(
            Request::post("/api/snapshots")
                .header("content-type", "application/json")
                .body(Body::from(event.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_sessions_listed_newest_first() {
    let (app, _pool) = build_test_app().await;
    let wallet = common::test_wallet("APISESS");
    let t0 = common::base_time();

    // Two periods: one broken by a drop to zero, a later one still open.
    for (hours, balance) in [(0i64, 600i64), (12, 0), (24, 700)] {
        let event = json!({
            "wallet": wallet,
            "balance": balance.to_string(),
            "observed_at": (t0 + Duration::hours(hours)).to_rfc3339(),
        });
        let response = app
            .clone()
            .oneshot(
                Request::post("/api/snapshots")
                    .header("content-type", "application/json")
                    .body(Body::from(event.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .oneshot(
            Request::get(format!("/api/wallets/{wallet}/sessions?limit=10"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let sessions = body["data"].as_array().expect("sessions array");
    assert_eq!(sessions.len(), 2);
    assert!(sessions[0]["ended_at"].is_null());
    assert!(sessions[1]["ended_at"].is_string());
}

#[tokio::test]
async fn test_eligibility_fails_closed_for_unknown_wallet() {
    let (app, _pool) = build_test_app().await;
    let wallet = common::test_wallet("APIUNKNOWN");

    let response = app
        .oneshot(
            Request::get(format!("/api/wallets/{wallet}/eligibility"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["is_eligible"], json!(false));
    assert_eq!(body["data"]["min_balance_24h"], json!("0"));
    assert!(body["data"]["today_reward"].is_null());
}
