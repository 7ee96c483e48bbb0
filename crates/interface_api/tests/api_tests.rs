//! HTTP API tests
//!
//! Drive the full router over the in-memory ledger with a frozen clock.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use tower::ServiceExt;

use core_kernel::{FixedClock, UserId};
use domain_investment::InMemoryLedgerStore;
use interface_api::{auth::create_token, config::ApiConfig, create_router, AppState};

const SECRET: &str = "test-secret";

fn app() -> Router {
    let config = ApiConfig {
        jwt_secret: SECRET.to_string(),
        ..ApiConfig::default()
    };
    let clock = FixedClock::on(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
    let state = AppState::new(Arc::new(InMemoryLedgerStore::new()), Arc::new(clock), config);
    create_router(state)
}

fn token(user: UserId, roles: &[&str]) -> String {
    create_token(user, roles.iter().map(|r| r.to_string()).collect(), SECRET, 600).unwrap()
}

async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn project_body(total_shares: u32) -> Value {
    json!({
        "property_type": "project",
        "title": "Harbour Point",
        "location": "Lisbon",
        "price": "50000",
        "currency": "USD",
        "total_shares": total_shares,
        "advancement_percent": "20",
        "number_of_installments": 10,
        "installment_frequency": "monthly"
    })
}

/// Registers a property as an admin and returns its id
async fn register(app: &Router, body: Value) -> String {
    let admin = token(UserId::new(), &["admin"]);
    let (status, value) = send(app, Method::POST, "/api/v1/properties", Some(&admin), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{}", value);
    value["data"]["id"].as_str().unwrap().to_string()
}

// ============================================================================
// Health and authentication
// ============================================================================

mod access_tests {
    use super::*;

    #[tokio::test]
    async fn test_health_is_public() {
        let app = app();
        let (status, body) = send(&app, Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        let (status, body) = send(&app, Method::GET, "/health/ready", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ready");
    }

    #[tokio::test]
    async fn test_responses_carry_request_id() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let app = app();
        let (status, body) = send(&app, Method::GET, "/api/v1/investments", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_token_signed_with_another_secret_is_rejected() {
        let app = app();
        let forged = create_token(UserId::new(), vec!["admin".to_string()], "other", 600).unwrap();
        let (status, _) = send(&app, Method::GET, "/api/v1/portfolio", Some(&forged), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_investor_cannot_register_property() {
        let app = app();
        let investor = token(UserId::new(), &["investor"]);
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/properties",
            Some(&investor),
            Some(project_body(10)),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_property_writer_role_can_register() {
        let app = app();
        let writer = token(UserId::new(), &["property:write"]);
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/properties",
            Some(&writer),
            Some(project_body(10)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["available_shares"], 10);
    }
}

// ============================================================================
// Properties
// ============================================================================

mod property_tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_body_is_unprocessable() {
        let app = app();
        let admin = token(UserId::new(), &["admin"]);
        let mut body = project_body(10);
        body["total_shares"] = json!(0);
        let (status, body) = send(&app, Method::POST, "/api/v1/properties", Some(&admin), Some(body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let app = app();
        let admin = token(UserId::new(), &["admin"]);
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/v1/properties",
            Some(&admin),
            Some(json!({ "title": "no type" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_property_is_not_found() {
        let app = app();
        let investor = token(UserId::new(), &["investor"]);
        let uri = format!("/api/v1/properties/{}", uuid::Uuid::new_v4());
        let (status, body) = send(&app, Method::GET, &uri, Some(&investor), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "PROPERTY_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_terms_update_reprices_shares() {
        let app = app();
        let admin = token(UserId::new(), &["admin"]);
        let id = register(&app, project_body(10)).await;

        let uri = format!("/api/v1/properties/{}/terms", id);
        let (status, body) = send(
            &app,
            Method::PUT,
            &uri,
            Some(&admin),
            Some(json!({ "price": "100000" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["data"]["price"]["currency"], "USD");
        assert_eq!(body["data"]["version"], 2);
    }

    #[tokio::test]
    async fn test_single_activation_requires_funding() {
        let app = app();
        let admin = token(UserId::new(), &["admin"]);
        let mut body = project_body(10);
        body["property_type"] = json!("single");
        let id = register(&app, body).await;

        let uri = format!("/api/v1/properties/{}/activate-schedules", id);
        let (status, body) = send(&app, Method::POST, &uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }
}

// ============================================================================
// Investments
// ============================================================================

mod investment_tests {
    use super::*;

    #[tokio::test]
    async fn test_invest_and_pay_down_payment() {
        let app = app();
        let id = register(&app, project_body(10)).await;
        let investor = token(UserId::new(), &["investor"]);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/investments",
            Some(&investor),
            Some(json!({ "property_id": id, "shares": 2 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        assert_eq!(body["data"]["status"], "pending");
        assert_eq!(body["data"]["shares_invested"], 2);
        assert_eq!(body["data"]["installments"].as_array().unwrap().len(), 10);
        let investment_id = body["data"]["id"].as_str().unwrap().to_string();

        let uri = format!("/api/v1/investments/{}/down-payment", investment_id);
        let (status, body) = send(
            &app,
            Method::POST,
            &uri,
            Some(&investor),
            Some(json!({ "transaction_id": "txn-1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["data"]["status"], "active");
        assert_eq!(body["data"]["down_payment_paid"], true);

        let (status, body) = send(
            &app,
            Method::POST,
            &uri,
            Some(&investor),
            Some(json!({ "transaction_id": "txn-2" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "ALREADY_PAID");

        let (status, body) = send(&app, Method::GET, "/api/v1/investments", Some(&investor), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_oversized_request_is_conflict() {
        let app = app();
        let id = register(&app, project_body(3)).await;
        let investor = token(UserId::new(), &["investor"]);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/investments",
            Some(&investor),
            Some(json!({ "property_id": id, "shares": 4 })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "INSUFFICIENT_SHARES");
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_zero_shares_is_unprocessable() {
        let app = app();
        let id = register(&app, project_body(3)).await;
        let investor = token(UserId::new(), &["investor"]);

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/v1/investments",
            Some(&investor),
            Some(json!({ "property_id": id, "shares": 0 })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_other_users_investment_is_hidden() {
        let app = app();
        let id = register(&app, project_body(10)).await;
        let owner = token(UserId::new(), &["investor"]);
        let stranger = token(UserId::new(), &["investor"]);

        let (_, body) = send(
            &app,
            Method::POST,
            "/api/v1/investments",
            Some(&owner),
            Some(json!({ "property_id": id, "shares": 1 })),
        )
        .await;
        let investment_id = body["data"]["id"].as_str().unwrap().to_string();

        let uri = format!("/api/v1/investments/{}", investment_id);
        let (status, body) = send(&app, Method::GET, &uri, Some(&stranger), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "INVESTMENT_NOT_FOUND");

        let uri = format!("/api/v1/investments/{}/cancel", investment_id);
        let (status, _) = send(&app, Method::POST, &uri, Some(&stranger), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(&app, Method::POST, &uri, Some(&owner), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "cancelled");
    }
}

// ============================================================================
// Payment schedule and portfolio
// ============================================================================

mod schedule_tests {
    use super::*;

    #[tokio::test]
    async fn test_schedule_lists_down_payment_and_installments() {
        let app = app();
        let id = register(&app, project_body(10)).await;
        let investor = token(UserId::new(), &["investor"]);
        send(
            &app,
            Method::POST,
            "/api/v1/investments",
            Some(&investor),
            Some(json!({ "property_id": id, "shares": 1 })),
        )
        .await;

        let (status, body) = send(&app, Method::GET, "/api/v1/payment-schedule", Some(&investor), None).await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        let lines = body["data"]["items"].as_array().unwrap();
        assert_eq!(lines.len(), 11);
        assert_eq!(lines[0]["kind"], "down_payment");
        assert_eq!(lines[0]["due_date"], "2025-01-15");

        let (status, body) = send(
            &app,
            Method::GET,
            "/api/v1/payment-schedule?filter=upcoming&days=31",
            Some(&investor),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_filter_is_bad_request() {
        let app = app();
        let investor = token(UserId::new(), &["investor"]);
        let (status, body) = send(
            &app,
            Method::GET,
            "/api/v1/payment-schedule?filter=late",
            Some(&investor),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_portfolio_counts_open_investments() {
        let app = app();
        let first = register(&app, project_body(10)).await;
        let second = register(&app, project_body(10)).await;
        let investor = token(UserId::new(), &["investor"]);

        for (property, shares) in [(&first, 2), (&second, 3)] {
            let (status, _) = send(
                &app,
                Method::POST,
                "/api/v1/investments",
                Some(&investor),
                Some(json!({ "property_id": property, "shares": shares })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, body) = send(&app, Method::GET, "/api/v1/portfolio", Some(&investor), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["investment_count"], 2);
        assert_eq!(body["data"]["property_count"], 2);
        assert_eq!(body["data"]["total_shares"], 5);
    }
}
