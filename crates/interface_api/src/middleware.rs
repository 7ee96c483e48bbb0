//! API middleware
//!
//! Runs inside the request-id layers, so every request carries an
//! `x-request-id` by the time it gets here.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tracing::{info, warn};

use crate::auth::{validate_token, AuthError, Claims};
use crate::error::ApiError;
use crate::AppState;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string()
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
}

/// Authentication middleware
///
/// Stores the validated [`Claims`] in the request extensions, where
/// [`crate::auth::AuthUser`] picks them up.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let claims = match bearer_token(request.headers()) {
        Some(token) => validate_token(token, &state.config.jwt_secret),
        None => Err(AuthError::InvalidToken),
    };

    match claims {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(e) => {
            warn!(
                request_id = %request_id(request.headers()),
                uri = %request.uri(),
                reason = %e,
                "Rejected unauthenticated request"
            );
            ApiError::Unauthorized.into_response()
        }
    }
}

/// Audit logging middleware
///
/// One line per ledger request: who, what, outcome and latency.
pub async fn audit_middleware(
    State(_state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = request_id(request.headers());
    let user_id = request
        .extensions()
        .get::<Claims>()
        .map(|c| c.sub.clone())
        .unwrap_or_else(|| "anonymous".to_string());

    let start = Utc::now();
    let response = next.run(request).await;
    let duration_ms = (Utc::now() - start).num_milliseconds();
    let status = response.status();

    if status.is_client_error() {
        warn!(
            request_id = %request_id,
            method = %method,
            uri = %uri,
            user = %user_id,
            status = status.as_u16(),
            duration_ms,
            "Ledger request refused"
        );
    } else {
        info!(
            request_id = %request_id,
            method = %method,
            uri = %uri,
            user = %user_id,
            status = status.as_u16(),
            duration_ms,
            "Ledger request"
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_requires_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert("Authorization", HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers), Some("abc"));
    }

    #[test]
    fn test_missing_request_id_is_dash() {
        assert_eq!(request_id(&HeaderMap::new()), "-");
    }
}
