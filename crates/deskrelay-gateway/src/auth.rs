// SPDX-FileCopyrightText: 2026 deskrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bearer token authentication for the `/v1` routes.
//!
//! When no token is configured, all requests are rejected (fail-closed).

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

/// Authentication configuration for the gateway.
#[derive(Clone)]
pub struct AuthConfig {
    /// Expected bearer token. `None` rejects every request.
    pub bearer_token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

impl AuthConfig {
    /// Returns true if `header` carries the configured token.
    fn accepts(&self, header: Option<&str>) -> bool {
        let Some(expected) = self.bearer_token.as_deref() else {
            return false;
        };
        header
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| token == expected)
    }
}

/// Middleware that validates the `Authorization: Bearer <token>` header.
pub async fn auth_middleware(
    State(auth): State<AuthConfig>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if auth.bearer_token.is_none() {
        tracing::error!("gateway has no bearer token configured -- rejecting request");
        return Err(StatusCode::UNAUTHORIZED);
    }

    let header = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok());

    if auth.accepts(header) {
        Ok(next.run(request).await)
    } else {
        tracing::debug!(path = %request.uri().path(), "bearer auth rejected");
        Err(StatusCode::UNAUTHORIZED)
    }
}
