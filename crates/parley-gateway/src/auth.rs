// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bearer-token authentication for the staff API.
//!
//! When no admin token is configured every admin request is rejected
//! (fail-closed).

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::ApiError;

/// Authentication configuration for the admin routes.
#[derive(Clone, Default)]
pub struct AdminAuth {
    /// Expected bearer token. `None` locks every admin route.
    pub bearer_token: Option<String>,
}

impl AdminAuth {
    pub fn new(bearer_token: Option<String>) -> Self {
        Self {
            bearer_token: bearer_token.filter(|t| !t.trim().is_empty()),
        }
    }

    fn accepts(&self, header: Option<&str>) -> bool {
        let Some(expected) = self.bearer_token.as_deref() else {
            return false;
        };
        header
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| token == expected)
    }
}

impl std::fmt::Debug for AdminAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminAuth")
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

/// Middleware guarding the admin routes.
pub async fn require_admin(
    State(auth): State<AdminAuth>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if auth.bearer_token.is_none() {
        tracing::error!("no admin token configured -- rejecting admin request");
        return Err(ApiError::Unauthorized);
    }

    let header = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok());

    if auth.accepts(header) {
        Ok(next.run(request).await)
    } else {
        tracing::debug!(path = %request.uri().path(), "admin request with bad credentials");
        Err(ApiError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_token_counts_as_unset() {
        assert!(AdminAuth::new(Some("  ".into())).bearer_token.is_none());
        assert!(AdminAuth::new(None).bearer_token.is_none());
    }

    #[test]
    fn only_exact_bearer_token_is_accepted() {
        let auth = AdminAuth::new(Some("staff-secret".into()));
        assert!(auth.accepts(Some("Bearer staff-secret")));
        assert!(!auth.accepts(Some("Bearer staff-secret2")));
        assert!(!auth.accepts(Some("staff-secret")));
        assert!(!auth.accepts(Some("Basic staff-secret")));
        assert!(!auth.accepts(None));
    }

    #[test]
    fn unset_token_accepts_nothing() {
        let auth = AdminAuth::default();
        assert!(!auth.accepts(Some("Bearer ")));
        assert!(!auth.accepts(Some("Bearer anything")));
    }

    #[test]
    fn debug_redacts_token() {
        let auth = AdminAuth::new(Some("staff-secret".into()));
        let debug_output = format!("{auth:?}");
        assert!(!debug_output.contains("staff-secret"));
        assert!(debug_output.contains("[redacted]"));
    }
}
