use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use gatherly_auth::{IdentityDirectory, JwtValidator};

use crate::app::errors::json_error;
use crate::context::IdentityContext;

/// Shared state for the authentication middleware.
#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
    pub directory: Arc<dyn IdentityDirectory>,
}

/// Resolves the caller's identity from an optional `Authorization: Bearer` header.
///
/// No header at all is a legitimate guest request and proceeds with an
/// anonymous context. A header that is present but malformed, expired, or
/// signed with the wrong key is rejected with 401, as is a token whose
/// subject is unknown to the identity directory.
pub async fn resolve_identity(
    State(state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let bearer = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    let context = match bearer {
        None => IdentityContext::anonymous(),
        Some(token) => {
            let claims = match state.jwt.validate(token, Utc::now()) {
                Ok(claims) => claims,
                Err(err) => {
                    tracing::debug!(error = %err, "rejected bearer token");
                    return json_error(
                        axum::http::StatusCode::UNAUTHORIZED,
                        "invalid_token",
                        "bearer token is invalid or expired",
                    );
                }
            };

            match state.directory.identity(claims.sub) {
                Some(identity) => IdentityContext::authenticated(identity),
                None => {
                    return json_error(
                        axum::http::StatusCode::UNAUTHORIZED,
                        "unknown_identity",
                        "token subject is not a known account",
                    );
                }
            }
        }
    };

    request.extensions_mut().insert(context);
    next.run(request).await
}
