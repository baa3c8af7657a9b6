//! Application assembly: routes, middleware, shared services.

use std::sync::Arc;

use axum::{Extension, Router, middleware::from_fn_with_state};

use crate::middleware::{AuthState, resolve_identity};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Assemble the router over an already-built service set.
///
/// Identity resolution runs on every route; a missing bearer header yields an
/// anonymous context rather than a rejection, so guest-visible surfaces work
/// without credentials.
pub fn build_app(services: Arc<AppServices>) -> Router {
    let auth_state = AuthState {
        jwt: Arc::clone(&services.jwt),
        directory: services.directory.clone(),
    };

    routes::router()
        .layer(from_fn_with_state(auth_state, resolve_identity))
        .layer(Extension(services))
}
