//! Read-only catalog surface.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::Path,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use gatherly_catalog::{EventCatalog, EventId};

use crate::app::errors::{domain_error_response, json_error};
use crate::app::services::AppServices;

async fn list(Extension(services): Extension<Arc<AppServices>>) -> Response {
    Json(services.catalog.list()).into_response()
}

async fn get_event(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Response {
    let id = match EventId::from_str(&id) {
        Ok(id) => id,
        Err(err) => return domain_error_response(err),
    };

    match services.catalog.get(id) {
        Some(event) => Json(event).into_response(),
        None => json_error(StatusCode::NOT_FOUND, "event_not_found", "unknown event"),
    }
}

pub fn router() -> Router {
    Router::new()
        .route("/events", get(list))
        .route("/events/:id", get(get_event))
}
