//! Navigation surface: menu resolution and the direct-access probe.

use axum::{
    Extension, Json, Router,
    extract::Query,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use gatherly_auth::{is_authorized, resolve_menu};

use crate::app::dto::AuthorizeQuery;
use crate::app::errors::access_error_response;
use crate::context::IdentityContext;

/// Menu for the current (possibly anonymous) actor.
async fn menu(Extension(ctx): Extension<IdentityContext>) -> Response {
    Json(resolve_menu(ctx.current())).into_response()
}

/// Pre-flight probe used by clients before a direct navigation: answers
/// whether the current actor may open `path`, with the same taxonomy the
/// real surfaces use (401/403/404).
async fn authorize(
    Extension(ctx): Extension<IdentityContext>,
    Query(query): Query<AuthorizeQuery>,
) -> Response {
    match is_authorized(ctx.current(), &query.path) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => access_error_response(err),
    }
}

pub fn router() -> Router {
    Router::new()
        .route("/menu", get(menu))
        .route("/authorize", get(authorize))
}
