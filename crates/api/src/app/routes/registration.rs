//! Registration flows: decision probe, free confirmation, paid two-step,
//! and the caller's own tickets.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::{Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use gatherly_auth::{AccessError, Identity, is_authorized};
use gatherly_catalog::{Event, EventCatalog, EventId};
use gatherly_registration::{RegistrationError, TicketStore};

use crate::app::dto::{DecisionQuery, FinalizeRequest, RegisterRequest};
use crate::app::errors::{
    access_error_response, domain_error_response, json_error, registration_error_response,
};
use crate::app::services::AppServices;
use crate::context::IdentityContext;

enum LookupFailure {
    Domain(gatherly_core::DomainError),
    Unknown,
}

fn lookup_event(services: &AppServices, raw_id: &str) -> Result<Event, LookupFailure> {
    let id = EventId::from_str(raw_id).map_err(LookupFailure::Domain)?;
    services.catalog.get(id).ok_or(LookupFailure::Unknown)
}

fn lookup_failure_response(failure: LookupFailure) -> Response {
    match failure {
        LookupFailure::Domain(err) => domain_error_response(err),
        LookupFailure::Unknown => {
            json_error(StatusCode::NOT_FOUND, "event_not_found", "unknown event")
        }
    }
}

/// Registration requires a signed-in, non-suspended actor.
fn require_registrant(ctx: &IdentityContext) -> Result<&Identity, Response> {
    let identity = ctx
        .current()
        .ok_or_else(|| registration_error_response(RegistrationError::NotAuthenticated))?;
    if identity.is_suspended() {
        return Err(access_error_response(AccessError::Suspended));
    }
    Ok(identity)
}

/// What would happen if the current actor registered for this tier.
async fn decision(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<IdentityContext>,
    Path(id): Path<String>,
    Query(query): Query<DecisionQuery>,
) -> Response {
    let event = match EventId::from_str(&id) {
        Ok(id) => services.catalog.get(id),
        Err(err) => return domain_error_response(err),
    };

    let decision = services
        .engine
        .evaluate(ctx.current(), event.as_ref(), &query.tier);
    Json(decision).into_response()
}

async fn register_free(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<IdentityContext>,
    Path(id): Path<String>,
    Json(body): Json<RegisterRequest>,
) -> Response {
    let identity = match require_registrant(&ctx) {
        Ok(identity) => identity,
        Err(response) => return response,
    };
    let event = match lookup_event(&services, &id) {
        Ok(event) => event,
        Err(failure) => return lookup_failure_response(failure),
    };

    match services.engine.confirm_free(identity, &event, &body.tier) {
        Ok(ticket) => (StatusCode::CREATED, Json(ticket)).into_response(),
        Err(err) => registration_error_response(err),
    }
}

async fn register_paid(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<IdentityContext>,
    Path(id): Path<String>,
    Json(body): Json<RegisterRequest>,
) -> Response {
    let identity = match require_registrant(&ctx) {
        Ok(identity) => identity,
        Err(response) => return response,
    };
    let event = match lookup_event(&services, &id) {
        Ok(event) => event,
        Err(failure) => return lookup_failure_response(failure),
    };

    match services.engine.initiate_paid(identity, &event, &body.tier) {
        Ok(intent) => {
            services.remember_intent(intent.clone());
            (StatusCode::ACCEPTED, Json(intent)).into_response()
        }
        Err(err) => registration_error_response(err),
    }
}

/// Settle a parked intent with the payment collaborator's outcome.
async fn finalize(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<FinalizeRequest>,
) -> Response {
    let Some(intent) = services.take_intent(body.intent) else {
        return json_error(
            StatusCode::NOT_FOUND,
            "intent_not_found",
            "unknown or already-settled payment intent",
        );
    };

    match services.engine.finalize_paid(&intent, body.outcome) {
        Ok(ticket) => Json(ticket).into_response(),
        Err(err) => registration_error_response(err),
    }
}

async fn my_tickets(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<IdentityContext>,
) -> Response {
    if let Err(err) = is_authorized(ctx.current(), "/me/tickets") {
        return access_error_response(err);
    }
    // is_authorized only passes for authenticated actors here.
    let Some(identity) = ctx.current() else {
        return access_error_response(AccessError::NotAuthenticated);
    };

    Json(services.engine.store().tickets_for_user(identity.id)).into_response()
}

pub fn router() -> Router {
    Router::new()
        .route("/events/:id/registration", get(decision))
        .route("/events/:id/register", post(register_free))
        .route("/events/:id/register/paid", post(register_paid))
        .route("/registrations/finalize", post(finalize))
        .route("/me/tickets", get(my_tickets))
}
