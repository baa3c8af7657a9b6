//! Mapping from domain errors to HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use gatherly_auth::AccessError;
use gatherly_core::DomainError;
use gatherly_registration::RegistrationError;
use serde_json::json;

/// Build a JSON error response with a stable machine-readable code.
pub fn json_error(status: StatusCode, code: &str, message: &str) -> Response {
    let body = Json(json!({
        "error": code,
        "message": message,
    }));
    (status, body).into_response()
}

/// Map an access-control outcome onto an HTTP response.
pub fn access_error_response(err: AccessError) -> Response {
    match err {
        AccessError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "unknown route"),
        AccessError::NotAuthenticated => json_error(
            StatusCode::UNAUTHORIZED,
            "not_authenticated",
            "sign in to access this resource",
        ),
        AccessError::Unauthorized => json_error(
            StatusCode::FORBIDDEN,
            "unauthorized",
            "your role does not grant access to this resource",
        ),
        AccessError::Suspended => json_error(
            StatusCode::FORBIDDEN,
            "account_suspended",
            "account is suspended",
        ),
    }
}

/// Map a registration engine error onto an HTTP response.
pub fn registration_error_response(err: RegistrationError) -> Response {
    match err {
        RegistrationError::NotAuthenticated => json_error(
            StatusCode::UNAUTHORIZED,
            "not_authenticated",
            "sign in to register for events",
        ),
        RegistrationError::EventNotFound => {
            json_error(StatusCode::NOT_FOUND, "event_not_found", "unknown event")
        }
        RegistrationError::TierNotFound => json_error(
            StatusCode::NOT_FOUND,
            "tier_not_found",
            "the event has no such ticket tier",
        ),
        RegistrationError::TierNotFree => json_error(
            StatusCode::BAD_REQUEST,
            "tier_not_free",
            "this tier requires payment; use the paid registration flow",
        ),
        RegistrationError::TierNotPaid => json_error(
            StatusCode::BAD_REQUEST,
            "tier_not_paid",
            "this tier is free; use the free registration flow",
        ),
        RegistrationError::AlreadyRegistered => json_error(
            StatusCode::CONFLICT,
            "already_registered",
            "an active registration for this tier already exists",
        ),
        RegistrationError::CapacityExceeded => {
            json_error(StatusCode::CONFLICT, "sold_out", "the tier is sold out")
        }
        RegistrationError::PaymentFailed => json_error(
            StatusCode::PAYMENT_REQUIRED,
            "payment_failed",
            "payment did not complete; the reservation was released",
        ),
        RegistrationError::TicketNotFound => json_error(
            StatusCode::NOT_FOUND,
            "ticket_not_found",
            "no ticket matches this reservation",
        ),
        RegistrationError::InvalidTicketState => json_error(
            StatusCode::CONFLICT,
            "invalid_ticket_state",
            "the reservation is no longer in a finalizable state",
        ),
        RegistrationError::Store(inner) => {
            tracing::error!(error = %inner, "ticket store failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_unavailable",
                "ticket storage is unavailable",
            )
        }
    }
}

/// Map a domain error (identity directory commands) onto an HTTP response.
pub fn domain_error_response(err: DomainError) -> Response {
    match &err {
        DomainError::Validation(_) | DomainError::InvalidId(_) => {
            json_error(StatusCode::BAD_REQUEST, "validation", &err.to_string())
        }
        DomainError::InvariantViolation(_) => json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "invariant_violation",
            &err.to_string(),
        ),
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", &err.to_string()),
        DomainError::Conflict(_) => json_error(StatusCode::CONFLICT, "conflict", &err.to_string()),
        DomainError::Unauthorized => {
            json_error(StatusCode::FORBIDDEN, "unauthorized", &err.to_string())
        }
    }
}
