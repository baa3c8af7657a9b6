//! Admin surface: directory mutations.
//!
//! Access is gated twice: the route table admits the actor into the admin
//! area, then the directory aggregate enforces per-command actor rules
//! (e.g. speaker approval is super-admin only).

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::Path,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use chrono::Utc;

use gatherly_auth::directory::{
    Actor, ApproveSpeaker, ChangeRole, DirectoryCommand, Reactivate, RejectSpeaker, Suspend,
};
use gatherly_auth::{Identity, IdentityDirectory, is_authorized};
use gatherly_core::UserId;

use crate::app::dto::ChangeRoleRequest;
use crate::app::errors::{access_error_response, domain_error_response, json_error};
use crate::app::services::AppServices;
use crate::context::IdentityContext;

const ADMIN_AREA: &str = "/admin/dashboard";

fn require_admin(ctx: &IdentityContext) -> Result<&Identity, Response> {
    is_authorized(ctx.current(), ADMIN_AREA).map_err(access_error_response)?;
    // The admin area only admits authenticated actors.
    ctx.current()
        .ok_or_else(|| access_error_response(gatherly_auth::AccessError::NotAuthenticated))
}

fn actor(identity: &Identity) -> Actor {
    Actor {
        user_id: identity.id,
        role: identity.role,
    }
}

/// Run a directory command and respond with the target's updated snapshot.
fn execute(services: &AppServices, command: DirectoryCommand) -> Response {
    let target = command.target();
    match services.directory.execute(command) {
        Ok(_) => match services.directory.identity(target) {
            Some(identity) => Json(identity).into_response(),
            None => json_error(StatusCode::NOT_FOUND, "not_found", "unknown account"),
        },
        Err(err) => domain_error_response(err),
    }
}

fn parse_user_id(raw: &str) -> Result<UserId, Response> {
    UserId::from_str(raw).map_err(domain_error_response)
}

async fn change_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<IdentityContext>,
    Path(id): Path<String>,
    Json(body): Json<ChangeRoleRequest>,
) -> Response {
    let admin = match require_admin(&ctx) {
        Ok(identity) => identity,
        Err(response) => return response,
    };
    let user_id = match parse_user_id(&id) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };

    execute(
        &services,
        DirectoryCommand::ChangeRole(ChangeRole {
            actor: actor(admin),
            user_id,
            new_role: body.role,
            occurred_at: Utc::now(),
        }),
    )
}

async fn suspend(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<IdentityContext>,
    Path(id): Path<String>,
) -> Response {
    let admin = match require_admin(&ctx) {
        Ok(identity) => identity,
        Err(response) => return response,
    };
    let user_id = match parse_user_id(&id) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };

    execute(
        &services,
        DirectoryCommand::Suspend(Suspend {
            actor: actor(admin),
            user_id,
            occurred_at: Utc::now(),
        }),
    )
}

async fn reactivate(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<IdentityContext>,
    Path(id): Path<String>,
) -> Response {
    let admin = match require_admin(&ctx) {
        Ok(identity) => identity,
        Err(response) => return response,
    };
    let user_id = match parse_user_id(&id) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };

    execute(
        &services,
        DirectoryCommand::Reactivate(Reactivate {
            actor: actor(admin),
            user_id,
            occurred_at: Utc::now(),
        }),
    )
}

async fn approve_speaker(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<IdentityContext>,
    Path(id): Path<String>,
) -> Response {
    let admin = match require_admin(&ctx) {
        Ok(identity) => identity,
        Err(response) => return response,
    };
    let user_id = match parse_user_id(&id) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };

    execute(
        &services,
        DirectoryCommand::ApproveSpeaker(ApproveSpeaker {
            actor: actor(admin),
            user_id,
            occurred_at: Utc::now(),
        }),
    )
}

async fn reject_speaker(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<IdentityContext>,
    Path(id): Path<String>,
) -> Response {
    let admin = match require_admin(&ctx) {
        Ok(identity) => identity,
        Err(response) => return response,
    };
    let user_id = match parse_user_id(&id) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };

    execute(
        &services,
        DirectoryCommand::RejectSpeaker(RejectSpeaker {
            actor: actor(admin),
            user_id,
            occurred_at: Utc::now(),
        }),
    )
}

pub fn router() -> Router {
    Router::new()
        .route("/admin/users/:id/role", post(change_role))
        .route("/admin/users/:id/suspend", post(suspend))
        .route("/admin/users/:id/reactivate", post(reactivate))
        .route("/admin/users/:id/approve-speaker", post(approve_speaker))
        .route("/admin/users/:id/reject-speaker", post(reject_speaker))
}
