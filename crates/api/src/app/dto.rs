//! Request payloads.

use serde::Deserialize;

use gatherly_auth::Role;
use gatherly_registration::{PaymentIntentId, PaymentOutcome};

#[derive(Debug, Deserialize)]
pub struct AuthorizeQuery {
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct DecisionQuery {
    pub tier: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub tier: String,
}

#[derive(Debug, Deserialize)]
pub struct FinalizeRequest {
    pub intent: PaymentIntentId,
    pub outcome: PaymentOutcome,
}

#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: Role,
}
