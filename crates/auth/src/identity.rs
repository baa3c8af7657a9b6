//! Identity model: an authenticated actor with a role and status.

use serde::{Deserialize, Serialize};

use gatherly_core::{Entity, UserId};

use crate::roles::Role;

/// Account status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    /// Account is active and can use authenticated surfaces.
    #[default]
    Active,
    /// Account is suspended; retains its role but is denied all
    /// authenticated-only surfaces.
    Suspended,
}

/// Speaker verification state.
///
/// Meaningful only for identities with role [`Role::Speaker`]; everyone else
/// stays at `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    #[default]
    None,
    Pending,
    Approved,
    Rejected,
}

/// An authenticated actor.
///
/// Anonymous actors are represented by `Option<&Identity>::None`; there is no
/// guest identity record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub display_name: String,
    pub email: String,
    pub role: Role,
    pub status: AccountStatus,
    pub verification_status: VerificationStatus,
}

impl Identity {
    pub fn new(id: UserId, display_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            email: email.into(),
            role: Role::User,
            status: AccountStatus::Active,
            verification_status: VerificationStatus::None,
        }
    }

    pub fn is_suspended(&self) -> bool {
        self.status == AccountStatus::Suspended
    }
}

impl Entity for Identity {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Effective role of a possibly-anonymous actor.
pub fn effective_role(identity: Option<&Identity>) -> Role {
    identity.map(|i| i.role).unwrap_or(Role::Guest)
}
