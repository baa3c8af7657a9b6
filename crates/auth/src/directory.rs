//! Identity directory state machine (command→event).
//!
//! Role and status changes are admin-only mutations; there is no self-service
//! role switching. The emitted events are the facts the notification
//! collaborator renders (`RoleChanged`, `UserSuspended`, `SpeakerApproved`,
//! ...).
//!
//! # Invariants
//! - Role changes require an `Admin`/`SuperAdmin` actor.
//! - Actors cannot change their own role (no self-escalation).
//! - Speaker approval/rejection requires a `SuperAdmin` actor and a speaker
//!   with a pending verification.
//! - Suspended accounts cannot be assigned new roles until reactivated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gatherly_core::{Aggregate, AggregateRoot, DomainError, UserId};
use gatherly_messaging::DomainEvent;

use crate::identity::{AccountStatus, Identity, VerificationStatus};
use crate::roles::Role;

/// The identity performing a directory mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
    pub role: Role,
}

/// Directory aggregate: one identity account and its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityAccount {
    id: UserId,
    email: String,
    display_name: String,
    role: Role,
    status: AccountStatus,
    verification_status: VerificationStatus,
    version: u64,
    created: bool,
}

impl IdentityAccount {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: UserId) -> Self {
        Self {
            id,
            email: String::new(),
            display_name: String::new(),
            role: Role::User,
            status: AccountStatus::Active,
            verification_status: VerificationStatus::None,
            version: 0,
            created: false,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn status(&self) -> AccountStatus {
        self.status
    }

    pub fn verification_status(&self) -> VerificationStatus {
        self.verification_status
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    /// Snapshot as the read-side [`Identity`] the resolver consumes.
    pub fn to_identity(&self) -> Identity {
        Identity {
            id: self.id,
            display_name: self.display_name.clone(),
            email: self.email.clone(),
            role: self.role,
            status: self.status,
            verification_status: self.verification_status,
        }
    }

    fn ensure_created(&self) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        Ok(())
    }

    fn ensure_admin_actor(actor: &Actor) -> Result<(), DomainError> {
        if !actor.role.is_admin() {
            return Err(DomainError::Unauthorized);
        }
        Ok(())
    }

    fn ensure_super_admin_actor(actor: &Actor) -> Result<(), DomainError> {
        if actor.role != Role::SuperAdmin {
            return Err(DomainError::Unauthorized);
        }
        Ok(())
    }
}

impl AggregateRoot for IdentityAccount {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Command to create a new identity (registration/login resolution).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateIdentity {
    pub user_id: UserId,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub occurred_at: DateTime<Utc>,
}

/// Command to change an identity's role (admin-only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRole {
    pub actor: Actor,
    pub user_id: UserId,
    pub new_role: Role,
    pub occurred_at: DateTime<Utc>,
}

/// Command to suspend an account (admin-only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suspend {
    pub actor: Actor,
    pub user_id: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Command to reactivate a suspended account (admin-only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reactivate {
    pub actor: Actor,
    pub user_id: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Command to approve a pending speaker (super-admin only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveSpeaker {
    pub actor: Actor,
    pub user_id: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Command to reject a pending speaker (super-admin only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectSpeaker {
    pub actor: Actor,
    pub user_id: UserId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirectoryCommand {
    CreateIdentity(CreateIdentity),
    ChangeRole(ChangeRole),
    Suspend(Suspend),
    Reactivate(Reactivate),
    ApproveSpeaker(ApproveSpeaker),
    RejectSpeaker(RejectSpeaker),
}

impl DirectoryCommand {
    /// The identity this command targets.
    pub fn target(&self) -> UserId {
        match self {
            DirectoryCommand::CreateIdentity(c) => c.user_id,
            DirectoryCommand::ChangeRole(c) => c.user_id,
            DirectoryCommand::Suspend(c) => c.user_id,
            DirectoryCommand::Reactivate(c) => c.user_id,
            DirectoryCommand::ApproveSpeaker(c) => c.user_id,
            DirectoryCommand::RejectSpeaker(c) => c.user_id,
        }
    }
}

/// Directory port: the session collaborator's view of identities.
///
/// The core reads the current identity and issues mutation commands it does
/// not itself persist; implementations own storage and event fan-out.
pub trait IdentityDirectory: Send + Sync {
    /// Current identity snapshot, if the account exists.
    fn identity(&self, id: UserId) -> Option<Identity>;

    /// Run a directory command against its target account.
    fn execute(&self, command: DirectoryCommand) -> Result<Vec<DirectoryEvent>, DomainError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Events
// ─────────────────────────────────────────────────────────────────────────────

/// Event: IdentityCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityCreated {
    pub user_id: UserId,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub occurred_at: DateTime<Utc>,
}

/// Event: RoleChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleChanged {
    pub user_id: UserId,
    pub changed_by: UserId,
    pub old_role: Role,
    pub new_role: Role,
    pub occurred_at: DateTime<Utc>,
}

/// Event: UserSuspended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSuspended {
    pub user_id: UserId,
    pub suspended_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: UserReactivated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserReactivated {
    pub user_id: UserId,
    pub reactivated_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SpeakerApproved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeakerApproved {
    pub user_id: UserId,
    pub approved_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SpeakerRejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeakerRejected {
    pub user_id: UserId,
    pub rejected_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirectoryEvent {
    IdentityCreated(IdentityCreated),
    RoleChanged(RoleChanged),
    UserSuspended(UserSuspended),
    UserReactivated(UserReactivated),
    SpeakerApproved(SpeakerApproved),
    SpeakerRejected(SpeakerRejected),
}

impl DomainEvent for DirectoryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            DirectoryEvent::IdentityCreated(_) => "identity.created",
            DirectoryEvent::RoleChanged(_) => "identity.role_changed",
            DirectoryEvent::UserSuspended(_) => "identity.suspended",
            DirectoryEvent::UserReactivated(_) => "identity.reactivated",
            DirectoryEvent::SpeakerApproved(_) => "identity.speaker_approved",
            DirectoryEvent::SpeakerRejected(_) => "identity.speaker_rejected",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            DirectoryEvent::IdentityCreated(e) => e.occurred_at,
            DirectoryEvent::RoleChanged(e) => e.occurred_at,
            DirectoryEvent::UserSuspended(e) => e.occurred_at,
            DirectoryEvent::UserReactivated(e) => e.occurred_at,
            DirectoryEvent::SpeakerApproved(e) => e.occurred_at,
            DirectoryEvent::SpeakerRejected(e) => e.occurred_at,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Aggregate behavior
// ─────────────────────────────────────────────────────────────────────────────

impl Aggregate for IdentityAccount {
    type Command = DirectoryCommand;
    type Event = DirectoryEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            DirectoryEvent::IdentityCreated(e) => {
                self.id = e.user_id;
                self.email = e.email.clone();
                self.display_name = e.display_name.clone();
                self.role = e.role;
                self.status = AccountStatus::Active;
                self.verification_status = if e.role == Role::Speaker {
                    VerificationStatus::Pending
                } else {
                    VerificationStatus::None
                };
                self.created = true;
            }
            DirectoryEvent::RoleChanged(e) => {
                self.role = e.new_role;
                // Moving into the speaker role restarts verification.
                self.verification_status = if e.new_role == Role::Speaker {
                    VerificationStatus::Pending
                } else {
                    VerificationStatus::None
                };
            }
            DirectoryEvent::UserSuspended(_) => {
                self.status = AccountStatus::Suspended;
            }
            DirectoryEvent::UserReactivated(_) => {
                self.status = AccountStatus::Active;
            }
            DirectoryEvent::SpeakerApproved(_) => {
                self.verification_status = VerificationStatus::Approved;
            }
            DirectoryEvent::SpeakerRejected(_) => {
                self.verification_status = VerificationStatus::Rejected;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            DirectoryCommand::CreateIdentity(cmd) => self.handle_create(cmd),
            DirectoryCommand::ChangeRole(cmd) => self.handle_change_role(cmd),
            DirectoryCommand::Suspend(cmd) => self.handle_suspend(cmd),
            DirectoryCommand::Reactivate(cmd) => self.handle_reactivate(cmd),
            DirectoryCommand::ApproveSpeaker(cmd) => self.handle_approve_speaker(cmd),
            DirectoryCommand::RejectSpeaker(cmd) => self.handle_reject_speaker(cmd),
        }
    }
}

impl IdentityAccount {
    fn handle_create(&self, cmd: &CreateIdentity) -> Result<Vec<DirectoryEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("identity already exists"));
        }
        if cmd.role == Role::Guest {
            return Err(DomainError::validation("guest is not an assignable role"));
        }
        if cmd.email.trim().is_empty() {
            return Err(DomainError::validation("email must not be empty"));
        }

        Ok(vec![DirectoryEvent::IdentityCreated(IdentityCreated {
            user_id: cmd.user_id,
            email: cmd.email.clone(),
            display_name: cmd.display_name.clone(),
            role: cmd.role,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_change_role(&self, cmd: &ChangeRole) -> Result<Vec<DirectoryEvent>, DomainError> {
        self.ensure_created()?;
        Self::ensure_admin_actor(&cmd.actor)?;

        if cmd.actor.user_id == cmd.user_id {
            return Err(DomainError::invariant("actors cannot change their own role"));
        }
        if cmd.new_role == Role::Guest {
            return Err(DomainError::validation("guest is not an assignable role"));
        }
        if self.status == AccountStatus::Suspended {
            return Err(DomainError::invariant(
                "suspended accounts cannot be assigned new roles",
            ));
        }
        if cmd.new_role == self.role {
            return Err(DomainError::conflict("identity already has that role"));
        }

        Ok(vec![DirectoryEvent::RoleChanged(RoleChanged {
            user_id: cmd.user_id,
            changed_by: cmd.actor.user_id,
            old_role: self.role,
            new_role: cmd.new_role,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_suspend(&self, cmd: &Suspend) -> Result<Vec<DirectoryEvent>, DomainError> {
        self.ensure_created()?;
        Self::ensure_admin_actor(&cmd.actor)?;

        if self.status == AccountStatus::Suspended {
            return Err(DomainError::conflict("account is already suspended"));
        }

        Ok(vec![DirectoryEvent::UserSuspended(UserSuspended {
            user_id: cmd.user_id,
            suspended_by: cmd.actor.user_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_reactivate(&self, cmd: &Reactivate) -> Result<Vec<DirectoryEvent>, DomainError> {
        self.ensure_created()?;
        Self::ensure_admin_actor(&cmd.actor)?;

        if self.status != AccountStatus::Suspended {
            return Err(DomainError::conflict("account is not suspended"));
        }

        Ok(vec![DirectoryEvent::UserReactivated(UserReactivated {
            user_id: cmd.user_id,
            reactivated_by: cmd.actor.user_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_approve_speaker(
        &self,
        cmd: &ApproveSpeaker,
    ) -> Result<Vec<DirectoryEvent>, DomainError> {
        self.ensure_created()?;
        Self::ensure_super_admin_actor(&cmd.actor)?;
        self.ensure_pending_speaker()?;

        Ok(vec![DirectoryEvent::SpeakerApproved(SpeakerApproved {
            user_id: cmd.user_id,
            approved_by: cmd.actor.user_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_reject_speaker(
        &self,
        cmd: &RejectSpeaker,
    ) -> Result<Vec<DirectoryEvent>, DomainError> {
        self.ensure_created()?;
        Self::ensure_super_admin_actor(&cmd.actor)?;
        self.ensure_pending_speaker()?;

        Ok(vec![DirectoryEvent::SpeakerRejected(SpeakerRejected {
            user_id: cmd.user_id,
            rejected_by: cmd.actor.user_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn ensure_pending_speaker(&self) -> Result<(), DomainError> {
        if self.role != Role::Speaker {
            return Err(DomainError::invariant(
                "verification applies to speakers only",
            ));
        }
        if self.verification_status != VerificationStatus::Pending {
            return Err(DomainError::conflict("speaker verification is not pending"));
        }
        Ok(())
    }
}
