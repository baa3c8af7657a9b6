//! `gatherly-auth` — pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage. It owns the
//! identity/role model, the declarative route permission table with its two
//! entry points (`resolve_menu`, `is_authorized`), the admin-only directory
//! state machine, and session claims validation.

pub mod authorize;
pub mod claims;
pub mod directory;
pub mod identity;
pub mod navigation;
pub mod roles;

pub use authorize::{AccessError, is_authorized};
pub use claims::{
    Hs256JwtValidator, JwtValidator, SessionClaims, TokenValidationError, validate_claims,
};
pub use directory::{DirectoryCommand, DirectoryEvent, IdentityAccount, IdentityDirectory};
pub use identity::{AccountStatus, Identity, VerificationStatus, effective_role};
pub use navigation::{Menu, NavGroup, NavigationEntry, resolve_menu};
pub use roles::Role;
