//! Direct-navigation gating against the route permission table.

use thiserror::Error;

use crate::identity::{Identity, effective_role};
use crate::navigation::{NAV_TABLE, NavigationEntry, SIGN_IN_PATH};

/// Why a navigation target is not reachable.
///
/// These are expected decision outcomes, not failures; callers map each
/// variant to exactly one user-facing behavior (auth prompt, permission-denied
/// page, sign-in redirect, 404).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AccessError {
    /// The path matches no configured entry. Distinct from denial so callers
    /// can tell "this route doesn't exist" from "you cannot access it".
    #[error("no such route")]
    NotFound,

    /// An anonymous actor requested an authenticated-only surface.
    #[error("authentication required")]
    NotAuthenticated,

    /// The actor is authenticated but its role is not permitted. There is no
    /// nearest-role fallback.
    #[error("forbidden")]
    Unauthorized,

    /// The account is suspended; only the sign-in surface stays reachable.
    #[error("account suspended")]
    Suspended,
}

/// Find the most specific table entry matching `path`.
fn matching_entry(path: &str) -> Option<&'static NavigationEntry> {
    NAV_TABLE
        .iter()
        .filter(|e| e.matches(path))
        .max_by_key(|e| e.path.len())
}

/// Gate direct navigation to `path` for a (possibly anonymous) actor.
///
/// Pure function of (identity, table): no IO, no mutation, freely concurrent.
pub fn is_authorized(identity: Option<&Identity>, path: &str) -> Result<(), AccessError> {
    let entry = matching_entry(path).ok_or(AccessError::NotFound)?;

    if let Some(identity) = identity {
        if identity.is_suspended() && entry.path != SIGN_IN_PATH {
            return Err(AccessError::Suspended);
        }
    }

    if entry.allows(effective_role(identity)) {
        return Ok(());
    }

    match identity {
        None => Err(AccessError::NotAuthenticated),
        Some(_) => Err(AccessError::Unauthorized),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::AccountStatus;
    use crate::roles::Role;
    use gatherly_core::UserId;

    fn identity_with_role(role: Role) -> Identity {
        let mut identity = Identity::new(UserId::new(), "Test", "test@example.com");
        identity.role = role;
        identity
    }

    #[test]
    fn guest_on_admin_dashboard_is_not_authenticated() {
        assert_eq!(
            is_authorized(None, "/admin/dashboard"),
            Err(AccessError::NotAuthenticated)
        );
    }

    #[test]
    fn admin_on_super_admin_route_is_unauthorized() {
        let admin = identity_with_role(Role::Admin);
        assert_eq!(
            is_authorized(Some(&admin), "/admin/users"),
            Err(AccessError::Unauthorized)
        );
    }

    #[test]
    fn unknown_route_is_not_found_not_denied() {
        let user = identity_with_role(Role::User);
        assert_eq!(
            is_authorized(Some(&user), "/no/such/route"),
            Err(AccessError::NotFound)
        );
        assert_eq!(is_authorized(None, "/no/such/route"), Err(AccessError::NotFound));
    }

    #[test]
    fn user_reaches_baseline_surfaces() {
        let user = identity_with_role(Role::User);
        assert_eq!(is_authorized(Some(&user), "/events"), Ok(()));
        assert_eq!(is_authorized(Some(&user), "/me/tickets"), Ok(()));
    }

    #[test]
    fn guest_reaches_guest_visible_surfaces() {
        assert_eq!(is_authorized(None, "/events"), Ok(()));
        assert_eq!(is_authorized(None, SIGN_IN_PATH), Ok(()));
    }

    #[test]
    fn suspended_identity_is_denied_every_surface_except_sign_in() {
        let mut admin = identity_with_role(Role::Admin);
        admin.status = AccountStatus::Suspended;

        for entry in NAV_TABLE {
            let result = is_authorized(Some(&admin), entry.path);
            if entry.path == SIGN_IN_PATH {
                assert_eq!(result, Ok(()));
            } else {
                assert_eq!(result, Err(AccessError::Suspended), "path {}", entry.path);
            }
        }
    }

    #[test]
    fn most_specific_entry_wins_for_nested_paths() {
        // "/admin/users/42" must resolve against "/admin/users" (super_admin
        // only), not against a broader admin entry.
        let admin = identity_with_role(Role::Admin);
        assert_eq!(
            is_authorized(Some(&admin), "/admin/users/42"),
            Err(AccessError::Unauthorized)
        );

        let sa = identity_with_role(Role::SuperAdmin);
        assert_eq!(is_authorized(Some(&sa), "/admin/users/42"), Ok(()));
    }

    #[test]
    fn speaker_only_surface_rejects_plain_users() {
        let user = identity_with_role(Role::User);
        assert_eq!(
            is_authorized(Some(&user), "/speaker/sessions"),
            Err(AccessError::Unauthorized)
        );

        let speaker = identity_with_role(Role::Speaker);
        assert_eq!(is_authorized(Some(&speaker), "/speaker/sessions"), Ok(()));
    }
}
