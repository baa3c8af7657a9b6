//! Declarative route→role permission table and menu resolution.
//!
//! All role checks in the platform consult this one table; there are no
//! per-page role conditionals anywhere else.

use serde::Serialize;

use crate::identity::Identity;
use crate::identity::effective_role;
use crate::roles::Role;

/// Grouping of navigation entries in the rendered menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NavGroup {
    Admin,
    SuperAdmin,
}

/// One navigable surface and the roles that may reach it.
///
/// Static configuration, not user-mutable. `allowed_roles` is non-empty for
/// every entry; ungrouped entries are baseline entries visible to any allowed
/// role, including guests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavigationEntry {
    pub path: &'static str,
    pub label: &'static str,
    pub allowed_roles: &'static [Role],
    pub group: Option<NavGroup>,
}

impl NavigationEntry {
    pub fn allows(&self, role: Role) -> bool {
        self.allowed_roles.contains(&role)
    }

    /// Exact or path-segment prefix match ("/admin" matches "/admin/x" but
    /// not "/administrators").
    pub fn matches(&self, path: &str) -> bool {
        path == self.path
            || path
                .strip_prefix(self.path)
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

/// The sign-in surface stays reachable for everyone, including suspended
/// accounts being redirected there.
pub const SIGN_IN_PATH: &str = "/auth/sign-in";

const EVERYONE: &[Role] = &[
    Role::Guest,
    Role::User,
    Role::Speaker,
    Role::Admin,
    Role::SuperAdmin,
];
const AUTHENTICATED: &[Role] = &[Role::User, Role::Speaker, Role::Admin, Role::SuperAdmin];
const ADMINS: &[Role] = &[Role::Admin, Role::SuperAdmin];
const SUPER_ADMIN_ONLY: &[Role] = &[Role::SuperAdmin];

/// The route permission table, in menu order.
pub const NAV_TABLE: &[NavigationEntry] = &[
    NavigationEntry {
        path: "/",
        label: "Home",
        allowed_roles: EVERYONE,
        group: None,
    },
    NavigationEntry {
        path: "/events",
        label: "Events",
        allowed_roles: EVERYONE,
        group: None,
    },
    NavigationEntry {
        path: SIGN_IN_PATH,
        label: "Sign in",
        allowed_roles: EVERYONE,
        group: None,
    },
    NavigationEntry {
        path: "/me/tickets",
        label: "My Tickets",
        allowed_roles: AUTHENTICATED,
        group: None,
    },
    NavigationEntry {
        path: "/speaker/sessions",
        label: "My Sessions",
        allowed_roles: &[Role::Speaker],
        group: None,
    },
    NavigationEntry {
        path: "/admin/dashboard",
        label: "Dashboard",
        allowed_roles: ADMINS,
        group: Some(NavGroup::Admin),
    },
    NavigationEntry {
        path: "/admin/events",
        label: "Manage Events",
        allowed_roles: ADMINS,
        group: Some(NavGroup::Admin),
    },
    NavigationEntry {
        path: "/admin/users",
        label: "Manage Users",
        allowed_roles: SUPER_ADMIN_ONLY,
        group: Some(NavGroup::SuperAdmin),
    },
    NavigationEntry {
        path: "/admin/settings",
        label: "Platform Settings",
        allowed_roles: SUPER_ADMIN_ONLY,
        group: Some(NavGroup::SuperAdmin),
    },
];

/// The menu presented to one actor, partitioned by group.
///
/// A grouped section is rendered only when non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct Menu {
    pub primary: Vec<NavigationEntry>,
    pub admin: Vec<NavigationEntry>,
    pub super_admin: Vec<NavigationEntry>,
}

/// Compute the visible menu for a (possibly anonymous) actor.
///
/// Pure function of (identity, table): preserves table order, filters by the
/// effective role. Suspended accounts see the guest menu until reactivated.
pub fn resolve_menu(identity: Option<&Identity>) -> Menu {
    let role = match identity {
        Some(i) if i.is_suspended() => Role::Guest,
        other => effective_role(other),
    };

    let mut menu = Menu::default();
    for entry in NAV_TABLE {
        if !entry.allows(role) {
            continue;
        }
        match entry.group {
            None => menu.primary.push(*entry),
            Some(NavGroup::Admin) => menu.admin.push(*entry),
            Some(NavGroup::SuperAdmin) => menu.super_admin.push(*entry),
        }
    }

    menu
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::AccountStatus;
    use gatherly_core::UserId;

    fn identity_with_role(role: Role) -> Identity {
        let mut identity = Identity::new(UserId::new(), "Test", "test@example.com");
        identity.role = role;
        identity
    }

    #[test]
    fn every_entry_has_a_non_empty_role_list() {
        for entry in NAV_TABLE {
            assert!(
                !entry.allowed_roles.is_empty(),
                "entry {} has no roles",
                entry.path
            );
        }
    }

    #[test]
    fn guest_menu_has_no_grouped_sections() {
        let menu = resolve_menu(None);
        assert!(menu.primary.iter().any(|e| e.path == "/events"));
        assert!(menu.admin.is_empty());
        assert!(menu.super_admin.is_empty());
    }

    #[test]
    fn admin_menu_includes_admin_group_but_not_super_admin_group() {
        let admin = identity_with_role(Role::Admin);
        let menu = resolve_menu(Some(&admin));
        assert!(menu.admin.iter().any(|e| e.path == "/admin/dashboard"));
        assert!(menu.super_admin.is_empty());
    }

    #[test]
    fn super_admin_sees_both_grouped_sections() {
        let sa = identity_with_role(Role::SuperAdmin);
        let menu = resolve_menu(Some(&sa));
        assert!(!menu.admin.is_empty());
        assert!(menu.super_admin.iter().any(|e| e.path == "/admin/users"));
    }

    #[test]
    fn suspended_identity_resolves_the_guest_menu() {
        let mut admin = identity_with_role(Role::Admin);
        admin.status = AccountStatus::Suspended;

        assert_eq!(resolve_menu(Some(&admin)), resolve_menu(None));
    }

    #[test]
    fn menu_preserves_table_order() {
        let user = identity_with_role(Role::User);
        let menu = resolve_menu(Some(&user));

        let order: Vec<&str> = menu.primary.iter().map(|e| e.path).collect();
        assert_eq!(order, vec!["/", "/events", SIGN_IN_PATH, "/me/tickets"]);
    }

    #[test]
    fn prefix_match_is_segment_aware() {
        let entry = NAV_TABLE
            .iter()
            .find(|e| e.path == "/admin/users")
            .unwrap();
        assert!(entry.matches("/admin/users"));
        assert!(entry.matches("/admin/users/42"));
        assert!(!entry.matches("/admin/users-archive"));
    }
}
