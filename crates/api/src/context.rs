use gatherly_auth::Identity;

/// Request-scoped identity context.
///
/// Absent identity means the request is anonymous (guest); routes that allow
/// guests read it as-is, everything else goes through the access resolver.
#[derive(Debug, Clone, Default)]
pub struct IdentityContext {
    identity: Option<Identity>,
}

impl IdentityContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
        }
    }

    pub fn current(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }
}
