//! In-memory identity directory for tests/dev.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use gatherly_auth::directory::{DirectoryCommand, DirectoryEvent, IdentityDirectory};
use gatherly_auth::{Identity, IdentityAccount};
use gatherly_core::{Aggregate, DomainError, UserId};
use gatherly_messaging::{EventBus, InMemoryEventBus};

/// In-memory directory backing the session collaborator.
///
/// Commands run against the account aggregate under a write lock, so
/// concurrent mutations of one account serialize; emitted events fan out to
/// the notification bus best-effort.
pub struct InMemoryIdentityDirectory {
    accounts: RwLock<HashMap<UserId, IdentityAccount>>,
    bus: Arc<InMemoryEventBus<DirectoryEvent>>,
}

impl InMemoryIdentityDirectory {
    pub fn new(bus: Arc<InMemoryEventBus<DirectoryEvent>>) -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            bus,
        }
    }
}

impl IdentityDirectory for InMemoryIdentityDirectory {
    fn identity(&self, id: UserId) -> Option<Identity> {
        let accounts = self.accounts.read().ok()?;
        accounts
            .get(&id)
            .filter(|a| a.is_created())
            .map(IdentityAccount::to_identity)
    }

    fn execute(&self, command: DirectoryCommand) -> Result<Vec<DirectoryEvent>, DomainError> {
        let target = command.target();

        let mut accounts = self
            .accounts
            .write()
            .map_err(|_| DomainError::conflict("directory lock poisoned"))?;

        let account = accounts
            .entry(target)
            .or_insert_with(|| IdentityAccount::empty(target));

        let events = account.handle(&command)?;
        for event in &events {
            account.apply(event);
            if let Err(e) = self.bus.publish(event.clone()) {
                tracing::warn!(error = ?e, "failed to publish directory event");
            }
        }

        Ok(events)
    }
}
