//! Service wiring shared by the binary and the black-box tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use gatherly_auth::directory::DirectoryEvent;
use gatherly_auth::{Hs256JwtValidator, JwtValidator};
use gatherly_infra::{InMemoryEventCatalog, InMemoryIdentityDirectory};
use gatherly_messaging::InMemoryEventBus;
use gatherly_registration::{
    InMemoryTicketStore, PaymentIntent, PaymentIntentId, RegistrationEngine, RegistrationEvent,
};

/// Concrete engine type used by the HTTP layer.
pub type Engine = RegistrationEngine<Arc<InMemoryTicketStore>, Arc<InMemoryEventBus<RegistrationEvent>>>;

/// Everything a request handler can reach.
///
/// One instance per process, shared behind an `Arc` extension. Payment intents
/// live here until the payment collaborator reports back; an intent is
/// single-use and removed on finalize.
pub struct AppServices {
    pub catalog: Arc<InMemoryEventCatalog>,
    pub directory: Arc<InMemoryIdentityDirectory>,
    pub directory_bus: Arc<InMemoryEventBus<DirectoryEvent>>,
    pub registration_bus: Arc<InMemoryEventBus<RegistrationEvent>>,
    pub engine: Arc<Engine>,
    pub jwt: Arc<dyn JwtValidator>,
    intents: Mutex<HashMap<PaymentIntentId, PaymentIntent>>,
}

impl AppServices {
    pub fn new(jwt_secret: &str) -> Arc<Self> {
        let directory_bus = Arc::new(InMemoryEventBus::new());
        let registration_bus = Arc::new(InMemoryEventBus::new());

        let directory = Arc::new(InMemoryIdentityDirectory::new(Arc::clone(&directory_bus)));
        let engine = Arc::new(RegistrationEngine::new(
            Arc::new(InMemoryTicketStore::new()),
            Arc::clone(&registration_bus),
        ));

        Arc::new(Self {
            catalog: Arc::new(InMemoryEventCatalog::new()),
            directory,
            directory_bus,
            registration_bus,
            engine,
            jwt: Arc::new(Hs256JwtValidator::new(jwt_secret)),
            intents: Mutex::new(HashMap::new()),
        })
    }

    /// Park an intent until the payment collaborator finalizes it.
    pub fn remember_intent(&self, intent: PaymentIntent) {
        match self.intents.lock() {
            Ok(mut intents) => {
                intents.insert(intent.id, intent);
            }
            Err(_) => tracing::error!("intent registry lock poisoned; intent dropped"),
        }
    }

    /// Consume an intent. Intents are single-use: a second finalize for the
    /// same id comes back `None`.
    pub fn take_intent(&self, id: PaymentIntentId) -> Option<PaymentIntent> {
        self.intents.lock().ok()?.remove(&id)
    }
}
