//! In-memory event catalog for tests/dev.

use std::collections::HashMap;
use std::sync::RwLock;

use gatherly_catalog::{Event, EventCatalog, EventId};

/// In-memory stand-in for the CMS read API.
///
/// Seeded at startup (or per test); the core only ever reads from it.
#[derive(Debug, Default)]
pub struct InMemoryEventCatalog {
    events: RwLock<HashMap<EventId, Event>>,
}

impl InMemoryEventCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a catalog record (seeding/fixtures only).
    pub fn upsert(&self, event: Event) {
        if let Ok(mut events) = self.events.write() {
            events.insert(event.id, event);
        }
    }
}

impl EventCatalog for InMemoryEventCatalog {
    fn get(&self, id: EventId) -> Option<Event> {
        let events = self.events.read().ok()?;
        events.get(&id).cloned()
    }

    fn list(&self) -> Vec<Event> {
        let Ok(events) = self.events.read() else {
            return Vec::new();
        };

        let mut all: Vec<Event> = events.values().cloned().collect();
        all.sort_by_key(|e| e.starts_at);
        all
    }
}
