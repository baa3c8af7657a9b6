//! Catalog read port.

use std::sync::Arc;

use crate::event::{Event, EventId};

/// Read-only access to the published event catalog.
///
/// Implementations adapt whatever serves the content (the hosted CMS in
/// production, an in-memory fixture in dev/tests). The core only ever reads.
pub trait EventCatalog: Send + Sync {
    fn get(&self, id: EventId) -> Option<Event>;
    fn list(&self) -> Vec<Event>;
}

impl<C> EventCatalog for Arc<C>
where
    C: EventCatalog + ?Sized,
{
    fn get(&self, id: EventId) -> Option<Event> {
        (**self).get(id)
    }

    fn list(&self) -> Vec<Event> {
        (**self).list()
    }
}
