//! `gatherly-catalog` — read-only event catalog model.
//!
//! Events, ticket tiers and venues are authored in the CMS collaborator; this
//! crate models them for the core and defines the read port the registration
//! engine consumes. The core never mutates catalog records.

pub mod event;
pub mod provider;

pub use event::{Event, EventId, TicketTier, Venue, VenueKind};
pub use provider::EventCatalog;
