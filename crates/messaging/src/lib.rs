//! `gatherly-messaging` — domain event plumbing.
//!
//! The core emits domain facts (registration confirmed, user suspended, ...)
//! for the notification collaborator to render. This crate carries the event
//! contract and a transport-agnostic pub/sub abstraction; it never formats
//! user-facing text.

pub mod bus;
pub mod domain_event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use domain_event::DomainEvent;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
