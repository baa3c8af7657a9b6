//! `gatherly-registration` — the event registration/ticketing engine.
//!
//! Given an event, a ticket tier and a user identity, the engine decides
//! eligibility, prevents duplicate registrations, and produces a ticket
//! through either the free-confirmation path or the paid-confirmation path.
//! Payment collection itself is an external collaborator; the engine's only
//! contract with it is intent initiation and a finalize callback.

pub mod engine;
pub mod in_memory_store;
pub mod store;
pub mod ticket;

pub use engine::{
    PaymentIntent, PaymentIntentId, PaymentOutcome, RegistrationDecision, RegistrationEngine,
    RegistrationError, RegistrationEvent,
};
pub use in_memory_store::InMemoryTicketStore;
pub use store::{TicketStore, TicketStoreError};
pub use ticket::{QrCode, Ticket, TicketId, TicketStatus};
