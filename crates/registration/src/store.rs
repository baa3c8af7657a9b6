//! Ticket persistence port.
//!
//! The engine talks to storage through this trait so the uniqueness and
//! capacity invariants can be enforced where they belong: in one atomic
//! storage operation, not in a read-then-write in the caller.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use gatherly_catalog::EventId;
use gatherly_core::UserId;

use crate::ticket::{Ticket, TicketId, TicketStatus};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TicketStoreError {
    /// An active ticket already exists for this (event, user, tier).
    #[error("active ticket already exists for this tier")]
    DuplicateActive,

    /// The tier's quantity cap would be exceeded.
    #[error("tier capacity exceeded")]
    CapacityExceeded,

    #[error("ticket not found")]
    NotFound,

    /// Compare-and-set on status failed.
    #[error("invalid transition: {from:?} -> {to:?}")]
    InvalidTransition { from: TicketStatus, to: TicketStatus },

    /// Storage is unavailable (truly unexpected; not a business outcome).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Ticket storage contract.
///
/// `insert_active` is the single serialization point per (event, user, tier)
/// key: the duplicate check, the capacity check and the insert happen under
/// one atomic operation. Registrations for different keys proceed fully in
/// parallel.
pub trait TicketStore: Send + Sync {
    /// Atomically insert a new active (pending or confirmed) ticket.
    ///
    /// Fails with [`TicketStoreError::DuplicateActive`] when an active ticket
    /// already exists for the same (event, user, tier), and with
    /// [`TicketStoreError::CapacityExceeded`] when active tickets for the tier
    /// have reached `tier_quantity`.
    fn insert_active(&self, ticket: Ticket, tier_quantity: u32) -> Result<Ticket, TicketStoreError>;

    /// The active ticket for a (event, user, tier) key, if any.
    fn find_active(&self, event_id: EventId, user_id: UserId, tier_name: &str) -> Option<Ticket>;

    fn get(&self, id: TicketId) -> Option<Ticket>;

    /// Compare-and-set status transition.
    ///
    /// Assigns a qr code when confirming a ticket that has none.
    fn transition(
        &self,
        id: TicketId,
        from: TicketStatus,
        to: TicketStatus,
    ) -> Result<Ticket, TicketStoreError>;

    /// Cancel pending tickets created before `cutoff`, releasing their
    /// reservations. Returns the cancelled tickets.
    fn expire_pending(&self, cutoff: DateTime<Utc>) -> Vec<Ticket>;

    /// All tickets held by a user, newest first.
    fn tickets_for_user(&self, user_id: UserId) -> Vec<Ticket>;
}

impl<S> TicketStore for Arc<S>
where
    S: TicketStore + ?Sized,
{
    fn insert_active(&self, ticket: Ticket, tier_quantity: u32) -> Result<Ticket, TicketStoreError> {
        (**self).insert_active(ticket, tier_quantity)
    }

    fn find_active(&self, event_id: EventId, user_id: UserId, tier_name: &str) -> Option<Ticket> {
        (**self).find_active(event_id, user_id, tier_name)
    }

    fn get(&self, id: TicketId) -> Option<Ticket> {
        (**self).get(id)
    }

    fn transition(
        &self,
        id: TicketId,
        from: TicketStatus,
        to: TicketStatus,
    ) -> Result<Ticket, TicketStoreError> {
        (**self).transition(id, from, to)
    }

    fn expire_pending(&self, cutoff: DateTime<Utc>) -> Vec<Ticket> {
        (**self).expire_pending(cutoff)
    }

    fn tickets_for_user(&self, user_id: UserId) -> Vec<Ticket> {
        (**self).tickets_for_user(user_id)
    }
}
