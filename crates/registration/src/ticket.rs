//! Ticket entity and lifecycle.

use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gatherly_catalog::EventId;
use gatherly_core::{DomainError, Entity, UserId};

/// Unique identifier for a ticket.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(Uuid);

impl TicketId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TicketId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for TicketId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TicketId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid =
            Uuid::from_str(s).map_err(|e| DomainError::invalid_id(format!("TicketId: {e}")))?;
        Ok(Self(uuid))
    }
}

/// Opaque check-in token printed on the ticket.
///
/// Unique per ticket; collision-resistant but not a secret.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QrCode(String);

impl QrCode {
    pub fn generate() -> Self {
        Self(Uuid::now_v7().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for QrCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ticket lifecycle.
///
/// `Pending` reserves inventory while payment is in flight; `Cancelled` is
/// terminal and releases the reservation. Confirmed tickets are immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl TicketStatus {
    /// Active tickets count toward duplicate and capacity checks.
    pub fn is_active(&self) -> bool {
        matches!(self, TicketStatus::Pending | TicketStatus::Confirmed)
    }
}

/// A registration for one (event, user, tier).
///
/// # Invariants
/// - At most one *active* ticket exists per (event_id, user_id, tier_name);
///   the store enforces this atomically.
/// - A confirmed ticket always carries a qr code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub event_id: EventId,
    pub user_id: UserId,
    pub tier_name: String,
    /// Price paid (or to pay), smallest currency unit.
    pub price: u64,
    pub status: TicketStatus,
    pub qr_code: Option<QrCode>,
    pub created_at: DateTime<Utc>,
}

impl Ticket {
    /// A confirmed ticket for the free path, qr code assigned immediately.
    pub fn confirmed(
        event_id: EventId,
        user_id: UserId,
        tier_name: impl Into<String>,
        price: u64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TicketId::new(),
            event_id,
            user_id,
            tier_name: tier_name.into(),
            price,
            status: TicketStatus::Confirmed,
            qr_code: Some(QrCode::generate()),
            created_at,
        }
    }

    /// A pending ticket reserving inventory for the paid path.
    pub fn pending(
        event_id: EventId,
        user_id: UserId,
        tier_name: impl Into<String>,
        price: u64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TicketId::new(),
            event_id,
            user_id,
            tier_name: tier_name.into(),
            price,
            status: TicketStatus::Pending,
            qr_code: None,
            created_at,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

impl Entity for Ticket {
    type Id = TicketId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirmed_tickets_carry_a_qr_code() {
        let ticket = Ticket::confirmed(EventId::new(), UserId::new(), "Free Entry", 0, Utc::now());
        assert_eq!(ticket.status, TicketStatus::Confirmed);
        assert!(ticket.qr_code.is_some());
        assert!(!ticket.qr_code.unwrap().as_str().is_empty());
    }

    #[test]
    fn pending_tickets_have_no_qr_code_yet() {
        let ticket = Ticket::pending(EventId::new(), UserId::new(), "VIP Pass", 599, Utc::now());
        assert_eq!(ticket.status, TicketStatus::Pending);
        assert!(ticket.qr_code.is_none());
    }

    #[test]
    fn cancelled_is_the_only_inactive_status() {
        assert!(TicketStatus::Pending.is_active());
        assert!(TicketStatus::Confirmed.is_active());
        assert!(!TicketStatus::Cancelled.is_active());
    }

    #[test]
    fn qr_codes_are_unique() {
        let a = QrCode::generate();
        let b = QrCode::generate();
        assert_ne!(a, b);
    }
}
