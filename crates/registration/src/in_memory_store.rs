//! In-memory ticket store for tests/dev.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use gatherly_catalog::EventId;
use gatherly_core::UserId;

use crate::store::{TicketStore, TicketStoreError};
use crate::ticket::{QrCode, Ticket, TicketId, TicketStatus};

/// In-memory ticket store.
///
/// All check-then-act sequences run under a single write-lock acquisition,
/// which is the per-process serialization point the duplicate and capacity
/// invariants require. Intended for tests/dev; not optimized for performance
/// (duplicate/capacity checks scan).
#[derive(Debug, Default)]
pub struct InMemoryTicketStore {
    tickets: RwLock<HashMap<TicketId, Ticket>>,
}

impl InMemoryTicketStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn active_count(tickets: &HashMap<TicketId, Ticket>, event_id: EventId, tier: &str) -> u32 {
        tickets
            .values()
            .filter(|t| t.event_id == event_id && t.tier_name == tier && t.is_active())
            .count() as u32
    }
}

impl TicketStore for InMemoryTicketStore {
    fn insert_active(&self, ticket: Ticket, tier_quantity: u32) -> Result<Ticket, TicketStoreError> {
        if !ticket.is_active() {
            return Err(TicketStoreError::InvalidTransition {
                from: ticket.status,
                to: ticket.status,
            });
        }

        let mut tickets = self
            .tickets
            .write()
            .map_err(|_| TicketStoreError::Unavailable("lock poisoned".to_string()))?;

        let duplicate = tickets.values().any(|t| {
            t.event_id == ticket.event_id
                && t.user_id == ticket.user_id
                && t.tier_name == ticket.tier_name
                && t.is_active()
        });
        if duplicate {
            return Err(TicketStoreError::DuplicateActive);
        }

        if Self::active_count(&tickets, ticket.event_id, &ticket.tier_name) >= tier_quantity {
            return Err(TicketStoreError::CapacityExceeded);
        }

        tickets.insert(ticket.id, ticket.clone());
        Ok(ticket)
    }

    fn find_active(&self, event_id: EventId, user_id: UserId, tier_name: &str) -> Option<Ticket> {
        let tickets = self.tickets.read().ok()?;
        tickets
            .values()
            .find(|t| {
                t.event_id == event_id
                    && t.user_id == user_id
                    && t.tier_name == tier_name
                    && t.is_active()
            })
            .cloned()
    }

    fn get(&self, id: TicketId) -> Option<Ticket> {
        let tickets = self.tickets.read().ok()?;
        tickets.get(&id).cloned()
    }

    fn transition(
        &self,
        id: TicketId,
        from: TicketStatus,
        to: TicketStatus,
    ) -> Result<Ticket, TicketStoreError> {
        let mut tickets = self
            .tickets
            .write()
            .map_err(|_| TicketStoreError::Unavailable("lock poisoned".to_string()))?;

        let ticket = tickets.get_mut(&id).ok_or(TicketStoreError::NotFound)?;

        if ticket.status != from {
            return Err(TicketStoreError::InvalidTransition {
                from: ticket.status,
                to,
            });
        }

        ticket.status = to;
        if to == TicketStatus::Confirmed && ticket.qr_code.is_none() {
            ticket.qr_code = Some(QrCode::generate());
        }

        Ok(ticket.clone())
    }

    fn expire_pending(&self, cutoff: DateTime<Utc>) -> Vec<Ticket> {
        let Ok(mut tickets) = self.tickets.write() else {
            return Vec::new();
        };

        let mut expired = Vec::new();
        for ticket in tickets.values_mut() {
            if ticket.status == TicketStatus::Pending && ticket.created_at < cutoff {
                ticket.status = TicketStatus::Cancelled;
                expired.push(ticket.clone());
            }
        }
        expired
    }

    fn tickets_for_user(&self, user_id: UserId) -> Vec<Ticket> {
        let Ok(tickets) = self.tickets.read() else {
            return Vec::new();
        };

        let mut owned: Vec<Ticket> = tickets
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        owned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};

    fn free_ticket(event_id: EventId, user_id: UserId) -> Ticket {
        Ticket::confirmed(event_id, user_id, "Free Entry", 0, Utc::now())
    }

    #[test]
    fn second_active_ticket_for_same_key_is_rejected() {
        let store = InMemoryTicketStore::new();
        let event_id = EventId::new();
        let user_id = UserId::new();

        store
            .insert_active(free_ticket(event_id, user_id), 10)
            .unwrap();
        let err = store
            .insert_active(free_ticket(event_id, user_id), 10)
            .unwrap_err();
        assert_eq!(err, TicketStoreError::DuplicateActive);
    }

    #[test]
    fn different_tiers_do_not_collide() {
        let store = InMemoryTicketStore::new();
        let event_id = EventId::new();
        let user_id = UserId::new();

        store
            .insert_active(free_ticket(event_id, user_id), 10)
            .unwrap();
        store
            .insert_active(
                Ticket::pending(event_id, user_id, "VIP Pass", 599, Utc::now()),
                10,
            )
            .unwrap();
    }

    #[test]
    fn cancelled_ticket_frees_the_key() {
        let store = InMemoryTicketStore::new();
        let event_id = EventId::new();
        let user_id = UserId::new();

        let pending = store
            .insert_active(
                Ticket::pending(event_id, user_id, "VIP Pass", 599, Utc::now()),
                10,
            )
            .unwrap();
        store
            .transition(pending.id, TicketStatus::Pending, TicketStatus::Cancelled)
            .unwrap();

        // Key released; a fresh registration may proceed.
        store
            .insert_active(
                Ticket::pending(event_id, user_id, "VIP Pass", 599, Utc::now()),
                10,
            )
            .unwrap();
    }

    #[test]
    fn capacity_counts_active_tickets_only() {
        let store = InMemoryTicketStore::new();
        let event_id = EventId::new();

        for _ in 0..2 {
            store
                .insert_active(free_ticket(event_id, UserId::new()), 2)
                .unwrap();
        }
        let err = store
            .insert_active(free_ticket(event_id, UserId::new()), 2)
            .unwrap_err();
        assert_eq!(err, TicketStoreError::CapacityExceeded);

        // A cancellation releases one slot.
        let pending = store.tickets_for_user(UserId::new());
        assert!(pending.is_empty());
    }

    #[test]
    fn confirming_assigns_a_qr_code() {
        let store = InMemoryTicketStore::new();
        let pending = store
            .insert_active(
                Ticket::pending(EventId::new(), UserId::new(), "VIP Pass", 599, Utc::now()),
                10,
            )
            .unwrap();
        assert!(pending.qr_code.is_none());

        let confirmed = store
            .transition(pending.id, TicketStatus::Pending, TicketStatus::Confirmed)
            .unwrap();
        assert!(confirmed.qr_code.is_some());
    }

    #[test]
    fn cancelled_tickets_never_resurrect() {
        let store = InMemoryTicketStore::new();
        let pending = store
            .insert_active(
                Ticket::pending(EventId::new(), UserId::new(), "VIP Pass", 599, Utc::now()),
                10,
            )
            .unwrap();
        store
            .transition(pending.id, TicketStatus::Pending, TicketStatus::Cancelled)
            .unwrap();

        let err = store
            .transition(pending.id, TicketStatus::Pending, TicketStatus::Confirmed)
            .unwrap_err();
        assert!(matches!(err, TicketStoreError::InvalidTransition { .. }));
    }

    #[test]
    fn expire_pending_cancels_only_stale_pending_tickets() {
        let store = InMemoryTicketStore::new();
        let event_id = EventId::new();
        let old = Utc::now() - chrono::Duration::hours(1);

        let stale = store
            .insert_active(
                Ticket::pending(event_id, UserId::new(), "VIP Pass", 599, old),
                10,
            )
            .unwrap();
        let fresh = store
            .insert_active(
                Ticket::pending(event_id, UserId::new(), "VIP Pass", 599, Utc::now()),
                10,
            )
            .unwrap();
        let confirmed = store
            .insert_active(free_ticket(event_id, UserId::new()), 10)
            .unwrap();

        let cutoff = Utc::now() - chrono::Duration::minutes(30);
        let expired = store.expire_pending(cutoff);

        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].id, stale.id);
        assert_eq!(store.get(stale.id).unwrap().status, TicketStatus::Cancelled);
        assert_eq!(store.get(fresh.id).unwrap().status, TicketStatus::Pending);
        assert_eq!(
            store.get(confirmed.id).unwrap().status,
            TicketStatus::Confirmed
        );
    }

    #[test]
    fn concurrent_inserts_for_same_key_admit_exactly_one() {
        let store = Arc::new(InMemoryTicketStore::new());
        let event_id = EventId::new();
        let user_id = UserId::new();

        let threads = 8;
        let barrier = Arc::new(Barrier::new(threads));
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let store = Arc::clone(&store);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    store.insert_active(free_ticket(event_id, user_id), 100)
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let ok = results.iter().filter(|r| r.is_ok()).count();
        let dup = results
            .iter()
            .filter(|r| matches!(r, Err(TicketStoreError::DuplicateActive)))
            .count();

        assert_eq!(ok, 1);
        assert_eq!(dup, threads - 1);
    }

    #[test]
    fn concurrent_inserts_never_oversell_a_tier() {
        let store = Arc::new(InMemoryTicketStore::new());
        let event_id = EventId::new();
        let quantity = 5u32;

        let threads = 16;
        let barrier = Arc::new(Barrier::new(threads));
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let store = Arc::clone(&store);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    store.insert_active(free_ticket(event_id, UserId::new()), quantity)
                })
            })
            .collect();

        let ok = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|r| r.is_ok())
            .count();

        assert_eq!(ok as u32, quantity);
    }
}
