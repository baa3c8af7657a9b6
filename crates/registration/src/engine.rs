//! Registration decision logic and the free/paid ticket flows.

use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use gatherly_auth::Identity;
use gatherly_catalog::{Event, EventId};
use gatherly_core::{DomainError, UserId};
use gatherly_messaging::{DomainEvent, EventBus};

use crate::store::{TicketStore, TicketStoreError};
use crate::ticket::{Ticket, TicketId, TicketStatus};

/// Outcome of [`RegistrationEngine::evaluate`].
///
/// These are normal decision outcomes, not errors; the caller picks the
/// registration path (or the user-facing notice) from the variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "decision")]
pub enum RegistrationDecision {
    /// Anonymous actors must sign in before registering.
    RequiresLogin,
    EventNotFound,
    /// The tier name is not part of the event's catalog.
    InvalidTier,
    /// An active ticket already exists for this (event, user, tier).
    AlreadyRegistered,
    /// Free-confirmation path applies.
    TierFree,
    /// Paid path applies; `amount` is the tier price.
    TierPaid { amount: u64 },
}

/// Registration failure taxonomy.
///
/// Expected business conditions are returned, never panicked; only
/// [`RegistrationError::Store`] signals a truly unexpected failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("authentication required")]
    NotAuthenticated,

    #[error("event not found")]
    EventNotFound,

    #[error("tier not found")]
    TierNotFound,

    #[error("tier is not free")]
    TierNotFree,

    #[error("tier is not paid")]
    TierNotPaid,

    #[error("already registered for this tier")]
    AlreadyRegistered,

    #[error("tier is sold out")]
    CapacityExceeded,

    #[error("payment failed")]
    PaymentFailed,

    #[error("ticket not found")]
    TicketNotFound,

    #[error("ticket is not in the expected state")]
    InvalidTicketState,

    #[error("storage failure: {0}")]
    Store(TicketStoreError),
}

impl From<TicketStoreError> for RegistrationError {
    fn from(err: TicketStoreError) -> Self {
        match err {
            TicketStoreError::DuplicateActive => RegistrationError::AlreadyRegistered,
            TicketStoreError::CapacityExceeded => RegistrationError::CapacityExceeded,
            TicketStoreError::NotFound => RegistrationError::TicketNotFound,
            TicketStoreError::InvalidTransition { .. } => RegistrationError::InvalidTicketState,
            other @ TicketStoreError::Unavailable(_) => RegistrationError::Store(other),
        }
    }
}

/// Identifier of a payment intent handed to the payment collaborator.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentIntentId(Uuid);

impl PaymentIntentId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for PaymentIntentId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for PaymentIntentId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PaymentIntentId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = Uuid::from_str(s)
            .map_err(|e| DomainError::invalid_id(format!("PaymentIntentId: {e}")))?;
        Ok(Self(uuid))
    }
}

/// A reserved, not-yet-settled charge.
///
/// The pending ticket referenced by `ticket_id` holds the inventory while the
/// external payment collaborator collects the charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: PaymentIntentId,
    pub ticket_id: TicketId,
    pub event_id: EventId,
    pub user_id: UserId,
    pub tier_name: String,
    /// Amount due, smallest currency unit.
    pub amount: u64,
}

/// The payment collaborator's verdict for an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentOutcome {
    Succeeded,
    Failed,
    /// The client never returned; treated like a failure.
    Abandoned,
}

/// Why a registration did not complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    PaymentFailed,
    PaymentAbandoned,
    ReservationExpired,
}

/// Event: RegistrationConfirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationConfirmed {
    pub ticket_id: TicketId,
    pub event_id: EventId,
    pub user_id: UserId,
    pub tier_name: String,
    pub price: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: RegistrationFailed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationFailed {
    pub ticket_id: TicketId,
    pub event_id: EventId,
    pub user_id: UserId,
    pub tier_name: String,
    pub reason: FailureReason,
    pub occurred_at: DateTime<Utc>,
}

/// Facts the engine emits for the notification collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationEvent {
    RegistrationConfirmed(RegistrationConfirmed),
    RegistrationFailed(RegistrationFailed),
}

impl DomainEvent for RegistrationEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RegistrationEvent::RegistrationConfirmed(_) => "registration.confirmed",
            RegistrationEvent::RegistrationFailed(_) => "registration.failed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            RegistrationEvent::RegistrationConfirmed(e) => e.occurred_at,
            RegistrationEvent::RegistrationFailed(e) => e.occurred_at,
        }
    }
}

/// The registration engine.
///
/// Decisions are pure; side effects go through the [`TicketStore`] (which owns
/// the uniqueness/capacity invariants) and the event bus (best-effort
/// notification fan-out — the store remains the source of truth).
pub struct RegistrationEngine<S, B> {
    store: S,
    bus: B,
}

impl<S, B> RegistrationEngine<S, B>
where
    S: TicketStore,
    B: EventBus<RegistrationEvent>,
{
    pub fn new(store: S, bus: B) -> Self {
        Self { store, bus }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Decide the registration path for a (possibly anonymous) actor.
    pub fn evaluate(
        &self,
        identity: Option<&Identity>,
        event: Option<&Event>,
        tier_name: &str,
    ) -> RegistrationDecision {
        let Some(identity) = identity else {
            return RegistrationDecision::RequiresLogin;
        };
        let Some(event) = event else {
            return RegistrationDecision::EventNotFound;
        };
        let Some(tier) = event.tier(tier_name) else {
            return RegistrationDecision::InvalidTier;
        };

        if self
            .store
            .find_active(event.id, identity.id, tier_name)
            .is_some()
        {
            return RegistrationDecision::AlreadyRegistered;
        }

        if tier.is_free() {
            RegistrationDecision::TierFree
        } else {
            RegistrationDecision::TierPaid { amount: tier.price }
        }
    }

    /// Free-confirmation path: create a confirmed ticket in one atomic insert.
    ///
    /// Safe under concurrent duplicate submission: the store admits exactly
    /// one active ticket per (event, user, tier); the rest come back as
    /// [`RegistrationError::AlreadyRegistered`].
    pub fn confirm_free(
        &self,
        identity: &Identity,
        event: &Event,
        tier_name: &str,
    ) -> Result<Ticket, RegistrationError> {
        let tier = event
            .tier(tier_name)
            .ok_or(RegistrationError::TierNotFound)?;
        if !tier.is_free() {
            return Err(RegistrationError::TierNotFree);
        }

        let ticket = Ticket::confirmed(event.id, identity.id, tier_name, 0, Utc::now());
        let ticket = self.store.insert_active(ticket, tier.quantity)?;

        tracing::info!(
            ticket_id = %ticket.id,
            event_id = %event.id,
            user_id = %identity.id,
            tier = tier_name,
            "free registration confirmed"
        );
        self.publish(RegistrationEvent::RegistrationConfirmed(
            RegistrationConfirmed {
                ticket_id: ticket.id,
                event_id: event.id,
                user_id: identity.id,
                tier_name: tier_name.to_string(),
                price: 0,
                occurred_at: ticket.created_at,
            },
        ));

        Ok(ticket)
    }

    /// Paid path, step 1: reserve inventory with a pending ticket and hand a
    /// payment intent to the external collaborator.
    pub fn initiate_paid(
        &self,
        identity: &Identity,
        event: &Event,
        tier_name: &str,
    ) -> Result<PaymentIntent, RegistrationError> {
        let tier = event
            .tier(tier_name)
            .ok_or(RegistrationError::TierNotFound)?;
        if tier.is_free() {
            return Err(RegistrationError::TierNotPaid);
        }

        let ticket = Ticket::pending(event.id, identity.id, tier_name, tier.price, Utc::now());
        let ticket = self.store.insert_active(ticket, tier.quantity)?;

        tracing::info!(
            ticket_id = %ticket.id,
            event_id = %event.id,
            user_id = %identity.id,
            tier = tier_name,
            amount = tier.price,
            "paid registration initiated"
        );

        Ok(PaymentIntent {
            id: PaymentIntentId::new(),
            ticket_id: ticket.id,
            event_id: event.id,
            user_id: identity.id,
            tier_name: tier_name.to_string(),
            amount: tier.price,
        })
    }

    /// Paid path, step 2: settle the reservation from the payment outcome.
    ///
    /// Success confirms the pending ticket (assigning its qr code); failure or
    /// abandonment cancels it, releasing the reservation deterministically.
    pub fn finalize_paid(
        &self,
        intent: &PaymentIntent,
        outcome: PaymentOutcome,
    ) -> Result<Ticket, RegistrationError> {
        match outcome {
            PaymentOutcome::Succeeded => {
                let ticket = self.store.transition(
                    intent.ticket_id,
                    TicketStatus::Pending,
                    TicketStatus::Confirmed,
                )?;

                tracing::info!(ticket_id = %ticket.id, "paid registration confirmed");
                self.publish(RegistrationEvent::RegistrationConfirmed(
                    RegistrationConfirmed {
                        ticket_id: ticket.id,
                        event_id: ticket.event_id,
                        user_id: ticket.user_id,
                        tier_name: ticket.tier_name.clone(),
                        price: ticket.price,
                        occurred_at: Utc::now(),
                    },
                ));

                Ok(ticket)
            }
            PaymentOutcome::Failed | PaymentOutcome::Abandoned => {
                let ticket = self.store.transition(
                    intent.ticket_id,
                    TicketStatus::Pending,
                    TicketStatus::Cancelled,
                )?;

                let reason = match outcome {
                    PaymentOutcome::Failed => FailureReason::PaymentFailed,
                    _ => FailureReason::PaymentAbandoned,
                };
                tracing::warn!(ticket_id = %ticket.id, ?reason, "paid registration not completed");
                self.publish(RegistrationEvent::RegistrationFailed(RegistrationFailed {
                    ticket_id: ticket.id,
                    event_id: ticket.event_id,
                    user_id: ticket.user_id,
                    tier_name: ticket.tier_name.clone(),
                    reason,
                    occurred_at: Utc::now(),
                }));

                Err(RegistrationError::PaymentFailed)
            }
        }
    }

    /// Reconciliation: cancel pending tickets older than `cutoff`.
    ///
    /// Invoked by a scheduler collaborator so abandoned reservations are
    /// released without relying on the client returning.
    pub fn expire_pending(&self, cutoff: DateTime<Utc>) -> Vec<Ticket> {
        let expired = self.store.expire_pending(cutoff);

        for ticket in &expired {
            tracing::warn!(ticket_id = %ticket.id, "pending reservation expired");
            self.publish(RegistrationEvent::RegistrationFailed(RegistrationFailed {
                ticket_id: ticket.id,
                event_id: ticket.event_id,
                user_id: ticket.user_id,
                tier_name: ticket.tier_name.clone(),
                reason: FailureReason::ReservationExpired,
                occurred_at: Utc::now(),
            }));
        }

        expired
    }

    /// Best-effort fan-out; the store is the source of truth, so a failed
    /// publish is logged and not propagated.
    fn publish(&self, event: RegistrationEvent) {
        if let Err(e) = self.bus.publish(event) {
            tracing::warn!(error = ?e, "failed to publish registration event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};

    use proptest::prelude::*;

    use gatherly_catalog::{TicketTier, Venue, VenueKind};
    use gatherly_messaging::InMemoryEventBus;

    use crate::in_memory_store::InMemoryTicketStore;

    type TestEngine =
        RegistrationEngine<Arc<InMemoryTicketStore>, Arc<InMemoryEventBus<RegistrationEvent>>>;

    fn engine() -> TestEngine {
        RegistrationEngine::new(
            Arc::new(InMemoryTicketStore::new()),
            Arc::new(InMemoryEventBus::new()),
        )
    }

    fn attendee() -> Identity {
        Identity::new(UserId::new(), "Alex", "alex@example.com")
    }

    fn event_with_tiers(tiers: Vec<TicketTier>) -> Event {
        Event::new(
            EventId::new(),
            "DevDays",
            "two days of talks",
            "conference",
            Utc::now() + chrono::Duration::days(30),
            Venue {
                kind: VenueKind::Physical,
                details: "Main Hall".to_string(),
            },
            tiers,
            UserId::new(),
            None,
        )
        .unwrap()
    }

    fn tier(name: &str, price: u64, quantity: u32) -> TicketTier {
        TicketTier {
            name: name.to_string(),
            price,
            quantity,
        }
    }

    #[test]
    fn anonymous_actor_requires_login() {
        let engine = engine();
        let event = event_with_tiers(vec![tier("Free Entry", 0, 10)]);

        assert_eq!(
            engine.evaluate(None, Some(&event), "Free Entry"),
            RegistrationDecision::RequiresLogin
        );
    }

    #[test]
    fn missing_event_and_bogus_tier_are_distinct_decisions() {
        let engine = engine();
        let user = attendee();
        let event = event_with_tiers(vec![tier("Free Entry", 0, 10)]);

        assert_eq!(
            engine.evaluate(Some(&user), None, "Free Entry"),
            RegistrationDecision::EventNotFound
        );
        assert_eq!(
            engine.evaluate(Some(&user), Some(&event), "Backstage"),
            RegistrationDecision::InvalidTier
        );
    }

    #[test]
    fn free_tier_evaluates_free_and_confirms_with_price_zero() {
        let engine = engine();
        let user = attendee();
        let event = event_with_tiers(vec![tier("Free Entry", 0, 10)]);

        assert_eq!(
            engine.evaluate(Some(&user), Some(&event), "Free Entry"),
            RegistrationDecision::TierFree
        );

        let ticket = engine.confirm_free(&user, &event, "Free Entry").unwrap();
        assert_eq!(ticket.status, TicketStatus::Confirmed);
        assert_eq!(ticket.price, 0);
        assert!(ticket.qr_code.is_some());
    }

    #[test]
    fn retry_after_confirmation_is_already_registered() {
        let engine = engine();
        let user = attendee();
        let event = event_with_tiers(vec![tier("Free Entry", 0, 10)]);

        engine.confirm_free(&user, &event, "Free Entry").unwrap();

        // The decision is stable no matter how often it is asked.
        for _ in 0..3 {
            assert_eq!(
                engine.evaluate(Some(&user), Some(&event), "Free Entry"),
                RegistrationDecision::AlreadyRegistered
            );
        }

        let err = engine.confirm_free(&user, &event, "Free Entry").unwrap_err();
        assert_eq!(err, RegistrationError::AlreadyRegistered);
    }

    #[test]
    fn paid_tier_flows_through_intent_to_confirmed_ticket() {
        let engine = engine();
        let user = attendee();
        let event = event_with_tiers(vec![tier("VIP Pass", 599, 5)]);

        assert_eq!(
            engine.evaluate(Some(&user), Some(&event), "VIP Pass"),
            RegistrationDecision::TierPaid { amount: 599 }
        );

        let intent = engine.initiate_paid(&user, &event, "VIP Pass").unwrap();
        assert_eq!(intent.amount, 599);

        let ticket = engine
            .finalize_paid(&intent, PaymentOutcome::Succeeded)
            .unwrap();
        assert_eq!(ticket.status, TicketStatus::Confirmed);
        assert_eq!(ticket.price, 599);
        assert!(ticket.qr_code.is_some());
    }

    #[test]
    fn failed_payment_cancels_the_reservation() {
        let engine = engine();
        let user = attendee();
        let event = event_with_tiers(vec![tier("VIP Pass", 599, 5)]);

        let intent = engine.initiate_paid(&user, &event, "VIP Pass").unwrap();
        let err = engine
            .finalize_paid(&intent, PaymentOutcome::Failed)
            .unwrap_err();
        assert_eq!(err, RegistrationError::PaymentFailed);

        // Reservation released: the user may try again.
        assert_eq!(
            engine.evaluate(Some(&user), Some(&event), "VIP Pass"),
            RegistrationDecision::TierPaid { amount: 599 }
        );
    }

    #[test]
    fn finalize_is_not_replayable_after_cancellation() {
        let engine = engine();
        let user = attendee();
        let event = event_with_tiers(vec![tier("VIP Pass", 599, 5)]);

        let intent = engine.initiate_paid(&user, &event, "VIP Pass").unwrap();
        let _ = engine.finalize_paid(&intent, PaymentOutcome::Failed);

        // A late success callback must not resurrect the cancelled ticket.
        let err = engine
            .finalize_paid(&intent, PaymentOutcome::Succeeded)
            .unwrap_err();
        assert_eq!(err, RegistrationError::InvalidTicketState);
    }

    #[test]
    fn pending_reservation_counts_toward_duplicates() {
        let engine = engine();
        let user = attendee();
        let event = event_with_tiers(vec![tier("VIP Pass", 599, 5)]);

        engine.initiate_paid(&user, &event, "VIP Pass").unwrap();
        assert_eq!(
            engine.evaluate(Some(&user), Some(&event), "VIP Pass"),
            RegistrationDecision::AlreadyRegistered
        );
        let err = engine.initiate_paid(&user, &event, "VIP Pass").unwrap_err();
        assert_eq!(err, RegistrationError::AlreadyRegistered);
    }

    #[test]
    fn free_confirmation_on_a_paid_tier_is_rejected() {
        let engine = engine();
        let user = attendee();
        let event = event_with_tiers(vec![tier("VIP Pass", 599, 5)]);

        assert_eq!(
            engine.confirm_free(&user, &event, "VIP Pass").unwrap_err(),
            RegistrationError::TierNotFree
        );
        assert_eq!(
            engine.initiate_paid(&user, &event, "Backstage").unwrap_err(),
            RegistrationError::TierNotFound
        );
    }

    #[test]
    fn same_user_may_hold_different_tiers_of_one_event() {
        let engine = engine();
        let user = attendee();
        let event = event_with_tiers(vec![tier("Free Entry", 0, 10), tier("VIP Pass", 599, 5)]);

        engine.confirm_free(&user, &event, "Free Entry").unwrap();
        let intent = engine.initiate_paid(&user, &event, "VIP Pass").unwrap();
        engine
            .finalize_paid(&intent, PaymentOutcome::Succeeded)
            .unwrap();

        assert_eq!(engine.store().tickets_for_user(user.id).len(), 2);
    }

    #[test]
    fn sold_out_tier_rejects_with_capacity_exceeded() {
        let engine = engine();
        let event = event_with_tiers(vec![tier("Free Entry", 0, 1)]);

        engine
            .confirm_free(&attendee(), &event, "Free Entry")
            .unwrap();
        let err = engine
            .confirm_free(&attendee(), &event, "Free Entry")
            .unwrap_err();
        assert_eq!(err, RegistrationError::CapacityExceeded);
    }

    #[test]
    fn concurrent_free_confirmations_yield_one_ticket() {
        let engine = Arc::new(engine());
        let user = attendee();
        let event = event_with_tiers(vec![tier("Free Entry", 0, 100)]);

        let threads = 8;
        let barrier = Arc::new(Barrier::new(threads));
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let engine = Arc::clone(&engine);
                let barrier = Arc::clone(&barrier);
                let user = user.clone();
                let event = event.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    engine.confirm_free(&user, &event, "Free Entry")
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let ok = results.iter().filter(|r| r.is_ok()).count();
        let dup = results
            .iter()
            .filter(|r| matches!(r, Err(RegistrationError::AlreadyRegistered)))
            .count();

        assert_eq!(ok, 1);
        assert_eq!(dup, threads - 1);
    }

    #[test]
    fn expired_reservations_emit_failure_events() {
        let store = Arc::new(InMemoryTicketStore::new());
        let bus = Arc::new(InMemoryEventBus::new());
        let sub = bus.subscribe();
        let engine = RegistrationEngine::new(Arc::clone(&store), Arc::clone(&bus));

        let user = attendee();
        let event = event_with_tiers(vec![tier("VIP Pass", 599, 5)]);
        engine.initiate_paid(&user, &event, "VIP Pass").unwrap();

        let expired = engine.expire_pending(Utc::now() + chrono::Duration::seconds(1));
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].status, TicketStatus::Cancelled);

        match sub.try_recv().unwrap() {
            RegistrationEvent::RegistrationFailed(e) => {
                assert_eq!(e.reason, FailureReason::ReservationExpired);
            }
            other => panic!("expected RegistrationFailed, got {other:?}"),
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: no interleaving of registrations oversells a tier, and no
        /// user ever ends up with two active tickets for the same tier.
        #[test]
        fn capacity_and_uniqueness_hold_for_any_registration_sequence(
            quantity in 1u32..8,
            attempts in prop::collection::vec(0usize..6, 1..40)
        ) {
            let engine = engine();
            let users: Vec<Identity> = (0..6).map(|_| attendee()).collect();
            let event = event_with_tiers(vec![tier("Free Entry", 0, quantity)]);

            let mut confirmed = 0u32;
            for idx in attempts {
                match engine.confirm_free(&users[idx], &event, "Free Entry") {
                    Ok(_) => confirmed += 1,
                    Err(RegistrationError::AlreadyRegistered)
                    | Err(RegistrationError::CapacityExceeded) => {}
                    Err(other) => panic!("unexpected error: {other:?}"),
                }
            }

            prop_assert!(confirmed <= quantity);
            for user in &users {
                let active = engine
                    .store()
                    .tickets_for_user(user.id)
                    .into_iter()
                    .filter(|t| t.is_active())
                    .count();
                prop_assert!(active <= 1);
            }
        }
    }
}
