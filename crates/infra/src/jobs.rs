//! Housekeeping jobs.

use chrono::{Duration, Utc};

use gatherly_messaging::EventBus;
use gatherly_registration::{RegistrationEngine, RegistrationEvent, TicketStore};

/// Default bound on how long a payment may stay in flight.
pub const DEFAULT_PENDING_TTL_MINUTES: i64 = 30;

/// Reconciliation pass for abandoned paid registrations.
///
/// A pending ticket reserves inventory; if the payment collaborator never
/// finalizes it, this job cancels the reservation after the configured TTL so
/// capacity is released without relying on the client returning.
#[derive(Debug, Clone, Copy)]
pub struct PendingExpiry {
    ttl: Duration,
}

impl PendingExpiry {
    pub fn new(ttl_minutes: i64) -> Self {
        Self {
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Run one sweep; returns how many reservations were released.
    pub fn run_once<S, B>(&self, engine: &RegistrationEngine<S, B>) -> usize
    where
        S: TicketStore,
        B: EventBus<RegistrationEvent>,
    {
        let cutoff = Utc::now() - self.ttl;
        let expired = engine.expire_pending(cutoff);

        if !expired.is_empty() {
            tracing::info!(count = expired.len(), "released expired reservations");
        }
        expired.len()
    }
}

impl Default for PendingExpiry {
    fn default() -> Self {
        Self::new(DEFAULT_PENDING_TTL_MINUTES)
    }
}
