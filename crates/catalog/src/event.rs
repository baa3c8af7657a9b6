//! Event catalog records (CMS-owned, read-only for the core).

use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gatherly_core::{DomainError, DomainResult, Entity, UserId};

/// Unique identifier for a catalog event.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
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

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for EventId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for EventId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<EventId> for Uuid {
    fn from(value: EventId) -> Self {
        value.0
    }
}

impl FromStr for EventId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid =
            Uuid::from_str(s).map_err(|e| DomainError::invalid_id(format!("EventId: {e}")))?;
        Ok(Self(uuid))
    }
}

/// Where an event takes place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VenueKind {
    Physical,
    Online,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Venue {
    pub kind: VenueKind,
    /// Address for physical venues, join link/platform for online ones.
    pub details: String,
}

/// A named ticket class for an event.
///
/// `price` is in the smallest currency unit; 0 means free admission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketTier {
    pub name: String,
    pub price: u64,
    /// Capacity cap for this tier.
    pub quantity: u32,
}

impl TicketTier {
    pub fn is_free(&self) -> bool {
        self.price == 0
    }
}

/// A published event as served by the CMS.
///
/// # Invariants
/// - `tiers` is non-empty.
/// - Tier names are unique within the event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub description: String,
    pub category: String,
    pub starts_at: DateTime<Utc>,
    pub venue: Venue,
    tiers: Vec<TicketTier>,
    pub organizer_id: UserId,
    pub cover_image: Option<String>,
}

impl Event {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: EventId,
        title: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
        starts_at: DateTime<Utc>,
        venue: Venue,
        tiers: Vec<TicketTier>,
        organizer_id: UserId,
        cover_image: Option<String>,
    ) -> DomainResult<Self> {
        if tiers.is_empty() {
            return Err(DomainError::validation("event must have at least one tier"));
        }

        for (i, tier) in tiers.iter().enumerate() {
            if tier.name.trim().is_empty() {
                return Err(DomainError::validation("tier name must not be empty"));
            }
            if tiers[..i].iter().any(|t| t.name == tier.name) {
                return Err(DomainError::validation(format!(
                    "duplicate tier name '{}'",
                    tier.name
                )));
            }
        }

        Ok(Self {
            id,
            title: title.into(),
            description: description.into(),
            category: category.into(),
            starts_at,
            venue,
            tiers,
            organizer_id,
            cover_image,
        })
    }

    pub fn tiers(&self) -> &[TicketTier] {
        &self.tiers
    }

    /// Look up a tier by its (event-unique) name.
    pub fn tier(&self, name: &str) -> Option<&TicketTier> {
        self.tiers.iter().find(|t| t.name == name)
    }

    /// An event is free iff at least one tier has price 0.
    pub fn is_free(&self) -> bool {
        self.tiers.iter().any(TicketTier::is_free)
    }
}

impl Entity for Event {
    type Id = EventId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn venue() -> Venue {
        Venue {
            kind: VenueKind::Online,
            details: "https://meet.example/e".to_string(),
        }
    }

    fn tier(name: &str, price: u64) -> TicketTier {
        TicketTier {
            name: name.to_string(),
            price,
            quantity: 100,
        }
    }

    #[test]
    fn event_requires_at_least_one_tier() {
        let err = Event::new(
            EventId::new(),
            "RustConf",
            "annual",
            "conference",
            Utc::now(),
            venue(),
            vec![],
            UserId::new(),
            None,
        )
        .unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn duplicate_tier_names_are_rejected() {
        let err = Event::new(
            EventId::new(),
            "RustConf",
            "annual",
            "conference",
            Utc::now(),
            venue(),
            vec![tier("General", 100), tier("General", 200)],
            UserId::new(),
            None,
        )
        .unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn event_is_free_iff_some_tier_is_free() {
        let paid_only = Event::new(
            EventId::new(),
            "RustConf",
            "annual",
            "conference",
            Utc::now(),
            venue(),
            vec![tier("General", 100)],
            UserId::new(),
            None,
        )
        .unwrap();
        assert!(!paid_only.is_free());

        let mixed = Event::new(
            EventId::new(),
            "Meetup",
            "monthly",
            "community",
            Utc::now(),
            venue(),
            vec![tier("Free Entry", 0), tier("Supporter", 500)],
            UserId::new(),
            None,
        )
        .unwrap();
        assert!(mixed.is_free());
    }

    #[test]
    fn tier_lookup_is_by_exact_name() {
        let event = Event::new(
            EventId::new(),
            "Meetup",
            "monthly",
            "community",
            Utc::now(),
            venue(),
            vec![tier("Free Entry", 0)],
            UserId::new(),
            None,
        )
        .unwrap();

        assert!(event.tier("Free Entry").is_some());
        assert!(event.tier("free entry").is_none());
    }
}
