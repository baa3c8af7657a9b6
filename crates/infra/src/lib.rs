//! Infrastructure layer: in-memory adapters for the domain ports and
//! housekeeping jobs.
//!
//! Production deployments swap these for CMS/database-backed adapters; the
//! ports they implement live in the domain crates.

pub mod catalog;
pub mod directory;
pub mod jobs;

pub use catalog::InMemoryEventCatalog;
pub use directory::InMemoryIdentityDirectory;
pub use jobs::{DEFAULT_PENDING_TTL_MINUTES, PendingExpiry};
