use std::sync::Arc;

use chrono::{Duration, Utc};

use gatherly_api::app::{AppServices, build_app};
use gatherly_catalog::{Event, EventId, TicketTier, Venue, VenueKind};
use gatherly_core::UserId;
use gatherly_infra::{DEFAULT_PENDING_TTL_MINUTES, PendingExpiry};

const SWEEP_INTERVAL_SECS: u64 = 60;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    gatherly_observability::init();

    let secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
        tracing::warn!("JWT_SECRET not set; using an insecure development secret");
        "insecure-dev-secret".to_string()
    });
    let ttl_minutes = std::env::var("PENDING_TTL_MINUTES")
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(DEFAULT_PENDING_TTL_MINUTES);
    let addr = std::env::var("GATHERLY_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let services = AppServices::new(&secret);
    seed_demo_catalog(&services);
    spawn_pending_expiry(&services, ttl_minutes);

    let app = build_app(Arc::clone(&services));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "gatherly api listening");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Periodic reconciliation of abandoned paid reservations.
fn spawn_pending_expiry(services: &Arc<AppServices>, ttl_minutes: i64) {
    let sweep = PendingExpiry::new(ttl_minutes);
    let engine = Arc::clone(&services.engine);

    tokio::spawn(async move {
        let mut tick =
            tokio::time::interval(std::time::Duration::from_secs(SWEEP_INTERVAL_SECS));
        loop {
            tick.tick().await;
            sweep.run_once(engine.as_ref());
        }
    });
}

/// Development fixtures; a deployment would point the catalog at the CMS.
fn seed_demo_catalog(services: &AppServices) {
    let organizer = UserId::new();

    let meetup = Event::new(
        EventId::new(),
        "Rust Meetup",
        "Monthly community meetup with two talks and pizza.",
        "community",
        Utc::now() + Duration::days(14),
        Venue {
            kind: VenueKind::Physical,
            details: "Community Hall, 42 Main St".to_string(),
        },
        vec![TicketTier {
            name: "Free Entry".to_string(),
            price: 0,
            quantity: 80,
        }],
        organizer,
        None,
    );

    let conference = Event::new(
        EventId::new(),
        "DevDays Conference",
        "Two days of talks and workshops.",
        "conference",
        Utc::now() + Duration::days(60),
        Venue {
            kind: VenueKind::Online,
            details: "https://live.devdays.example".to_string(),
        },
        vec![
            TicketTier {
                name: "General".to_string(),
                price: 19900,
                quantity: 500,
            },
            TicketTier {
                name: "VIP Pass".to_string(),
                price: 59900,
                quantity: 50,
            },
        ],
        organizer,
        Some("https://cdn.devdays.example/cover.png".to_string()),
    );

    for event in [meetup, conference] {
        match event {
            Ok(event) => {
                tracing::info!(event_id = %event.id, title = %event.title, "seeded catalog event");
                services.catalog.upsert(event);
            }
            Err(err) => tracing::error!(error = %err, "invalid demo fixture"),
        }
    }
}
