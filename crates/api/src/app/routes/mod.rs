use axum::Router;

pub mod admin;
pub mod events;
pub mod menu;
pub mod registration;
pub mod system;

pub fn router() -> Router {
    Router::new()
        .merge(system::router())
        .merge(menu::router())
        .merge(events::router())
        .merge(registration::router())
        .merge(admin::router())
}
