pub mod auth;
pub mod dashboard;
pub mod events;
pub mod management;
pub mod organizers;
pub mod tickets;
pub mod users;
pub mod venues;

use axum::Router;
use std::sync::Arc;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(auth::routes())
        .merge(dashboard::routes())
        .merge(events::routes())
        .merge(management::routes())
        .merge(users::routes())
        .merge(organizers::routes())
        .merge(venues::routes())
        .merge(tickets::routes())
}
