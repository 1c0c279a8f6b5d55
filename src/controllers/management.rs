use axum::{
    extract::State,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

use crate::errors::AppError;
use crate::middleware::AuthUser;
use crate::models::{Event, Organizer, Ticket, User, Venue};
use crate::policy;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/management", get(management_index))
}

// GET /api/management — сводная страница бэк-офиса, только для админов
async fn management_index(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    policy::require_admin(user.role)?;

    let users: Vec<User> = sqlx::query_as("SELECT * FROM users ORDER BY id")
        .fetch_all(&state.db.pool)
        .await?;

    let events: Vec<Event> = sqlx::query_as("SELECT * FROM events ORDER BY from_date DESC")
        .fetch_all(&state.db.pool)
        .await?;

    let organizers: Vec<Organizer> = sqlx::query_as("SELECT * FROM organizers ORDER BY id")
        .fetch_all(&state.db.pool)
        .await?;

    let tickets: Vec<Ticket> = sqlx::query_as("SELECT * FROM tickets ORDER BY id")
        .fetch_all(&state.db.pool)
        .await?;

    let venues: Vec<Venue> = sqlx::query_as("SELECT * FROM venues ORDER BY id")
        .fetch_all(&state.db.pool)
        .await?;

    Ok(Json(json!({
        "success": true,
        "users": users,
        "events": events,
        "organizers": organizers,
        "tickets": tickets,
        "venues": venues,
    })))
}
