use axum::{
    extract::State,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use sqlx::FromRow;
use std::sync::Arc;

use crate::errors::AppError;
use crate::middleware::AuthUser;
use crate::models::{Event, Organizer};
use crate::policy;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/dashboard", get(dashboard))
}

// Регистрация текущего пользователя вместе с событием
#[derive(Debug, Serialize, FromRow)]
struct RegisteredEvent {
    pub attendee_id: i64,
    pub event_id: i64,
    pub title: String,
    pub from_date: chrono::NaiveDateTime,
    pub checked_in: bool,
}

// GET /api/dashboard — форма ответа зависит от роли
async fn dashboard(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    if policy::is_admin(user.role) {
        let total_events = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM events")
            .fetch_one(&state.db.pool)
            .await?;

        let ongoing_events = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM events
             WHERE from_date <= NOW() AND to_date >= NOW() AND archived = FALSE"
        )
        .fetch_one(&state.db.pool)
        .await?;

        let archived_events = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM events WHERE archived = TRUE"
        )
        .fetch_one(&state.db.pool)
        .await?;

        return Ok(Json(json!({
            "success": true,
            "role": "Admin",
            "total_events": total_events,
            "ongoing_events": ongoing_events,
            "archived_events": archived_events,
        })));
    }

    if policy::is_organizer(user.role) {
        // Организатор без профиля видит пустую сводку
        let organizer = Organizer::find_by_user(user.id, &state.db).await?;

        let (organizer_events, upcoming_events) = match organizer {
            Some(org) => {
                let all: Vec<Event> = sqlx::query_as(
                    "SELECT * FROM events WHERE organizer_id = $1 ORDER BY from_date DESC"
                )
                .bind(org.id)
                .fetch_all(&state.db.pool)
                .await?;

                let upcoming: Vec<Event> = sqlx::query_as(
                    "SELECT * FROM events
                     WHERE organizer_id = $1 AND from_date >= NOW()
                     ORDER BY from_date"
                )
                .bind(org.id)
                .fetch_all(&state.db.pool)
                .await?;

                (all, upcoming)
            }
            None => (vec![], vec![]),
        };

        return Ok(Json(json!({
            "success": true,
            "role": "Organizer",
            "organizer_events": organizer_events,
            "upcoming_events": upcoming_events,
        })));
    }

    // Участник: ближайшие события и собственные регистрации
    let upcoming_events: Vec<Event> = sqlx::query_as(
        "SELECT * FROM events
         WHERE from_date >= NOW() AND is_public = TRUE AND archived = FALSE
         ORDER BY from_date
         LIMIT 6"
    )
    .fetch_all(&state.db.pool)
    .await?;

    let registered_events: Vec<RegisteredEvent> = sqlx::query_as(
        "SELECT a.id AS attendee_id, e.id AS event_id, e.title, e.from_date, a.checked_in
         FROM attendees a
         JOIN events e ON e.id = a.event_id
         WHERE a.user_id = $1
         ORDER BY e.from_date"
    )
    .bind(user.id)
    .fetch_all(&state.db.pool)
    .await?;

    Ok(Json(json!({
        "success": true,
        "role": "Attendee",
        "upcoming_events": upcoming_events,
        "registered_events": registered_events,
    })))
}
