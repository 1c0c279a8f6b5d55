//! events.rs
//!
//! Публичная афиша событий и CRUD для организаторов и админов.
//!
//! - Список и карточка события доступны без авторизации (только публичные
//!   неархивные события; скрытые видят админы и организатор-владелец).
//! - Создание — админ или организатор; организатор всегда становится
//!   владельцем и не может переназначить его.
//! - Регистрация участника — services::registration.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::errors::AppError;
use crate::middleware::{AuthUser, MaybeAuthUser};
use crate::models::{Attendee, Event, Organizer, Ticket};
use crate::policy;
use crate::services::registration;
use crate::AppState;

// Публичная афиша отдаёт 12 событий на страницу
const PAGE_SIZE: u32 = 12;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route(
            "/events/{id}",
            get(get_event).put(update_event).delete(delete_event),
        )
        .route("/events/{id}/register", post(register_for_event))
}

/* ---------- helpers ---------- */

fn page_offset(page: u32, page_size: u32) -> i64 {
    ((page.max(1) - 1) * page_size) as i64
}

// Профиль организатора запрашивающего, если роль — организатор
async fn requester_organizer_id(
    state: &AppState,
    user: &AuthUser,
) -> Result<Option<i64>, AppError> {
    if !policy::is_organizer(user.role) {
        return Ok(None);
    }
    Ok(Organizer::find_by_user(user.id, &state.db).await?.map(|o| o.id))
}

// Скрытое событие видят только админ и организатор-владелец
fn can_view_hidden(user: Option<&AuthUser>, requester_org: Option<i64>, event: &Event) -> bool {
    match user {
        Some(user) if policy::is_admin(user.role) => true,
        Some(_) => match (requester_org, event.organizer_id) {
            (Some(mine), Some(owner)) => mine == owner,
            _ => false,
        },
        None => false,
    }
}

/* ---------- PUBLIC LISTING ---------- */

// GET /api/events?page=N
#[derive(Debug, Deserialize)]
struct EventsQuery {
    pub page: Option<u32>,
}

async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EventsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = params.page.unwrap_or(1).max(1);

    let total = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM events WHERE is_public = TRUE AND archived = FALSE"
    )
    .fetch_one(&state.db.pool)
    .await?;

    let events: Vec<Event> = sqlx::query_as(
        "SELECT * FROM events
         WHERE is_public = TRUE AND archived = FALSE
         ORDER BY from_date DESC
         LIMIT $1 OFFSET $2"
    )
    .bind(PAGE_SIZE as i64)
    .bind(page_offset(page, PAGE_SIZE))
    .fetch_all(&state.db.pool)
    .await?;

    Ok(Json(json!({
        "success": true,
        "events": events,
        "page": page,
        "page_size": PAGE_SIZE,
        "total": total,
    })))
}

// GET /api/events/{id}
async fn get_event(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(user): MaybeAuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let event = Event::find_by_id(id, &state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found.".to_string()))?;

    if !event.is_public || event.archived {
        let requester_org = match &user {
            Some(u) => requester_organizer_id(&state, u).await?,
            None => None,
        };
        // Не раскрываем существование скрытого события посторонним
        if !can_view_hidden(user.as_ref(), requester_org, &event) {
            return Err(AppError::NotFound("Event not found.".to_string()));
        }
    }

    let tickets: Vec<Ticket> = sqlx::query_as(
        "SELECT * FROM tickets WHERE event_id = $1 ORDER BY id"
    )
    .bind(event.id)
    .fetch_all(&state.db.pool)
    .await?;

    let booked = Attendee::count_for_event(event.id, &state.db).await?;
    let spots_left = event.spots_left(booked);

    Ok(Json(json!({
        "success": true,
        "event": event,
        "tickets": tickets,
        "attendees_count": booked,
        "spots_left": spots_left,
    })))
}

/* ---------- EVENT CRUD ---------- */

#[derive(Debug, Deserialize, Validate)]
struct EventPayload {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub organizer_id: Option<i64>,
    pub venue_id: Option<i64>,
    #[validate(length(max = 500))]
    pub thumbnail: Option<String>,
    pub from_date: NaiveDateTime,
    pub to_date: NaiveDateTime,
    #[validate(range(min = 0))]
    pub max_attendees: Option<i32>,
    #[serde(default = "default_is_public")]
    pub is_public: bool,
    #[serde(default)]
    pub archived: bool,
}

fn default_is_public() -> bool {
    true
}

async fn check_venue_exists(state: &AppState, venue_id: i64) -> Result<(), AppError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM venues WHERE id = $1)"
    )
    .bind(venue_id)
    .fetch_one(&state.db.pool)
    .await?;
    if exists {
        Ok(())
    } else {
        Err(AppError::Validation("Unknown venue.".to_string()))
    }
}

async fn check_organizer_exists(state: &AppState, organizer_id: i64) -> Result<(), AppError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM organizers WHERE id = $1)"
    )
    .bind(organizer_id)
    .fetch_one(&state.db.pool)
    .await?;
    if exists {
        Ok(())
    } else {
        Err(AppError::Validation("Unknown organizer.".to_string()))
    }
}

// POST /api/events
async fn create_event(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<EventPayload>,
) -> Result<impl IntoResponse, AppError> {
    policy::require_event_create(user.role)?;
    req.validate()?;

    // Организатор всегда публикует от своего профиля
    let organizer_id = if policy::is_organizer(user.role) {
        let own = requester_organizer_id(&state, &user).await?;
        Some(own.ok_or_else(|| {
            AppError::Validation("You do not have an organizer profile.".to_string())
        })?)
    } else {
        if let Some(organizer_id) = req.organizer_id {
            check_organizer_exists(&state, organizer_id).await?;
        }
        req.organizer_id
    };

    if let Some(venue_id) = req.venue_id {
        check_venue_exists(&state, venue_id).await?;
    }

    let event: Event = sqlx::query_as(
        "INSERT INTO events (organizer_id, venue_id, title, description, thumbnail,
                             from_date, to_date, archived, max_attendees, is_public)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
         RETURNING *"
    )
    .bind(organizer_id)
    .bind(req.venue_id)
    .bind(&req.title)
    .bind(&req.description)
    .bind(&req.thumbnail)
    .bind(req.from_date)
    .bind(req.to_date)
    .bind(req.archived)
    .bind(req.max_attendees)
    .bind(req.is_public)
    .fetch_one(&state.db.pool)
    .await?;

    tracing::info!("event {} created by user {}", event.id, user.id);

    Ok((StatusCode::CREATED, Json(json!({ "success": true, "event": event }))))
}

// PUT /api/events/{id}
async fn update_event(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<EventPayload>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let event = Event::find_by_id(id, &state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found.".to_string()))?;

    let requester_org = requester_organizer_id(&state, &user).await?;
    policy::require_event_modify(user.role, requester_org, event.organizer_id)?;

    // Переназначить владельца может только админ
    let organizer_id = if policy::is_admin(user.role) {
        if let Some(organizer_id) = req.organizer_id {
            check_organizer_exists(&state, organizer_id).await?;
        }
        req.organizer_id
    } else {
        event.organizer_id
    };

    if let Some(venue_id) = req.venue_id {
        check_venue_exists(&state, venue_id).await?;
    }

    let event: Event = sqlx::query_as(
        "UPDATE events
         SET organizer_id = $1, venue_id = $2, title = $3, description = $4,
             thumbnail = $5, from_date = $6, to_date = $7, archived = $8,
             max_attendees = $9, is_public = $10, updated_at = NOW()
         WHERE id = $11
         RETURNING *"
    )
    .bind(organizer_id)
    .bind(req.venue_id)
    .bind(&req.title)
    .bind(&req.description)
    .bind(&req.thumbnail)
    .bind(req.from_date)
    .bind(req.to_date)
    .bind(req.archived)
    .bind(req.max_attendees)
    .bind(req.is_public)
    .bind(event.id)
    .fetch_one(&state.db.pool)
    .await?;

    Ok(Json(json!({ "success": true, "event": event })))
}

// DELETE /api/events/{id} — билеты и участники каскадом удаляет БД
async fn delete_event(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let event = Event::find_by_id(id, &state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found.".to_string()))?;

    let requester_org = requester_organizer_id(&state, &user).await?;
    policy::require_event_delete(user.role, requester_org, event.organizer_id)?;

    sqlx::query("DELETE FROM events WHERE id = $1")
        .bind(event.id)
        .execute(&state.db.pool)
        .await?;

    tracing::info!("event {} deleted by user {}", event.id, user.id);

    Ok(Json(json!({ "success": true, "message": "Event deleted." })))
}

/* ---------- ATTENDEE REGISTRATION ---------- */

// POST /api/events/{id}/register
#[derive(Debug, Deserialize, Validate)]
struct RegisterAttendeeRequest {
    #[validate(length(min = 1, max = 200))]
    pub full_name: String,
    #[validate(email)]
    pub email: String,
    pub ticket_id: Option<i64>,
}

async fn register_for_event(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(user): MaybeAuthUser,
    Path(id): Path<i64>,
    Json(req): Json<RegisterAttendeeRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let attendee = registration::register_attendee(
        &state.db,
        id,
        &req.full_name,
        &req.email,
        req.ticket_id,
        user.map(|u| u.id),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "You have successfully registered for the event!",
            "attendee": attendee,
        })),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_page_starts_at_zero() {
        assert_eq!(page_offset(1, PAGE_SIZE), 0);
        // страница 0 читается как первая
        assert_eq!(page_offset(0, PAGE_SIZE), 0);
    }

    #[test]
    fn pages_step_by_page_size() {
        assert_eq!(page_offset(2, PAGE_SIZE), 12);
        assert_eq!(page_offset(5, PAGE_SIZE), 48);
    }
}
