use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::errors::AppError;
use crate::middleware::AuthUser;
use crate::models::Ticket;
use crate::policy;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/management/tickets", get(list_tickets).post(create_ticket))
        .route(
            "/management/tickets/{id}",
            get(get_ticket).put(update_ticket).delete(delete_ticket),
        )
}

#[derive(Debug, Deserialize, Validate)]
struct TicketPayload {
    pub event_id: i64,
    #[validate(length(min = 1, max = 120))]
    #[serde(default = "default_ticket_name")]
    pub name: String,
    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub price: f64,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub quantity: i32,
}

fn default_ticket_name() -> String {
    "General Admission".to_string()
}

async fn check_event_exists(state: &AppState, event_id: i64) -> Result<(), AppError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM events WHERE id = $1)"
    )
    .bind(event_id)
    .fetch_one(&state.db.pool)
    .await?;

    if exists {
        Ok(())
    } else {
        Err(AppError::Validation(
            "Unable to add new ticket. Please ensure you filled all the details correctly."
                .to_string(),
        ))
    }
}

// GET /api/management/tickets
async fn list_tickets(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    policy::require_admin(user.role)?;

    let tickets: Vec<Ticket> = sqlx::query_as("SELECT * FROM tickets ORDER BY id")
        .fetch_all(&state.db.pool)
        .await?;

    Ok(Json(json!({ "success": true, "tickets": tickets })))
}

// GET /api/management/tickets/{id}
async fn get_ticket(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    policy::require_admin(user.role)?;

    let ticket: Option<Ticket> = sqlx::query_as("SELECT * FROM tickets WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db.pool)
        .await?;

    let ticket = ticket.ok_or_else(|| AppError::NotFound("Ticket not found.".to_string()))?;

    Ok(Json(json!({ "success": true, "ticket": ticket })))
}

// POST /api/management/tickets
async fn create_ticket(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<TicketPayload>,
) -> Result<impl IntoResponse, AppError> {
    policy::require_admin(user.role)?;
    req.validate()?;
    check_event_exists(&state, req.event_id).await?;

    let ticket: Ticket = sqlx::query_as(
        "INSERT INTO tickets (event_id, name, price, quantity)
         VALUES ($1, $2, $3, $4)
         RETURNING *"
    )
    .bind(req.event_id)
    .bind(&req.name)
    .bind(req.price)
    .bind(req.quantity)
    .fetch_one(&state.db.pool)
    .await?;

    Ok((StatusCode::CREATED, Json(json!({ "success": true, "ticket": ticket }))))
}

// PUT /api/management/tickets/{id}
async fn update_ticket(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<TicketPayload>,
) -> Result<impl IntoResponse, AppError> {
    policy::require_admin(user.role)?;
    req.validate()?;
    check_event_exists(&state, req.event_id).await?;

    let ticket: Option<Ticket> = sqlx::query_as(
        "UPDATE tickets
         SET event_id = $1, name = $2, price = $3, quantity = $4
         WHERE id = $5
         RETURNING *"
    )
    .bind(req.event_id)
    .bind(&req.name)
    .bind(req.price)
    .bind(req.quantity)
    .bind(id)
    .fetch_optional(&state.db.pool)
    .await?;

    let ticket = ticket.ok_or_else(|| AppError::NotFound("Ticket not found.".to_string()))?;

    Ok(Json(json!({ "success": true, "ticket": ticket })))
}

// DELETE /api/management/tickets/{id}
async fn delete_ticket(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    policy::require_admin(user.role)?;

    let deleted = sqlx::query("DELETE FROM tickets WHERE id = $1")
        .bind(id)
        .execute(&state.db.pool)
        .await?
        .rows_affected();

    if deleted == 0 {
        return Err(AppError::NotFound("Ticket not found.".to_string()));
    }

    Ok(Json(json!({ "success": true, "message": "Ticket deleted." })))
}
