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
use crate::models::Venue;
use crate::policy;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/management/venues", get(list_venues).post(create_venue))
        .route(
            "/management/venues/{id}",
            get(get_venue).put(update_venue).delete(delete_venue),
        )
}

#[derive(Debug, Deserialize, Validate)]
struct VenuePayload {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[validate(range(min = 0))]
    pub capacity: Option<i32>,
    #[serde(default)]
    pub description: String,
}

// GET /api/management/venues
async fn list_venues(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    policy::require_admin(user.role)?;

    let venues: Vec<Venue> = sqlx::query_as("SELECT * FROM venues ORDER BY id")
        .fetch_all(&state.db.pool)
        .await?;

    Ok(Json(json!({ "success": true, "venues": venues })))
}

// GET /api/management/venues/{id}
async fn get_venue(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    policy::require_admin(user.role)?;

    let venue: Option<Venue> = sqlx::query_as("SELECT * FROM venues WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db.pool)
        .await?;

    let venue = venue.ok_or_else(|| AppError::NotFound("Venue not found.".to_string()))?;

    Ok(Json(json!({ "success": true, "venue": venue })))
}

// POST /api/management/venues
async fn create_venue(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<VenuePayload>,
) -> Result<impl IntoResponse, AppError> {
    policy::require_admin(user.role)?;
    req.validate()?;

    let venue: Venue = sqlx::query_as(
        "INSERT INTO venues (name, address, capacity, description)
         VALUES ($1, $2, $3, $4)
         RETURNING *"
    )
    .bind(&req.name)
    .bind(&req.address)
    .bind(req.capacity)
    .bind(&req.description)
    .fetch_one(&state.db.pool)
    .await?;

    Ok((StatusCode::CREATED, Json(json!({ "success": true, "venue": venue }))))
}

// PUT /api/management/venues/{id}
async fn update_venue(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<VenuePayload>,
) -> Result<impl IntoResponse, AppError> {
    policy::require_admin(user.role)?;
    req.validate()?;

    let venue: Option<Venue> = sqlx::query_as(
        "UPDATE venues
         SET name = $1, address = $2, capacity = $3, description = $4
         WHERE id = $5
         RETURNING *"
    )
    .bind(&req.name)
    .bind(&req.address)
    .bind(req.capacity)
    .bind(&req.description)
    .bind(id)
    .fetch_optional(&state.db.pool)
    .await?;

    let venue = venue.ok_or_else(|| AppError::NotFound("Venue not found.".to_string()))?;

    Ok(Json(json!({ "success": true, "venue": venue })))
}

// DELETE /api/management/venues/{id} — события остаются, площадка обнуляется
async fn delete_venue(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    policy::require_admin(user.role)?;

    let deleted = sqlx::query("DELETE FROM venues WHERE id = $1")
        .bind(id)
        .execute(&state.db.pool)
        .await?
        .rows_affected();

    if deleted == 0 {
        return Err(AppError::NotFound("Venue not found.".to_string()));
    }

    Ok(Json(json!({ "success": true, "message": "Venue deleted." })))
}
