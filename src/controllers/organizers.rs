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

use crate::errors::{is_unique_violation, AppError};
use crate::middleware::AuthUser;
use crate::models::Organizer;
use crate::policy;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/management/organizers", get(list_organizers).post(create_organizer))
        .route(
            "/management/organizers/{id}",
            get(get_organizer).put(update_organizer).delete(delete_organizer),
        )
}

#[derive(Debug, Deserialize, Validate)]
struct OrganizerPayload {
    pub user_id: i64,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(email)]
    pub contact_email: String,
    #[validate(length(max = 30))]
    #[serde(default)]
    pub phone: String,
}

// GET /api/management/organizers
async fn list_organizers(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    policy::require_admin(user.role)?;

    let organizers: Vec<Organizer> = sqlx::query_as("SELECT * FROM organizers ORDER BY id")
        .fetch_all(&state.db.pool)
        .await?;

    Ok(Json(json!({ "success": true, "organizers": organizers })))
}

// GET /api/management/organizers/{id}
async fn get_organizer(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    policy::require_admin(user.role)?;

    let organizer: Option<Organizer> = sqlx::query_as("SELECT * FROM organizers WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db.pool)
        .await?;

    let organizer =
        organizer.ok_or_else(|| AppError::NotFound("Organizer not found.".to_string()))?;

    Ok(Json(json!({ "success": true, "organizer": organizer })))
}

// POST /api/management/organizers
async fn create_organizer(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<OrganizerPayload>,
) -> Result<impl IntoResponse, AppError> {
    policy::require_admin(user.role)?;
    req.validate()?;

    // Профиль привязывается к существующему пользователю
    let user_exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)"
    )
    .bind(req.user_id)
    .fetch_one(&state.db.pool)
    .await?;

    if !user_exists {
        return Err(AppError::Validation("Unknown user for organizer profile.".to_string()));
    }

    let organizer: Organizer = sqlx::query_as(
        "INSERT INTO organizers (user_id, name, contact_email, phone)
         VALUES ($1, $2, $3, $4)
         RETURNING *"
    )
    .bind(req.user_id)
    .bind(&req.name)
    .bind(&req.contact_email)
    .bind(&req.phone)
    .fetch_one(&state.db.pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Validation("This user already has an organizer profile.".to_string())
        } else {
            AppError::Database(e)
        }
    })?;

    Ok((StatusCode::CREATED, Json(json!({ "success": true, "organizer": organizer }))))
}

// PUT /api/management/organizers/{id}
async fn update_organizer(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<OrganizerPayload>,
) -> Result<impl IntoResponse, AppError> {
    policy::require_admin(user.role)?;
    req.validate()?;

    let organizer: Option<Organizer> = sqlx::query_as(
        "UPDATE organizers
         SET user_id = $1, name = $2, contact_email = $3, phone = $4
         WHERE id = $5
         RETURNING *"
    )
    .bind(req.user_id)
    .bind(&req.name)
    .bind(&req.contact_email)
    .bind(&req.phone)
    .bind(id)
    .fetch_optional(&state.db.pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Validation("This user already has an organizer profile.".to_string())
        } else {
            AppError::Database(e)
        }
    })?;

    let organizer =
        organizer.ok_or_else(|| AppError::NotFound("Organizer not found.".to_string()))?;

    Ok(Json(json!({ "success": true, "organizer": organizer })))
}

// DELETE /api/management/organizers/{id} — у событий организатор обнуляется
async fn delete_organizer(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    policy::require_admin(user.role)?;

    let deleted = sqlx::query("DELETE FROM organizers WHERE id = $1")
        .bind(id)
        .execute(&state.db.pool)
        .await?
        .rows_affected();

    if deleted == 0 {
        return Err(AppError::NotFound("Organizer not found.".to_string()));
    }

    Ok(Json(json!({ "success": true, "message": "Organizer deleted." })))
}
