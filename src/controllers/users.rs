//! users.rs
//!
//! Управление пользователями (бэк-офис). Созданный админом пользователь
//! получает одноразовый случайный пароль: он возвращается один раз в ответе
//! на создание, а password_change_required заставляет сменить его при
//! первом входе.

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
use uuid::Uuid;
use validator::Validate;

use crate::errors::{is_unique_violation, AppError};
use crate::middleware::AuthUser;
use crate::models::User;
use crate::policy;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/management/users", get(list_users).post(create_user))
        .route(
            "/management/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
}

/* ---------- helpers ---------- */

// Роль из формы принимаем только из известного набора
fn parse_role_strict(raw: &str) -> Result<policy::Role, AppError> {
    match raw {
        "superadmin" | "admin" | "organizer" | "attendee" => Ok(policy::Role::parse(raw)),
        _ => Err(AppError::Validation("Invalid role.".to_string())),
    }
}

// Легаси-флаги держим согласованными с ролью; политика их не читает
fn legacy_flags(role: policy::Role) -> (bool, bool) {
    let admin = policy::is_admin(role);
    (admin, admin)
}

/* ---------- USERS CRUD ---------- */

// GET /api/management/users
async fn list_users(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    policy::require_admin(user.role)?;

    let users: Vec<User> = sqlx::query_as("SELECT * FROM users ORDER BY id")
        .fetch_all(&state.db.pool)
        .await?;

    Ok(Json(json!({ "success": true, "users": users })))
}

// GET /api/management/users/{id}
async fn get_user(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    policy::require_admin(user.role)?;

    let row = User::find_by_id(id, &state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;

    Ok(Json(json!({ "success": true, "user": row })))
}

// POST /api/management/users
#[derive(Debug, Deserialize, Validate)]
struct CreateUserRequest {
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 150))]
    pub first_name: String,
    #[validate(length(max = 150))]
    #[serde(default)]
    pub last_name: String,
    pub role: String,
}

async fn create_user(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    policy::require_admin(user.role)?;
    req.validate()?;

    let role = parse_role_strict(&req.role)?;
    let (is_staff, is_superuser) = legacy_flags(role);

    // Одноразовый пароль вместо фиксированного дефолтного
    let temporary_password = Uuid::new_v4().simple().to_string();
    let password_hash = bcrypt::hash(&temporary_password, state.config.security.bcrypt_cost)
        .map_err(|e| {
            tracing::error!("bcrypt hash failed: {:?}", e);
            AppError::Validation("Unable to process the password.".to_string())
        })?;

    let created: User = sqlx::query_as(
        "INSERT INTO users (username, email, password_hash, first_name, last_name,
                            role, is_staff, is_superuser, password_change_required)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, TRUE)
         RETURNING *"
    )
    .bind(&req.username)
    .bind(&req.email)
    .bind(&password_hash)
    .bind(&req.first_name)
    .bind(&req.last_name)
    .bind(role.as_str())
    .bind(is_staff)
    .bind(is_superuser)
    .fetch_one(&state.db.pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Validation(
                "Unable to add new user. Please ensure you filled all the details correctly."
                    .to_string(),
            )
        } else {
            AppError::Database(e)
        }
    })?;

    tracing::info!("user {} created by admin {}", created.id, user.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "user": created,
            // показывается ровно один раз
            "temporary_password": temporary_password,
        })),
    ))
}

// PUT /api/management/users/{id}
#[derive(Debug, Deserialize, Validate)]
struct UpdateUserRequest {
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 150))]
    pub first_name: String,
    #[validate(length(max = 150))]
    #[serde(default)]
    pub last_name: String,
    pub role: String,
    #[serde(default = "default_is_active")]
    pub is_active: bool,
}

fn default_is_active() -> bool {
    true
}

async fn update_user(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    policy::require_admin(user.role)?;
    req.validate()?;

    let existing = User::find_by_id(id, &state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;

    let role = parse_role_strict(&req.role)?;
    let (is_staff, is_superuser) = legacy_flags(role);

    let updated: User = sqlx::query_as(
        "UPDATE users
         SET username = $1, email = $2, first_name = $3, last_name = $4,
             role = $5, is_staff = $6, is_superuser = $7, is_active = $8
         WHERE id = $9
         RETURNING *"
    )
    .bind(&req.username)
    .bind(&req.email)
    .bind(&req.first_name)
    .bind(&req.last_name)
    .bind(role.as_str())
    .bind(is_staff)
    .bind(is_superuser)
    .bind(req.is_active)
    .bind(existing.id)
    .fetch_one(&state.db.pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Validation(
                "Unable to update user. Username or email already in use.".to_string(),
            )
        } else {
            AppError::Database(e)
        }
    })?;

    Ok(Json(json!({ "success": true, "user": updated })))
}

// DELETE /api/management/users/{id}
async fn delete_user(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    policy::require_admin(user.role)?;

    let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(&state.db.pool)
        .await?
        .rows_affected();

    if deleted == 0 {
        return Err(AppError::NotFound("User not found.".to_string()));
    }

    tracing::info!("user {} deleted by admin {}", id, user.id);

    Ok(Json(json!({ "success": true, "message": "User deleted." })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Role;

    #[test]
    fn strict_role_rejects_unknown_values() {
        assert!(parse_role_strict("admin").is_ok());
        assert!(parse_role_strict("attendee").is_ok());
        assert!(parse_role_strict("staff").is_err());
        assert!(parse_role_strict("").is_err());
    }

    #[test]
    fn legacy_flags_follow_role() {
        assert_eq!(legacy_flags(Role::SuperAdmin), (true, true));
        assert_eq!(legacy_flags(Role::Admin), (true, true));
        assert_eq!(legacy_flags(Role::Organizer), (false, false));
        assert_eq!(legacy_flags(Role::Attendee), (false, false));
    }
}
