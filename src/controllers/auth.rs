use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::errors::{is_unique_violation, AppError};
use crate::middleware::AuthUser;
use crate::models::User;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/profile", get(profile))
        .route("/profile/basic", patch(update_basic))
        .route("/profile/email", patch(update_email))
        .route("/profile/password", patch(update_password))
}

/* ---------- AUTHENTICATION ---------- */

// POST /api/auth/register
#[derive(Debug, Deserialize, Validate)]
struct RegisterRequest {
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(length(min = 1, max = 150))]
    pub first_name: String,
    #[validate(length(max = 150))]
    #[serde(default)]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    // Повторный email отклоняем с понятным сообщением до вставки
    let email_taken = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)"
    )
    .bind(&req.email)
    .fetch_one(&state.db.pool)
    .await?;

    if email_taken {
        return Err(AppError::Validation(
            "This email has already been registered.".to_string(),
        ));
    }

    let password_hash = bcrypt::hash(&req.password, state.config.security.bcrypt_cost)
        .map_err(|e| {
            tracing::error!("bcrypt hash failed: {:?}", e);
            AppError::Validation("Unable to process the password.".to_string())
        })?;

    // Самостоятельная регистрация всегда даёт роль attendee
    let user: User = sqlx::query_as(
        "INSERT INTO users (username, email, password_hash, first_name, last_name, role)
         VALUES ($1, $2, $3, $4, $5, 'attendee')
         RETURNING *"
    )
    .bind(&req.username)
    .bind(&req.email)
    .bind(&password_hash)
    .bind(&req.first_name)
    .bind(&req.last_name)
    .fetch_one(&state.db.pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Validation("Username already in use.".to_string())
        } else {
            AppError::Database(e)
        }
    })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Registration successful!",
            "user": user,
        })),
    ))
}

// POST /api/auth/login
#[derive(Debug, Deserialize)]
struct LoginRequest {
    pub username: String,
    pub password: String,
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = User::find_by_username(&req.username, &state.db).await?;

    // Один ответ и для неизвестного имени, и для неверного пароля
    let user = match user {
        Some(user) if user.is_active && user.verify_password(&req.password) => user,
        _ => {
            return Err(AppError::Unauthorized(
                "Invalid username or password.".to_string(),
            ))
        }
    };

    sqlx::query("UPDATE users SET last_logged_in = NOW() WHERE id = $1")
        .bind(user.id)
        .execute(&state.db.pool)
        .await
        .ok(); // Игнорируем ошибку обновления

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "user": user,
            "password_change_required": user.password_change_required,
        })),
    ))
}

// POST /api/auth/logout — авторизация запросная (Basic), серверной сессии нет
async fn logout() -> impl IntoResponse {
    Json(json!({
        "success": true,
        "message": "You have been logged out.",
    }))
}

/* ---------- PROFILE ---------- */

// GET /api/profile
async fn profile(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let row = User::find_by_id(user.id, &state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;

    Ok(Json(json!({ "success": true, "user": row })))
}

// PATCH /api/profile/basic
#[derive(Debug, Deserialize, Validate)]
struct BasicChangeRequest {
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(length(min = 1, max = 150))]
    pub first_name: String,
    #[validate(length(max = 150))]
    #[serde(default)]
    pub last_name: String,
}

async fn update_basic(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<BasicChangeRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    // Уникальность username без учёта самого пользователя
    let username_taken = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 AND id <> $2)"
    )
    .bind(&req.username)
    .bind(user.id)
    .fetch_one(&state.db.pool)
    .await?;

    if username_taken {
        return Err(AppError::Validation("Username already in use.".to_string()));
    }

    sqlx::query(
        "UPDATE users SET username = $1, first_name = $2, last_name = $3 WHERE id = $4"
    )
    .bind(&req.username)
    .bind(&req.first_name)
    .bind(&req.last_name)
    .bind(user.id)
    .execute(&state.db.pool)
    .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Profile updated successfully.",
    })))
}

// PATCH /api/profile/email
#[derive(Debug, Deserialize, Validate)]
struct EmailChangeRequest {
    #[validate(email)]
    pub old_email: String,
    #[validate(email)]
    pub new_email: String,
}

async fn update_email(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<EmailChangeRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    if req.old_email != user.email {
        return Err(AppError::Validation("Old email mismatch.".to_string()));
    }

    let email_taken = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND id <> $2)"
    )
    .bind(&req.new_email)
    .bind(user.id)
    .fetch_one(&state.db.pool)
    .await?;

    if email_taken {
        return Err(AppError::Validation("Email already in use.".to_string()));
    }

    sqlx::query("UPDATE users SET email = $1 WHERE id = $2")
        .bind(&req.new_email)
        .bind(user.id)
        .execute(&state.db.pool)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Email updated successfully.",
    })))
}

// PATCH /api/profile/password
#[derive(Debug, Deserialize, Validate)]
struct PasswordChangeRequest {
    pub old_password: String,
    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

async fn update_password(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<PasswordChangeRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let row = User::find_by_id(user.id, &state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;

    if !row.verify_password(&req.old_password) {
        return Err(AppError::Validation(
            "Password update failed. Check fields and try again.".to_string(),
        ));
    }

    let password_hash = bcrypt::hash(&req.new_password, state.config.security.bcrypt_cost)
        .map_err(|e| {
            tracing::error!("bcrypt hash failed: {:?}", e);
            AppError::Validation("Unable to process the password.".to_string())
        })?;

    // Смена пароля закрывает требование первого входа
    sqlx::query(
        "UPDATE users SET password_hash = $1, password_change_required = FALSE WHERE id = $2"
    )
    .bind(&password_hash)
    .bind(user.id)
    .execute(&state.db.pool)
    .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Password updated successfully. Please log in again.",
    })))
}
