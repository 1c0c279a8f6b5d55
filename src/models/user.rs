use serde::Serialize;
use sqlx::FromRow;
use chrono::NaiveDateTime;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_active: bool,
    pub password_change_required: bool,
    pub date_joined: NaiveDateTime,
    pub last_logged_in: Option<NaiveDateTime>,
}

impl User {
    // Найти пользователя по username
    pub async fn find_by_username(username: &str, db: &crate::database::Database) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE username = $1"
        )
        .bind(username)
        .fetch_optional(&db.pool)
        .await
    }

    pub async fn find_by_id(id: i64, db: &crate::database::Database) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&db.pool)
        .await
    }

    // Проверить пароль против bcrypt-хеша
    pub fn verify_password(&self, password: &str) -> bool {
        bcrypt::verify(password, &self.password_hash).unwrap_or(false)
    }
}
