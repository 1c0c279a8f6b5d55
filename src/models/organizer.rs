use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Organizer {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub contact_email: String,
    pub phone: String,
}

impl Organizer {
    // Профиль организатора, принадлежащий пользователю (1:1)
    pub async fn find_by_user(user_id: i64, db: &crate::database::Database) -> Result<Option<Organizer>, sqlx::Error> {
        sqlx::query_as::<_, Organizer>(
            "SELECT * FROM organizers WHERE user_id = $1"
        )
        .bind(user_id)
        .fetch_optional(&db.pool)
        .await
    }
}
