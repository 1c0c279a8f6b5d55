use serde::Serialize;
use sqlx::FromRow;
use chrono::NaiveDateTime;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Attendee {
    pub id: i64,
    pub user_id: Option<i64>,
    pub event_id: i64,
    pub ticket_id: Option<i64>,
    pub full_name: String,
    pub email: String,
    pub checked_in: bool,
    pub created_at: NaiveDateTime,
}

impl Attendee {
    // Текущее число регистраций события
    pub async fn count_for_event(event_id: i64, db: &crate::database::Database) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM attendees WHERE event_id = $1"
        )
        .bind(event_id)
        .fetch_one(&db.pool)
        .await
    }
}
