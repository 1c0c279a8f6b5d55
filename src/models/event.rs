use serde::Serialize;
use sqlx::FromRow;
use chrono::NaiveDateTime;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Event {
    pub id: i64,
    pub organizer_id: Option<i64>,
    pub venue_id: Option<i64>,
    pub title: String,
    pub description: String,
    pub thumbnail: Option<String>,
    pub from_date: NaiveDateTime,
    pub to_date: NaiveDateTime,
    pub archived: bool,
    pub max_attendees: Option<i32>,
    pub is_public: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Event {
    pub async fn find_by_id(id: i64, db: &crate::database::Database) -> Result<Option<Event>, sqlx::Error> {
        sqlx::query_as::<_, Event>(
            "SELECT * FROM events WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&db.pool)
        .await
    }

    // Сколько мест осталось; None — лимит не задан
    pub fn spots_left(&self, booked: i64) -> Option<i64> {
        self.max_attendees
            .map(|max| (max as i64 - booked).max(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn event(max_attendees: Option<i32>) -> Event {
        let d = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap().and_hms_opt(10, 0, 0).unwrap();
        Event {
            id: 1,
            organizer_id: None,
            venue_id: None,
            title: "Orientation Day".to_string(),
            description: String::new(),
            thumbnail: None,
            from_date: d,
            to_date: d,
            archived: false,
            max_attendees,
            is_public: true,
            created_at: d,
            updated_at: d,
        }
    }

    #[test]
    fn spots_left_unlimited_when_no_cap() {
        assert_eq!(event(None).spots_left(100), None);
    }

    #[test]
    fn spots_left_counts_down() {
        assert_eq!(event(Some(50)).spots_left(20), Some(30));
    }

    #[test]
    fn spots_left_never_negative() {
        assert_eq!(event(Some(10)).spots_left(15), Some(0));
    }
}
