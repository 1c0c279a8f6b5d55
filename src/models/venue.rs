use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Venue {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub capacity: Option<i32>,
    pub description: String,
}
