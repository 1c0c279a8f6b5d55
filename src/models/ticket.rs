use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Ticket {
    pub id: i64,
    pub event_id: i64,
    pub name: String,
    pub price: f64,
    pub quantity: i32,
}
