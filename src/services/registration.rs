//! registration.rs
//!
//! Рабочий процесс регистрации участника на событие.
//!
//! Порядок проверок: событие существует → событие открыто (публичное и не
//! в архиве) → нет повторной регистрации (email, событие) → лимит мест не
//! исчерпан. Всё выполняется в одной транзакции с блокировкой строки
//! события, чтобы подсчёт занятых мест и вставка были атомарны. Повторную
//! регистрацию при гонке двух запросов отсекает уникальный индекс в БД,
//! а не только предварительная проверка.

use sqlx::FromRow;
use thiserror::Error;
use tracing::info;

use crate::database::Database;
use crate::errors::{is_unique_violation, AppError};
use crate::models::Attendee;

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("Event not found.")]
    EventNotFound,

    #[error("Registration for this event is closed.")]
    EventNotOpen,

    #[error("The selected ticket does not belong to this event.")]
    InvalidTicket,

    #[error("This email is already registered for this event.")]
    Duplicate,

    #[error("This event has reached its maximum number of attendees.")]
    CapacityExceeded,

    #[error("database error")]
    Database(#[from] sqlx::Error),
}

impl From<RegistrationError> for AppError {
    fn from(err: RegistrationError) -> Self {
        match err {
            RegistrationError::EventNotFound => AppError::NotFound("Event not found.".to_string()),
            RegistrationError::EventNotOpen => {
                AppError::Validation("Registration for this event is closed.".to_string())
            }
            RegistrationError::InvalidTicket => {
                AppError::Validation("The selected ticket does not belong to this event.".to_string())
            }
            RegistrationError::Duplicate => AppError::DuplicateRegistration,
            RegistrationError::CapacityExceeded => AppError::CapacityExceeded,
            RegistrationError::Database(e) => AppError::Database(e),
        }
    }
}

#[derive(FromRow)]
struct EventRow {
    id: i64,
    is_public: bool,
    archived: bool,
    max_attendees: Option<i32>,
}

/// Регистрирует участника; либо создаёт строку Attendee, либо возвращает
/// ошибку, не меняя хранилище.
pub async fn register_attendee(
    db: &Database,
    event_id: i64,
    full_name: &str,
    email: &str,
    ticket_id: Option<i64>,
    user_id: Option<i64>,
) -> Result<Attendee, RegistrationError> {
    let mut tx = db.pool.begin().await?;

    // Блокируем строку события на время проверки вместимости и вставки
    let event: Option<EventRow> = sqlx::query_as(
        "SELECT id, is_public, archived, max_attendees FROM events WHERE id = $1 FOR UPDATE"
    )
    .bind(event_id)
    .fetch_optional(&mut *tx)
    .await?;

    let event = event.ok_or(RegistrationError::EventNotFound)?;
    check_open(event.is_public, event.archived)?;

    if let Some(ticket_id) = ticket_id {
        let ticket_ok = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM tickets WHERE id = $1 AND event_id = $2)"
        )
        .bind(ticket_id)
        .bind(event.id)
        .fetch_one(&mut *tx)
        .await?;

        if !ticket_ok {
            return Err(RegistrationError::InvalidTicket);
        }
    }

    // Предварительная проверка дубликата — ради понятного ответа;
    // решающее слово за уникальным индексом ниже
    let already_registered = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM attendees WHERE email = $1 AND event_id = $2)"
    )
    .bind(email)
    .bind(event.id)
    .fetch_one(&mut *tx)
    .await?;

    if already_registered {
        return Err(RegistrationError::Duplicate);
    }

    let current = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM attendees WHERE event_id = $1"
    )
    .bind(event.id)
    .fetch_one(&mut *tx)
    .await?;

    check_capacity(event.max_attendees, current)?;

    let attendee: Attendee = sqlx::query_as(
        "INSERT INTO attendees (user_id, event_id, ticket_id, full_name, email)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING *"
    )
    .bind(user_id)
    .bind(event.id)
    .bind(ticket_id)
    .bind(full_name)
    .bind(email)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            RegistrationError::Duplicate
        } else {
            RegistrationError::Database(e)
        }
    })?;

    tx.commit().await?;

    info!("registered attendee {} for event {}", attendee.id, event.id);
    Ok(attendee)
}

// Регистрация возможна только на публичное неархивное событие
fn check_open(is_public: bool, archived: bool) -> Result<(), RegistrationError> {
    if is_public && !archived {
        Ok(())
    } else {
        Err(RegistrationError::EventNotOpen)
    }
}

// Лимит не задан — мест всегда хватает
fn check_capacity(max_attendees: Option<i32>, current: i64) -> Result<(), RegistrationError> {
    match max_attendees {
        Some(max) if current >= max as i64 => Err(RegistrationError::CapacityExceeded),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn open_public_event_accepts_registration() {
        assert!(check_open(true, false).is_ok());
    }

    #[test]
    fn archived_or_private_event_is_closed() {
        assert!(matches!(check_open(true, true), Err(RegistrationError::EventNotOpen)));
        assert!(matches!(check_open(false, false), Err(RegistrationError::EventNotOpen)));
        assert!(matches!(check_open(false, true), Err(RegistrationError::EventNotOpen)));
    }

    #[test]
    fn unlimited_event_never_fills_up() {
        assert!(check_capacity(None, 0).is_ok());
        assert!(check_capacity(None, 1_000_000).is_ok());
    }

    #[test]
    fn last_spot_is_granted_then_denied() {
        // max_attendees = 1: первый проходит, второй получает отказ
        assert!(check_capacity(Some(1), 0).is_ok());
        assert!(matches!(check_capacity(Some(1), 1), Err(RegistrationError::CapacityExceeded)));
    }

    #[test]
    fn zero_capacity_event_admits_nobody() {
        assert!(matches!(check_capacity(Some(0), 0), Err(RegistrationError::CapacityExceeded)));
    }

    proptest! {
        // count(attendees) ≤ max_attendees: пропускаем ровно пока current < max
        #[test]
        fn capacity_is_a_hard_bound(max in 0i32..10_000, current in 0i64..20_000) {
            let allowed = check_capacity(Some(max), current).is_ok();
            prop_assert_eq!(allowed, current < max as i64);
        }
    }

    #[test]
    fn registration_errors_map_to_taxonomy() {
        assert!(matches!(
            AppError::from(RegistrationError::Duplicate),
            AppError::DuplicateRegistration
        ));
        assert!(matches!(
            AppError::from(RegistrationError::CapacityExceeded),
            AppError::CapacityExceeded
        ));
        assert!(matches!(
            AppError::from(RegistrationError::EventNotFound),
            AppError::NotFound(_)
        ));
    }
}
