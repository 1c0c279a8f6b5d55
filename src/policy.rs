//! policy.rs
//!
//! Политика авторизации: чистые функции от роли запрашивающего к разрешению.
//!
//! Единственный источник истины — колонка `role` пользователя. Легаси-флаги
//! `is_staff`/`is_superuser` остаются в схеме, но в решениях не участвуют.
//! Решение принимается заново на каждый запрос, результаты не кешируются.

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    SuperAdmin,
    Admin,
    Organizer,
    Attendee,
}

impl Role {
    // Неизвестные значения читаем как attendee — минимум прав
    pub fn parse(raw: &str) -> Role {
        match raw {
            "superadmin" => Role::SuperAdmin,
            "admin" => Role::Admin,
            "organizer" => Role::Organizer,
            _ => Role::Attendee,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "superadmin",
            Role::Admin => "admin",
            Role::Organizer => "organizer",
            Role::Attendee => "attendee",
        }
    }
}

/// Админский доступ: полный CRUD по всем сущностям
pub fn is_admin(role: Role) -> bool {
    matches!(role, Role::SuperAdmin | Role::Admin)
}

pub fn is_organizer(role: Role) -> bool {
    role == Role::Organizer
}

/// Создавать события могут админы и организаторы
pub fn can_create_events(role: Role) -> bool {
    is_admin(role) || is_organizer(role)
}

/// Изменять/удалять событие может админ, а организатор — только своё.
/// Событие без организатора (organizer_id = NULL) доступно только админам.
pub fn can_modify_event(
    role: Role,
    requester_organizer_id: Option<i64>,
    event_organizer_id: Option<i64>,
) -> bool {
    if is_admin(role) {
        return true;
    }
    if is_organizer(role) {
        return match (requester_organizer_id, event_organizer_id) {
            (Some(mine), Some(owner)) => mine == owner,
            _ => false,
        };
    }
    false
}

pub fn require_admin(role: Role) -> Result<(), AppError> {
    if is_admin(role) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You are not authorized to access management.".to_string(),
        ))
    }
}

pub fn require_event_create(role: Role) -> Result<(), AppError> {
    if can_create_events(role) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You are not authorized to create events.".to_string(),
        ))
    }
}

pub fn require_event_modify(
    role: Role,
    requester_organizer_id: Option<i64>,
    event_organizer_id: Option<i64>,
) -> Result<(), AppError> {
    if can_modify_event(role, requester_organizer_id, event_organizer_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You are not authorized to edit events.".to_string(),
        ))
    }
}

pub fn require_event_delete(
    role: Role,
    requester_organizer_id: Option<i64>,
    event_organizer_id: Option<i64>,
) -> Result<(), AppError> {
    if can_modify_event(role, requester_organizer_id, event_organizer_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You are not authorized to delete events.".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_roles() {
        assert_eq!(Role::parse("superadmin"), Role::SuperAdmin);
        assert_eq!(Role::parse("admin"), Role::Admin);
        assert_eq!(Role::parse("organizer"), Role::Organizer);
        assert_eq!(Role::parse("attendee"), Role::Attendee);
    }

    #[test]
    fn parse_unknown_role_falls_back_to_attendee() {
        assert_eq!(Role::parse("staff"), Role::Attendee);
        assert_eq!(Role::parse(""), Role::Attendee);
    }

    #[test]
    fn admins_pass_management_gate() {
        assert!(require_admin(Role::Admin).is_ok());
        assert!(require_admin(Role::SuperAdmin).is_ok());
    }

    #[test]
    fn non_admins_are_denied_management() {
        assert!(require_admin(Role::Organizer).is_err());
        assert!(require_admin(Role::Attendee).is_err());
    }

    #[test]
    fn event_creation_matrix() {
        assert!(can_create_events(Role::SuperAdmin));
        assert!(can_create_events(Role::Admin));
        assert!(can_create_events(Role::Organizer));
        assert!(!can_create_events(Role::Attendee));
    }

    #[test]
    fn organizer_modifies_only_own_events() {
        // владелец
        assert!(can_modify_event(Role::Organizer, Some(7), Some(7)));
        // чужое событие
        assert!(!can_modify_event(Role::Organizer, Some(7), Some(8)));
        // событие без организатора
        assert!(!can_modify_event(Role::Organizer, Some(7), None));
        // организатор без профиля
        assert!(!can_modify_event(Role::Organizer, None, Some(7)));
    }

    #[test]
    fn admin_modifies_any_event() {
        assert!(can_modify_event(Role::Admin, None, Some(3)));
        assert!(can_modify_event(Role::SuperAdmin, None, None));
    }

    #[test]
    fn attendee_never_modifies_events() {
        assert!(!can_modify_event(Role::Attendee, Some(1), Some(1)));
    }

    #[test]
    fn denial_messages_are_user_visible() {
        let err = require_event_create(Role::Attendee).unwrap_err();
        assert_eq!(err.to_string(), "You are not authorized to create events.");
    }
}
