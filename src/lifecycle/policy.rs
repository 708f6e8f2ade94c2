//! Status state machine for absence requests and who may drive it.
//!
//! `pending` is the only initial state. `rejected` and `cancelled` are
//! terminal, `approved` can only move on to `cancelled`, and nothing ever
//! returns to `pending`. The upstream enforces the same rules; this copy
//! exists so illegal moves are refused before any local state changes.

use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::auth::Session;
use crate::model::absence::{AbsenceRequest, AbsenceStatus};
use crate::model::role::Role;

pub fn authorize(session: &Session, request: &AbsenceRequest, target: AbsenceStatus) -> bool {
    use AbsenceStatus::*;

    match (request.status, target) {
        (Pending, Approved) | (Pending, Rejected) => session.role.is_privileged(),
        (Pending, Cancelled) | (Approved, Cancelled) => may_cancel(session, request),
        _ => false,
    }
}

fn may_cancel(session: &Session, request: &AbsenceRequest) -> bool {
    session.role == Role::Admin
        || request.employee_account_id == session.user_id
        || request.manager_id.as_ref() == Some(&session.user_id)
}

/// Buttons the details view may offer for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct AllowedActions {
    pub can_approve: bool,
    pub can_reject: bool,
    pub can_cancel: bool,
}

pub fn allowed_actions(session: &Session, request: &AbsenceRequest) -> AllowedActions {
    AllowedActions {
        can_approve: authorize(session, request, AbsenceStatus::Approved),
        can_reject: authorize(session, request, AbsenceStatus::Rejected),
        can_cancel: authorize(session, request, AbsenceStatus::Cancelled),
    }
}
