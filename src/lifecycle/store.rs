use async_trait::async_trait;
use derive_more::Display;

use crate::model::absence::{AbsenceDraft, AbsenceFilters, AbsencePage, AbsenceRequest, ProcessAction};
use crate::model::id::Id;
use crate::model::leave_balance::{BalanceUpdate, LeaveBalance};

/// Failures reported by the upstream absence API.
#[derive(Debug, Display)]
pub enum StoreError {
    #[display(fmt = "upstream rejected the session token")]
    Unauthorized,
    #[display(fmt = "record not found")]
    NotFound,
    #[display(fmt = "upstream rejected request ({}): {}", status, message)]
    Rejected { status: u16, message: String },
    #[display(fmt = "upstream unreachable: {}", _0)]
    Transport(String),
    #[display(fmt = "unexpected upstream payload: {}", _0)]
    Decode(String),
}

impl std::error::Error for StoreError {}

impl StoreError {
    /// Message the upstream chose to show users, if any.
    pub fn user_message(&self) -> Option<&str> {
        match self {
            StoreError::Rejected { message, .. } if !message.is_empty() => Some(message),
            _ => None,
        }
    }
}

/// The upstream owner of absence records.
#[async_trait]
pub trait AbsenceStore: Send + Sync {
    async fn list(&self, filters: &AbsenceFilters) -> Result<AbsencePage, StoreError>;
    async fn get(&self, id: &Id) -> Result<AbsenceRequest, StoreError>;
    async fn create(&self, draft: &AbsenceDraft) -> Result<AbsenceRequest, StoreError>;
    async fn update(&self, id: &Id, draft: &AbsenceDraft) -> Result<AbsenceRequest, StoreError>;
    async fn process(&self, id: &Id, action: ProcessAction, comments: &str)
    -> Result<(), StoreError>;
    async fn cancel(&self, id: &Id) -> Result<(), StoreError>;
}

/// The upstream owner of leave balances.
#[async_trait]
pub trait LeaveBalanceStore: Send + Sync {
    async fn current_balance(&self, year: i32) -> Result<LeaveBalance, StoreError>;
    async fn employee_balance(&self, employee_id: &Id, year: i32)
    -> Result<LeaveBalance, StoreError>;
    async fn team_balances(
        &self,
        department_id: Option<&str>,
        year: i32,
    ) -> Result<Vec<LeaveBalance>, StoreError>;
    async fn update_balance(
        &self,
        employee_id: &Id,
        update: &BalanceUpdate,
    ) -> Result<LeaveBalance, StoreError>;
}
