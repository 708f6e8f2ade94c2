use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;

use super::store::{AbsenceStore, LeaveBalanceStore, StoreError};
use crate::auth::auth::Session;
use crate::model::absence::{
    AbsenceDraft, AbsenceFilters, AbsencePage, AbsenceRequest, AbsenceStatus, AbsenceType,
    ProcessAction,
};
use crate::model::id::Id;
use crate::model::leave_balance::{BalanceUpdate, DayCounts, LeaveBalance};
use crate::model::role::Role;

pub(crate) fn session(user_id: &str, role: Role) -> Session {
    Session::new(Id::new(user_id), role, format!("token-{user_id}"))
}

pub(crate) fn request(id: &str, status: AbsenceStatus) -> AbsenceRequest {
    AbsenceRequest {
        id: Id::new(id),
        employee_account_id: Id::new("emp-1"),
        manager_id: Some(Id::new("mgr-1")),
        department_id: Some(Id::new("dep-1")),
        absence_type: AbsenceType::Vacation,
        start_date: NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date"),
        end_date: NaiveDate::from_ymd_opt(2024, 3, 3).expect("valid date"),
        status,
        has_documentation: false,
        comments: None,
        submission_time: None,
        employee_name: Some("Jane Doe".to_string()),
        employee_email: None,
        department_name: Some("Engineering".to_string()),
    }
}

pub(crate) fn vacation_balance(remaining: f64) -> LeaveBalance {
    LeaveBalance {
        employee_id: Some(Id::new("emp-1")),
        year: Some(2024),
        balance: DayCounts {
            vacation: 20.0,
            sick: 10.0,
            personal: 3.0,
        },
        used: DayCounts {
            vacation: 20.0 - remaining,
            ..Default::default()
        },
        remaining: None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    List(AbsenceFilters),
    Get(Id),
    Create(AbsenceDraft),
    Update(Id, AbsenceDraft),
    Process(Id, ProcessAction, String),
    Cancel(Id),
    CurrentBalance(i32),
    EmployeeBalance(Id, i32),
    TeamBalances(Option<String>, i32),
    UpdateBalance(Id, BalanceUpdate),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Failure {
    Unauthorized,
    NotFound,
    Rejected,
    Transport,
}

impl Failure {
    fn error(self) -> StoreError {
        match self {
            Failure::Unauthorized => StoreError::Unauthorized,
            Failure::NotFound => StoreError::NotFound,
            Failure::Rejected => StoreError::Rejected {
                status: 400,
                message: "Request already processed".to_string(),
            },
            Failure::Transport => StoreError::Transport("connection refused".to_string()),
        }
    }
}

#[derive(Default)]
struct Inner {
    records: Vec<AbsenceRequest>,
    balance: Option<LeaveBalance>,
    calls: Vec<Call>,
    fail_list: Option<Failure>,
    fail_mutations: Option<Failure>,
}

/// In-memory upstream double that records every call.
///
/// Successful process/cancel calls update the stored record the way the
/// upstream would, so a later `list` reflects them.
#[derive(Default, Clone)]
pub(crate) struct RecordingStore {
    inner: Arc<Mutex<Inner>>,
}

impl RecordingStore {
    pub(crate) fn with_records(records: Vec<AbsenceRequest>) -> Self {
        let store = Self::default();
        store.inner.lock().unwrap().records = records;
        store
    }

    pub(crate) fn set_balance(&self, balance: Option<LeaveBalance>) {
        self.inner.lock().unwrap().balance = balance;
    }

    pub(crate) fn fail_list(&self, failure: Option<Failure>) {
        self.inner.lock().unwrap().fail_list = failure;
    }

    pub(crate) fn fail_mutations(&self, failure: Option<Failure>) {
        self.inner.lock().unwrap().fail_mutations = failure;
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::List(_)))
            .count()
    }

    pub(crate) fn mutation_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| {
                matches!(
                    call,
                    Call::Create(_) | Call::Update(..) | Call::Process(..) | Call::Cancel(_)
                )
            })
            .collect()
    }

    pub(crate) fn records(&self) -> Vec<AbsenceRequest> {
        self.inner.lock().unwrap().records.clone()
    }

    fn record(&self, call: Call) {
        self.inner.lock().unwrap().calls.push(call);
    }

    fn mutation_failure(&self) -> Option<StoreError> {
        self.inner.lock().unwrap().fail_mutations.map(Failure::error)
    }

    fn set_status(&self, id: &Id, status: AbsenceStatus) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let record = inner
            .records
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or(StoreError::NotFound)?;
        record.status = status;
        Ok(())
    }
}

#[async_trait]
impl AbsenceStore for RecordingStore {
    async fn list(&self, filters: &AbsenceFilters) -> Result<AbsencePage, StoreError> {
        self.record(Call::List(filters.clone()));
        let inner = self.inner.lock().unwrap();
        if let Some(failure) = inner.fail_list {
            return Err(failure.error());
        }
        Ok(AbsencePage {
            requests: inner.records.clone(),
            count: Some(inner.records.len() as u64),
        })
    }

    async fn get(&self, id: &Id) -> Result<AbsenceRequest, StoreError> {
        self.record(Call::Get(id.clone()));
        self.inner
            .lock()
            .unwrap()
            .records
            .iter()
            .find(|r| &r.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn create(&self, draft: &AbsenceDraft) -> Result<AbsenceRequest, StoreError> {
        self.record(Call::Create(draft.clone()));
        if let Some(err) = self.mutation_failure() {
            return Err(err);
        }
        let mut inner = self.inner.lock().unwrap();
        let mut created = request(
            &format!("new-{}", inner.records.len() + 1),
            AbsenceStatus::Pending,
        );
        created.absence_type = draft.absence_type;
        created.start_date = draft.start_date;
        created.end_date = draft.end_date;
        created.has_documentation = draft.has_documentation;
        inner.records.push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: &Id, draft: &AbsenceDraft) -> Result<AbsenceRequest, StoreError> {
        self.record(Call::Update(id.clone(), draft.clone()));
        if let Some(err) = self.mutation_failure() {
            return Err(err);
        }
        let mut inner = self.inner.lock().unwrap();
        let record = inner
            .records
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or(StoreError::NotFound)?;
        record.start_date = draft.start_date;
        record.end_date = draft.end_date;
        record.absence_type = draft.absence_type;
        Ok(record.clone())
    }

    async fn process(
        &self,
        id: &Id,
        action: ProcessAction,
        comments: &str,
    ) -> Result<(), StoreError> {
        self.record(Call::Process(id.clone(), action, comments.to_string()));
        if let Some(err) = self.mutation_failure() {
            return Err(err);
        }
        let status = match action {
            ProcessAction::Approve => AbsenceStatus::Approved,
            ProcessAction::Reject => AbsenceStatus::Rejected,
        };
        self.set_status(id, status)
    }

    async fn cancel(&self, id: &Id) -> Result<(), StoreError> {
        self.record(Call::Cancel(id.clone()));
        if let Some(err) = self.mutation_failure() {
            return Err(err);
        }
        self.set_status(id, AbsenceStatus::Cancelled)
    }
}

#[async_trait]
impl LeaveBalanceStore for RecordingStore {
    async fn current_balance(&self, year: i32) -> Result<LeaveBalance, StoreError> {
        self.record(Call::CurrentBalance(year));
        self.inner
            .lock()
            .unwrap()
            .balance
            .clone()
            .ok_or(StoreError::NotFound)
    }

    async fn employee_balance(
        &self,
        employee_id: &Id,
        year: i32,
    ) -> Result<LeaveBalance, StoreError> {
        self.record(Call::EmployeeBalance(employee_id.clone(), year));
        self.inner
            .lock()
            .unwrap()
            .balance
            .clone()
            .ok_or(StoreError::NotFound)
    }

    async fn team_balances(
        &self,
        department_id: Option<&str>,
        year: i32,
    ) -> Result<Vec<LeaveBalance>, StoreError> {
        self.record(Call::TeamBalances(department_id.map(str::to_string), year));
        Ok(self.inner.lock().unwrap().balance.clone().into_iter().collect())
    }

    async fn update_balance(
        &self,
        employee_id: &Id,
        update: &BalanceUpdate,
    ) -> Result<LeaveBalance, StoreError> {
        self.record(Call::UpdateBalance(employee_id.clone(), update.clone()));
        if let Some(err) = self.mutation_failure() {
            return Err(err);
        }
        let mut balance = vacation_balance(0.0);
        balance.employee_id = Some(employee_id.clone());
        balance.year = update.year;
        if let Some(days) = update.vacation_days {
            balance.balance.vacation = days;
        }
        Ok(balance)
    }
}
