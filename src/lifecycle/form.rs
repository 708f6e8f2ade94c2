//! New/edit absence request form: validation, live preview and submission.
//!
//! Balance checks run in two tiers. `preview` is advisory and only produces a
//! warning while the user is still typing. `validate` runs at submit time and
//! turns the same condition into a blocking general error. Neither tier ever
//! blocks when no balance record is known.

use std::sync::Arc;

use chrono::NaiveDate;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use super::FieldErrors;
use super::balance::{compute_duration, evaluate_sufficiency, format_days};
use super::store::{AbsenceStore, LeaveBalanceStore, StoreError};
use crate::model::absence::{AbsenceDraft, AbsenceRequest, AbsenceType, parse_day};
use crate::model::id::Id;
use crate::model::leave_balance::LeaveBalance;

pub const SUBMIT_FAILED: &str = "Failed to submit request. Please try again.";

/// Raw form input as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct AbsenceForm {
    #[schema(example = "2024-03-01")]
    pub start_date: String,
    #[schema(example = "2024-03-05")]
    pub end_date: String,
    #[serde(rename = "type")]
    #[schema(example = "vacation")]
    pub absence_type: String,
    pub has_documentation: bool,
    pub comments: String,
}

impl AbsenceForm {
    /// Prefills the form for editing an existing request.
    pub fn from_request(request: &AbsenceRequest) -> Self {
        Self {
            start_date: request.start_date.format("%Y-%m-%d").to_string(),
            end_date: request.end_date.format("%Y-%m-%d").to_string(),
            absence_type: request.absence_type.to_string(),
            has_documentation: request.has_documentation,
            comments: request.comments.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct FormValidation {
    #[schema(value_type = Object)]
    pub field_errors: FieldErrors,
    /// Blocking error that belongs to no single field.
    pub general: Option<String>,
    /// Advisory only.
    pub warning: Option<String>,
}

impl FormValidation {
    pub fn is_valid(&self) -> bool {
        self.field_errors.is_empty() && self.general.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct FormPreview {
    /// Set once both dates parse and form a valid range.
    pub requested_days: Option<u32>,
    pub warning: Option<String>,
}

struct Parsed {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    absence_type: Option<AbsenceType>,
    errors: FieldErrors,
}

impl Parsed {
    fn requested_days(&self) -> Option<u32> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if end >= start => Some(compute_duration(start, end)),
            _ => None,
        }
    }
}

fn parse(form: &AbsenceForm) -> Parsed {
    let mut errors = FieldErrors::new();

    let start = parse_date_field(&form.start_date, "startDate", "Start date", &mut errors);
    let end = parse_date_field(&form.end_date, "endDate", "End date", &mut errors);
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            errors.insert("endDate", "End date cannot be before start date".to_string());
        }
    }

    let raw_type = form.absence_type.trim();
    let absence_type = if raw_type.is_empty() {
        errors.insert("type", "Absence type is required".to_string());
        None
    } else {
        match raw_type.parse::<AbsenceType>() {
            Ok(absence_type) => Some(absence_type),
            Err(_) => {
                errors.insert(
                    "type",
                    "Absence type must be vacation, sick or personal".to_string(),
                );
                None
            }
        }
    };

    Parsed {
        start,
        end,
        absence_type,
        errors,
    }
}

fn parse_date_field(
    raw: &str,
    field: &'static str,
    label: &str,
    errors: &mut FieldErrors,
) -> Option<NaiveDate> {
    if raw.trim().is_empty() {
        errors.insert(field, format!("{label} is required"));
        return None;
    }
    match parse_day(raw) {
        Ok(day) => Some(day),
        Err(_) => {
            errors.insert(field, format!("{label} must be a valid date (YYYY-MM-DD)"));
            None
        }
    }
}

fn exceeds_balance(parsed: &Parsed, balance: Option<&LeaveBalance>) -> Option<(AbsenceType, f64)> {
    let balance = balance?;
    let absence_type = parsed.absence_type?;
    let days = parsed.requested_days()?;
    let check = evaluate_sufficiency(Some(balance), absence_type, days);
    (!check.sufficient).then_some((absence_type, check.remaining))
}

fn balance_warning(absence_type: AbsenceType, remaining: f64) -> String {
    format!(
        "Warning: This request exceeds your available {t} balance. Your current {t} balance: {n} days",
        t = absence_type,
        n = format_days(remaining)
    )
}

/// Live-typing tier. Never blocks.
pub fn preview(form: &AbsenceForm, balance: Option<&LeaveBalance>) -> FormPreview {
    let parsed = parse(form);
    FormPreview {
        requested_days: parsed.requested_days(),
        warning: exceeds_balance(&parsed, balance)
            .map(|(absence_type, remaining)| balance_warning(absence_type, remaining)),
    }
}

/// Submit-time tier. Every rule is evaluated so all problems are reported at once.
pub fn validate(form: &AbsenceForm, balance: Option<&LeaveBalance>) -> FormValidation {
    let parsed = parse(form);

    let (general, warning) = match exceeds_balance(&parsed, balance) {
        Some((absence_type, remaining)) => (
            Some(format!(
                "Insufficient {} leave balance. You have {} days remaining.",
                absence_type,
                format_days(remaining)
            )),
            Some(balance_warning(absence_type, remaining)),
        ),
        None => (None, None),
    };

    FormValidation {
        field_errors: parsed.errors,
        general,
        warning,
    }
}

#[derive(Debug, Display)]
pub enum SubmitError {
    #[display(fmt = "form has validation errors")]
    Invalid(FormValidation),
    #[display(fmt = "{}", general)]
    Remote { general: String, source: StoreError },
}

impl std::error::Error for SubmitError {}

pub struct AbsenceFormController {
    absences: Arc<dyn AbsenceStore>,
    balances: Arc<dyn LeaveBalanceStore>,
    balance: Option<LeaveBalance>,
}

impl AbsenceFormController {
    pub fn new(absences: Arc<dyn AbsenceStore>, balances: Arc<dyn LeaveBalanceStore>) -> Self {
        Self {
            absences,
            balances,
            balance: None,
        }
    }

    /// Fetches the signed-in employee's balance. A failure leaves the
    /// controller without a balance, which only disables the balance checks.
    pub async fn load_balance(&mut self, year: i32) -> Option<&LeaveBalance> {
        self.balance = match self.balances.current_balance(year).await {
            Ok(balance) => Some(balance),
            Err(e) => {
                warn!(year, error = %e, "Leave balance unavailable, skipping balance checks");
                None
            }
        };
        self.balance.as_ref()
    }

    pub fn preview(&self, form: &AbsenceForm) -> FormPreview {
        preview(form, self.balance.as_ref())
    }

    pub fn validate(&self, form: &AbsenceForm) -> FormValidation {
        validate(form, self.balance.as_ref())
    }

    #[instrument(name = "absence_submit", skip(self, form))]
    pub async fn submit(
        &self,
        form: &AbsenceForm,
        editing: Option<&Id>,
    ) -> Result<AbsenceRequest, SubmitError> {
        let validation = self.validate(form);
        if !validation.is_valid() {
            return Err(SubmitError::Invalid(validation));
        }

        let parsed = parse(form);
        let (Some(start_date), Some(end_date), Some(absence_type)) =
            (parsed.start, parsed.end, parsed.absence_type)
        else {
            return Err(SubmitError::Invalid(validation));
        };
        let draft = AbsenceDraft {
            start_date,
            end_date,
            absence_type,
            has_documentation: form.has_documentation,
            comments: form.comments.clone(),
        };

        let result = match editing {
            Some(id) => self.absences.update(id, &draft).await,
            None => self.absences.create(&draft).await,
        };

        match result {
            Ok(saved) => {
                info!(id = %saved.id, "Absence request saved");
                Ok(saved)
            }
            Err(source) => {
                warn!(error = %source, "Absence request submission failed");
                let general = source.user_message().unwrap_or(SUBMIT_FAILED).to_string();
                Err(SubmitError::Remote { general, source })
            }
        }
    }
}
