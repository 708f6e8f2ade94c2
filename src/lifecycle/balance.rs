use chrono::NaiveDate;

use super::FieldErrors;
use crate::model::absence::AbsenceType;
use crate::model::leave_balance::{BalanceUpdate, LeaveBalance};

/// Outcome of checking a request against a leave balance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sufficiency {
    pub sufficient: bool,
    pub remaining: f64,
    /// False when no balance record was available. Callers must treat an
    /// unverified result as "cannot verify", never as a block.
    pub verified: bool,
}

/// Calendar days covered by a request, inclusive of both ends.
pub fn compute_duration(start: NaiveDate, end: NaiveDate) -> u32 {
    let span = (end - start).num_days().unsigned_abs();
    u32::try_from(span).unwrap_or(u32::MAX - 1) + 1
}

pub fn evaluate_sufficiency(
    balance: Option<&LeaveBalance>,
    absence_type: AbsenceType,
    requested_days: u32,
) -> Sufficiency {
    let remaining = balance.map_or(0.0, |b| b.remaining(absence_type));
    Sufficiency {
        sufficient: f64::from(requested_days) <= remaining,
        remaining,
        verified: balance.is_some(),
    }
}

/// Renders a day count without a trailing `.0` for whole days.
pub fn format_days(days: f64) -> String {
    if days.fract() == 0.0 {
        format!("{}", days as i64)
    } else {
        format!("{days}")
    }
}

/// Collects every problem with an admin balance update.
pub fn validate_balance_update(update: &BalanceUpdate) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if update.year.is_none() {
        errors.insert("year", "Year is required".to_string());
    }

    let fields = [
        ("vacationDays", update.vacation_days, "Vacation"),
        ("sickDays", update.sick_days, "Sick"),
        ("personalDays", update.personal_days, "Personal"),
    ];
    for (field, value, label) in fields {
        if value.is_some_and(|days| days < 0.0 || !days.is_finite()) {
            errors.insert(field, format!("{label} days cannot be negative"));
        }
    }

    if fields.iter().all(|(_, value, _)| value.is_none()) {
        errors.insert(
            "general",
            "At least one balance field must be updated".to_string(),
        );
    }

    errors
}
