use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::absence::AbsenceType;
use super::id::Id;

/// Days per absence type. Fractional days are allowed (half days).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct DayCounts {
    #[schema(example = 20.0)]
    pub vacation: f64,
    #[schema(example = 10.0)]
    pub sick: f64,
    #[schema(example = 3.0)]
    pub personal: f64,
}

impl DayCounts {
    pub fn get(&self, absence_type: AbsenceType) -> f64 {
        match absence_type {
            AbsenceType::Vacation => self.vacation,
            AbsenceType::Sick => self.sick,
            AbsenceType::Personal => self.personal,
        }
    }

    fn minus(&self, other: &DayCounts) -> DayCounts {
        DayCounts {
            vacation: self.vacation - other.vacation,
            sick: self.sick - other.sick,
            personal: self.personal - other.personal,
        }
    }
}

/// Allotment and consumption for one employee and year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LeaveBalance {
    #[serde(default, alias = "employeeId")]
    #[schema(value_type = Option<String>, example = "4")]
    pub employee_id: Option<Id>,
    #[serde(default)]
    #[schema(example = 2024)]
    pub year: Option<i32>,
    pub balance: DayCounts,
    #[serde(default)]
    pub used: DayCounts,
    /// Precomputed by the upstream when present, otherwise `balance - used`.
    #[serde(default)]
    pub remaining: Option<DayCounts>,
}

impl LeaveBalance {
    pub fn remaining(&self, absence_type: AbsenceType) -> f64 {
        self.remaining
            .unwrap_or_else(|| self.balance.minus(&self.used))
            .get(absence_type)
    }
}

/// Admin update of an employee's allotment. Omitted fields are left untouched upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BalanceUpdate {
    #[schema(example = 2024)]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = 20.0)]
    pub vacation_days: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sick_days: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personal_days: Option<f64>,
}
