use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::{IntoParams, ToSchema};

use super::id::Id;

#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AbsenceStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl AbsenceStatus {
    /// Board column order.
    pub const ALL: [AbsenceStatus; 4] = [
        AbsenceStatus::Pending,
        AbsenceStatus::Approved,
        AbsenceStatus::Rejected,
        AbsenceStatus::Cancelled,
    ];

    pub fn title(self) -> &'static str {
        match self {
            AbsenceStatus::Pending => "Pending",
            AbsenceStatus::Approved => "Approved",
            AbsenceStatus::Rejected => "Rejected",
            AbsenceStatus::Cancelled => "Cancelled",
        }
    }
}

#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AbsenceType {
    Vacation,
    Sick,
    Personal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": "17",
    "employee_account_id": "4",
    "manager_id": "2",
    "department_id": "1",
    "type": "vacation",
    "start_date": "2024-03-01",
    "end_date": "2024-03-05",
    "status": "pending",
    "has_documentation": false,
    "comments": null,
    "submission_time": "2024-02-20T09:30:00Z",
    "employee_name": "Jane Doe",
    "employee_email": "jane.doe@example.com",
    "department_name": "Engineering"
}))]
pub struct AbsenceRequest {
    #[schema(value_type = String, example = "17")]
    pub id: Id,
    #[schema(value_type = String, example = "4")]
    pub employee_account_id: Id,
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "2")]
    pub manager_id: Option<Id>,
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "1")]
    pub department_id: Option<Id>,
    #[serde(rename = "type")]
    pub absence_type: AbsenceType,
    #[serde(deserialize_with = "deserialize_day")]
    #[schema(example = "2024-03-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[serde(deserialize_with = "deserialize_day")]
    #[schema(example = "2024-03-05", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    pub status: AbsenceStatus,
    #[serde(default)]
    pub has_documentation: bool,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    #[schema(format = "date-time", value_type = Option<String>)]
    pub submission_time: Option<DateTime<Utc>>,

    // Joined display fields shown on tickets and the details view.
    #[serde(default)]
    pub employee_name: Option<String>,
    #[serde(default)]
    pub employee_email: Option<String>,
    #[serde(default)]
    pub department_name: Option<String>,
}

/// Body sent to the upstream create/update endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbsenceDraft {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(rename = "type")]
    pub absence_type: AbsenceType,
    pub has_documentation: bool,
    pub comments: String,
}

/// Board and list filters. Empty values are never forwarded upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase", default)]
#[into_params(parameter_in = Query)]
pub struct AbsenceFilters {
    /// Restrict to one department (admins)
    pub department_id: Option<String>,
    /// Restrict to one employee
    pub employee_id: Option<String>,
    /// vacation, sick or personal
    #[serde(rename = "type")]
    pub absence_type: Option<String>,
    /// Lower bound (YYYY-MM-DD)
    pub start_date: Option<String>,
    /// Upper bound (YYYY-MM-DD)
    pub end_date: Option<String>,
    pub status: Option<String>,
}

impl AbsenceFilters {
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        [
            ("departmentId", &self.department_id),
            ("employeeId", &self.employee_id),
            ("type", &self.absence_type),
            ("startDate", &self.start_date),
            ("endDate", &self.end_date),
            ("status", &self.status),
        ]
        .into_iter()
        .filter_map(|(key, value)| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| (key, v.to_string()))
        })
        .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AbsencePage {
    pub requests: Vec<AbsenceRequest>,
    #[serde(default)]
    pub count: Option<u64>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProcessAction {
    Approve,
    Reject,
}

// The upstream sends plain dates for some records and full timestamps for others.
fn deserialize_day<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_day(&raw).map_err(serde::de::Error::custom)
}

pub fn parse_day(raw: &str) -> Result<NaiveDate, String> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|ts| ts.date_naive()))
        .map_err(|err| format!("failed to parse '{raw}' as a date ({err})"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_upstream_record_with_numeric_ids_and_timestamps() {
        let record: AbsenceRequest = serde_json::from_value(json!({
            "id": 17,
            "employee_account_id": 4,
            "manager_id": 2,
            "department_id": null,
            "type": "sick",
            "start_date": "2024-03-01T00:00:00.000Z",
            "end_date": "2024-03-02",
            "status": "approved",
            "has_documentation": true,
            "comments": "doctor's note attached",
            "submission_time": "2024-02-28T08:00:00Z"
        }))
        .expect("record decodes");

        assert_eq!(record.id, Id::new("17"));
        assert_eq!(record.manager_id, Some(Id::new("2")));
        assert_eq!(record.department_id, None);
        assert_eq!(record.absence_type, AbsenceType::Sick);
        assert_eq!(record.start_date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(record.status, AbsenceStatus::Approved);
    }

    #[test]
    fn display_fields_survive_a_round_trip() {
        let record: AbsenceRequest = serde_json::from_value(json!({
            "id": 9,
            "employee_account_id": 4,
            "type": "vacation",
            "start_date": "2024-03-01",
            "end_date": "2024-03-05",
            "status": "pending",
            "employee_name": "Jane Doe",
            "employee_email": "jane.doe@example.com",
            "department_name": "Engineering"
        }))
        .expect("record decodes");

        let out = serde_json::to_value(&record).unwrap();
        assert_eq!(out["employee_name"], "Jane Doe");
        assert_eq!(out["employee_email"], "jane.doe@example.com");
        assert_eq!(out["department_name"], "Engineering");
    }

    #[test]
    fn draft_serializes_with_camel_case_keys() {
        let draft = AbsenceDraft {
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            absence_type: AbsenceType::Vacation,
            has_documentation: false,
            comments: String::new(),
        };

        assert_eq!(
            serde_json::to_value(&draft).unwrap(),
            json!({
                "startDate": "2024-03-01",
                "endDate": "2024-03-05",
                "type": "vacation",
                "hasDocumentation": false,
                "comments": ""
            })
        );
    }

    #[test]
    fn filters_skip_blank_values() {
        let filters = AbsenceFilters {
            department_id: Some("3".to_string()),
            employee_id: Some("  ".to_string()),
            absence_type: Some("vacation".to_string()),
            ..Default::default()
        };

        assert_eq!(
            filters.to_query(),
            vec![
                ("departmentId", "3".to_string()),
                ("type", "vacation".to_string())
            ]
        );
    }
}
