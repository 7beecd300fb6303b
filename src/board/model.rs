#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::error::PmtuiError;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Calendar date of "now", local clock if the offset is determinable.
#[must_use]
pub fn today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

pub fn parse_date(value: &str) -> Result<Date, PmtuiError> {
    let fmt = format_description!("[year]-[month]-[day]");
    Date::parse(value.trim(), &fmt).map_err(|_| PmtuiError::InvalidDate {
        value: value.to_owned(),
    })
}

#[must_use]
pub fn format_date(date: Date) -> String {
    let fmt = format_description!("[year]-[month]-[day]");
    date.format(&fmt)
        .unwrap_or_else(|_| date.to_string())
}

#[must_use]
pub fn clamp_progress(value: i64) -> u8 {
    u8::try_from(value.clamp(0, 100)).unwrap_or(0)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub name: String,
    pub departments: Vec<String>,
    pub color: String,
    #[serde(with = "iso_date")]
    pub deadline: Date,
    #[serde(with = "iso_date")]
    pub created_at: Date,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub progress: u8,
}

impl Task {
    #[must_use]
    pub fn new_id() -> String {
        let id = Uuid::new_v4().simple().to_string();
        id.chars().take(8).collect()
    }
}

/// Fields a user fills in before a task exists. Validated by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub name: String,
    pub departments: Vec<String>,
    pub deadline: Option<Date>,
    pub progress: u8,
    pub done: bool,
}

impl TaskDraft {
    #[must_use]
    pub fn from_task(task: &Task) -> Self {
        Self {
            name: task.name.clone(),
            departments: task.departments.clone(),
            deadline: Some(task.deadline),
            progress: task.progress,
            done: task.done,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Note {
    pub id: String,
    pub text: String,
    #[serde(with = "iso_date")]
    pub date: Date,
    #[serde(default)]
    pub checked: bool,
}

impl Note {
    #[must_use]
    pub fn new_id() -> String {
        let id = Uuid::new_v4().simple().to_string();
        id.chars().take(8).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, with = "iso_date::option")]
    pub deadline: Option<Date>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub departments: Vec<String>,
}

/// Partial project record decoded from a handoff payload. Only fields
/// present in the payload overwrite the existing record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectPatch {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default, with = "iso_date::option")]
    pub deadline: Option<Date>,
    pub budget: Option<f64>,
    pub progress: Option<u8>,
    pub departments: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;

    #[test]
    fn parses_and_formats_iso_dates() {
        let d = parse_date("2025-12-01").unwrap();
        assert_eq!(d, date!(2025 - 12 - 01));
        assert_eq!(format_date(d), "2025-12-01");
    }

    #[test]
    fn rejects_non_iso_dates() {
        assert!(parse_date("01/12/2025").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn clamps_progress_to_percent_range() {
        assert_eq!(clamp_progress(-5), 0);
        assert_eq!(clamp_progress(42), 42);
        assert_eq!(clamp_progress(250), 100);
    }

    #[test]
    fn task_round_trips_with_camel_case_created_at() {
        let task = Task {
            id: Task::new_id(),
            name: "Wire harness".to_owned(),
            departments: vec!["Design Electric".to_owned()],
            color: "#33C1FF".to_owned(),
            deadline: date!(2025 - 12 - 01),
            created_at: date!(2025 - 11 - 20),
            done: false,
            progress: 40,
        };
        let json = serde_json::to_string(&task).unwrap();
        assert!(json.contains("\"createdAt\":\"2025-11-20\""));
        let back: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(back, task);
    }

    #[test]
    fn task_ids_are_unique_enough_for_a_session() {
        let a = Task::new_id();
        let b = Task::new_id();
        assert_eq!(a.len(), 8);
        assert_ne!(a, b);
    }
}
