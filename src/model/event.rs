use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Attendance event log. Punch-in rows are paired in place: the matching
/// punch-out backfills `punch_out`, `hours_worked` and `hours_hms`, after
/// which the row is immutable.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceEvent {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 1)]
    pub employee_id: u64,

    #[schema(example = "punch_in")]
    pub event_type: String,

    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub day: NaiveDate,

    #[schema(value_type = String, format = "date-time")]
    pub timestamp: DateTime<Utc>,

    #[schema(value_type = Option<String>, format = "date-time")]
    pub punch_out: Option<DateTime<Utc>>,

    #[schema(value_type = Option<String>, example = "8.25")]
    pub hours_worked: Option<Decimal>,

    #[schema(example = "08:15:00")]
    pub hours_hms: Option<String>,

    pub is_late: bool,

    pub late_reason: Option<String>,

    /// Reason for a late punch-out or other attendance notes.
    pub reason: Option<String>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EventType {
    PunchIn,
    PunchOut,
    Login,
    Logout,
    StatusChange,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::PunchIn => "punch_in",
            EventType::PunchOut => "punch_out",
            EventType::Login => "login",
            EventType::Logout => "logout",
            EventType::StatusChange => "status_change",
        }
    }
}
