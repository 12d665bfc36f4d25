use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pending,
    Sent,
    Approved,
    Rejected,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Sent => "sent",
            ReportStatus::Approved => "approved",
            ReportStatus::Rejected => "rejected",
        }
    }
}

/// One free-text report per (employee, date), enforced by a unique key.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct DailyWorkReport {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 1)]
    pub employee_id: u64,

    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub date: NaiveDate,

    #[schema(example = "Closed out the quarterly reconciliation.")]
    pub work_details: String,

    #[schema(example = "sent")]
    pub status: String,

    pub admin_reply: Option<String>,

    #[schema(value_type = Option<String>, format = "date-time")]
    pub replied_at: Option<DateTime<Utc>>,

    pub replied_by: Option<u64>,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,

    #[schema(value_type = String, format = "date-time")]
    pub updated_at: DateTime<Utc>,
}

/// Threaded admin reply to a report. `is_read` flips when the owning
/// employee views the thread.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AdminReply {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 1)]
    pub report_id: u64,

    #[schema(example = 2)]
    pub admin_user_id: u64,

    #[schema(example = "Looks good, please add ticket numbers tomorrow.")]
    pub message: String,

    pub is_read: bool,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}
