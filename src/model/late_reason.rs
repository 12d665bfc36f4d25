use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One submission per late login. `is_approved` is tri-state:
/// NULL = pending, true/false = decided.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LateLoginReason {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 1)]
    pub employee_id: u64,

    #[schema(value_type = String, format = "date-time")]
    pub login_time: DateTime<Utc>,

    #[schema(example = "09:30:00", value_type = Option<String>)]
    pub expected_time: Option<NaiveTime>,

    #[schema(example = "Doctor's appointment ran over.")]
    pub reason: String,

    pub is_approved: Option<bool>,

    pub approved_by: Option<u64>,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}
