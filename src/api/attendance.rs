use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::{ApiError, is_unique_violation};
use crate::model::employee::EmployeeStatus;
use crate::model::event::{AttendanceEvent, EventType};
use crate::policy;
use actix_web::{HttpResponse, web};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

pub(crate) const EVENT_COLUMNS: &str = "id, employee_id, event_type, day, timestamp, punch_out, \
     hours_worked, hours_hms, is_late, late_reason, reason";

async fn fetch_open_punch(
    pool: &MySqlPool,
    employee_id: u64,
    day: NaiveDate,
) -> Result<Option<AttendanceEvent>, ApiError> {
    let sql = format!(
        "SELECT {EVENT_COLUMNS} FROM attendance_events \
         WHERE employee_id = ? AND day = ? AND event_type = 'punch_in' AND punch_out IS NULL \
         ORDER BY timestamp DESC LIMIT 1"
    );
    Ok(sqlx::query_as::<_, AttendanceEvent>(&sql)
        .bind(employee_id)
        .bind(day)
        .fetch_optional(pool)
        .await?)
}

async fn employee_exists(pool: &MySqlPool, employee_id: u64) -> Result<(), ApiError> {
    let exists =
        sqlx::query_scalar::<_, i64>("SELECT EXISTS(SELECT 1 FROM employees WHERE id = ?)")
            .bind(employee_id)
            .fetch_one(pool)
            .await?;
    if exists != 0 {
        Ok(())
    } else {
        Err(ApiError::NotFound("Employee not found".into()))
    }
}

#[derive(Deserialize, ToSchema)]
pub struct PunchInReq {
    /// Required when punching in after 09:30 facility time.
    #[schema(example = "Traffic jam on the highway")]
    pub late_reason: Option<String>,
}

/// Punch-in endpoint
#[utoipa::path(
    post,
    path = "/api/v1/attendance/{employee_id}/punch-in",
    params(
        ("employee_id" = u64, Path, description = "Employee ID")
    ),
    request_body = PunchInReq,
    responses(
        (status = 201, description = "Punched in successfully", body = Object, example = json!({
            "status": "success",
            "message": "Punched in successfully",
            "punch_type": "in",
            "is_late": false
        })),
        (status = 400, description = "Already punched in, or late without a reason"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn punch_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    payload: web::Json<PunchInReq>,
) -> Result<HttpResponse, ApiError> {
    let employee_id = path.into_inner();
    auth.authorize_employee(employee_id)?;
    employee_exists(pool.get_ref(), employee_id).await?;

    let now = config.facility_now();
    let is_late = policy::is_late_punch_in(now.time());
    let late_reason = payload
        .late_reason
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty());

    if is_late && late_reason.is_none() {
        return Err(ApiError::Validation {
            field: "late_reason",
            message: "Reason is required for late punch-in (after 09:30)",
        });
    }

    let result = sqlx::query(
        r#"
        INSERT INTO attendance_events (employee_id, event_type, day, timestamp, is_late, late_reason)
        VALUES (?, 'punch_in', ?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(now.date_naive())
    .bind(now.with_timezone(&Utc))
    .bind(is_late)
    .bind(if is_late { late_reason } else { None })
    .execute(pool.get_ref())
    .await;

    if let Err(e) = result {
        // The open-punch unique key is the invariant, not a pre-read.
        if is_unique_violation(&e) {
            return Err(ApiError::Policy("Already punched in today".into()));
        }
        return Err(e.into());
    }

    sqlx::query("UPDATE employees SET status = ?, last_activity = ? WHERE id = ?")
        .bind(EmployeeStatus::Online.as_str())
        .bind(now.with_timezone(&Utc))
        .bind(employee_id)
        .execute(pool.get_ref())
        .await?;

    let message = if is_late {
        "Punched in late. Reason submitted."
    } else {
        "Punched in successfully"
    };

    Ok(HttpResponse::Created().json(serde_json::json!({
        "status": "success",
        "message": message,
        "punch_type": "in",
        "timestamp": now.with_timezone(&Utc),
        "is_late": is_late
    })))
}

#[derive(Deserialize, ToSchema)]
pub struct PunchOutReq {
    /// Required when punching out after 18:30 facility time.
    pub reason: Option<String>,
}

/// Punch-out endpoint; pairs the open punch-in and backfills hours.
#[utoipa::path(
    post,
    path = "/api/v1/attendance/{employee_id}/punch-out",
    params(
        ("employee_id" = u64, Path, description = "Employee ID")
    ),
    request_body = PunchOutReq,
    responses(
        (status = 200, description = "Punched out successfully", body = Object, example = json!({
            "status": "success",
            "message": "Punched out successfully",
            "punch_type": "out",
            "hours_worked": "8.25",
            "hours_hms": "08:15:00"
        })),
        (status = 400, description = "No active punch-in, or late without a reason"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn punch_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    payload: web::Json<PunchOutReq>,
) -> Result<HttpResponse, ApiError> {
    let employee_id = path.into_inner();
    auth.authorize_employee(employee_id)?;
    employee_exists(pool.get_ref(), employee_id).await?;

    let now = config.facility_now();
    let today = now.date_naive();

    let open_punch = fetch_open_punch(pool.get_ref(), employee_id, today)
        .await?
        .ok_or_else(|| ApiError::Policy("No active punch-in found for today".into()))?;

    let reason = payload
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty());

    if policy::requires_punch_out_reason(now.time()) && reason.is_none() {
        return Err(ApiError::Validation {
            field: "reason",
            message: "Reason is required when punching out after 18:30",
        });
    }

    let now_utc = now.with_timezone(&Utc);
    let elapsed_secs = (now_utc - open_punch.timestamp).num_seconds();
    let hours_worked = policy::punch_hours(elapsed_secs);
    let hours_hms = policy::elapsed_hms(elapsed_secs);

    sqlx::query(
        r#"
        UPDATE attendance_events
        SET punch_out = ?, hours_worked = ?, hours_hms = ?, reason = ?
        WHERE id = ?
        "#,
    )
    .bind(now_utc)
    .bind(hours_worked)
    .bind(&hours_hms)
    .bind(reason)
    .bind(open_punch.id)
    .execute(pool.get_ref())
    .await?;

    sqlx::query(
        r#"
        INSERT INTO attendance_events (employee_id, event_type, day, timestamp, reason)
        VALUES (?, 'punch_out', ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(today)
    .bind(now_utc)
    .bind(reason)
    .execute(pool.get_ref())
    .await?;

    sqlx::query("UPDATE employees SET status = ?, logout_time = ?, last_activity = ? WHERE id = ?")
        .bind(EmployeeStatus::Offline.as_str())
        .bind(now_utc)
        .bind(now_utc)
        .bind(employee_id)
        .execute(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "success",
        "message": "Punched out successfully",
        "punch_type": "out",
        "timestamp": now_utc,
        "hours_worked": hours_worked,
        "hours_hms": hours_hms
    })))
}

/// Current punch state for the authenticated employee.
#[utoipa::path(
    get,
    path = "/api/v1/attendance/status",
    responses(
        (status = 200, description = "Current punch status", body = Object, example = json!({
            "status": "punched_in",
            "message": "Currently punched in",
            "punch_type": "in",
            "hours_worked": "2.50",
            "is_late": false
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn punch_status(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let employee_id = auth.own_employee_id()?;
    let now = config.facility_now();

    let sql = format!(
        "SELECT {EVENT_COLUMNS} FROM attendance_events \
         WHERE employee_id = ? AND day = ? AND event_type = 'punch_in' \
         ORDER BY timestamp DESC LIMIT 1"
    );
    let today_punch = sqlx::query_as::<_, AttendanceEvent>(&sql)
        .bind(employee_id)
        .bind(now.date_naive())
        .fetch_optional(pool.get_ref())
        .await?;

    let punch = match today_punch {
        None => {
            return Ok(HttpResponse::Ok().json(serde_json::json!({
                "status": "not_punched_in",
                "message": "Not punched in today",
                "punch_type": null,
                "timestamp": null,
                "hours_worked": "0",
                "is_late": false
            })));
        }
        Some(p) => p,
    };

    if let Some(punch_out) = punch.punch_out {
        return Ok(HttpResponse::Ok().json(serde_json::json!({
            "status": "punched_out",
            "message": "Punched out",
            "punch_type": "out",
            "punch_in": punch.timestamp,
            "punch_out": punch_out,
            "hours_worked": punch.hours_worked,
            "hours_hms": punch.hours_hms,
            "is_late": punch.is_late,
            "late_reason": if punch.is_late { punch.late_reason } else { None }
        })));
    }

    let running_secs = (now.with_timezone(&Utc) - punch.timestamp).num_seconds();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "punched_in",
        "message": "Currently punched in",
        "punch_type": "in",
        "punch_in": punch.timestamp,
        "punch_out": null,
        "hours_worked": policy::punch_hours(running_secs),
        "is_late": punch.is_late,
        "late_reason": if punch.is_late { punch.late_reason } else { None }
    })))
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct AttendanceFilter {
    /// Filter by employee ID
    pub employee_id: Option<u64>,
    #[param(example = "2026-01-01")]
    pub start_date: Option<NaiveDate>,
    #[param(example = "2026-01-31")]
    pub end_date: Option<NaiveDate>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    Date(NaiveDate),
}

/// HR/admin listing of punch records.
#[utoipa::path(
    get,
    path = "/api/v1/hr/attendance",
    params(AttendanceFilter),
    responses(
        (status = 200, description = "Punch records", body = Object),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn hr_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceFilter>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let per_page = query.per_page.unwrap_or(20).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let mut where_sql = String::from(" WHERE event_type = 'punch_in'");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(emp_id) = query.employee_id {
        where_sql.push_str(" AND employee_id = ?");
        args.push(FilterValue::U64(emp_id));
    }
    if let Some(start) = query.start_date {
        where_sql.push_str(" AND day >= ?");
        args.push(FilterValue::Date(start));
    }
    if let Some(end) = query.end_date {
        where_sql.push_str(" AND day <= ?");
        args.push(FilterValue::Date(end));
    }

    let count_sql = format!("SELECT COUNT(*) FROM attendance_events{where_sql}");
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Date(d) => count_q.bind(*d),
        };
    }
    let total = count_q.fetch_one(pool.get_ref()).await?;

    let data_sql = format!(
        "SELECT {EVENT_COLUMNS} FROM attendance_events{where_sql} \
         ORDER BY day DESC, timestamp DESC LIMIT ? OFFSET ?"
    );
    let mut data_q = sqlx::query_as::<_, AttendanceEvent>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Date(d) => data_q.bind(d),
        };
    }
    let records = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "count": total,
        "page": page,
        "per_page": per_page,
        "results": records
    })))
}

// Event log writers used by the session endpoints.
pub async fn append_event(
    pool: &MySqlPool,
    employee_id: u64,
    event_type: EventType,
    now: DateTime<FixedOffset>,
) -> Result<(), ApiError> {
    sqlx::query(
        r#"
        INSERT INTO attendance_events (employee_id, event_type, day, timestamp)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(event_type.as_str())
    .bind(now.date_naive())
    .bind(now.with_timezone(&Utc))
    .execute(pool)
    .await?;
    Ok(())
}
