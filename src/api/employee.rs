use crate::api::attendance::append_event;
use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::ApiError;
use crate::model::employee::Employee;
use crate::model::event::EventType;
use crate::policy;
use actix_web::{HttpResponse, web};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use std::collections::HashMap;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

pub(crate) const EMPLOYEE_COLUMNS: &str = "id, user_id, first_name, last_name, email, status, \
     login_time, logout_time, hours_worked, last_activity, created_at, updated_at";

pub(crate) async fn fetch_employee(pool: &MySqlPool, id: u64) -> Result<Employee, ApiError> {
    let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?");
    sqlx::query_as::<_, Employee>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Employee not found".into()))
}

async fn persist_session(pool: &MySqlPool, emp: &Employee) -> Result<(), ApiError> {
    sqlx::query(
        r#"
        UPDATE employees
        SET login_time = ?, logout_time = ?, status = ?, hours_worked = ?, last_activity = ?
        WHERE id = ?
        "#,
    )
    .bind(emp.login_time)
    .bind(emp.logout_time)
    .bind(&emp.status)
    .bind(emp.hours_worked)
    .bind(emp.last_activity)
    .bind(emp.id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Day bounds in UTC for a facility-local calendar day.
fn day_bounds_utc(day: NaiveDate, tz: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = tz
        .from_local_datetime(&day.and_hms_opt(0, 0, 0).unwrap())
        .unwrap()
        .with_timezone(&Utc);
    (start, start + Duration::days(1))
}

/// Session login: starts the employee's work day.
#[utoipa::path(
    post,
    path = "/api/v1/employees/{employee_id}/login",
    params(("employee_id" = u64, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Login recorded", body = Employee),
        (status = 400, description = "Policy violation (weekend, outside office hours, already online)"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn session_login(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let employee_id = path.into_inner();
    auth.authorize_employee(employee_id)?;

    let mut emp = fetch_employee(pool.get_ref(), employee_id).await?;
    let now = config.facility_now();

    emp.login(now)?;
    persist_session(pool.get_ref(), &emp).await?;
    append_event(pool.get_ref(), employee_id, EventType::Login, now).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Login recorded successfully",
        "data": emp
    })))
}

/// Session logout: closes the work day and computes worked hours.
#[utoipa::path(
    post,
    path = "/api/v1/employees/{employee_id}/logout",
    params(("employee_id" = u64, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Logout recorded", body = Employee),
        (status = 400, description = "Policy violation (not logged in)"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn session_logout(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let employee_id = path.into_inner();
    auth.authorize_employee(employee_id)?;

    let mut emp = fetch_employee(pool.get_ref(), employee_id).await?;
    let now = config.facility_now();

    emp.logout(now)?;
    persist_session(pool.get_ref(), &emp).await?;
    append_event(pool.get_ref(), employee_id, EventType::Logout, now).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Logout recorded successfully",
        "data": emp
    })))
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateStatusReq {
    #[schema(example = "leave")]
    pub status: String,
}

/// Explicit status transition; the stored status is authoritative.
#[utoipa::path(
    post,
    path = "/api/v1/employees/{employee_id}/status",
    params(("employee_id" = u64, Path, description = "Employee ID")),
    request_body = UpdateStatusReq,
    responses(
        (status = 200, description = "Status updated", body = Object, example = json!({
            "success": true,
            "message": "Status updated to leave",
            "status": "leave"
        })),
        (status = 400, description = "Unknown status, or online without login time"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn update_status(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    payload: web::Json<UpdateStatusReq>,
) -> Result<HttpResponse, ApiError> {
    let employee_id = path.into_inner();
    auth.authorize_employee(employee_id)?;

    let mut emp = fetch_employee(pool.get_ref(), employee_id).await?;
    let new_status = emp.update_status(&payload.status)?;

    let now = config.facility_now();
    sqlx::query("UPDATE employees SET status = ?, last_activity = ? WHERE id = ?")
        .bind(new_status.as_str())
        .bind(now.with_timezone(&Utc))
        .bind(employee_id)
        .execute(pool.get_ref())
        .await?;

    append_event(pool.get_ref(), employee_id, EventType::StatusChange, now).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": format!("Status updated to {}", new_status.as_str()),
        "status": new_status
    })))
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct EmployeeQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    /// Filter by employee status (online/offline/leave)
    pub status: Option<String>,
    /// Search by name or email
    pub search: Option<String>,
    /// Filter by today's report state: "sent" or "pending"
    pub report: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<Employee>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 42)]
    pub total: i64,
}

enum FilterValue {
    Str(String),
    Date(NaiveDate),
}

/// Admin listing with search and report-state filtering.
#[utoipa::path(
    get,
    path = "/api/v1/employees",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn list_employees(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<EmployeeQuery>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    // ---------- build WHERE clause dynamically ----------
    let mut conditions = Vec::new();
    let mut bindings: Vec<FilterValue> = Vec::new();

    if let Some(status) = query.status.as_deref().filter(|s| *s != "all") {
        conditions.push("status = ?".to_string());
        bindings.push(FilterValue::Str(status.to_lowercase()));
    }

    if let Some(search) = &query.search {
        conditions.push("(first_name LIKE ? OR last_name LIKE ? OR email LIKE ?)".to_string());
        let like = format!("%{search}%");
        bindings.push(FilterValue::Str(like.clone()));
        bindings.push(FilterValue::Str(like.clone()));
        bindings.push(FilterValue::Str(like));
    }

    match query.report.as_deref() {
        Some("sent") => {
            conditions.push(
                "id IN (SELECT employee_id FROM daily_work_reports WHERE date = ?)".to_string(),
            );
            bindings.push(FilterValue::Date(config.facility_now().date_naive()));
        }
        Some("pending") => {
            conditions.push(
                "id NOT IN (SELECT employee_id FROM daily_work_reports WHERE date = ?)".to_string(),
            );
            bindings.push(FilterValue::Date(config.facility_now().date_naive()));
        }
        _ => {}
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    // ---------- total count ----------
    let count_sql = format!("SELECT COUNT(*) FROM employees {where_clause}");
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &bindings {
        count_query = match b {
            FilterValue::Str(s) => count_query.bind(s.clone()),
            FilterValue::Date(d) => count_query.bind(*d),
        };
    }
    let total = count_query.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %count_sql, "Failed to count employees");
        ApiError::Internal
    })?;

    // ---------- data query ----------
    let data_sql = format!(
        "SELECT {EMPLOYEE_COLUMNS} FROM employees {where_clause} \
         ORDER BY first_name, last_name LIMIT ? OFFSET ?"
    );
    let mut data_query = sqlx::query_as::<_, Employee>(&data_sql);
    for b in &bindings {
        data_query = match b {
            FilterValue::Str(s) => data_query.bind(s.clone()),
            FilterValue::Date(d) => data_query.bind(*d),
        };
    }
    let employees = data_query
        .bind(per_page as i64)
        .bind(offset as i64)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, sql = %data_sql, "Failed to fetch employees");
            ApiError::Internal
        })?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        data: employees,
        page,
        per_page,
        total,
    }))
}

#[derive(sqlx::FromRow)]
struct EventAgg {
    employee_id: u64,
    ts: Option<DateTime<Utc>>,
}

/// Today's login/logout and worked hours per employee, from the event log.
#[utoipa::path(
    get,
    path = "/api/v1/employees/today",
    responses(
        (status = 200, description = "Today's attendance for all employees", body = Object),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn today_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let today = config.facility_now().date_naive();

    let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees ORDER BY first_name, last_name");
    let employees = sqlx::query_as::<_, Employee>(&sql)
        .fetch_all(pool.get_ref())
        .await?;

    let logins: Vec<EventAgg> = sqlx::query_as(
        "SELECT employee_id, MIN(timestamp) AS ts FROM attendance_events \
         WHERE event_type = 'login' AND day = ? GROUP BY employee_id",
    )
    .bind(today)
    .fetch_all(pool.get_ref())
    .await?;

    let logouts: Vec<EventAgg> = sqlx::query_as(
        "SELECT employee_id, MAX(timestamp) AS ts FROM attendance_events \
         WHERE event_type = 'logout' AND day = ? GROUP BY employee_id",
    )
    .bind(today)
    .fetch_all(pool.get_ref())
    .await?;

    let logins: HashMap<u64, Option<DateTime<Utc>>> =
        logins.into_iter().map(|a| (a.employee_id, a.ts)).collect();
    let logouts: HashMap<u64, Option<DateTime<Utc>>> =
        logouts.into_iter().map(|a| (a.employee_id, a.ts)).collect();

    let rows: Vec<serde_json::Value> = employees
        .iter()
        .map(|emp| {
            let login = logins.get(&emp.id).copied().flatten();
            let logout = logouts.get(&emp.id).copied().flatten();
            let hours = match (login, logout) {
                (Some(li), Some(lo)) => policy::punch_hours((lo - li).num_seconds()),
                _ => Decimal::ZERO,
            };
            serde_json::json!({
                "employee_id": emp.id,
                "name": emp.full_name(),
                "email": emp.email,
                "login_time": login,
                "logout_time": logout,
                "hours_worked": hours,
                "status": emp.status
            })
        })
        .collect();

    Ok(HttpResponse::Ok().json(rows))
}

#[derive(sqlx::FromRow)]
struct StatusCount {
    status: String,
    cnt: i64,
}

/// Daily attendance summary for the admin dashboard.
#[utoipa::path(
    get,
    path = "/api/v1/employees/summary",
    responses(
        (status = 200, description = "Attendance summary for today", body = Object, example = json!({
            "date": "2026-01-01",
            "total_employees": 12,
            "online": 8,
            "offline": 3,
            "on_leave": 1,
            "average_hours_worked": "7.43",
            "late_comers": 2
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn summary(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let now = config.facility_now();
    let today = now.date_naive();
    let (day_start, day_end) = day_bounds_utc(today, config.office_offset);

    let counts: Vec<StatusCount> =
        sqlx::query_as("SELECT status, COUNT(*) AS cnt FROM employees GROUP BY status")
            .fetch_all(pool.get_ref())
            .await?;

    let count_for = |s: &str| {
        counts
            .iter()
            .find(|c| c.status == s)
            .map(|c| c.cnt)
            .unwrap_or(0)
    };
    let total: i64 = counts.iter().map(|c| c.cnt).sum();

    let avg_hours: Option<Decimal> = sqlx::query_scalar(
        "SELECT AVG(hours_worked) FROM employees \
         WHERE login_time >= ? AND login_time < ? AND logout_time IS NOT NULL",
    )
    .bind(day_start)
    .bind(day_end)
    .fetch_one(pool.get_ref())
    .await?;

    let late_instant = config
        .office_offset
        .from_local_datetime(&today.and_time(policy::late_threshold()))
        .unwrap()
        .with_timezone(&Utc);

    let late_comers: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM employees WHERE login_time > ? AND login_time < ?",
    )
    .bind(late_instant)
    .bind(day_end)
    .fetch_one(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "date": today,
        "total_employees": total,
        "online": count_for("online"),
        "offline": count_for("offline"),
        "on_leave": count_for("leave"),
        "average_hours_worked": avg_hours
            .unwrap_or(Decimal::ZERO)
            .round_dp(2),
        "late_comers": late_comers
    })))
}
