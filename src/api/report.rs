use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::{ApiError, is_unique_violation};
use crate::mailer::Mailer;
use crate::model::report::{AdminReply, DailyWorkReport, ReportStatus};
use actix_web::{HttpResponse, web};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

const REPORT_COLUMNS: &str = "id, employee_id, date, work_details, status, admin_reply, \
     replied_at, replied_by, created_at, updated_at";

async fn fetch_report(pool: &MySqlPool, id: u64) -> Result<DailyWorkReport, ApiError> {
    let sql = format!("SELECT {REPORT_COLUMNS} FROM daily_work_reports WHERE id = ?");
    sqlx::query_as::<_, DailyWorkReport>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Report not found".into()))
}

#[derive(Deserialize, ToSchema)]
pub struct CreateReportReq {
    #[schema(example = "Finished the payroll export and reviewed two PRs.")]
    pub work_details: String,
}

/// Submit today's work report. One report per employee per day.
#[utoipa::path(
    post,
    path = "/api/v1/reports",
    request_body = CreateReportReq,
    responses(
        (status = 201, description = "Report submitted", body = DailyWorkReport),
        (status = 400, description = "Blank details, or a report already exists for today", body = Object, example = json!({
            "error": "Report already submitted for today",
            "report_id": 7,
            "date": "2026-01-01",
            "status": "sent"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn create_report(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<CreateReportReq>,
) -> Result<HttpResponse, ApiError> {
    let employee_id = auth.own_employee_id()?;

    let details = payload.work_details.trim();
    if details.is_empty() {
        return Err(ApiError::Validation {
            field: "work_details",
            message: "Work details must not be empty",
        });
    }

    let today = config.facility_now().date_naive();

    let existing_sql =
        format!("SELECT {REPORT_COLUMNS} FROM daily_work_reports WHERE employee_id = ? AND date = ?");
    if let Some(existing) = sqlx::query_as::<_, DailyWorkReport>(&existing_sql)
        .bind(employee_id)
        .bind(today)
        .fetch_optional(pool.get_ref())
        .await?
    {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "error": "Report already submitted for today",
            "report_id": existing.id,
            "date": existing.date,
            "status": existing.status
        })));
    }

    let result = sqlx::query(
        "INSERT INTO daily_work_reports (employee_id, date, work_details, status) VALUES (?, ?, ?, ?)",
    )
    .bind(employee_id)
    .bind(today)
    .bind(details)
    .bind(ReportStatus::Sent.as_str())
    .execute(pool.get_ref())
    .await;

    let report_id = match result {
        Ok(r) => r.last_insert_id(),
        // Concurrent submit lost the race against uq_report_per_day.
        Err(e) if is_unique_violation(&e) => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Report already submitted for today",
                "date": today
            })));
        }
        Err(e) => return Err(e.into()),
    };

    let report = fetch_report(pool.get_ref(), report_id).await?;
    info!(report_id, employee_id, "Daily report submitted");

    Ok(HttpResponse::Created().json(report))
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct ReportQuery {
    /// Admin-only: restrict to one employee
    pub employee_id: Option<u64>,
    #[param(example = "2026-01-01")]
    pub start_date: Option<NaiveDate>,
    #[param(example = "2026-01-31")]
    pub end_date: Option<NaiveDate>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

enum FilterValue {
    U64(u64),
    Date(NaiveDate),
}

/// List reports: admins see everyone's, employees only their own.
#[utoipa::path(
    get,
    path = "/api/v1/reports",
    params(ReportQuery),
    responses(
        (status = 200, description = "Paginated reports", body = Object),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn list_reports(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ReportQuery>,
) -> Result<HttpResponse, ApiError> {
    let per_page = query.per_page.unwrap_or(20).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if auth.role.is_admin() {
        if let Some(emp_id) = query.employee_id {
            where_sql.push_str(" AND employee_id = ?");
            args.push(FilterValue::U64(emp_id));
        }
    } else {
        where_sql.push_str(" AND employee_id = ?");
        args.push(FilterValue::U64(auth.own_employee_id()?));
    }

    if let Some(start) = query.start_date {
        where_sql.push_str(" AND date >= ?");
        args.push(FilterValue::Date(start));
    }
    if let Some(end) = query.end_date {
        where_sql.push_str(" AND date <= ?");
        args.push(FilterValue::Date(end));
    }

    let count_sql = format!("SELECT COUNT(*) FROM daily_work_reports{where_sql}");
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Date(d) => count_q.bind(*d),
        };
    }
    let total = count_q.fetch_one(pool.get_ref()).await?;

    let data_sql = format!(
        "SELECT {REPORT_COLUMNS} FROM daily_work_reports{where_sql} \
         ORDER BY date DESC, id DESC LIMIT ? OFFSET ?"
    );
    let mut data_q = sqlx::query_as::<_, DailyWorkReport>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Date(d) => data_q.bind(d),
        };
    }
    let reports = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "count": total,
        "page": page,
        "per_page": per_page,
        "results": reports
    })))
}

#[derive(Deserialize, ToSchema)]
pub struct AdminReplyReq {
    #[schema(example = "Looks good, please add ticket numbers tomorrow.")]
    pub message: String,
}

/// Admin reply: threads a message onto the report, marks it approved and
/// emails the employee best-effort.
#[utoipa::path(
    post,
    path = "/api/v1/reports/{report_id}/reply",
    params(("report_id" = u64, Path, description = "Report ID")),
    request_body = AdminReplyReq,
    responses(
        (status = 201, description = "Reply recorded", body = AdminReply),
        (status = 400, description = "Blank message"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Report not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn admin_reply(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    mailer: web::Data<Mailer>,
    path: web::Path<u64>,
    payload: web::Json<AdminReplyReq>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;
    let report_id = path.into_inner();

    let message = payload.message.trim();
    if message.is_empty() {
        return Err(ApiError::Validation {
            field: "message",
            message: "Reply message must not be empty",
        });
    }

    let report = fetch_report(pool.get_ref(), report_id).await?;

    sqlx::query(
        r#"
        UPDATE daily_work_reports
        SET admin_reply = ?, replied_at = NOW(), replied_by = ?, status = ?
        WHERE id = ?
        "#,
    )
    .bind(message)
    .bind(auth.user_id)
    .bind(ReportStatus::Approved.as_str())
    .bind(report_id)
    .execute(pool.get_ref())
    .await?;

    let reply_id = sqlx::query(
        "INSERT INTO admin_replies (report_id, admin_user_id, message) VALUES (?, ?, ?)",
    )
    .bind(report_id)
    .bind(auth.user_id)
    .bind(message)
    .execute(pool.get_ref())
    .await?
    .last_insert_id();

    let reply = sqlx::query_as::<_, AdminReply>(
        "SELECT id, report_id, admin_user_id, message, is_read, created_at \
         FROM admin_replies WHERE id = ?",
    )
    .bind(reply_id)
    .fetch_one(pool.get_ref())
    .await?;

    // Notification failures never fail the reply.
    let email: Option<String> =
        sqlx::query_scalar("SELECT email FROM employees WHERE id = ?")
            .bind(report.employee_id)
            .fetch_optional(pool.get_ref())
            .await?;
    if let Some(email) = email {
        mailer
            .send(
                &email,
                &format!("Reply to your daily report - {}", report.date),
                &format!("An admin replied to your report for {}:\n\n{}", report.date, message),
            )
            .await;
    }

    Ok(HttpResponse::Created().json(reply))
}

/// Reply thread for a report. Viewing as the owning employee marks the
/// replies read.
#[utoipa::path(
    get,
    path = "/api/v1/reports/{report_id}/replies",
    params(("report_id" = u64, Path, description = "Report ID")),
    responses(
        (status = 200, description = "Replies in chronological order", body = [AdminReply]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Report not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn report_replies(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let report_id = path.into_inner();
    let report = fetch_report(pool.get_ref(), report_id).await?;

    auth.authorize_employee(report.employee_id)?;

    let is_owner = auth.employee_id == Some(report.employee_id);
    if is_owner {
        sqlx::query("UPDATE admin_replies SET is_read = TRUE WHERE report_id = ? AND is_read = FALSE")
            .bind(report_id)
            .execute(pool.get_ref())
            .await?;
    }

    let replies = sqlx::query_as::<_, AdminReply>(
        "SELECT id, report_id, admin_user_id, message, is_read, created_at \
         FROM admin_replies WHERE report_id = ? ORDER BY created_at ASC, id ASC",
    )
    .bind(report_id)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(replies))
}

#[derive(sqlx::FromRow)]
struct EmployeeReportRow {
    employee_id: u64,
    first_name: String,
    last_name: String,
    email: String,
    status: String,
    login_time: Option<DateTime<Utc>>,
    logout_time: Option<DateTime<Utc>>,
    report_id: Option<u64>,
    report_status: Option<String>,
    submitted_at: Option<DateTime<Utc>>,
    work_details: Option<String>,
}

/// Admin overview: every employee with today's report state, defaulting to
/// pending when nothing was submitted.
#[utoipa::path(
    get,
    path = "/api/v1/admin/reports/employees",
    responses(
        (status = 200, description = "Per-employee report state for today", body = Object),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn admin_report_overview(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let today = config.facility_now().date_naive();

    let rows: Vec<EmployeeReportRow> = sqlx::query_as(
        r#"
        SELECT e.id AS employee_id, e.first_name, e.last_name, e.email, e.status,
               e.login_time, e.logout_time,
               r.id AS report_id, r.status AS report_status,
               r.created_at AS submitted_at, r.work_details
        FROM employees e
        LEFT JOIN daily_work_reports r ON r.employee_id = e.id AND r.date = ?
        ORDER BY e.first_name, e.last_name
        "#,
    )
    .bind(today)
    .fetch_all(pool.get_ref())
    .await?;

    let results: Vec<serde_json::Value> = rows
        .into_iter()
        .map(|row| {
            let preview = row.work_details.as_deref().map(|d| {
                if d.chars().count() > 100 {
                    let cut: String = d.chars().take(100).collect();
                    format!("{cut}...")
                } else {
                    d.to_string()
                }
            });
            serde_json::json!({
                "employee_id": row.employee_id,
                "name": format!("{} {}", row.first_name, row.last_name).trim().to_string(),
                "email": row.email,
                "employee_status": row.status,
                "login_time": row.login_time,
                "logout_time": row.logout_time,
                "report_id": row.report_id,
                "report_status": row
                    .report_status
                    .unwrap_or_else(|| ReportStatus::Pending.as_str().to_string()),
                "submitted_at": row.submitted_at,
                "work_details": preview
            })
        })
        .collect();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "date": today,
        "results": results
    })))
}
