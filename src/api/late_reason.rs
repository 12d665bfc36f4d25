use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::ApiError;
use crate::model::late_reason::LateLoginReason;
use crate::policy;
use actix_web::{HttpResponse, web};
use chrono::{NaiveTime, Utc};
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

const REASON_COLUMNS: &str = "id, employee_id, login_time, expected_time, reason, is_approved, \
     approved_by, created_at";

#[derive(Deserialize, ToSchema)]
pub struct CreateLateReasonReq {
    #[schema(example = "Traffic jam on the highway")]
    pub reason: String,
    /// When the employee expected to arrive, "HH:MM:SS".
    #[schema(example = "10:15:00")]
    pub expected_time: Option<String>,
}

/// Record why the authenticated employee arrived late.
#[utoipa::path(
    post,
    path = "/api/v1/late-login-reasons",
    request_body = CreateLateReasonReq,
    responses(
        (status = 201, description = "Reason recorded", body = LateLoginReason),
        (status = 400, description = "Blank reason or malformed expected time"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile")
    ),
    security(("bearer_auth" = [])),
    tag = "Late reasons"
)]
pub async fn create_late_reason(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<CreateLateReasonReq>,
) -> Result<HttpResponse, ApiError> {
    let employee_id = auth.own_employee_id()?;

    let reason = payload.reason.trim();
    if reason.is_empty() {
        return Err(ApiError::Validation {
            field: "reason",
            message: "Reason must not be empty",
        });
    }

    let expected_time = match payload.expected_time.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => match NaiveTime::parse_from_str(raw, "%H:%M:%S") {
            Ok(t) => Some(t),
            Err(_) => {
                return Err(ApiError::Validation {
                    field: "expected_time",
                    message: "Expected time must look like HH:MM:SS",
                });
            }
        },
        _ => Some(policy::late_threshold()),
    };

    let now = config.facility_now();

    let id = sqlx::query(
        r#"
        INSERT INTO late_login_reasons (employee_id, login_time, expected_time, reason)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(now.with_timezone(&Utc))
    .bind(expected_time)
    .bind(reason)
    .execute(pool.get_ref())
    .await?
    .last_insert_id();

    let sql = format!("SELECT {REASON_COLUMNS} FROM late_login_reasons WHERE id = ?");
    let record = sqlx::query_as::<_, LateLoginReason>(&sql)
        .bind(id)
        .fetch_one(pool.get_ref())
        .await?;

    Ok(HttpResponse::Created().json(record))
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LateReasonQuery {
    pub employee_id: Option<u64>,
    /// "approved", "rejected" or "undecided"
    pub decision: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

/// Admin listing of late-login reasons, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/late-login-reasons",
    params(LateReasonQuery),
    responses(
        (status = 200, description = "Paginated late-login reasons", body = Object),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Late reasons"
)]
pub async fn list_late_reasons(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LateReasonQuery>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let per_page = query.per_page.unwrap_or(20).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let mut where_sql = String::from(" WHERE 1=1");
    let mut ids: Vec<u64> = Vec::new();

    if let Some(emp_id) = query.employee_id {
        where_sql.push_str(" AND employee_id = ?");
        ids.push(emp_id);
    }
    match query.decision.as_deref() {
        Some("approved") => where_sql.push_str(" AND is_approved = TRUE"),
        Some("rejected") => where_sql.push_str(" AND is_approved = FALSE"),
        Some("undecided") => where_sql.push_str(" AND is_approved IS NULL"),
        _ => {}
    }

    let count_sql = format!("SELECT COUNT(*) FROM late_login_reasons{where_sql}");
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for id in &ids {
        count_q = count_q.bind(*id);
    }
    let total = count_q.fetch_one(pool.get_ref()).await?;

    let data_sql = format!(
        "SELECT {REASON_COLUMNS} FROM late_login_reasons{where_sql} \
         ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
    );
    let mut data_q = sqlx::query_as::<_, LateLoginReason>(&data_sql);
    for id in &ids {
        data_q = data_q.bind(*id);
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

#[derive(Deserialize, ToSchema)]
pub struct DecideLateReasonReq {
    pub approved: bool,
}

/// Approve or reject a late-login reason.
#[utoipa::path(
    put,
    path = "/api/v1/late-login-reasons/{reason_id}/approve",
    params(("reason_id" = u64, Path, description = "Late-login reason ID")),
    request_body = DecideLateReasonReq,
    responses(
        (status = 200, description = "Decision recorded", body = Object, example = json!({
            "success": true,
            "approved": true
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Reason not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Late reasons"
)]
pub async fn decide_late_reason(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<DecideLateReasonReq>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;
    let reason_id = path.into_inner();

    let affected = sqlx::query(
        "UPDATE late_login_reasons SET is_approved = ?, approved_by = ? WHERE id = ?",
    )
    .bind(payload.approved)
    .bind(auth.user_id)
    .bind(reason_id)
    .execute(pool.get_ref())
    .await?
    .rows_affected();

    if affected == 0 {
        return Err(ApiError::NotFound("Late-login reason not found".into()));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "approved": payload.approved
    })))
}
