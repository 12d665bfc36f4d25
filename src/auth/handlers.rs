use crate::{
    auth::{
        jwt::{generate_access_token, generate_refresh_token, verify_token},
        password::{hash_password, verify_password},
    },
    config::Config,
    error::{ApiError, is_unique_violation},
    models::{LoginReqDto, RegisterReq, TokenType, UserSql},
};
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error, info, instrument};

/// User registration handler. When the payload carries an email, an employee
/// profile is created in the same transaction and linked to the account.
pub async fn register(
    user: web::Json<RegisterReq>,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, ApiError> {
    let username = user.username.trim().to_lowercase();
    if username.is_empty() || user.password.is_empty() {
        return Err(ApiError::Validation {
            field: "username",
            message: "Username and password must not be empty",
        });
    }

    let hashed = hash_password(&user.password).map_err(|e| {
        error!(error = %e, "Failed to hash password");
        ApiError::Internal
    })?;

    let mut tx = pool.begin().await?;

    let result = sqlx::query("INSERT INTO users (username, password, role_id) VALUES (?, ?, ?)")
        .bind(&username)
        .bind(&hashed)
        .bind(user.role_id)
        .execute(&mut *tx)
        .await;

    let user_id = match result {
        Ok(r) => r.last_insert_id(),
        Err(e) if is_unique_violation(&e) => {
            return Ok(HttpResponse::Conflict().json(json!({
                "error": "Username already exists"
            })));
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(email) = user.email.as_deref().filter(|e| !e.trim().is_empty()) {
        let result = sqlx::query(
            "INSERT INTO employees (user_id, first_name, last_name, email) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(user.first_name.as_deref().unwrap_or(""))
        .bind(user.last_name.as_deref().unwrap_or(""))
        .bind(email.trim())
        .execute(&mut *tx)
        .await;

        let employee_id = match result {
            Ok(r) => r.last_insert_id(),
            Err(e) if is_unique_violation(&e) => {
                return Ok(HttpResponse::Conflict().json(json!({
                    "error": "Email already linked to an employee"
                })));
            }
            Err(e) => return Err(e.into()),
        };

        sqlx::query("UPDATE users SET employee_id = ? WHERE id = ?")
            .bind(employee_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "User registered successfully"
    })))
}

#[derive(Serialize, Deserialize)]
struct LoginResponse {
    access_token: String,
    refresh_token: String,
}

#[instrument(
    name = "auth_login",
    skip(pool, config, user),
    fields(username = %user.username)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    info!("Login request received");

    if user.username.trim().is_empty() || user.password.is_empty() {
        info!("Validation failed: empty username or password");
        return Err(ApiError::Validation {
            field: "username",
            message: "Username or password required",
        });
    }

    debug!("Fetching user from database");

    let db_user = sqlx::query_as::<_, UserSql>(
        r#"
        SELECT id, username, password, role_id, employee_id
        FROM users
        WHERE username = ?
        "#,
    )
    .bind(&user.username)
    .fetch_optional(pool.get_ref())
    .await?;

    let db_user = match db_user {
        Some(u) => u,
        None => {
            info!("Invalid credentials: user not found");
            return Err(ApiError::Unauthorized("Invalid credentials"));
        }
    };

    if let Err(e) = verify_password(&user.password, &db_user.password) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return Err(ApiError::Unauthorized("Invalid credentials"));
    }

    let access_token = generate_access_token(
        db_user.id,
        db_user.username.clone(),
        db_user.role_id,
        db_user.employee_id,
        &config.jwt_secret,
        config.access_token_ttl,
    );

    let (refresh_token, refresh_claims) = generate_refresh_token(
        db_user.id,
        db_user.username.clone(),
        db_user.role_id,
        db_user.employee_id,
        &config.jwt_secret,
        config.refresh_token_ttl,
    );

    debug!(user_id = db_user.id, jti = %refresh_claims.jti, "Storing refresh token");

    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (user_id, jti, expires_at)
        VALUES (?, ?, FROM_UNIXTIME(?))
        "#,
    )
    .bind(db_user.id)
    .bind(&refresh_claims.jti)
    .bind(refresh_claims.exp as i64)
    .execute(pool.get_ref())
    .await?;

    // Non-fatal bookkeeping.
    if let Err(e) = sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = ?")
        .bind(db_user.id)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to update last_login_at");
    }

    info!("Login successful");

    Ok(HttpResponse::Ok().json(LoginResponse {
        access_token,
        refresh_token,
    }))
}

#[derive(sqlx::FromRow)]
struct RefreshRow {
    id: u64,
    user_id: u64,
    revoked: bool,
}

pub async fn refresh_token(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let token = bearer_token(&req).ok_or(ApiError::Unauthorized("No token"))?;

    let claims =
        verify_token(token, &config.jwt_secret).map_err(|_| ApiError::Unauthorized("Invalid token"))?;

    if claims.token_type != TokenType::Refresh {
        return Err(ApiError::Unauthorized("Refresh token required"));
    }

    let record = sqlx::query_as::<_, RefreshRow>(
        "SELECT id, user_id, revoked FROM refresh_tokens WHERE jti = ?",
    )
    .bind(&claims.jti)
    .fetch_optional(pool.get_ref())
    .await?;

    let record = match record {
        Some(r) if !r.revoked => r,
        _ => return Err(ApiError::Unauthorized("Refresh token revoked")),
    };

    // Rotation: old jti is dead as soon as a new pair is issued.
    sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE id = ?")
        .bind(record.id)
        .execute(pool.get_ref())
        .await?;

    let (new_refresh_token, new_claims) = generate_refresh_token(
        claims.user_id,
        claims.sub.clone(),
        claims.role,
        claims.employee_id,
        &config.jwt_secret,
        config.refresh_token_ttl,
    );

    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (user_id, jti, expires_at)
        VALUES (?, ?, FROM_UNIXTIME(?))
        "#,
    )
    .bind(record.user_id)
    .bind(&new_claims.jti)
    .bind(new_claims.exp as i64)
    .execute(pool.get_ref())
    .await?;

    let access_token = generate_access_token(
        claims.user_id,
        claims.sub,
        claims.role,
        claims.employee_id,
        &config.jwt_secret,
        config.access_token_ttl,
    );

    Ok(HttpResponse::Ok().json(json!({
        "access_token": access_token,
        "refresh_token": new_refresh_token
    })))
}

/// Revokes the presented refresh token. Idempotent: succeeds even when the
/// token is missing, invalid, or already revoked.
pub async fn logout(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    let token = match bearer_token(&req) {
        Some(t) => t,
        None => return HttpResponse::NoContent().finish(),
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(_) => return HttpResponse::NoContent().finish(),
    };

    if claims.token_type != TokenType::Refresh {
        return HttpResponse::NoContent().finish();
    }

    let _ = sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE jti = ?")
        .bind(&claims.jti)
        .execute(pool.get_ref())
        .await;

    HttpResponse::NoContent().finish()
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}
