use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

/// Rejection of an operation by a business rule. Terminal for the request,
/// never retried.
#[derive(Debug, Display, PartialEq, Eq)]
#[display(fmt = "{}", _0)]
pub struct PolicyViolation(pub String);

impl PolicyViolation {
    pub fn new(msg: impl Into<String>) -> Self {
        PolicyViolation(msg.into())
    }
}

/// Crate-wide error taxonomy surfaced to API callers as JSON bodies.
#[derive(Debug, Display)]
pub enum ApiError {
    #[display(fmt = "{}", _0)]
    Policy(String),

    #[display(fmt = "{}", _0)]
    NotFound(String),

    /// Field-level validation failure, rendered as `{field: [message]}`.
    #[display(fmt = "{}: {}", field, message)]
    Validation {
        field: &'static str,
        message: &'static str,
    },

    #[display(fmt = "{}", _0)]
    Forbidden(&'static str),

    #[display(fmt = "{}", _0)]
    Unauthorized(&'static str),

    #[display(fmt = "Internal Server Error")]
    Internal,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Policy(_) | ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ApiError::Validation { field, message } => {
                let mut map = serde_json::Map::new();
                map.insert((*field).to_string(), json!([message]));
                serde_json::Value::Object(map)
            }
            ApiError::Internal => json!({ "error": "Internal Server Error" }),
            other => json!({ "error": other.to_string() }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<PolicyViolation> for ApiError {
    fn from(e: PolicyViolation) -> Self {
        ApiError::Policy(e.0)
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        tracing::error!(error = %e, "Database error");
        ApiError::Internal
    }
}

/// True when a database error is a unique-key violation (SQLSTATE 23000),
/// used to turn constraint enforcement into policy errors.
pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = e {
        return db_err.code().as_deref() == Some("23000");
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(
            ApiError::Policy("late".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Validation {
                field: "late_reason",
                message: "This field is required."
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::NotFound("employee".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Forbidden("admin only").status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(ApiError::Internal.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn policy_violation_converts_to_bad_request() {
        let err: ApiError = PolicyViolation::new("Cannot login on weekends").into();
        match err {
            ApiError::Policy(msg) => assert_eq!(msg, "Cannot login on weekends"),
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
