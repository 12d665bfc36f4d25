use crate::config::Config;
use crate::error::ApiError;
use crate::{model::role::Role, models::Claims};
use actix_web::{FromRequest, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};
use jsonwebtoken::decode;
use jsonwebtoken::{DecodingKey, Validation};

pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ApiError::Unauthorized("Missing token"))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => return ready(Err(ApiError::Internal)),
        };

        let data = match decode::<Claims>(
            token,
            &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            &Validation::default(),
        ) {
            Ok(d) => d,
            Err(_) => return ready(Err(ApiError::Unauthorized("Invalid token"))),
        };

        let role = match Role::from_id(data.claims.role) {
            Some(r) => r,
            None => return ready(Err(ApiError::Unauthorized("Invalid role"))),
        };

        ready(Ok(AuthUser {
            user_id: data.claims.user_id,
            username: data.claims.sub,
            role,
            employee_id: data.claims.employee_id,
        }))
    }
}

impl AuthUser {
    /// Single admin capability check; replaces ad hoc staff/superuser tests.
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Admin only"))
        }
    }

    /// Self-or-admin: the caller may act on the given employee record.
    pub fn authorize_employee(&self, employee_id: u64) -> Result<(), ApiError> {
        if self.role.is_admin() || self.employee_id == Some(employee_id) {
            Ok(())
        } else {
            Err(ApiError::Forbidden(
                "You can only act on your own attendance record",
            ))
        }
    }

    /// The caller's own employee id; fails for accounts without a profile.
    pub fn own_employee_id(&self) -> Result<u64, ApiError> {
        self.employee_id
            .ok_or(ApiError::Forbidden("No employee profile"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role, employee_id: Option<u64>) -> AuthUser {
        AuthUser {
            user_id: 1,
            username: "jane".into(),
            role,
            employee_id,
        }
    }

    #[test]
    fn admin_capability_gate() {
        assert!(user(Role::Admin, None).require_admin().is_ok());
        assert!(user(Role::Superuser, None).require_admin().is_ok());
        assert!(user(Role::Employee, Some(1)).require_admin().is_err());
    }

    #[test]
    fn self_or_admin_gate() {
        assert!(user(Role::Employee, Some(5)).authorize_employee(5).is_ok());
        assert!(user(Role::Employee, Some(5)).authorize_employee(6).is_err());
        assert!(user(Role::Admin, None).authorize_employee(6).is_ok());
    }

    #[test]
    fn own_employee_required() {
        assert_eq!(user(Role::Employee, Some(5)).own_employee_id().unwrap(), 5);
        assert!(user(Role::Employee, None).own_employee_id().is_err());
    }
}
