use crate::error::PolicyViolation;
use crate::policy;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmployeeStatus {
    Online,
    Offline,
    Leave,
}

impl EmployeeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmployeeStatus::Online => "online",
            EmployeeStatus::Offline => "offline",
            EmployeeStatus::Leave => "leave",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "online" => Some(EmployeeStatus::Online),
            "offline" => Some(EmployeeStatus::Offline),
            "leave" => Some(EmployeeStatus::Leave),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "user_id": 10,
        "first_name": "John",
        "last_name": "Doe",
        "email": "john.doe@company.com",
        "status": "offline",
        "login_time": null,
        "logout_time": null,
        "hours_worked": "0.00",
        "last_activity": null
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 10)]
    pub user_id: u64,

    #[schema(example = "John")]
    pub first_name: String,

    #[schema(example = "Doe")]
    pub last_name: String,

    #[schema(example = "john.doe@company.com")]
    pub email: String,

    #[schema(example = "offline")]
    pub status: String,

    #[schema(value_type = Option<String>, format = "date-time")]
    pub login_time: Option<DateTime<Utc>>,

    #[schema(value_type = Option<String>, format = "date-time")]
    pub logout_time: Option<DateTime<Utc>>,

    #[schema(value_type = String, example = "9.17")]
    pub hours_worked: Decimal,

    #[schema(value_type = Option<String>, format = "date-time")]
    pub last_activity: Option<DateTime<Utc>>,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,

    #[schema(value_type = String, format = "date-time")]
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    fn local_date(ts: Option<DateTime<Utc>>, tz: &FixedOffset) -> Option<NaiveDate> {
        ts.map(|t| t.with_timezone(tz).date_naive())
    }

    /// Start a work session. Guards: no second login on a day already online,
    /// no weekends, only inside the office window.
    pub fn login(&mut self, now: DateTime<FixedOffset>) -> Result<(), PolicyViolation> {
        let today = now.date_naive();
        let tz = *now.offset();

        if self.status == EmployeeStatus::Online.as_str()
            && Self::local_date(self.login_time, &tz) == Some(today)
        {
            return Err(PolicyViolation::new("Already logged in today"));
        }

        if policy::is_weekend(today) {
            return Err(PolicyViolation::new("Cannot login on weekends"));
        }

        if !policy::within_office_window(now.time()) {
            return Err(PolicyViolation::new(
                "Cannot login outside office hours (09:30 - 18:40)",
            ));
        }

        // A logout left over from a previous day is stale for this session.
        if Self::local_date(self.logout_time, &tz)
            .map(|d| d < today)
            .unwrap_or(false)
        {
            self.logout_time = None;
        }

        self.login_time = Some(now.with_timezone(&Utc));
        self.status = EmployeeStatus::Online.as_str().to_string();
        self.last_activity = Some(now.with_timezone(&Utc));
        Ok(())
    }

    /// Close the current work session and recompute worked hours.
    pub fn logout(&mut self, now: DateTime<FixedOffset>) -> Result<(), PolicyViolation> {
        let login_time = match self.login_time {
            Some(t) if self.status == EmployeeStatus::Online.as_str() => t,
            _ => {
                return Err(PolicyViolation::new("Cannot logout without being logged in"));
            }
        };

        if now.with_timezone(&Utc) < login_time {
            return Err(PolicyViolation::new(
                "Logout time cannot be before login time",
            ));
        }

        let tz = *now.offset();
        self.hours_worked = policy::worked_hours(
            login_time.with_timezone(&tz).naive_local(),
            now.naive_local(),
        );
        self.logout_time = Some(now.with_timezone(&Utc));
        self.status = EmployeeStatus::Offline.as_str().to_string();
        self.last_activity = Some(now.with_timezone(&Utc));
        Ok(())
    }

    /// Explicit status transition. The target must be a recognized status and
    /// `online` requires a login time; otherwise intentionally permissive.
    pub fn update_status(&mut self, new_status: &str) -> Result<EmployeeStatus, PolicyViolation> {
        let parsed = EmployeeStatus::parse(new_status)
            .ok_or_else(|| PolicyViolation(format!("Invalid status: {new_status}")))?;

        if parsed == EmployeeStatus::Online && self.login_time.is_none() {
            return Err(PolicyViolation::new(
                "Cannot set status to online without login time",
            ));
        }

        self.status = parsed.as_str().to_string();
        Ok(parsed)
    }

    /// Status implied by the login/logout timestamps alone. Read-side only:
    /// explicit transitions own the stored status, this never overwrites it.
    pub fn derived_status(&self, today: NaiveDate, tz: &FixedOffset) -> EmployeeStatus {
        let login_today = Self::local_date(self.login_time, tz) == Some(today);
        let logout_today = Self::local_date(self.logout_time, tz) == Some(today);

        if login_today && self.logout_time.is_none() {
            EmployeeStatus::Online
        } else if logout_today {
            EmployeeStatus::Offline
        } else {
            EmployeeStatus::Leave
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn tz() -> FixedOffset {
        FixedOffset::east_opt(6 * 3600).unwrap()
    }

    fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<FixedOffset> {
        tz().with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn employee() -> Employee {
        Employee {
            id: 1,
            user_id: 1,
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            email: "jane@company.com".into(),
            status: "offline".into(),
            login_time: None,
            logout_time: None,
            hours_worked: Decimal::ZERO,
            last_activity: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn login_inside_window_goes_online() {
        let mut emp = employee();
        // 2025-06-16 is a Monday.
        emp.login(local(2025, 6, 16, 10, 0)).unwrap();
        assert_eq!(emp.status, "online");
        assert!(emp.login_time.is_some());
    }

    #[test]
    fn second_login_same_day_rejected() {
        let mut emp = employee();
        emp.login(local(2025, 6, 16, 10, 0)).unwrap();
        let err = emp.login(local(2025, 6, 16, 11, 0)).unwrap_err();
        assert_eq!(err, PolicyViolation::new("Already logged in today"));
    }

    #[test]
    fn weekend_login_rejected_any_time() {
        let mut emp = employee();
        // Saturday, inside the office window.
        assert!(emp.login(local(2025, 6, 14, 10, 0)).is_err());
        // Sunday.
        assert!(emp.login(local(2025, 6, 15, 14, 0)).is_err());
    }

    #[test]
    fn login_outside_window_rejected() {
        let mut emp = employee();
        assert!(emp.login(local(2025, 6, 16, 9, 0)).is_err());
        assert!(emp.login(local(2025, 6, 16, 19, 0)).is_err());
    }

    #[test]
    fn login_clears_stale_logout() {
        let mut emp = employee();
        emp.logout_time = Some(local(2025, 6, 13, 17, 0).with_timezone(&Utc));
        emp.login(local(2025, 6, 16, 10, 0)).unwrap();
        assert!(emp.logout_time.is_none());
    }

    #[test]
    fn logout_without_login_rejected() {
        let mut emp = employee();
        assert!(emp.logout(local(2025, 6, 16, 17, 0)).is_err());
    }

    #[test]
    fn logout_before_login_rejected() {
        let mut emp = employee();
        emp.login(local(2025, 6, 16, 12, 0)).unwrap();
        assert!(emp.logout(local(2025, 6, 16, 11, 0)).is_err());
    }

    #[test]
    fn overlong_day_is_capped() {
        let mut emp = employee();
        emp.status = "online".into();
        emp.login_time = Some(local(2025, 6, 16, 9, 25).with_timezone(&Utc));
        emp.logout(local(2025, 6, 16, 19, 0)).unwrap();
        assert_eq!(emp.hours_worked, dec!(9.17));
        assert_eq!(emp.status, "offline");
    }

    #[test]
    fn plain_session_hours() {
        let mut emp = employee();
        emp.login(local(2025, 6, 16, 10, 0)).unwrap();
        emp.logout(local(2025, 6, 16, 16, 0)).unwrap();
        assert_eq!(emp.hours_worked, dec!(6.00));
        assert_eq!(emp.status, "offline");
    }

    #[test]
    fn update_status_guards() {
        let mut emp = employee();
        assert!(emp.update_status("away").is_err());
        assert!(emp.update_status("online").is_err());
        emp.update_status("leave").unwrap();
        assert_eq!(emp.status, "leave");
        emp.login_time = Some(Utc::now());
        emp.update_status("online").unwrap();
        assert_eq!(emp.status, "online");
    }

    #[test]
    fn derived_status_follows_timestamps() {
        let tz = tz();
        let today = NaiveDate::from_ymd_opt(2025, 6, 16).unwrap();

        let mut emp = employee();
        assert_eq!(emp.derived_status(today, &tz), EmployeeStatus::Leave);

        emp.login_time = Some(local(2025, 6, 16, 10, 0).with_timezone(&Utc));
        assert_eq!(emp.derived_status(today, &tz), EmployeeStatus::Online);

        emp.logout_time = Some(local(2025, 6, 16, 17, 0).with_timezone(&Utc));
        assert_eq!(emp.derived_status(today, &tz), EmployeeStatus::Offline);
    }
}
