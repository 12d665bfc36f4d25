use crate::api::attendance::{AttendanceFilter, PunchInReq, PunchOutReq};
use crate::api::employee::{EmployeeListResponse, EmployeeQuery, UpdateStatusReq};
use crate::api::late_reason::{CreateLateReasonReq, DecideLateReasonReq, LateReasonQuery};
use crate::api::report::{AdminReplyReq, CreateReportReq, ReportQuery};
use crate::model::employee::{Employee, EmployeeStatus};
use crate::model::event::AttendanceEvent;
use crate::model::late_reason::LateLoginReason;
use crate::model::report::{AdminReply, DailyWorkReport, ReportStatus};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HR Attendance API",
        version = "1.0.0",
        description = r#"
## HR Attendance Tracking

This API powers an attendance-tracking backend for HR teams.

### 🔹 Key Features
- **Work sessions**
  - Daily login/logout with office-hours policy and worked-hours tracking
- **Punch cycles**
  - Punch-in/punch-out pairs with late-arrival reasons and running hours
- **Daily work reports**
  - One report per employee per day, with threaded admin replies
- **Admin views**
  - Attendance summaries, today's roster, punch record listings

### 🔐 Security
Most endpoints are protected using **JWT Bearer authentication**.
Admin-only views require an **Admin** or **Superuser** role.

### 📦 Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::employee::session_login,
        crate::api::employee::session_logout,
        crate::api::employee::update_status,
        crate::api::employee::list_employees,
        crate::api::employee::today_attendance,
        crate::api::employee::summary,

        crate::api::attendance::punch_in,
        crate::api::attendance::punch_out,
        crate::api::attendance::punch_status,
        crate::api::attendance::hr_attendance,

        crate::api::report::create_report,
        crate::api::report::list_reports,
        crate::api::report::admin_reply,
        crate::api::report::report_replies,
        crate::api::report::admin_report_overview,

        crate::api::late_reason::create_late_reason,
        crate::api::late_reason::list_late_reasons,
        crate::api::late_reason::decide_late_reason
    ),
    components(
        schemas(
            Employee,
            EmployeeStatus,
            EmployeeQuery,
            EmployeeListResponse,
            UpdateStatusReq,
            AttendanceEvent,
            AttendanceFilter,
            PunchInReq,
            PunchOutReq,
            DailyWorkReport,
            ReportStatus,
            AdminReply,
            CreateReportReq,
            ReportQuery,
            AdminReplyReq,
            LateLoginReason,
            CreateLateReasonReq,
            LateReasonQuery,
            DecideLateReasonReq
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Employee", description = "Work sessions and admin roster views"),
        (name = "Attendance", description = "Punch cycles and punch record listings"),
        (name = "Reports", description = "Daily work reports and admin replies"),
        (name = "Late reasons", description = "Late-login reason submissions and decisions"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
