use crate::{
    api::{attendance, employee, late_reason, report},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(register_limiter.clone())
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/employees")
                    // /employees
                    .service(web::resource("").route(web::get().to(employee::list_employees)))
                    // fixed segments before the {id} routes
                    .service(web::resource("/summary").route(web::get().to(employee::summary)))
                    .service(
                        web::resource("/today").route(web::get().to(employee::today_attendance)),
                    )
                    .service(
                        web::resource("/{id}/login")
                            .route(web::post().to(employee::session_login)),
                    )
                    .service(
                        web::resource("/{id}/logout")
                            .route(web::post().to(employee::session_logout)),
                    )
                    .service(
                        web::resource("/{id}/status")
                            .route(web::post().to(employee::update_status)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    .service(
                        web::resource("/status").route(web::get().to(attendance::punch_status)),
                    )
                    .service(
                        web::resource("/{id}/punch-in")
                            .route(web::post().to(attendance::punch_in)),
                    )
                    .service(
                        web::resource("/{id}/punch-out")
                            .route(web::post().to(attendance::punch_out)),
                    ),
            )
            .service(
                web::scope("/hr").service(
                    web::resource("/attendance").route(web::get().to(attendance::hr_attendance)),
                ),
            )
            .service(
                web::scope("/reports")
                    // /reports
                    .service(
                        web::resource("")
                            .route(web::post().to(report::create_report))
                            .route(web::get().to(report::list_reports)),
                    )
                    // /reports/{id}/reply
                    .service(
                        web::resource("/{id}/reply").route(web::post().to(report::admin_reply)),
                    )
                    // /reports/{id}/replies
                    .service(
                        web::resource("/{id}/replies")
                            .route(web::get().to(report::report_replies)),
                    ),
            )
            .service(
                web::scope("/admin").service(
                    web::resource("/reports/employees")
                        .route(web::get().to(report::admin_report_overview)),
                ),
            )
            .service(
                web::scope("/late-login-reasons")
                    .service(
                        web::resource("")
                            .route(web::post().to(late_reason::create_late_reason))
                            .route(web::get().to(late_reason::list_late_reasons)),
                    )
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(late_reason::decide_late_reason)),
                    ),
            ),
    );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)
//
// API REQUEST
//  └─ Authorization: Bearer access_token
//
// ACCESS EXPIRED
//  └─ POST /refresh with refresh_token
//       └─ returns new access_token
