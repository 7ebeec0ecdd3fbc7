use crate::{
    api::{attendance, user},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
    error::AppError,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let cfg = GovernorConfigBuilder::default()
        .milliseconds_per_request((60_000 / requests_per_min as u64).max(1))
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("period and burst size are non-zero");
    Governor::new(&cfg)
}

/// Body and query extraction failures answer with the same JSON error shape
/// as handler validation.
fn extractor_configs(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::invalid(format!("Body tidak valid: {err}")).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::invalid(format!("Query tidak valid: {err}")).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| AppError::invalid(format!("Parameter tidak valid: {err}")).into()),
    );
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    extractor_configs(cfg);

    cfg.service(handlers::index);

    cfg.service(
        web::scope(&config.api_prefix)
            // Public routes
            .service(
                web::scope("/auth").service(
                    web::resource("/login")
                        .wrap(login_limiter)
                        .route(web::post().to(handlers::login)),
                ),
            )
            // Protected routes
            .service(
                web::scope("")
                    .wrap(from_fn(auth_middleware)) // authentication
                    .wrap(protected_limiter) // rate limiting
                    .service(
                        web::scope("/users")
                            // /users
                            .service(
                                web::resource("")
                                    .route(web::post().to(user::create_user))
                                    .route(web::get().to(user::list_users)),
                            )
                            // /users/{id}
                            .service(
                                web::resource("/{id}")
                                    .route(web::get().to(user::get_user))
                                    .route(web::put().to(user::update_user))
                                    .route(web::delete().to(user::delete_user)),
                            ),
                    )
                    .service(
                        web::scope("/attendance")
                            // /attendance
                            .service(
                                web::resource("").route(web::post().to(attendance::record_attendance)),
                            )
                            .service(
                                web::resource("/check-in").route(web::post().to(attendance::check_in)),
                            )
                            .service(
                                web::resource("/history/{user_id}")
                                    .route(web::get().to(attendance::history)),
                            )
                            .service(
                                web::resource("/summary/{user_id}")
                                    .route(web::get().to(attendance::summary)),
                            )
                            .service(
                                web::resource("/analysis").route(web::post().to(attendance::analysis)),
                            ),
                    ),
            ),
    );
}

// LOGIN
//  └─ token {id, username, role}, default 3 h

// API REQUEST
//  └─ Authorization: Bearer token
//       ├─ missing / invalid / expired → 403
//       └─ role != karyawan            → 403
