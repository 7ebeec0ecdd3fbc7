//! Shared fixtures for handler tests.

use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::{
    App, Error,
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    test, web,
};

use crate::auth::jwt::generate_access_token;
use crate::config::Config;
use crate::routes;
use crate::store::memory::MemoryStore;
use crate::store::{AttendanceStore, UserStore};

pub fn test_config() -> Config {
    Config {
        database_url: "mysql://unused".into(),
        db_max_connections: 1,
        jwt_secret: "test-secret".into(),
        server_addr: "127.0.0.1:0".into(),
        access_token_ttl: 600,
        rate_login_per_min: 1000,
        rate_protected_per_min: 1000,
        api_prefix: "/api".into(),
        log_dir: "logs".into(),
        log_level: tracing::Level::DEBUG,
    }
}

pub fn bearer(role: &str) -> (&'static str, String) {
    let config = test_config();
    let token = generate_access_token(1, "tester".into(), role.into(), &config.jwt_secret, 600)
        .expect("token");
    ("Authorization", format!("Bearer {token}"))
}

/// Full application wired to one in-memory store.
pub fn app(
    store: Arc<MemoryStore>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
> {
    let config = test_config();
    let users: Arc<dyn UserStore> = store.clone();
    let attendance: Arc<dyn AttendanceStore> = store;

    App::new()
        .app_data(web::Data::from(users))
        .app_data(web::Data::from(attendance))
        .app_data(web::Data::new(config.clone()))
        .configure(|cfg| routes::configure(cfg, config))
}

/// Rate limiting keys on the peer address, which test requests lack by default.
pub fn with_peer(req: test::TestRequest) -> test::TestRequest {
    req.peer_addr(SocketAddr::from(([127, 0, 0, 1], 40000)))
}
