use actix_web::{HttpResponse, get, web};
use tracing::{debug, info, instrument};

use crate::{
    auth::{jwt::generate_access_token, password::verify_password},
    config::Config,
    error::{AppError, AppResult},
    models::{LoginReqDto, LoginResponse},
    store::UserStore,
};

/// Login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Login succeeded", body = LoginResponse),
        (status = 400, description = "Username or password missing"),
        (status = 401, description = "Wrong password"),
        (status = 404, description = "Unknown username"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(users, config, user),
    fields(username = %user.username)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    users: web::Data<dyn UserStore>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    info!("Login request received");

    // 1️⃣ Basic validation
    if user.username.trim().is_empty() || user.password.is_empty() {
        info!("Validation failed: empty username or password");
        return Err(AppError::invalid("Username dan password wajib diisi!"));
    }

    // 2️⃣ Fetch user
    let db_user = users
        .find_by_username(user.username.trim())
        .await?
        .ok_or_else(|| {
            info!("Login failed: user not found");
            AppError::not_found("Username tidak ditemukan.")
        })?;
    debug!(user_id = db_user.id, "User found");

    // 3️⃣ Verify password
    if !verify_password(&user.password, &db_user.password)? {
        info!("Login failed: password mismatch");
        return Err(AppError::InvalidCredentials);
    }

    // 4️⃣ Issue token
    let token = generate_access_token(
        db_user.id,
        db_user.username,
        db_user.role,
        &config.jwt_secret,
        config.access_token_ttl,
    )
    .map_err(|e| AppError::Internal(format!("token issuance failed: {e}")))?;

    info!("Login successful");

    Ok(HttpResponse::Ok().json(LoginResponse {
        status: "success".to_string(),
        message: "Login berhasil".to_string(),
        token,
    }))
}

#[get("/")]
pub async fn index() -> &'static str {
    "Presensi API is running"
}
