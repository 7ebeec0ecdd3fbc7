use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, ResponseError,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use tracing::debug;

use crate::auth::auth::AuthUser;
use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::error::AppError;
use crate::model::role;

/// Resolves the bearer token into an [`AuthUser`] or short-circuits with 403.
fn authenticate(req: &ServiceRequest, config: &Config) -> Result<AuthUser, AppError> {
    let header_value = req
        .headers()
        .get("Authorization")
        .ok_or_else(|| AppError::Unauthorized("Token tidak ditemukan, akses ditolak!".into()))?
        .to_str()
        .map_err(|_| AppError::Unauthorized("Token tidak valid!".into()))?;

    let token = header_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Token tidak valid!".into()))?;

    let claims = verify_token(token, &config.jwt_secret).map_err(|e| {
        debug!(error = %e, "Rejected bearer token");
        AppError::Unauthorized("Token tidak valid!".into())
    })?;

    if !role::is_privileged(&claims.role) {
        return Err(AppError::Forbidden(
            "Akses ditolak! Hanya karyawan yang dapat mengakses rute ini.".into(),
        ));
    }

    Ok(claims.into())
}

pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| AppError::Internal("App config missing".into()))?
        .clone();

    match authenticate(&req, &config) {
        Ok(auth_user) => {
            debug!(
                user_id = auth_user.id,
                username = %auth_user.username,
                role = %auth_user.role,
                "Authenticated request"
            );
            req.extensions_mut().insert(auth_user);
            next.call(req).await
        }
        Err(e) => {
            let resp = e.error_response();
            Ok(req.into_response(resp))
        }
    }
}
