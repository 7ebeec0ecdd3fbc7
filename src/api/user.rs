use actix_web::{HttpResponse, web};
use serde::Deserialize;
use tracing::{error, info, instrument};
use utoipa::ToSchema;

use crate::{
    auth::{auth::AuthUser, password::hash_password},
    error::{AppError, AppResult},
    model::user::{NewUser, UserProfile},
    models::ApiResponse,
    store::UserStore,
    utils::validation::present,
};

/// Body of create and update; every field is required.
#[derive(Deserialize, ToSchema)]
pub struct UserPayload {
    #[schema(example = "Budi Santoso")]
    pub name: Option<String>,
    #[schema(example = "budi")]
    pub username: Option<String>,
    /// Plain-text password, also accepted as `sandi`.
    #[serde(alias = "sandi")]
    #[schema(example = "rahasia123")]
    pub password: Option<String>,
    #[schema(example = "karyawan")]
    pub role: Option<String>,
}

struct ValidUser<'a> {
    name: &'a str,
    username: &'a str,
    password: &'a str,
    role: &'a str,
}

impl UserPayload {
    fn validate(&self) -> AppResult<ValidUser<'_>> {
        match (
            present(&self.name),
            present(&self.username),
            self.password.as_deref().filter(|p| !p.is_empty()),
            present(&self.role),
        ) {
            (Some(name), Some(username), Some(password), Some(role)) => Ok(ValidUser {
                name,
                username,
                password,
                role,
            }),
            _ => Err(AppError::invalid("Semua data wajib diisi!")),
        }
    }
}

impl ValidUser<'_> {
    fn into_new_user(self) -> AppResult<NewUser> {
        Ok(NewUser {
            name: self.name.to_string(),
            username: self.username.to_string(),
            password_hash: hash_password(self.password)?,
            role: self.role.to_string(),
        })
    }
}

fn username_taken() -> AppError {
    AppError::Conflict("Username sudah digunakan. Gunakan username lain.".into())
}

/// MySQL duplicate-key (SQLSTATE 23000) raised when a concurrent request took
/// the username between the check and the write.
fn is_duplicate_key(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23000"))
}

/// Create user
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = UserPayload,
    responses(
        (status = 200, description = "User created", body = UserProfile),
        (status = 400, description = "Missing fields or username taken", body = Object, example = json!({
            "status": "error",
            "message": "Username sudah digunakan. Gunakan username lain."
        })),
        (status = 403, description = "Missing/invalid token or wrong role"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
#[instrument(name = "create_user", skip_all, fields(actor = auth.id))]
pub async fn create_user(
    auth: AuthUser,
    users: web::Data<dyn UserStore>,
    payload: web::Json<UserPayload>,
) -> AppResult<HttpResponse> {
    // A taken username is reported even when other fields are missing.
    if let Some(username) = present(&payload.username) {
        if users.username_taken(username, None).await? {
            info!(username, "Rejected duplicate username");
            return Err(username_taken());
        }
    }

    let new_user = payload.validate()?.into_new_user()?;
    let id = users.insert(&new_user).await.map_err(|e| {
        if is_duplicate_key(&e) {
            username_taken()
        } else {
            error!(error = %e, "Failed to insert user");
            AppError::from(e)
        }
    })?;

    info!(user_id = id, "User created");

    Ok(HttpResponse::Ok().json(ApiResponse::with_message(
        "Pengguna berhasil ditambahkan",
        UserProfile {
            id,
            name: new_user.name,
            username: new_user.username,
            role: new_user.role,
        },
    )))
}

/// Get user by id
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id", Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = UserProfile),
        (status = 404, description = "User not found"),
        (status = 403, description = "Missing/invalid token or wrong role"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn get_user(
    users: web::Data<dyn UserStore>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    let user = users
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Pengguna tidak ditemukan."))?;

    Ok(HttpResponse::Ok().json(ApiResponse::data(user)))
}

/// List users
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "All users", body = [UserProfile]),
        (status = 404, description = "No users exist"),
        (status = 403, description = "Missing/invalid token or wrong role"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn list_users(users: web::Data<dyn UserStore>) -> AppResult<HttpResponse> {
    let all = users.list().await?;

    if all.is_empty() {
        return Err(AppError::not_found("Tidak ada pengguna ditemukan."));
    }

    Ok(HttpResponse::Ok().json(ApiResponse::data(all)))
}

/// Update user
///
/// Keeping the current username is allowed; only a username owned by a
/// different user is rejected.
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id", Path, description = "User ID")),
    request_body = UserPayload,
    responses(
        (status = 200, description = "User updated", body = UserProfile),
        (status = 400, description = "Missing fields or username taken"),
        (status = 404, description = "User not found"),
        (status = 403, description = "Missing/invalid token or wrong role"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
#[instrument(name = "update_user", skip_all, fields(actor = auth.id, user_id = *path))]
pub async fn update_user(
    auth: AuthUser,
    users: web::Data<dyn UserStore>,
    path: web::Path<u64>,
    payload: web::Json<UserPayload>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let valid = payload.validate()?;

    if users.username_taken(valid.username, Some(id)).await? {
        info!(username = valid.username, "Rejected duplicate username");
        return Err(username_taken());
    }

    let new_user = valid.into_new_user()?;
    let updated = users.update(id, &new_user).await.map_err(|e| {
        if is_duplicate_key(&e) {
            username_taken()
        } else {
            AppError::from(e)
        }
    })?;

    if !updated {
        return Err(AppError::not_found("Pengguna tidak ditemukan."));
    }

    info!("User updated");

    Ok(HttpResponse::Ok().json(ApiResponse::with_message(
        "Pengguna berhasil diubah",
        UserProfile {
            id,
            name: new_user.name,
            username: new_user.username,
            role: new_user.role,
        },
    )))
}

/// Delete user
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id", Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted", body = Object, example = json!({
            "status": "success",
            "message": "Pengguna berhasil dihapus"
        })),
        (status = 404, description = "User not found"),
        (status = 403, description = "Missing/invalid token or wrong role"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
#[instrument(name = "delete_user", skip_all, fields(actor = auth.id, user_id = *path))]
pub async fn delete_user(
    auth: AuthUser,
    users: web::Data<dyn UserStore>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    if !users.delete(id).await? {
        return Err(AppError::not_found("Pengguna tidak ditemukan."));
    }

    info!("User deleted");

    Ok(HttpResponse::Ok().json(ApiResponse::message("Pengguna berhasil dihapus")))
}

#[cfg(test)]
mod tests {
    use crate::store::memory::MemoryStore;
    use crate::test_support::{app, bearer, with_peer};
    use actix_web::{http::StatusCode, test};
    use serde_json::{Value, json};
    use std::sync::Arc;

    fn user_body(username: &str) -> Value {
        json!({
            "name": "Budi",
            "username": username,
            "password": "rahasia123",
            "role": "karyawan"
        })
    }

    #[actix_web::test]
    async fn create_then_read_back() {
        let app = test::init_service(app(Arc::new(MemoryStore::default()))).await;

        let req = with_peer(test::TestRequest::post().uri("/api/users"))
            .insert_header(bearer("karyawan"))
            .set_json(user_body("budi"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["username"], "budi");
        assert!(body["data"].get("password").is_none());
        let id = body["data"]["id"].as_u64().unwrap();

        let req = with_peer(test::TestRequest::get().uri(&format!("/api/users/{id}")))
            .insert_header(bearer("karyawan"))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["name"], "Budi");
        assert_eq!(body["data"]["role"], "karyawan");
    }

    #[actix_web::test]
    async fn duplicate_username_is_rejected_with_400() {
        let app = test::init_service(app(Arc::new(MemoryStore::default()))).await;

        for expected in [StatusCode::OK, StatusCode::BAD_REQUEST] {
            let req = with_peer(test::TestRequest::post().uri("/api/users"))
                .insert_header(bearer("karyawan"))
                .set_json(user_body("budi"))
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), expected);
        }
    }

    #[actix_web::test]
    async fn taken_username_wins_over_missing_fields() {
        let app = test::init_service(app(Arc::new(MemoryStore::default()))).await;

        let req = with_peer(test::TestRequest::post().uri("/api/users"))
            .insert_header(bearer("karyawan"))
            .set_json(user_body("budi"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = with_peer(test::TestRequest::post().uri("/api/users"))
            .insert_header(bearer("karyawan"))
            .set_json(json!({"name": "B", "username": "budi", "role": "karyawan"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Username sudah digunakan. Gunakan username lain.");
    }

    #[actix_web::test]
    async fn missing_fields_are_rejected() {
        let app = test::init_service(app(Arc::new(MemoryStore::default()))).await;

        let req = with_peer(test::TestRequest::post().uri("/api/users"))
            .insert_header(bearer("karyawan"))
            .set_json(json!({"name": "Budi", "username": "budi", "role": "karyawan"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Semua data wajib diisi!");
    }

    #[actix_web::test]
    async fn update_keeps_own_username_but_not_anothers() {
        let app = test::init_service(app(Arc::new(MemoryStore::default()))).await;

        for username in ["budi", "citra"] {
            let req = with_peer(test::TestRequest::post().uri("/api/users"))
                .insert_header(bearer("karyawan"))
                .set_json(user_body(username))
                .to_request();
            test::call_service(&app, req).await;
        }

        // legacy `sandi` field name
        let req = with_peer(test::TestRequest::put().uri("/api/users/1"))
            .insert_header(bearer("karyawan"))
            .set_json(json!({"name": "Budi S", "username": "budi", "sandi": "baru", "role": "karyawan"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["name"], "Budi S");

        let req = with_peer(test::TestRequest::put().uri("/api/users/1"))
            .insert_header(bearer("karyawan"))
            .set_json(user_body("citra"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = with_peer(test::TestRequest::put().uri("/api/users/99"))
            .insert_header(bearer("karyawan"))
            .set_json(user_body("dewi"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn list_and_delete() {
        let app = test::init_service(app(Arc::new(MemoryStore::default()))).await;

        let list = || {
            with_peer(test::TestRequest::get().uri("/api/users"))
                .insert_header(bearer("karyawan"))
                .to_request()
        };
        assert_eq!(test::call_service(&app, list()).await.status(), StatusCode::NOT_FOUND);

        let req = with_peer(test::TestRequest::post().uri("/api/users"))
            .insert_header(bearer("karyawan"))
            .set_json(user_body("budi"))
            .to_request();
        test::call_service(&app, req).await;

        let body: Value = test::call_and_read_body_json(&app, list()).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let delete = || {
            with_peer(test::TestRequest::delete().uri("/api/users/1"))
                .insert_header(bearer("karyawan"))
                .to_request()
        };
        assert_eq!(test::call_service(&app, delete()).await.status(), StatusCode::OK);
        assert_eq!(test::call_service(&app, delete()).await.status(), StatusCode::NOT_FOUND);

        let req = with_peer(test::TestRequest::get().uri("/api/users/1"))
            .insert_header(bearer("karyawan"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn store_failure_is_500() {
        let app = test::init_service(app(Arc::new(MemoryStore::failing()))).await;

        let req = with_peer(test::TestRequest::get().uri("/api/users"))
            .insert_header(bearer("karyawan"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Terjadi kesalahan pada server.");
    }
}
