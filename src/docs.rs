use crate::api::attendance::{
    AnalysisRequest, AttendanceCreated, CheckIn, CheckInCreated, CreateAttendance,
};
use crate::api::user::UserPayload;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::user::UserProfile;
use crate::models::{LoginReqDto, LoginResponse};
use crate::reporting::{
    AnalysisPeriod, AttendanceRate, GroupAnalysis, GroupedAnalysis, MonthlySummary, StatusTotals,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Presensi API",
        version = "1.0.0",
        description = r#"
## Employee Attendance (Presensi) API

- **Auth**: username/password login returning a bearer token
- **Users**: create, list, view, update and delete users
- **Attendance**: record attendance, check-in, per-user history
- **Reporting**: monthly per-status summary and attendance rates grouped by role

Attendance status is one of `hadir`, `izin`, `sakit`, `alpa`.

### 🔐 Security
All endpoints except login require `Authorization: Bearer <token>` from a user
whose role is **karyawan**. Missing, invalid or expired tokens and other roles
are answered with **403**.
"#,
    ),
    paths(
        crate::auth::handlers::login,

        crate::api::user::create_user,
        crate::api::user::get_user,
        crate::api::user::list_users,
        crate::api::user::update_user,
        crate::api::user::delete_user,

        crate::api::attendance::record_attendance,
        crate::api::attendance::check_in,
        crate::api::attendance::history,
        crate::api::attendance::summary,
        crate::api::attendance::analysis
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            UserPayload,
            UserProfile,
            CreateAttendance,
            AttendanceCreated,
            CheckIn,
            CheckInCreated,
            AttendanceRecord,
            AttendanceStatus,
            AnalysisRequest,
            MonthlySummary,
            StatusTotals,
            AttendanceRate,
            AnalysisPeriod,
            GroupAnalysis,
            GroupedAnalysis
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login"),
        (name = "User", description = "User management APIs"),
        (name = "Attendance", description = "Attendance recording and reporting APIs"),
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_every_route_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/auth/login",
            "/api/users",
            "/api/users/{id}",
            "/api/attendance",
            "/api/attendance/check-in",
            "/api/attendance/history/{user_id}",
            "/api/attendance/summary/{user_id}",
            "/api/attendance/analysis",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
