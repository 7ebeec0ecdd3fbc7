use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};

use crate::{
    auth::auth::AuthUser,
    error::{AppError, AppResult},
    model::attendance::{AttendanceStatus, NewAttendance},
    models::ApiResponse,
    reporting::{self, GroupBy},
    store::AttendanceStore,
    utils::validation::{parse_date, parse_datetime, parse_time, present},
};

#[derive(Deserialize, ToSchema)]
pub struct CreateAttendance {
    #[schema(example = 5)]
    pub user_id: Option<u64>,
    #[schema(example = "2024-03-04")]
    pub date: Option<String>,
    #[schema(example = "08:01:00")]
    pub time: Option<String>,
    #[schema(example = "hadir")]
    pub status: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceCreated {
    pub attendance_id: u64,
    pub user_id: u64,
    pub date: String,
    pub time: String,
    pub status: AttendanceStatus,
}

#[derive(Deserialize, ToSchema)]
pub struct CheckIn {
    #[schema(example = 5)]
    pub user_id: Option<u64>,
    #[schema(example = "2024-03-04 08:01:00")]
    pub check_in_time: Option<String>,
    #[schema(example = "2024-03-04 17:00:00")]
    pub check_out_time: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct CheckInCreated {
    pub id: u64,
    pub user_id: u64,
    pub check_in_time: String,
    pub check_out_time: Option<String>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SummaryQuery {
    /// Month in `MM-YYYY` form
    pub month: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct AnalysisRequest {
    #[schema(example = "2024-03-01")]
    pub start_date: Option<String>,
    #[schema(example = "2024-03-31")]
    pub end_date: Option<String>,
    #[schema(example = "role")]
    pub group_by: Option<String>,
}

/// Record attendance
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = CreateAttendance,
    responses(
        (status = 200, description = "Attendance recorded", body = AttendanceCreated),
        (status = 400, description = "Missing field or invalid status", body = Object, example = json!({
            "status": "error",
            "message": "Status presensi tidak valid!"
        })),
        (status = 403, description = "Missing/invalid token or wrong role"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
#[instrument(name = "record_attendance", skip_all, fields(actor = auth.id))]
pub async fn record_attendance(
    auth: AuthUser,
    store: web::Data<dyn AttendanceStore>,
    payload: web::Json<CreateAttendance>,
) -> AppResult<HttpResponse> {
    let (Some(user_id), Some(date), Some(time), Some(status)) = (
        payload.user_id.filter(|id| *id != 0),
        present(&payload.date),
        present(&payload.time),
        present(&payload.status),
    ) else {
        return Err(AppError::invalid("Semua data wajib diisi!"));
    };

    let status: AttendanceStatus = status
        .parse()
        .map_err(|_| AppError::invalid("Status presensi tidak valid!"))?;

    let record = NewAttendance {
        user_id,
        date: parse_date(date)?,
        time: parse_time(time)?,
        status,
        check_out_time: None,
    };

    let attendance_id = store.insert(&record).await?;
    info!(attendance_id, user_id, %status, "Attendance recorded");

    Ok(HttpResponse::Ok().json(ApiResponse::with_message(
        "Presensi berhasil dicatat",
        AttendanceCreated {
            attendance_id,
            user_id,
            date: date.to_string(),
            time: time.to_string(),
            status,
        },
    )))
}

/// Check in with a timestamp
///
/// Stored as a `hadir` record dated by the check-in timestamp.
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    request_body = CheckIn,
    responses(
        (status = 200, description = "Check-in recorded", body = CheckInCreated),
        (status = 400, description = "Missing user_id/check_in_time or malformed timestamp"),
        (status = 403, description = "Missing/invalid token or wrong role"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
#[instrument(name = "check_in", skip_all, fields(actor = auth.id))]
pub async fn check_in(
    auth: AuthUser,
    store: web::Data<dyn AttendanceStore>,
    payload: web::Json<CheckIn>,
) -> AppResult<HttpResponse> {
    let (Some(user_id), Some(check_in_raw)) = (
        payload.user_id.filter(|id| *id != 0),
        present(&payload.check_in_time),
    ) else {
        return Err(AppError::invalid("User ID dan waktu masuk harus diisi!"));
    };

    let checked_in = parse_datetime(check_in_raw)?;
    let check_out_raw = present(&payload.check_out_time);
    let check_out_time = match check_out_raw {
        Some(raw) => {
            let checked_out = parse_datetime(raw)?;
            if checked_out < checked_in {
                return Err(AppError::invalid(
                    "Waktu keluar tidak boleh sebelum waktu masuk.",
                ));
            }
            Some(checked_out.time())
        }
        None => None,
    };

    let record = NewAttendance {
        user_id,
        date: checked_in.date(),
        time: checked_in.time(),
        status: AttendanceStatus::Hadir,
        check_out_time,
    };

    let id = store.insert(&record).await?;
    info!(attendance_id = id, user_id, "Check-in recorded");

    Ok(HttpResponse::Ok().json(ApiResponse::with_message(
        "Absensi berhasil dicatat",
        CheckInCreated {
            id,
            user_id,
            check_in_time: check_in_raw.to_string(),
            check_out_time: check_out_raw.map(str::to_string),
        },
    )))
}

/// Attendance history of a user, newest first
#[utoipa::path(
    get,
    path = "/api/attendance/history/{user_id}",
    params(("user_id", Path, description = "User ID")),
    responses(
        (status = 200, description = "Attendance history", body = [AttendanceRecord]),
        (status = 404, description = "No attendance recorded for this user"),
        (status = 403, description = "Missing/invalid token or wrong role"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn history(
    store: web::Data<dyn AttendanceStore>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let user_id = path.into_inner();

    let records = store.history(user_id).await?;
    if records.is_empty() {
        return Err(AppError::not_found(
            "Riwayat presensi tidak ditemukan untuk pengguna ini.",
        ));
    }

    Ok(HttpResponse::Ok().json(ApiResponse::data(records)))
}

/// Monthly per-status summary
#[utoipa::path(
    get,
    path = "/api/attendance/summary/{user_id}",
    params(("user_id", Path, description = "User ID"), SummaryQuery),
    responses(
        (status = 200, description = "Status counts for the month", body = MonthlySummary),
        (status = 400, description = "Month missing or not MM-YYYY", body = Object, example = json!({
            "status": "error",
            "message": "Format bulan tidak valid. Gunakan format MM-YYYY."
        })),
        (status = 403, description = "Missing/invalid token or wrong role"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn summary(
    store: web::Data<dyn AttendanceStore>,
    path: web::Path<u64>,
    query: web::Query<SummaryQuery>,
) -> AppResult<HttpResponse> {
    let month = query.month.as_deref().unwrap_or_default();
    let summary = reporting::monthly_summary(store.get_ref(), path.into_inner(), month).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::data(summary)))
}

/// Attendance rates grouped by a user attribute
#[utoipa::path(
    post,
    path = "/api/attendance/analysis",
    request_body = AnalysisRequest,
    responses(
        (status = 200, description = "Grouped totals and percentages", body = GroupedAnalysis),
        (status = 400, description = "Missing/invalid dates or group_by"),
        (status = 403, description = "Missing/invalid token or wrong role"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn analysis(
    store: web::Data<dyn AttendanceStore>,
    payload: web::Json<AnalysisRequest>,
) -> AppResult<HttpResponse> {
    let (Some(start), Some(end)) = (present(&payload.start_date), present(&payload.end_date)) else {
        return Err(AppError::invalid(
            "Parameter start_date dan end_date diperlukan.",
        ));
    };

    let group_by: GroupBy = present(&payload.group_by)
        .and_then(|g| g.parse().ok())
        .ok_or_else(|| AppError::invalid("Parameter group_by tidak valid. Gunakan 'role'."))?;

    let result =
        reporting::grouped_analysis(store.get_ref(), parse_date(start)?, parse_date(end)?, group_by)
            .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::data(result)))
}
