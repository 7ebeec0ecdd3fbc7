use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

/// Attendance status vocabulary.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
    EnumIter,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AttendanceStatus {
    /// present
    Hadir,
    /// excused
    Izin,
    /// sick
    Sakit,
    /// absent without notice
    Alpa,
}

impl AttendanceStatus {
    /// Case-insensitive lookup; `None` for anything outside the vocabulary.
    pub fn parse(raw: &str) -> Option<Self> {
        raw.trim().to_lowercase().parse().ok()
    }
}

/// History row of the `attendance` table; the owning user is the query key.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(example = json!({
    "attendance_id": 12,
    "date": "2024-03-04",
    "time": "08:01:00",
    "status": "hadir",
    "check_out_time": null
}))]
pub struct AttendanceRecord {
    pub attendance_id: u64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(value_type = String, example = "08:01:00")]
    pub time: NaiveTime,
    pub status: String,
    #[schema(value_type = Option<String>, example = "17:00:00")]
    pub check_out_time: Option<NaiveTime>,
}

/// Values written by the attendance insert paths.
#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub user_id: u64,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: AttendanceStatus,
    pub check_out_time: Option<NaiveTime>,
}

/// Raw `status, COUNT(*)` row for one user.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

/// Raw `group, status, COUNT(*)` row from the users join.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GroupStatusCount {
    pub group_name: Option<String>,
    pub status: String,
    pub count: i64,
}
