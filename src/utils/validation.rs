use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{AppError, AppResult};

/// Trimmed value of a required text field; `None` when absent or blank.
pub fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// `YYYY-MM-DD`
pub fn parse_date(raw: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::invalid("Format tanggal tidak valid. Gunakan format YYYY-MM-DD."))
}

/// `HH:MM:SS`, or `HH:MM` with seconds defaulting to zero.
pub fn parse_time(raw: &str) -> AppResult<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| AppError::invalid("Format waktu tidak valid. Gunakan format HH:MM:SS."))
}

/// `YYYY-MM-DD HH:MM:SS` or the ISO `T`-separated form, fractional seconds allowed.
pub fn parse_datetime(raw: &str) -> AppResult<NaiveDateTime> {
    let raw = raw.trim();
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| {
            AppError::invalid("Format waktu tidak valid. Gunakan format YYYY-MM-DD HH:MM:SS.")
        })
}
