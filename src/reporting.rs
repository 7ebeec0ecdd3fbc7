//! Attendance reporting: per-user monthly summaries and per-group analysis.
//!
//! Both operations validate their input first, then issue a single read
//! against the [`AttendanceStore`] and fold the raw count rows.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use tracing::debug;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::model::attendance::{AttendanceStatus, GroupStatusCount, StatusCount};
use crate::store::AttendanceStore;

/// Group label used when the grouping column is NULL or blank.
pub const UNSPECIFIED_GROUP: &str = "Unspecified";

/// Columns an analysis may be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum GroupBy {
    Role,
}

impl GroupBy {
    /// Fully-qualified SQL column for the users join.
    pub fn column(&self) -> &'static str {
        match self {
            GroupBy::Role => "users.role",
        }
    }
}

/// A calendar month parsed from `MM-YYYY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Month {
    first_day: NaiveDate,
}

impl Month {
    /// Accepts exactly two month digits (01-12), a dash, and four year digits.
    pub fn parse(raw: &str) -> AppResult<Self> {
        let invalid = || AppError::invalid("Format bulan tidak valid. Gunakan format MM-YYYY.");

        let (mm, yyyy) = raw.split_once('-').ok_or_else(invalid)?;
        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if mm.len() != 2 || yyyy.len() != 4 || !all_digits(mm) || !all_digits(yyyy) {
            return Err(invalid());
        }

        let month: u32 = mm.parse().map_err(|_| invalid())?;
        let year: i32 = yyyy.parse().map_err(|_| invalid())?;
        let first_day = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;

        Ok(Self { first_day })
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    /// First day of the following month; the exclusive upper bound.
    pub fn next_first_day(&self) -> NaiveDate {
        let (year, month) = match self.first_day.month() {
            12 => (self.first_day.year() + 1, 1),
            m => (self.first_day.year(), m + 1),
        };
        NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MAX)
    }
}

impl std::fmt::Display for Month {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}-{:04}", self.first_day.month(), self.first_day.year())
    }
}

/// Count per status; every status is always present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StatusTotals {
    pub hadir: i64,
    pub izin: i64,
    pub sakit: i64,
    pub alpa: i64,
}

impl StatusTotals {
    fn slot(&mut self, status: AttendanceStatus) -> &mut i64 {
        match status {
            AttendanceStatus::Hadir => &mut self.hadir,
            AttendanceStatus::Izin => &mut self.izin,
            AttendanceStatus::Sakit => &mut self.sakit,
            AttendanceStatus::Alpa => &mut self.alpa,
        }
    }

    pub fn total(&self) -> i64 {
        self.hadir + self.izin + self.sakit + self.alpa
    }
}

/// Share of each status within a group, in percent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AttendanceRate {
    pub hadir_percentage: f64,
    pub izin_percentage: f64,
    pub sakit_percentage: f64,
    pub alpa_percentage: f64,
}

impl From<&StatusTotals> for AttendanceRate {
    fn from(totals: &StatusTotals) -> Self {
        let total = totals.total();
        if total <= 0 {
            return Self::default();
        }

        let pct = |n: i64| n as f64 / total as f64 * 100.0;
        Self {
            hadir_percentage: pct(totals.hadir),
            izin_percentage: pct(totals.izin),
            sakit_percentage: pct(totals.sakit),
            alpa_percentage: pct(totals.alpa),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[schema(example = json!({
    "user_id": 5,
    "month": "03-2024",
    "attendance_summary": { "hadir": 10, "izin": 0, "sakit": 0, "alpa": 2 }
}))]
pub struct MonthlySummary {
    pub user_id: u64,
    pub month: String,
    pub attendance_summary: StatusTotals,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AnalysisPeriod {
    #[schema(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct GroupAnalysis {
    pub group: String,
    pub total_attendance: StatusTotals,
    pub attendance_rate: AttendanceRate,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct GroupedAnalysis {
    pub analysis_period: AnalysisPeriod,
    pub grouped_analysis: Vec<GroupAnalysis>,
}

/// Folds raw `(status, count)` rows into a full summary. Statuses outside the
/// vocabulary are skipped.
pub fn summarize(rows: &[StatusCount]) -> StatusTotals {
    let mut totals = StatusTotals::default();
    for row in rows {
        match AttendanceStatus::parse(&row.status) {
            Some(status) => *totals.slot(status) = row.count,
            None => debug!(status = %row.status, "Ignoring unknown attendance status"),
        }
    }
    totals
}

/// Folds raw `(group, status, count)` rows into one entry per observed group,
/// sorted by group name.
pub fn analyze(rows: &[GroupStatusCount]) -> Vec<GroupAnalysis> {
    let mut groups: BTreeMap<String, StatusTotals> = BTreeMap::new();

    for row in rows {
        let Some(status) = AttendanceStatus::parse(&row.status) else {
            debug!(status = %row.status, "Ignoring unknown attendance status");
            continue;
        };

        let group = match row.group_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => UNSPECIFIED_GROUP.to_string(),
        };

        *groups.entry(group).or_default().slot(status) += row.count;
    }

    groups
        .into_iter()
        .map(|(group, total_attendance)| GroupAnalysis {
            group,
            attendance_rate: AttendanceRate::from(&total_attendance),
            total_attendance,
        })
        .collect()
}

/// Per-status counts for one user over one `MM-YYYY` month.
pub async fn monthly_summary(
    store: &dyn AttendanceStore,
    user_id: u64,
    month: &str,
) -> AppResult<MonthlySummary> {
    let month = Month::parse(month)?;

    let rows = store
        .status_counts(user_id, month.first_day(), month.next_first_day())
        .await?;
    debug!(user_id, %month, rows = rows.len(), "Fetched monthly status counts");

    Ok(MonthlySummary {
        user_id,
        month: month.to_string(),
        attendance_summary: summarize(&rows),
    })
}

/// Per-group totals and rates over the inclusive `[start, end]` date range.
pub async fn grouped_analysis(
    store: &dyn AttendanceStore,
    start: NaiveDate,
    end: NaiveDate,
    group_by: GroupBy,
) -> AppResult<GroupedAnalysis> {
    if start > end {
        return Err(AppError::invalid(
            "start_date tidak boleh lebih besar dari end_date.",
        ));
    }

    let rows = store.grouped_status_counts(group_by, start, end).await?;
    debug!(%group_by, %start, %end, rows = rows.len(), "Fetched grouped status counts");

    Ok(GroupedAnalysis {
        analysis_period: AnalysisPeriod {
            start_date: start,
            end_date: end,
        },
        grouped_analysis: analyze(&rows),
    })
}
