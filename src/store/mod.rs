//! Storage capabilities injected into handlers and the reporting engine.
//!
//! Handlers receive `web::Data<dyn UserStore>` / `web::Data<dyn AttendanceStore>`
//! so production code runs on MySQL while tests substitute the in-memory store.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::model::attendance::{AttendanceRecord, GroupStatusCount, NewAttendance, StatusCount};
use crate::model::user::{NewUser, User, UserProfile};
use crate::reporting::GroupBy;

#[cfg(test)]
pub mod memory;
pub mod mysql;

pub type StoreResult<T> = Result<T, sqlx::Error>;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    async fn find_by_id(&self, id: u64) -> StoreResult<Option<UserProfile>>;

    async fn list(&self) -> StoreResult<Vec<UserProfile>>;

    /// True when another user already owns `username`. `exclude_id` skips the
    /// row being updated.
    async fn username_taken(&self, username: &str, exclude_id: Option<u64>) -> StoreResult<bool>;

    /// Returns the generated id.
    async fn insert(&self, user: &NewUser) -> StoreResult<u64>;

    /// Returns false when no user has `id`.
    async fn update(&self, id: u64, user: &NewUser) -> StoreResult<bool>;

    /// Returns false when no user has `id`.
    async fn delete(&self, id: u64) -> StoreResult<bool>;
}

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Returns the generated attendance id.
    async fn insert(&self, record: &NewAttendance) -> StoreResult<u64>;

    /// All records of a user, newest first by (date, time).
    async fn history(&self, user_id: u64) -> StoreResult<Vec<AttendanceRecord>>;

    /// Raw per-status counts for a user with `from <= date < until`.
    async fn status_counts(
        &self,
        user_id: u64,
        from: NaiveDate,
        until: NaiveDate,
    ) -> StoreResult<Vec<StatusCount>>;

    /// Raw per-(group, status) counts over the inclusive date range, joined
    /// to the owning users.
    async fn grouped_status_counts(
        &self,
        group_by: GroupBy,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Vec<GroupStatusCount>>;
}
