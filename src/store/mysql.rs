use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::MySqlPool;
use tracing::debug;

use super::{AttendanceStore, StoreResult, UserStore};
use crate::model::attendance::{AttendanceRecord, GroupStatusCount, NewAttendance, StatusCount};
use crate::model::user::{NewUser, User, UserProfile};
use crate::reporting::GroupBy;

/// MySQL-backed implementation of both store traits.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for MySqlStore {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, username, password, role
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
    }

    async fn find_by_id(&self, id: u64) -> StoreResult<Option<UserProfile>> {
        sqlx::query_as::<_, UserProfile>("SELECT id, name, username, role FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn list(&self) -> StoreResult<Vec<UserProfile>> {
        sqlx::query_as::<_, UserProfile>("SELECT id, name, username, role FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await
    }

    async fn username_taken(&self, username: &str, exclude_id: Option<u64>) -> StoreResult<bool> {
        let exists = match exclude_id {
            Some(id) => {
                sqlx::query_scalar::<_, i64>(
                    "SELECT EXISTS(SELECT 1 FROM users WHERE username = ? AND id <> ? LIMIT 1)",
                )
                .bind(username)
                .bind(id)
                .fetch_one(&self.pool)
                .await?
            }
            None => {
                sqlx::query_scalar::<_, i64>(
                    "SELECT EXISTS(SELECT 1 FROM users WHERE username = ? LIMIT 1)",
                )
                .bind(username)
                .fetch_one(&self.pool)
                .await?
            }
        };

        Ok(exists != 0)
    }

    async fn insert(&self, user: &NewUser) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"INSERT INTO users (name, username, password, role) VALUES (?, ?, ?, ?)"#,
        )
        .bind(&user.name)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.role)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_id())
    }

    async fn update(&self, id: u64, user: &NewUser) -> StoreResult<bool> {
        // The password is re-hashed with a fresh salt on every update, so an
        // existing row always counts as affected.
        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = ?, username = ?, password = ?, role = ?
            WHERE id = ?
            "#,
        )
        .bind(&user.name)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.role)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: u64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl AttendanceStore for MySqlStore {
    async fn insert(&self, record: &NewAttendance) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance (user_id, date, time, status, check_out_time)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.user_id)
        .bind(record.date)
        .bind(record.time)
        .bind(record.status.as_ref())
        .bind(record.check_out_time)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_id())
    }

    async fn history(&self, user_id: u64) -> StoreResult<Vec<AttendanceRecord>> {
        sqlx::query_as::<_, AttendanceRecord>(
            r#"
            SELECT attendance_id, date, time, status, check_out_time
            FROM attendance
            WHERE user_id = ?
            ORDER BY date DESC, time DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn status_counts(
        &self,
        user_id: u64,
        from: NaiveDate,
        until: NaiveDate,
    ) -> StoreResult<Vec<StatusCount>> {
        sqlx::query_as::<_, StatusCount>(
            r#"
            SELECT status, COUNT(*) AS count
            FROM attendance
            WHERE user_id = ? AND date >= ? AND date < ?
            GROUP BY status
            "#,
        )
        .bind(user_id)
        .bind(from)
        .bind(until)
        .fetch_all(&self.pool)
        .await
    }

    async fn grouped_status_counts(
        &self,
        group_by: GroupBy,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Vec<GroupStatusCount>> {
        // The column comes from a closed enum, never from request text.
        let column = group_by.column();
        let sql = format!(
            r#"
            SELECT
                {column} AS group_name,
                attendance.status AS status,
                COUNT(attendance.status) AS count
            FROM attendance
            INNER JOIN users ON attendance.user_id = users.id
            WHERE attendance.date BETWEEN ? AND ?
            GROUP BY {column}, attendance.status
            "#
        );
        debug!(sql = %sql, %start, %end, "Running grouped attendance query");

        sqlx::query_as::<_, GroupStatusCount>(&sql)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await
    }
}
