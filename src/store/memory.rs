use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;

use super::{AttendanceStore, StoreResult, UserStore};
use crate::model::attendance::{AttendanceRecord, GroupStatusCount, NewAttendance, StatusCount};
use crate::model::user::{NewUser, User, UserProfile};
use crate::reporting::GroupBy;

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    /// `(user_id, row)`
    attendance: Vec<(u64, AttendanceRecord)>,
    next_user_id: u64,
    next_attendance_id: u64,
}

/// In-memory stand-in for the MySQL store. `failing()` builds one whose
/// every call errors, for exercising the 500 paths.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail: bool,
}

impl MemoryStore {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn tables(&self) -> StoreResult<std::sync::MutexGuard<'_, Tables>> {
        if self.fail {
            return Err(sqlx::Error::PoolTimedOut);
        }
        Ok(self.tables.lock().expect("memory store poisoned"))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let t = self.tables()?;
        Ok(t.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: u64) -> StoreResult<Option<UserProfile>> {
        let t = self.tables()?;
        Ok(t.users.iter().find(|u| u.id == id).cloned().map(Into::into))
    }

    async fn list(&self) -> StoreResult<Vec<UserProfile>> {
        let t = self.tables()?;
        Ok(t.users.iter().cloned().map(Into::into).collect())
    }

    async fn username_taken(&self, username: &str, exclude_id: Option<u64>) -> StoreResult<bool> {
        let t = self.tables()?;
        Ok(t
            .users
            .iter()
            .any(|u| u.username == username && Some(u.id) != exclude_id))
    }

    async fn insert(&self, user: &NewUser) -> StoreResult<u64> {
        let mut t = self.tables()?;
        t.next_user_id += 1;
        let id = t.next_user_id;
        t.users.push(User {
            id,
            name: user.name.clone(),
            username: user.username.clone(),
            password: user.password_hash.clone(),
            role: user.role.clone(),
        });
        Ok(id)
    }

    async fn update(&self, id: u64, user: &NewUser) -> StoreResult<bool> {
        let mut t = self.tables()?;
        let Some(row) = t.users.iter_mut().find(|u| u.id == id) else {
            return Ok(false);
        };
        row.name = user.name.clone();
        row.username = user.username.clone();
        row.password = user.password_hash.clone();
        row.role = user.role.clone();
        Ok(true)
    }

    async fn delete(&self, id: u64) -> StoreResult<bool> {
        let mut t = self.tables()?;
        let before = t.users.len();
        t.users.retain(|u| u.id != id);
        Ok(t.users.len() < before)
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn insert(&self, record: &NewAttendance) -> StoreResult<u64> {
        let mut t = self.tables()?;
        t.next_attendance_id += 1;
        let attendance_id = t.next_attendance_id;
        t.attendance.push((
            record.user_id,
            AttendanceRecord {
                attendance_id,
                date: record.date,
                time: record.time,
                status: record.status.to_string(),
                check_out_time: record.check_out_time,
            },
        ));
        Ok(attendance_id)
    }

    async fn history(&self, user_id: u64) -> StoreResult<Vec<AttendanceRecord>> {
        let t = self.tables()?;
        let mut rows: Vec<_> = t
            .attendance
            .iter()
            .filter(|(owner, _)| *owner == user_id)
            .map(|(_, a)| a.clone())
            .collect();
        rows.sort_by(|a, b| (b.date, b.time).cmp(&(a.date, a.time)));
        Ok(rows)
    }

    async fn status_counts(
        &self,
        user_id: u64,
        from: NaiveDate,
        until: NaiveDate,
    ) -> StoreResult<Vec<StatusCount>> {
        let t = self.tables()?;
        let mut counts: Vec<StatusCount> = Vec::new();
        for (_, a) in t
            .attendance
            .iter()
            .filter(|(owner, a)| *owner == user_id && a.date >= from && a.date < until)
        {
            match counts.iter_mut().find(|c| c.status == a.status) {
                Some(c) => c.count += 1,
                None => counts.push(StatusCount {
                    status: a.status.clone(),
                    count: 1,
                }),
            }
        }
        Ok(counts)
    }

    async fn grouped_status_counts(
        &self,
        group_by: GroupBy,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Vec<GroupStatusCount>> {
        let t = self.tables()?;
        let mut counts: Vec<GroupStatusCount> = Vec::new();
        for (owner, a) in t.attendance.iter().filter(|(_, a)| a.date >= start && a.date <= end) {
            // inner join: attendance of deleted users drops out
            let Some(user) = t.users.iter().find(|u| u.id == *owner) else {
                continue;
            };
            let group = match group_by {
                GroupBy::Role => Some(user.role.clone()),
            };
            match counts
                .iter_mut()
                .find(|c| c.group_name == group && c.status == a.status)
            {
                Some(c) => c.count += 1,
                None => counts.push(GroupStatusCount {
                    group_name: group,
                    status: a.status.clone(),
                    count: 1,
                }),
            }
        }
        Ok(counts)
    }
}
