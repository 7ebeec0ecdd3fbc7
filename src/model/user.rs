use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Row of the `users` table, including the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub username: String,
    pub password: String,
    pub role: String,
}

/// Values written on insert and on full update.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub username: String,
    pub password_hash: String,
    pub role: String,
}

/// Public projection of a user; never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "name": "Budi Santoso",
    "username": "budi",
    "role": "karyawan"
}))]
pub struct UserProfile {
    pub id: u64,
    pub name: String,
    pub username: String,
    pub role: String,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            username: user.username,
            role: user.role,
        }
    }
}
