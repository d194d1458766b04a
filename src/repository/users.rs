use chrono::Utc;
use sqlx::sqlite::SqlitePool;

use crate::{error::AppError, models::user::User};

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

/// Inserts a new user. The unique index on email turns a duplicate
/// insert into `AppError::Conflict`, including under concurrent
/// registration of the same address.
pub async fn create(
    pool: &SqlitePool,
    email: &str,
    password_hash: &str,
    full_name: &str,
) -> Result<User, AppError> {
    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (email, password_hash, full_name, created_at) \
         VALUES (?, ?, ?, ?) RETURNING *",
    )
    .bind(email)
    .bind(password_hash)
    .bind(full_name)
    .bind(Utc::now().naive_utc())
    .fetch_one(pool)
    .await?;
    Ok(user)
}

/// Applies a partial profile update; `None` fields keep their stored value.
pub async fn update(
    pool: &SqlitePool,
    id: i64,
    full_name: Option<&str>,
    password_hash: Option<&str>,
) -> Result<User, AppError> {
    let user = sqlx::query_as::<_, User>(
        "UPDATE users SET full_name = COALESCE(?, full_name), \
         password_hash = COALESCE(?, password_hash) WHERE id = ? RETURNING *",
    )
    .bind(full_name)
    .bind(password_hash)
    .bind(id)
    .fetch_one(pool)
    .await?;
    Ok(user)
}
