//! Principals (portal customers and staff).
//!
//! Users are global: one email can belong to profiles in several
//! organizations. Tenant scoping happens through `org_users`.

use anyhow::Result;
use chrono::Utc;

use crate::db::Db;
use crate::entities::User;

use super::conflict_on_unique;

pub async fn create(db: &Db, email: &str, phone: Option<&str>, is_admin: bool) -> Result<User> {
    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (email, phone, is_admin, created_at) VALUES (?, ?, ?, ?) RETURNING *",
    )
    .bind(email)
    .bind(phone)
    .bind(is_admin)
    .bind(Utc::now())
    .fetch_one(db)
    .await
    .map_err(|e| conflict_on_unique(e, "a user with this email already exists"))?;

    Ok(user)
}

pub async fn get(db: &Db, id: i64) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(user)
}

pub async fn find_by_email(db: &Db, email: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(db)
        .await?;
    Ok(user)
}

pub async fn find_or_create(db: &Db, email: &str) -> Result<User> {
    if let Some(user) = find_by_email(db, email).await? {
        return Ok(user);
    }
    create(db, email, None, false).await
}
