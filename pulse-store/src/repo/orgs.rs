//! Organizations — the tenant boundary itself.
//!
//! This table is not tenant-scoped: it is administered through the
//! cross-tenant surface only.

use anyhow::Result;
use chrono::Utc;

use crate::db::Db;
use crate::entities::Organization;

use super::conflict_on_unique;

pub async fn create(db: &Db, name: &str, slug: &str) -> Result<Organization> {
    let org = sqlx::query_as::<_, Organization>(
        "INSERT INTO organizations (name, slug, created_at) VALUES (?, ?, ?) RETURNING *",
    )
    .bind(name)
    .bind(slug)
    .bind(Utc::now())
    .fetch_one(db)
    .await
    .map_err(|e| conflict_on_unique(e, "an organization with this slug already exists"))?;

    Ok(org)
}

pub async fn get(db: &Db, id: i64) -> Result<Option<Organization>> {
    let org = sqlx::query_as::<_, Organization>("SELECT * FROM organizations WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(org)
}

pub async fn find_by_slug(db: &Db, slug: &str) -> Result<Option<Organization>> {
    let org = sqlx::query_as::<_, Organization>("SELECT * FROM organizations WHERE slug = ?")
        .bind(slug)
        .fetch_optional(db)
        .await?;
    Ok(org)
}

pub async fn list(db: &Db) -> Result<Vec<Organization>> {
    let orgs = sqlx::query_as::<_, Organization>("SELECT * FROM organizations ORDER BY id")
        .fetch_all(db)
        .await?;
    Ok(orgs)
}
