//! Page sections (the building blocks a page renders from).

use anyhow::Result;
use chrono::Utc;
use pulse_core::{OrgScope, PortalError};
use sqlx::QueryBuilder;

use crate::db::Db;
use crate::entities::Section;

use super::push_org_filter;

#[derive(Debug, Clone)]
pub struct NewSection {
    pub kind: String,
    pub heading: Option<String>,
    pub body: String,
    pub position: i64,
}

#[derive(Debug, Clone, Default)]
pub struct SectionUpdate {
    pub kind: Option<String>,
    pub heading: Option<Option<String>>,
    pub body: Option<String>,
    pub position: Option<i64>,
}

/// Create a section under a page the scope can see.
pub async fn create(db: &Db, scope: &OrgScope, page_id: i64, new: NewSection) -> Result<Section> {
    let org = scope.require_org()?;

    let page_exists = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM pages WHERE id = ? AND org_id = ? AND deleted_at IS NULL",
    )
    .bind(page_id)
    .bind(org.0)
    .fetch_one(db)
    .await?;
    if page_exists == 0 {
        return Err(PortalError::not_found("Page not found").into_anyhow());
    }

    let now = Utc::now();
    let section = sqlx::query_as::<_, Section>(
        "INSERT INTO sections (org_id, page_id, kind, heading, body, position, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)
         RETURNING *",
    )
    .bind(org.0)
    .bind(page_id)
    .bind(&new.kind)
    .bind(&new.heading)
    .bind(&new.body)
    .bind(new.position)
    .bind(now)
    .bind(now)
    .fetch_one(db)
    .await?;

    Ok(section)
}

pub async fn list_for_page(db: &Db, scope: &OrgScope, page_id: i64) -> Result<Vec<Section>> {
    let mut qb = QueryBuilder::new("SELECT * FROM sections WHERE page_id = ");
    qb.push_bind(page_id);
    push_org_filter(&mut qb, scope);
    qb.push(" ORDER BY position, id");

    let sections = qb.build_query_as::<Section>().fetch_all(db).await?;
    Ok(sections)
}

pub async fn update(
    db: &Db,
    scope: &OrgScope,
    id: i64,
    upd: SectionUpdate,
) -> Result<Option<Section>> {
    let mut qb = QueryBuilder::new("UPDATE sections SET updated_at = ");
    qb.push_bind(Utc::now());
    if let Some(kind) = upd.kind {
        qb.push(", kind = ").push_bind(kind);
    }
    if let Some(heading) = upd.heading {
        qb.push(", heading = ").push_bind(heading);
    }
    if let Some(body) = upd.body {
        qb.push(", body = ").push_bind(body);
    }
    if let Some(position) = upd.position {
        qb.push(", position = ").push_bind(position);
    }
    qb.push(" WHERE id = ").push_bind(id);
    push_org_filter(&mut qb, scope);
    qb.push(" RETURNING *");

    let section = qb.build_query_as::<Section>().fetch_optional(db).await?;
    Ok(section)
}

/// Reassign positions to match the order of `ordered_ids`. Ids outside
/// the page or the scope are ignored.
pub async fn reorder(
    db: &Db,
    scope: &OrgScope,
    page_id: i64,
    ordered_ids: &[i64],
) -> Result<Vec<Section>> {
    let org = scope.require_org()?;

    for (position, id) in ordered_ids.iter().enumerate() {
        sqlx::query(
            "UPDATE sections SET position = ?, updated_at = ?
             WHERE id = ? AND page_id = ? AND org_id = ?",
        )
        .bind(position as i64)
        .bind(Utc::now())
        .bind(*id)
        .bind(page_id)
        .bind(org.0)
        .execute(db)
        .await?;
    }

    list_for_page(db, scope, page_id).await
}

pub async fn delete(db: &Db, scope: &OrgScope, id: i64) -> Result<bool> {
    let mut qb = QueryBuilder::new("DELETE FROM sections WHERE id = ");
    qb.push_bind(id);
    push_org_filter(&mut qb, scope);

    let result = qb.build().execute(db).await?;
    Ok(result.rows_affected() > 0)
}
