//! CMS pages.
//!
//! Pages are soft-deleted: `deleted_at` is set instead of removing the
//! row. Scoping applies uniformly regardless of deletion state; deletion
//! only affects visibility through the explicit `include_deleted` filter.

use anyhow::Result;
use chrono::Utc;
use pulse_core::OrgScope;
use sqlx::QueryBuilder;

use crate::db::Db;
use crate::entities::{NavPage, Page};

use super::{conflict_on_unique, push_org_filter};

#[derive(Debug, Clone)]
pub struct NewPage {
    pub slug: String,
    pub title: String,
    pub show_in_nav: bool,
    pub nav_order: i64,
    pub published: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PageUpdate {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub show_in_nav: Option<bool>,
    pub nav_order: Option<i64>,
    pub published: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PageFilter {
    pub published_only: bool,
    pub include_deleted: bool,
}

/// Create a page, tagged once with the scope's organization.
pub async fn create(db: &Db, scope: &OrgScope, new: NewPage) -> Result<Page> {
    let org = scope.require_org()?;
    let now = Utc::now();

    let page = sqlx::query_as::<_, Page>(
        "INSERT INTO pages (org_id, slug, title, show_in_nav, nav_order, published, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)
         RETURNING *",
    )
    .bind(org.0)
    .bind(&new.slug)
    .bind(&new.title)
    .bind(new.show_in_nav)
    .bind(new.nav_order)
    .bind(new.published)
    .bind(now)
    .bind(now)
    .fetch_one(db)
    .await
    .map_err(|e| conflict_on_unique(e, "a page with this slug already exists"))?;

    Ok(page)
}

pub async fn get(db: &Db, scope: &OrgScope, id: i64) -> Result<Option<Page>> {
    let mut qb = QueryBuilder::new("SELECT * FROM pages WHERE id = ");
    qb.push_bind(id);
    push_org_filter(&mut qb, scope);

    let page = qb.build_query_as::<Page>().fetch_optional(db).await?;
    Ok(page)
}

/// Fetch a page by its slug for front-end rendering; soft-deleted pages
/// are invisible here.
pub async fn get_by_slug(db: &Db, scope: &OrgScope, slug: &str) -> Result<Option<Page>> {
    let mut qb = QueryBuilder::new("SELECT * FROM pages WHERE slug = ");
    qb.push_bind(slug.to_string());
    qb.push(" AND deleted_at IS NULL");
    push_org_filter(&mut qb, scope);

    let page = qb.build_query_as::<Page>().fetch_optional(db).await?;
    Ok(page)
}

pub async fn list(db: &Db, scope: &OrgScope, filter: PageFilter) -> Result<Vec<Page>> {
    let mut qb = QueryBuilder::new("SELECT * FROM pages WHERE 1=1");
    push_org_filter(&mut qb, scope);
    if !filter.include_deleted {
        qb.push(" AND deleted_at IS NULL");
    }
    if filter.published_only {
        qb.push(" AND published = 1");
    }
    qb.push(" ORDER BY nav_order, id");

    let pages = qb.build_query_as::<Page>().fetch_all(db).await?;
    Ok(pages)
}

/// Partial update. The organization tag is assigned at creation and is
/// deliberately absent from the SET clause.
pub async fn update(db: &Db, scope: &OrgScope, id: i64, upd: PageUpdate) -> Result<Option<Page>> {
    let mut qb = QueryBuilder::new("UPDATE pages SET updated_at = ");
    qb.push_bind(Utc::now());
    if let Some(slug) = upd.slug {
        qb.push(", slug = ").push_bind(slug);
    }
    if let Some(title) = upd.title {
        qb.push(", title = ").push_bind(title);
    }
    if let Some(show_in_nav) = upd.show_in_nav {
        qb.push(", show_in_nav = ").push_bind(show_in_nav);
    }
    if let Some(nav_order) = upd.nav_order {
        qb.push(", nav_order = ").push_bind(nav_order);
    }
    if let Some(published) = upd.published {
        qb.push(", published = ").push_bind(published);
    }
    qb.push(" WHERE id = ").push_bind(id);
    push_org_filter(&mut qb, scope);
    qb.push(" AND deleted_at IS NULL RETURNING *");

    let page = qb
        .build_query_as::<Page>()
        .fetch_optional(db)
        .await
        .map_err(|e| conflict_on_unique(e, "a page with this slug already exists"))?;
    Ok(page)
}

/// Soft delete. Returns false when the page is outside the scope, missing,
/// or already deleted.
pub async fn soft_delete(db: &Db, scope: &OrgScope, id: i64) -> Result<bool> {
    let mut qb = QueryBuilder::new("UPDATE pages SET deleted_at = ");
    qb.push_bind(Utc::now());
    qb.push(" WHERE id = ").push_bind(id);
    push_org_filter(&mut qb, scope);
    qb.push(" AND deleted_at IS NULL");

    let result = qb.build().execute(db).await?;
    Ok(result.rows_affected() > 0)
}

/// The pages shown in the portal's navigation, in order.
pub async fn nav_pages(db: &Db, scope: &OrgScope) -> Result<Vec<NavPage>> {
    let mut qb = QueryBuilder::new(
        "SELECT id, slug, title, nav_order FROM pages
         WHERE show_in_nav = 1 AND published = 1 AND deleted_at IS NULL",
    );
    push_org_filter(&mut qb, scope);
    qb.push(" ORDER BY nav_order, id");

    let pages = qb.build_query_as::<NavPage>().fetch_all(db).await?;
    Ok(pages)
}
