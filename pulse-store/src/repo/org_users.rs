//! Organization profiles — the link between a principal and its tenant.

use anyhow::Result;
use chrono::Utc;
use pulse_core::{OrgId, OrgScope};
use sqlx::QueryBuilder;

use crate::db::Db;
use crate::entities::OrgUser;

use super::push_org_filter;

/// Find or create the profile for `user_id` in the scope's organization.
pub async fn ensure(
    db: &Db,
    scope: &OrgScope,
    user_id: i64,
    display_name: Option<&str>,
) -> Result<OrgUser> {
    let org = scope.require_org()?;

    // Single upsert so two concurrent enrolments cannot race the
    // UNIQUE (user_id, org_id) constraint; the no-op update makes
    // RETURNING hand back the existing row untouched.
    let profile = sqlx::query_as::<_, OrgUser>(
        "INSERT INTO org_users (user_id, org_id, display_name, created_at)
         VALUES (?, ?, ?, ?)
         ON CONFLICT (user_id, org_id) DO UPDATE SET user_id = user_id
         RETURNING *",
    )
    .bind(user_id)
    .bind(org.0)
    .bind(display_name)
    .bind(Utc::now())
    .fetch_one(db)
    .await?;

    Ok(profile)
}

/// The organization a principal belongs to, if it has a profile.
///
/// This is the single resolution lookup shared by the HTTP layer for
/// both reads and writes, so creation-time tagging and query-time
/// filtering can never disagree about the active tenant.
pub async fn org_for_user(db: &Db, user_id: i64) -> Result<Option<OrgId>> {
    let org = sqlx::query_scalar::<_, i64>(
        "SELECT org_id FROM org_users WHERE user_id = ? ORDER BY id LIMIT 1",
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(org.map(OrgId))
}

pub async fn list(db: &Db, scope: &OrgScope) -> Result<Vec<OrgUser>> {
    let mut qb = QueryBuilder::new("SELECT * FROM org_users WHERE 1=1");
    push_org_filter(&mut qb, scope);
    qb.push(" ORDER BY id");

    let profiles = qb.build_query_as::<OrgUser>().fetch_all(db).await?;
    Ok(profiles)
}
