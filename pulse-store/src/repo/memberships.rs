//! Customer memberships.

use anyhow::Result;
use chrono::{DateTime, Utc};
use pulse_core::{OrgId, OrgScope};
use sqlx::{QueryBuilder, Sqlite};

use crate::db::Db;
use crate::entities::{Membership, MembershipStatus};

use super::push_org_filter;

/// Create an active membership.
///
/// Takes any executor so the purchase flow can run it inside the same
/// transaction that marks the purchase paid.
pub async fn create<'e, E>(
    executor: E,
    org: OrgId,
    user_id: i64,
    plan_id: i64,
    starts_on: DateTime<Utc>,
    expires_on: DateTime<Utc>,
) -> Result<Membership>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let membership = sqlx::query_as::<_, Membership>(
        "INSERT INTO memberships (org_id, user_id, plan_id, status, starts_on, expires_on, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)
         RETURNING *",
    )
    .bind(org.0)
    .bind(user_id)
    .bind(plan_id)
    .bind(MembershipStatus::Active)
    .bind(starts_on)
    .bind(expires_on)
    .bind(Utc::now())
    .fetch_one(executor)
    .await?;

    Ok(membership)
}

/// The user's current membership, if one is active and unexpired.
pub async fn active_for_user(
    db: &Db,
    scope: &OrgScope,
    user_id: i64,
) -> Result<Option<Membership>> {
    let mut qb = QueryBuilder::new("SELECT * FROM memberships WHERE user_id = ");
    qb.push_bind(user_id);
    qb.push(" AND status = ").push_bind(MembershipStatus::Active);
    qb.push(" AND expires_on > ").push_bind(Utc::now());
    push_org_filter(&mut qb, scope);
    qb.push(" ORDER BY expires_on DESC LIMIT 1");

    let membership = qb.build_query_as::<Membership>().fetch_optional(db).await?;
    Ok(membership)
}

pub async fn list(db: &Db, scope: &OrgScope) -> Result<Vec<Membership>> {
    let mut qb = QueryBuilder::new("SELECT * FROM memberships WHERE 1=1");
    push_org_filter(&mut qb, scope);
    qb.push(" ORDER BY id");

    let memberships = qb.build_query_as::<Membership>().fetch_all(db).await?;
    Ok(memberships)
}

/// Mark overdue active memberships as expired. Returns the number of
/// rows touched. Runs under any scope; it never reassigns an org tag.
pub async fn expire_overdue(db: &Db, scope: &OrgScope) -> Result<u64> {
    let mut qb = QueryBuilder::new("UPDATE memberships SET status = ");
    qb.push_bind(MembershipStatus::Expired);
    qb.push(" WHERE status = ").push_bind(MembershipStatus::Active);
    qb.push(" AND expires_on <= ").push_bind(Utc::now());
    push_org_filter(&mut qb, scope);

    let result = qb.build().execute(db).await?;
    Ok(result.rows_affected())
}

/// Cancel an active membership. Returns the updated row, or None when the
/// membership is outside the scope or not active.
pub async fn cancel(db: &Db, scope: &OrgScope, id: i64) -> Result<Option<Membership>> {
    let mut qb = QueryBuilder::new("UPDATE memberships SET status = ");
    qb.push_bind(MembershipStatus::Cancelled);
    qb.push(" WHERE id = ").push_bind(id);
    qb.push(" AND status = ").push_bind(MembershipStatus::Active);
    push_org_filter(&mut qb, scope);
    qb.push(" RETURNING *");

    let membership = qb.build_query_as::<Membership>().fetch_optional(db).await?;
    Ok(membership)
}
