//! Plan purchases.
//!
//! Status transitions are guarded in SQL: only a `pending` purchase can
//! become `paid` or `failed`, so a replayed confirmation is a no-op.

use anyhow::Result;
use chrono::Utc;
use pulse_core::OrgScope;
use sqlx::{QueryBuilder, Sqlite};

use crate::db::Db;
use crate::entities::{Purchase, PurchaseStatus};

use super::push_org_filter;

pub async fn create_pending(
    db: &Db,
    scope: &OrgScope,
    user_id: i64,
    plan_id: i64,
    amount_cents: i64,
    currency: &str,
) -> Result<Purchase> {
    let org = scope.require_org()?;
    let now = Utc::now();

    let purchase = sqlx::query_as::<_, Purchase>(
        "INSERT INTO purchases (org_id, user_id, plan_id, amount_cents, currency, status, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)
         RETURNING *",
    )
    .bind(org.0)
    .bind(user_id)
    .bind(plan_id)
    .bind(amount_cents)
    .bind(currency)
    .bind(PurchaseStatus::Pending)
    .bind(now)
    .bind(now)
    .fetch_one(db)
    .await?;

    Ok(purchase)
}

pub async fn set_gateway_ref(
    db: &Db,
    scope: &OrgScope,
    id: i64,
    gateway_ref: &str,
) -> Result<Option<Purchase>> {
    let mut qb = QueryBuilder::new("UPDATE purchases SET gateway_ref = ");
    qb.push_bind(gateway_ref.to_string());
    qb.push(", updated_at = ").push_bind(Utc::now());
    qb.push(" WHERE id = ").push_bind(id);
    push_org_filter(&mut qb, scope);
    qb.push(" RETURNING *");

    let purchase = qb.build_query_as::<Purchase>().fetch_optional(db).await?;
    Ok(purchase)
}

pub async fn get(db: &Db, scope: &OrgScope, id: i64) -> Result<Option<Purchase>> {
    let mut qb = QueryBuilder::new("SELECT * FROM purchases WHERE id = ");
    qb.push_bind(id);
    push_org_filter(&mut qb, scope);

    let purchase = qb.build_query_as::<Purchase>().fetch_optional(db).await?;
    Ok(purchase)
}

pub async fn list_for_user(db: &Db, scope: &OrgScope, user_id: i64) -> Result<Vec<Purchase>> {
    let mut qb = QueryBuilder::new("SELECT * FROM purchases WHERE user_id = ");
    qb.push_bind(user_id);
    push_org_filter(&mut qb, scope);
    qb.push(" ORDER BY id DESC");

    let purchases = qb.build_query_as::<Purchase>().fetch_all(db).await?;
    Ok(purchases)
}

/// Transition `pending` → `paid`. Returns None when the purchase is out
/// of scope, missing, or not pending.
pub async fn mark_paid<'e, E>(executor: E, scope: &OrgScope, id: i64) -> Result<Option<Purchase>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    transition(executor, scope, id, PurchaseStatus::Paid).await
}

/// Transition `pending` → `failed`.
pub async fn mark_failed<'e, E>(executor: E, scope: &OrgScope, id: i64) -> Result<Option<Purchase>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    transition(executor, scope, id, PurchaseStatus::Failed).await
}

async fn transition<'e, E>(
    executor: E,
    scope: &OrgScope,
    id: i64,
    to: PurchaseStatus,
) -> Result<Option<Purchase>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let mut qb = QueryBuilder::new("UPDATE purchases SET status = ");
    qb.push_bind(to);
    qb.push(", updated_at = ").push_bind(Utc::now());
    qb.push(" WHERE id = ").push_bind(id);
    qb.push(" AND status = ").push_bind(PurchaseStatus::Pending);
    push_org_filter(&mut qb, scope);
    qb.push(" RETURNING *");

    let purchase = qb.build_query_as::<Purchase>().fetch_optional(executor).await?;
    Ok(purchase)
}
