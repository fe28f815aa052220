//! Membership plans offered by an organization.

use anyhow::Result;
use chrono::Utc;
use pulse_core::OrgScope;
use sqlx::QueryBuilder;

use crate::db::Db;
use crate::entities::Plan;

use super::push_org_filter;

#[derive(Debug, Clone)]
pub struct NewPlan {
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub currency: String,
    pub duration_days: i64,
}

#[derive(Debug, Clone, Default)]
pub struct PlanUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub price_cents: Option<i64>,
    pub duration_days: Option<i64>,
    pub active: Option<bool>,
}

pub async fn create(db: &Db, scope: &OrgScope, new: NewPlan) -> Result<Plan> {
    let org = scope.require_org()?;

    let plan = sqlx::query_as::<_, Plan>(
        "INSERT INTO plans (org_id, name, description, price_cents, currency, duration_days, active, created_at)
         VALUES (?, ?, ?, ?, ?, ?, 1, ?)
         RETURNING *",
    )
    .bind(org.0)
    .bind(&new.name)
    .bind(&new.description)
    .bind(new.price_cents)
    .bind(&new.currency)
    .bind(new.duration_days)
    .bind(Utc::now())
    .fetch_one(db)
    .await?;

    Ok(plan)
}

pub async fn get(db: &Db, scope: &OrgScope, id: i64) -> Result<Option<Plan>> {
    let mut qb = QueryBuilder::new("SELECT * FROM plans WHERE id = ");
    qb.push_bind(id);
    push_org_filter(&mut qb, scope);

    let plan = qb.build_query_as::<Plan>().fetch_optional(db).await?;
    Ok(plan)
}

pub async fn list(db: &Db, scope: &OrgScope, active_only: bool) -> Result<Vec<Plan>> {
    let mut qb = QueryBuilder::new("SELECT * FROM plans WHERE 1=1");
    push_org_filter(&mut qb, scope);
    if active_only {
        qb.push(" AND active = 1");
    }
    qb.push(" ORDER BY price_cents, id");

    let plans = qb.build_query_as::<Plan>().fetch_all(db).await?;
    Ok(plans)
}

pub async fn update(db: &Db, scope: &OrgScope, id: i64, upd: PlanUpdate) -> Result<Option<Plan>> {
    let mut qb = QueryBuilder::new("UPDATE plans SET id = id");
    if let Some(name) = upd.name {
        qb.push(", name = ").push_bind(name);
    }
    if let Some(description) = upd.description {
        qb.push(", description = ").push_bind(description);
    }
    if let Some(price_cents) = upd.price_cents {
        qb.push(", price_cents = ").push_bind(price_cents);
    }
    if let Some(duration_days) = upd.duration_days {
        qb.push(", duration_days = ").push_bind(duration_days);
    }
    if let Some(active) = upd.active {
        qb.push(", active = ").push_bind(active);
    }
    qb.push(" WHERE id = ").push_bind(id);
    push_org_filter(&mut qb, scope);
    qb.push(" RETURNING *");

    let plan = qb.build_query_as::<Plan>().fetch_optional(db).await?;
    Ok(plan)
}

/// Retire a plan from sale. Existing memberships are unaffected.
pub async fn deactivate(db: &Db, scope: &OrgScope, id: i64) -> Result<Option<Plan>> {
    update(
        db,
        scope,
        id,
        PlanUpdate {
            active: Some(false),
            ..Default::default()
        },
    )
    .await
}
