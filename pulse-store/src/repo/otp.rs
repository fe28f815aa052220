//! OTP login challenges.
//!
//! Rows hold only the bcrypt hash of the code; expiry and attempt
//! accounting live here, the verification policy lives in pulse-auth.

use anyhow::Result;
use chrono::{DateTime, Utc};
use pulse_core::OrgScope;
use sqlx::QueryBuilder;

use crate::db::Db;
use crate::entities::{OtpChallenge, OtpChannel};

use super::push_org_filter;

pub async fn create(
    db: &Db,
    scope: &OrgScope,
    user_id: i64,
    code_hash: &str,
    channel: OtpChannel,
    max_attempts: i64,
    expires_at: DateTime<Utc>,
) -> Result<OtpChallenge> {
    let org = scope.require_org()?;

    let challenge = sqlx::query_as::<_, OtpChallenge>(
        "INSERT INTO otp_challenges (org_id, user_id, code_hash, channel, attempts, max_attempts, expires_at, created_at)
         VALUES (?, ?, ?, ?, 0, ?, ?, ?)
         RETURNING *",
    )
    .bind(org.0)
    .bind(user_id)
    .bind(code_hash)
    .bind(channel)
    .bind(max_attempts)
    .bind(expires_at)
    .bind(Utc::now())
    .fetch_one(db)
    .await?;

    Ok(challenge)
}

/// The newest unconsumed challenge for a user, if any.
pub async fn latest_open(db: &Db, scope: &OrgScope, user_id: i64) -> Result<Option<OtpChallenge>> {
    let mut qb = QueryBuilder::new("SELECT * FROM otp_challenges WHERE user_id = ");
    qb.push_bind(user_id);
    qb.push(" AND consumed_at IS NULL");
    push_org_filter(&mut qb, scope);
    qb.push(" ORDER BY id DESC LIMIT 1");

    let challenge = qb.build_query_as::<OtpChallenge>().fetch_optional(db).await?;
    Ok(challenge)
}

/// Burn one attempt; returns the new attempt count.
pub async fn record_attempt(db: &Db, scope: &OrgScope, id: i64) -> Result<i64> {
    let mut qb = QueryBuilder::new("UPDATE otp_challenges SET attempts = attempts + 1 WHERE id = ");
    qb.push_bind(id);
    push_org_filter(&mut qb, scope);
    qb.push(" RETURNING attempts");

    let attempts: i64 = qb.build_query_scalar().fetch_one(db).await?;
    Ok(attempts)
}

pub async fn consume(db: &Db, scope: &OrgScope, id: i64) -> Result<()> {
    let mut qb = QueryBuilder::new("UPDATE otp_challenges SET consumed_at = ");
    qb.push_bind(Utc::now());
    qb.push(" WHERE id = ").push_bind(id);
    push_org_filter(&mut qb, scope);

    qb.build().execute(db).await?;
    Ok(())
}
