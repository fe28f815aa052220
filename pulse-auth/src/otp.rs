//! The OTP login flow.
//!
//! Codes are six digits, stored only as bcrypt hashes, expire after a
//! configurable window, and carry an attempt budget. Verification is
//! deliberately vague about which step failed: callers see "Invalid
//! login" whether the user, challenge, or code was wrong.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use pulse_core::{OrgScope, PortalError};
use pulse_store::entities::{OtpChannel, User};
use pulse_store::repo::{org_users, otp, users};
use pulse_store::Db;
use rand::Rng;

use crate::delivery::OtpDelivery;
use crate::token::TokenIssuer;

const INVALID_LOGIN: &str = "Invalid login";

#[derive(Debug, Clone)]
pub struct OtpOptions {
    pub code_ttl: Duration,
    pub max_attempts: i64,
    /// bcrypt cost; tests lower this to keep hashing fast.
    pub hash_cost: u32,
}

impl Default for OtpOptions {
    fn default() -> Self {
        Self {
            code_ttl: Duration::from_secs(10 * 60),
            max_attempts: 5,
            hash_cost: 10,
        }
    }
}

/// The result of a successful verification.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub access_token: String,
    pub user_id: i64,
    pub org_id: i64,
}

pub struct OtpService {
    db: Db,
    delivery: Arc<dyn OtpDelivery>,
    tokens: TokenIssuer,
    options: OtpOptions,
}

impl OtpService {
    pub fn new(db: Db, delivery: Arc<dyn OtpDelivery>, tokens: TokenIssuer) -> Self {
        Self::with_options(db, delivery, tokens, OtpOptions::default())
    }

    pub fn with_options(
        db: Db,
        delivery: Arc<dyn OtpDelivery>,
        tokens: TokenIssuer,
        options: OtpOptions,
    ) -> Self {
        Self {
            db,
            delivery,
            tokens,
            options,
        }
    }

    /// Issue a fresh code for `email` within the portal's organization.
    ///
    /// Finds or enrols the customer, makes sure an organization profile
    /// exists (so later resolution by profile lookup succeeds), and hands
    /// the plaintext code to the delivery seam only.
    pub async fn request_code(&self, scope: &OrgScope, email: &str) -> Result<()> {
        let email = email.trim().to_ascii_lowercase();
        if email.is_empty() || !email.contains('@') {
            pulse_core::bail_portal!(unprocessable, "a valid email address is required");
        }

        let user = users::find_or_create(&self.db, &email).await?;
        org_users::ensure(&self.db, scope, user.id, None).await?;

        let code = generate_code();
        let code_hash = bcrypt::hash(&code, self.options.hash_cost)
            .map_err(|e| anyhow::anyhow!(e.to_string()))?;
        let expires_at = Utc::now()
            + chrono::Duration::from_std(self.options.code_ttl)
                .map_err(|e| anyhow::anyhow!(e.to_string()))?;

        otp::create(
            &self.db,
            scope,
            user.id,
            &code_hash,
            OtpChannel::Email,
            self.options.max_attempts,
            expires_at,
        )
        .await?;

        self.delivery
            .deliver(OtpChannel::Email, &email, &code)
            .await?;

        tracing::debug!(user_id = user.id, "otp challenge created");
        Ok(())
    }

    /// Verify a code and mint an access token.
    pub async fn verify_code(&self, scope: &OrgScope, email: &str, code: &str) -> Result<AuthSession> {
        let email = email.trim().to_ascii_lowercase();
        let user = users::find_by_email(&self.db, &email)
            .await?
            .ok_or_else(|| PortalError::not_authenticated(INVALID_LOGIN).into_anyhow())?;

        let challenge = otp::latest_open(&self.db, scope, user.id)
            .await?
            .ok_or_else(|| PortalError::not_authenticated(INVALID_LOGIN).into_anyhow())?;

        if challenge.expires_at <= Utc::now() {
            pulse_core::bail_portal!(not_authenticated, "This code has expired");
        }
        if challenge.attempts >= challenge.max_attempts {
            pulse_core::bail_portal!(too_many_requests, "Too many attempts for this code");
        }

        let ok = bcrypt::verify(code, &challenge.code_hash)
            .map_err(|e| PortalError::not_authenticated(e.to_string()).into_anyhow())?;
        if !ok {
            let attempts = otp::record_attempt(&self.db, scope, challenge.id).await?;
            if attempts >= challenge.max_attempts {
                pulse_core::bail_portal!(too_many_requests, "Too many attempts for this code");
            }
            pulse_core::bail_portal!(not_authenticated, INVALID_LOGIN);
        }

        otp::consume(&self.db, scope, challenge.id).await?;
        self.session_for(scope, &user)
    }

    fn session_for(&self, scope: &OrgScope, user: &User) -> Result<AuthSession> {
        let org = scope.require_org()?;
        let access_token = self
            .tokens
            .issue(pulse_core::PrincipalId(user.id), Some(org), user.is_admin)?;

        Ok(AuthSession {
            access_token,
            user_id: user.id,
            org_id: org.0,
        })
    }
}

fn generate_code() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{n:06}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_six_digits() {
        for _ in 0..50 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
