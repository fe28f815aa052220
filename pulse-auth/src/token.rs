// Access tokens (HS256).

use std::time::Duration;

use anyhow::Result;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use pulse_core::{OrgId, PortalError, PrincipalId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: i64,
    /// Organization id, when the principal has a profile.
    pub org: Option<i64>,
    /// Whether the principal may request cross-tenant scopes.
    pub admin: bool,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn principal(&self) -> PrincipalId {
        PrincipalId(self.sub)
    }

    pub fn org_id(&self) -> Option<OrgId> {
        self.org.map(OrgId)
    }
}

#[derive(Clone)]
pub struct TokenIssuer {
    secret: String,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: impl Into<String>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }

    pub fn issue(&self, user: PrincipalId, org: Option<OrgId>, admin: bool) -> Result<String> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: user.0,
            org: org.map(|o| o.0),
            admin,
            iat: now,
            exp: now + self.ttl.as_secs() as i64,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;
        Ok(token)
    }

    /// Validate signature and expiry; invalid tokens surface as 401s.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| PortalError::not_authenticated(e.to_string()).into_anyhow())?;
        Ok(data.claims)
    }
}
