//! Request extractors.
//!
//! [`Scoped`] performs the portal's single tenant-resolution procedure,
//! shared by reads and writes: token organization, then profile lookup,
//! then the configured fallback organization. A request that resolves to
//! no organization is rejected; there is no implicit global scope.

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use pulse_auth::Claims;
use pulse_core::{OrgScope, PortalError, PrincipalId, TenantContext};
use pulse_store::repo::org_users;

use crate::error::HttpError;
use crate::state::AppState;

/// Cross-tenant access is requested explicitly, never inferred.
pub const CROSS_TENANT_HEADER: &str = "x-cross-tenant-reason";

/// A request with a resolved tenant scope.
///
/// For single-tenant requests `context` carries the resolved organization
/// plus the authenticated principal (if any); a cross-tenant grant has no
/// concrete tenant, so `context` is `None` there.
pub struct Scoped {
    pub scope: OrgScope,
    pub context: Option<TenantContext>,
    pub claims: Option<Claims>,
}

impl Scoped {
    /// The verified staff claims, or 401/403.
    pub fn require_staff(&self) -> Result<&Claims, HttpError> {
        match &self.claims {
            Some(claims) if claims.admin => Ok(claims),
            Some(_) => Err(PortalError::forbidden("staff access required").into()),
            None => Err(PortalError::not_authenticated("authentication required").into()),
        }
    }
}

impl FromRequestParts<AppState> for Scoped {
    type Rejection = HttpError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = bearer_claims(parts, state)?;

        if let Some(value) = parts.headers.get(CROSS_TENANT_HEADER) {
            let reason = value.to_str().map_err(|_| {
                HttpError::from(PortalError::bad_request("invalid cross-tenant reason header"))
            })?;
            return match &claims {
                Some(c) if c.admin => Ok(Scoped {
                    scope: OrgScope::all_orgs(reason),
                    context: None,
                    claims,
                }),
                _ => Err(PortalError::forbidden(
                    "cross-tenant access requires a staff token",
                )
                .into()),
            };
        }

        let org = match &claims {
            Some(c) => match c.org_id() {
                Some(org) => Some(org),
                // Tokens minted before the user had a profile fall back
                // to the profile lookup.
                None => org_users::org_for_user(&state.db, c.sub)
                    .await
                    .map_err(HttpError::from)?,
            },
            None => state.config.default_org(),
        };

        let org = org.ok_or_else(|| {
            HttpError::from(PortalError::not_authenticated(
                "no organization could be resolved for this request",
            ))
        })?;

        let context = match &claims {
            Some(c) => TenantContext::with_principal(org, PrincipalId(c.sub)),
            None => TenantContext::new(org),
        };
        Ok(Scoped {
            scope: context.scope(),
            context: Some(context),
            claims,
        })
    }
}

/// A request with verified claims; anonymous requests are rejected.
pub struct Authed(pub Claims);

impl FromRequestParts<AppState> for Authed {
    type Rejection = HttpError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = bearer_claims(parts, state)?.ok_or_else(|| {
            HttpError::from(PortalError::not_authenticated("authentication required"))
        })?;
        Ok(Authed(claims))
    }
}

fn bearer_claims(parts: &Parts, state: &AppState) -> Result<Option<Claims>, HttpError> {
    let Some(value) = parts.headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| {
        HttpError::from(PortalError::not_authenticated("invalid authorization header"))
    })?;
    let token = value.strip_prefix("Bearer ").ok_or_else(|| {
        HttpError::from(PortalError::not_authenticated("invalid authorization header"))
    })?;

    let claims = state.tokens.verify(token).map_err(HttpError::from)?;
    Ok(Some(claims))
}
