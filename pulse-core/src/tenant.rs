//! Tenant-scoping types for Pulse.
//!
//! Every data access in the portal is constrained to one organization.
//! The scope is never inferred from ambient session state: callers pass
//! an [`OrgScope`] into every repository function, and the only way to
//! run unscoped is the audited [`OrgScope::all_orgs`] constructor.

use serde::{Deserialize, Serialize};

use crate::errors::PortalError;

/// An organization id — the tenant boundary for all portal data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrgId(pub i64);

impl std::fmt::Display for OrgId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An authenticated actor (portal customer or staff user).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(pub i64);

/// Context carried with every portal operation.
///
/// Constructed once per request by the HTTP layer and passed down
/// explicitly so all logic is tenant-aware.
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub org: OrgId,
    pub principal: Option<PrincipalId>,
}

impl TenantContext {
    pub fn new(org: OrgId) -> Self {
        Self {
            org,
            principal: None,
        }
    }

    pub fn with_principal(org: OrgId, principal: PrincipalId) -> Self {
        Self {
            org,
            principal: Some(principal),
        }
    }

    /// The scope this context grants: always a single-tenant scope.
    pub fn scope(&self) -> OrgScope {
        OrgScope::Tenant(self.org)
    }
}

/// The scope argument taken by every repository function.
///
/// `Tenant` constrains reads and writes to one organization's rows.
/// `AllOrgs` removes the constraint entirely; it can only be obtained
/// through [`OrgScope::all_orgs`], which logs an audit event naming the
/// reason, so cross-tenant access is always traceable.
#[derive(Debug, Clone)]
pub enum OrgScope {
    Tenant(OrgId),
    AllOrgs { reason: String },
}

impl OrgScope {
    pub fn tenant(org: OrgId) -> Self {
        OrgScope::Tenant(org)
    }

    /// Explicit cross-tenant capability.
    ///
    /// Emits an audit event; there is no silent path to an unscoped query.
    pub fn all_orgs(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        tracing::warn!(target: "pulse::audit", %reason, "cross-tenant scope granted");
        OrgScope::AllOrgs { reason }
    }

    /// The organization this scope is constrained to, if any.
    pub fn org(&self) -> Option<OrgId> {
        match self {
            OrgScope::Tenant(org) => Some(*org),
            OrgScope::AllOrgs { .. } => None,
        }
    }

    /// The concrete organization required for a write.
    ///
    /// New rows are tagged with their organization exactly once, at
    /// creation; a cross-tenant scope cannot say which organization a
    /// new row belongs to, so creating through it is an error.
    pub fn require_org(&self) -> anyhow::Result<OrgId> {
        match self {
            OrgScope::Tenant(org) => Ok(*org),
            OrgScope::AllOrgs { .. } => Err(PortalError::forbidden(
                "a cross-tenant scope cannot create or modify tenant-owned rows",
            )
            .into_anyhow()),
        }
    }

    pub fn is_cross_tenant(&self) -> bool {
        matches!(self, OrgScope::AllOrgs { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tenant_scope_exposes_its_org() {
        let scope = OrgScope::tenant(OrgId(8));
        assert_eq!(scope.org(), Some(OrgId(8)));
        assert_eq!(scope.require_org().unwrap(), OrgId(8));
        assert!(!scope.is_cross_tenant());
    }

    #[test]
    fn cross_tenant_scope_refuses_writes() {
        let scope = OrgScope::all_orgs("support tooling");
        assert_eq!(scope.org(), None);
        assert!(scope.is_cross_tenant());

        let err = scope.require_org().unwrap_err();
        let portal = PortalError::from_anyhow(&err).expect("structured error");
        assert_eq!(portal.code(), 403);
    }

    #[test]
    fn context_scope_is_single_tenant() {
        let ctx = TenantContext::with_principal(OrgId(3), PrincipalId(11));
        assert_eq!(ctx.scope().org(), Some(OrgId(3)));
    }
}
