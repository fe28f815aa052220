//! Tenant-scoped repositories.
//!
//! Every function touching a tenant-scoped table takes an explicit
//! [`OrgScope`]. A `Tenant` scope appends an `org_id` predicate; the
//! audited `AllOrgs` scope appends nothing. Writes additionally require a
//! concrete organization via [`OrgScope::require_org`].

use pulse_core::{OrgScope, PortalError};
use sqlx::{QueryBuilder, Sqlite};

pub mod memberships;
pub mod org_users;
pub mod orgs;
pub mod otp;
pub mod pages;
pub mod plans;
pub mod purchases;
pub mod sections;
pub mod users;

/// Append the tenant predicate for `scope`.
///
/// Callers must have started a `WHERE` clause already (`WHERE 1=1` or a
/// concrete predicate), so this can always prefix with `AND`.
pub(crate) fn push_org_filter(qb: &mut QueryBuilder<'_, Sqlite>, scope: &OrgScope) {
    if let OrgScope::Tenant(org) = scope {
        qb.push(" AND org_id = ").push_bind(org.0);
    }
}

/// Map a unique-constraint violation to a client-facing conflict.
pub(crate) fn conflict_on_unique(err: sqlx::Error, message: &str) -> anyhow::Error {
    if let sqlx::Error::Database(ref db) = err {
        if db.is_unique_violation() {
            return PortalError::conflict(message).into_anyhow();
        }
    }
    err.into()
}
