//! pulse-core: framework-agnostic core for the Pulse fitness portal.
//!
//! Holds the tenant-scoping types every other crate builds on, the
//! structured error type carried across crate boundaries, and the
//! string key/value configuration store.

pub mod config;
pub mod errors;
pub mod tenant;

pub use config::{PortalConfig, PortalConfigSnapshot};
pub use errors::{ErrorKind, PortalError};
pub use tenant::{OrgId, OrgScope, PrincipalId, TenantContext};
