//! pulse-store: relational persistence for the Pulse portal.
//!
//! Every repository function that touches a tenant-scoped table takes an
//! explicit [`pulse_core::OrgScope`]; there is no ambient tenant state and
//! no query path that filters implicitly.

pub mod db;
pub mod entities;
pub mod nav_cache;
pub mod repo;

pub use db::{connect, init_schema, memory, Db};
pub use nav_cache::NavCache;
