//! pulse-axum: the portal's HTTP surface.
//!
//! Every handler resolves its tenant through the [`Scoped`] extractor and
//! passes the resulting scope into the data layer explicitly. Errors keep
//! the portal's structured wire shape all the way out.

pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

pub use error::HttpError;
pub use extract::{Authed, Scoped, CROSS_TENANT_HEADER};
pub use routes::router;
pub use state::AppState;
