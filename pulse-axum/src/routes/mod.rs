//! Route tables for the portal API.

use axum::extract::rejection::JsonRejection;
use axum::Router;
use pulse_core::PortalError;
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::error::HttpError;
use crate::state::AppState;

mod auth;
mod memberships;
mod orgs;
mod pages;
mod plans;
mod purchases;
mod sections;

pub(crate) fn map_json_rejection(rejection: JsonRejection) -> HttpError {
    PortalError::bad_request("Failed to parse the request body as JSON")
        .with_errors(json!({"_schema": [rejection.to_string()]}))
        .into_anyhow()
        .into()
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(auth::router())
        .merge(pages::router())
        .merge(sections::router())
        .merge(plans::router())
        .merge(memberships::router())
        .merge(purchases::router())
        .merge(orgs::router())
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .with_state(state)
}
