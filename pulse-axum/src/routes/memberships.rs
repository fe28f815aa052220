use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use pulse_core::PortalError;
use pulse_store::entities::Membership;
use pulse_store::repo::memberships;
use serde_json::{json, Value};

use crate::error::HttpError;
use crate::extract::{Authed, Scoped};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/memberships/me", get(my_membership))
        .route("/memberships", get(list))
        .route("/memberships/expire-overdue", post(expire_overdue))
        .route("/memberships/{id}/cancel", post(cancel))
}

async fn my_membership(
    State(state): State<AppState>,
    scoped: Scoped,
    Authed(claims): Authed,
) -> Result<Json<Membership>, HttpError> {
    let membership = memberships::active_for_user(&state.db, &scoped.scope, claims.sub)
        .await?
        .ok_or_else(|| PortalError::not_found("No active membership"))?;
    Ok(Json(membership))
}

async fn list(
    State(state): State<AppState>,
    scoped: Scoped,
) -> Result<Json<Vec<Membership>>, HttpError> {
    scoped.require_staff()?;
    let rows = memberships::list(&state.db, &scoped.scope).await?;
    Ok(Json(rows))
}

/// Housekeeping: sweep memberships whose window has passed.
async fn expire_overdue(
    State(state): State<AppState>,
    scoped: Scoped,
) -> Result<Json<Value>, HttpError> {
    scoped.require_staff()?;
    let expired = memberships::expire_overdue(&state.db, &scoped.scope).await?;
    Ok(Json(json!({ "expired": expired })))
}

async fn cancel(
    State(state): State<AppState>,
    scoped: Scoped,
    Path(id): Path<i64>,
) -> Result<Json<Membership>, HttpError> {
    scoped.require_staff()?;
    let membership = memberships::cancel(&state.db, &scoped.scope, id)
        .await?
        .ok_or_else(|| PortalError::not_found("Membership not found"))?;
    Ok(Json(membership))
}
