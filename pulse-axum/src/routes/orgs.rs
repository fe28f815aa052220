//! Organization administration.
//!
//! The organizations table is the tenant boundary itself, so these
//! routes sit outside tenant scoping and are staff-only.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use pulse_core::PortalError;
use pulse_store::entities::Organization;
use pulse_store::repo::orgs;
use serde::Deserialize;

use crate::error::HttpError;
use crate::extract::Authed;
use crate::state::AppState;

use super::map_json_rejection;

#[derive(Deserialize)]
struct CreateOrgBody {
    name: String,
    slug: String,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/orgs", get(list).post(create))
}

fn require_staff(claims: &pulse_auth::Claims) -> Result<(), HttpError> {
    if claims.admin {
        Ok(())
    } else {
        Err(PortalError::forbidden("staff access required").into())
    }
}

async fn list(
    State(state): State<AppState>,
    Authed(claims): Authed,
) -> Result<Json<Vec<Organization>>, HttpError> {
    require_staff(&claims)?;
    let rows = orgs::list(&state.db).await?;
    Ok(Json(rows))
}

async fn create(
    State(state): State<AppState>,
    Authed(claims): Authed,
    body: Result<Json<CreateOrgBody>, JsonRejection>,
) -> Result<Json<Organization>, HttpError> {
    require_staff(&claims)?;
    let Json(body) = body.map_err(map_json_rejection)?;
    let org = orgs::create(&state.db, &body.name, &body.slug).await?;
    Ok(Json(org))
}
