use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use pulse_store::entities::{Membership, Purchase};
use pulse_store::repo::purchases;
use serde::{Deserialize, Serialize};

use crate::error::HttpError;
use crate::extract::{Authed, Scoped};
use crate::state::AppState;

use super::map_json_rejection;

#[derive(Deserialize)]
struct StartPurchaseBody {
    plan_id: i64,
}

#[derive(Serialize)]
struct OutcomeBody {
    purchase: Purchase,
    membership: Option<Membership>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/purchases", post(start))
        .route("/purchases/{id}", get(get_one))
        .route("/purchases/{id}/confirm", post(confirm))
        .route("/me/purchases", get(my_purchases))
}

async fn start(
    State(state): State<AppState>,
    scoped: Scoped,
    Authed(claims): Authed,
    body: Result<Json<StartPurchaseBody>, JsonRejection>,
) -> Result<Json<Purchase>, HttpError> {
    let Json(body) = body.map_err(map_json_rejection)?;
    let purchase = state
        .billing
        .start_purchase(&scoped.scope, claims.sub, body.plan_id)
        .await?;
    Ok(Json(purchase))
}

async fn get_one(
    State(state): State<AppState>,
    scoped: Scoped,
    Authed(claims): Authed,
    Path(id): Path<i64>,
) -> Result<Json<Purchase>, HttpError> {
    let purchase = owned_purchase(&state, &scoped, &claims, id).await?;
    Ok(Json(purchase))
}

async fn confirm(
    State(state): State<AppState>,
    scoped: Scoped,
    Authed(claims): Authed,
    Path(id): Path<i64>,
) -> Result<Json<OutcomeBody>, HttpError> {
    owned_purchase(&state, &scoped, &claims, id).await?;
    let outcome = state.billing.confirm_purchase(&scoped.scope, id).await?;
    Ok(Json(OutcomeBody {
        purchase: outcome.purchase,
        membership: outcome.membership,
    }))
}

/// Fetch a purchase the caller may act on. Customers reach their own
/// purchases only; another user's purchase looks like it does not exist.
async fn owned_purchase(
    state: &AppState,
    scoped: &Scoped,
    claims: &pulse_auth::Claims,
    id: i64,
) -> Result<Purchase, HttpError> {
    let purchase = purchases::get(&state.db, &scoped.scope, id)
        .await?
        .ok_or_else(|| pulse_core::PortalError::not_found("Purchase not found"))?;
    if purchase.user_id != claims.sub && !claims.admin {
        return Err(pulse_core::PortalError::not_found("Purchase not found").into());
    }
    Ok(purchase)
}

async fn my_purchases(
    State(state): State<AppState>,
    scoped: Scoped,
    Authed(claims): Authed,
) -> Result<Json<Vec<Purchase>>, HttpError> {
    let rows = purchases::list_for_user(&state.db, &scoped.scope, claims.sub).await?;
    Ok(Json(rows))
}
