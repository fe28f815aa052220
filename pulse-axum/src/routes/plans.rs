use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use pulse_core::PortalError;
use pulse_store::entities::Plan;
use pulse_store::repo::plans;
use serde::Deserialize;

use crate::error::HttpError;
use crate::extract::Scoped;
use crate::state::AppState;

use super::map_json_rejection;

#[derive(Deserialize)]
struct CreatePlanBody {
    name: String,
    description: Option<String>,
    price_cents: i64,
    currency: String,
    duration_days: i64,
}

#[derive(Deserialize, Default)]
struct UpdatePlanBody {
    name: Option<String>,
    description: Option<String>,
    price_cents: Option<i64>,
    duration_days: Option<i64>,
    active: Option<bool>,
}

#[derive(Deserialize, Default)]
struct ListQuery {
    #[serde(default)]
    include_retired: bool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/plans", get(list).post(create))
        .route("/plans/{id}", get(get_one).patch(update).delete(deactivate))
}

async fn list(
    State(state): State<AppState>,
    scoped: Scoped,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Plan>>, HttpError> {
    if query.include_retired {
        scoped.require_staff()?;
    }
    let rows = plans::list(&state.db, &scoped.scope, !query.include_retired).await?;
    Ok(Json(rows))
}

async fn get_one(
    State(state): State<AppState>,
    scoped: Scoped,
    Path(id): Path<i64>,
) -> Result<Json<Plan>, HttpError> {
    let plan = plans::get(&state.db, &scoped.scope, id)
        .await?
        .ok_or_else(|| PortalError::not_found("Plan not found"))?;
    Ok(Json(plan))
}

async fn create(
    State(state): State<AppState>,
    scoped: Scoped,
    body: Result<Json<CreatePlanBody>, JsonRejection>,
) -> Result<Json<Plan>, HttpError> {
    scoped.require_staff()?;
    let Json(body) = body.map_err(map_json_rejection)?;

    if body.price_cents < 0 || body.duration_days <= 0 {
        return Err(PortalError::unprocessable(
            "a plan needs a non-negative price and a positive duration",
        )
        .into());
    }

    let plan = plans::create(
        &state.db,
        &scoped.scope,
        plans::NewPlan {
            name: body.name,
            description: body.description,
            price_cents: body.price_cents,
            currency: body.currency,
            duration_days: body.duration_days,
        },
    )
    .await?;
    Ok(Json(plan))
}

async fn update(
    State(state): State<AppState>,
    scoped: Scoped,
    Path(id): Path<i64>,
    body: Result<Json<UpdatePlanBody>, JsonRejection>,
) -> Result<Json<Plan>, HttpError> {
    scoped.require_staff()?;
    let Json(body) = body.map_err(map_json_rejection)?;

    let plan = plans::update(
        &state.db,
        &scoped.scope,
        id,
        plans::PlanUpdate {
            name: body.name,
            description: body.description.map(Some),
            price_cents: body.price_cents,
            duration_days: body.duration_days,
            active: body.active,
        },
    )
    .await?
    .ok_or_else(|| PortalError::not_found("Plan not found"))?;
    Ok(Json(plan))
}

async fn deactivate(
    State(state): State<AppState>,
    scoped: Scoped,
    Path(id): Path<i64>,
) -> Result<Json<Plan>, HttpError> {
    scoped.require_staff()?;
    let plan = plans::deactivate(&state.db, &scoped.scope, id)
        .await?
        .ok_or_else(|| PortalError::not_found("Plan not found"))?;
    Ok(Json(plan))
}
