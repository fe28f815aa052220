use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, patch};
use axum::{Json, Router};
use pulse_core::PortalError;
use pulse_store::entities::Section;
use pulse_store::repo::sections;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::HttpError;
use crate::extract::Scoped;
use crate::state::AppState;

use super::map_json_rejection;

#[derive(Deserialize)]
struct CreateSectionBody {
    kind: String,
    heading: Option<String>,
    body: String,
    #[serde(default)]
    position: i64,
}

#[derive(Deserialize, Default)]
struct UpdateSectionBody {
    kind: Option<String>,
    // Nested Option: absent leaves the heading alone, null clears it.
    #[serde(default, with = "double_option")]
    heading: Option<Option<String>>,
    body: Option<String>,
    position: Option<i64>,
}

mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(d: D) -> Result<Option<Option<String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(d).map(Some)
    }
}

#[derive(Deserialize)]
struct ReorderBody {
    ordered_ids: Vec<i64>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pages/{id}/sections", get(list).post(create))
        .route("/pages/{id}/sections/reorder", axum::routing::post(reorder))
        .route("/sections/{id}", patch(update).delete(remove))
}

async fn list(
    State(state): State<AppState>,
    scoped: Scoped,
    Path(page_id): Path<i64>,
) -> Result<Json<Vec<Section>>, HttpError> {
    let rows = sections::list_for_page(&state.db, &scoped.scope, page_id).await?;
    Ok(Json(rows))
}

async fn create(
    State(state): State<AppState>,
    scoped: Scoped,
    Path(page_id): Path<i64>,
    body: Result<Json<CreateSectionBody>, JsonRejection>,
) -> Result<Json<Section>, HttpError> {
    scoped.require_staff()?;
    let Json(body) = body.map_err(map_json_rejection)?;

    let section = sections::create(
        &state.db,
        &scoped.scope,
        page_id,
        sections::NewSection {
            kind: body.kind,
            heading: body.heading,
            body: body.body,
            position: body.position,
        },
    )
    .await?;
    Ok(Json(section))
}

async fn reorder(
    State(state): State<AppState>,
    scoped: Scoped,
    Path(page_id): Path<i64>,
    body: Result<Json<ReorderBody>, JsonRejection>,
) -> Result<Json<Vec<Section>>, HttpError> {
    scoped.require_staff()?;
    let Json(body) = body.map_err(map_json_rejection)?;

    let rows = sections::reorder(&state.db, &scoped.scope, page_id, &body.ordered_ids).await?;
    Ok(Json(rows))
}

async fn update(
    State(state): State<AppState>,
    scoped: Scoped,
    Path(id): Path<i64>,
    body: Result<Json<UpdateSectionBody>, JsonRejection>,
) -> Result<Json<Section>, HttpError> {
    scoped.require_staff()?;
    let Json(body) = body.map_err(map_json_rejection)?;

    let section = sections::update(
        &state.db,
        &scoped.scope,
        id,
        sections::SectionUpdate {
            kind: body.kind,
            heading: body.heading,
            body: body.body,
            position: body.position,
        },
    )
    .await?
    .ok_or_else(|| PortalError::not_found("Section not found"))?;
    Ok(Json(section))
}

async fn remove(
    State(state): State<AppState>,
    scoped: Scoped,
    Path(id): Path<i64>,
) -> Result<Json<Value>, HttpError> {
    scoped.require_staff()?;
    let deleted = sections::delete(&state.db, &scoped.scope, id).await?;
    if !deleted {
        return Err(PortalError::not_found("Section not found").into());
    }
    Ok(Json(json!({ "deleted": true })))
}
