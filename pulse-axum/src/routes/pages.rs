use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use pulse_core::PortalError;
use pulse_store::entities::{NavPage, Page, Section};
use pulse_store::repo::{pages, sections};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::HttpError;
use crate::extract::Scoped;
use crate::state::AppState;

use super::map_json_rejection;

#[derive(Deserialize)]
struct CreatePageBody {
    slug: String,
    title: String,
    #[serde(default)]
    show_in_nav: bool,
    #[serde(default)]
    nav_order: i64,
    #[serde(default)]
    published: bool,
}

#[derive(Deserialize, Default)]
struct UpdatePageBody {
    slug: Option<String>,
    title: Option<String>,
    show_in_nav: Option<bool>,
    nav_order: Option<i64>,
    published: Option<bool>,
}

#[derive(Deserialize, Default)]
struct ListQuery {
    #[serde(default)]
    include_unpublished: bool,
    #[serde(default)]
    include_deleted: bool,
}

/// The shape the front end renders a page from.
#[derive(Serialize)]
struct PageView {
    #[serde(flatten)]
    page: Page,
    sections: Vec<Section>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pages", get(list).post(create))
        .route("/pages/nav", get(nav))
        .route("/pages/slug/{slug}", get(get_by_slug))
        .route("/pages/{id}", get(get_one).patch(update).delete(remove))
}

async fn list(
    State(state): State<AppState>,
    scoped: Scoped,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Page>>, HttpError> {
    // Drafts and deleted pages are staff-only views.
    let filter = if query.include_unpublished || query.include_deleted {
        scoped.require_staff()?;
        pages::PageFilter {
            published_only: !query.include_unpublished,
            include_deleted: query.include_deleted,
        }
    } else {
        pages::PageFilter {
            published_only: scoped.require_staff().is_err(),
            include_deleted: false,
        }
    };

    let rows = pages::list(&state.db, &scoped.scope, filter).await?;
    Ok(Json(rows))
}

async fn nav(
    State(state): State<AppState>,
    scoped: Scoped,
) -> Result<Json<Vec<NavPage>>, HttpError> {
    let rows = match scoped.scope.org() {
        Some(org) => {
            state
                .nav_cache
                .get_or_load(org, || pages::nav_pages(&state.db, &scoped.scope))
                .await?
        }
        // Cross-tenant reads bypass the per-organization cache.
        None => pages::nav_pages(&state.db, &scoped.scope).await?,
    };
    Ok(Json(rows))
}

async fn get_by_slug(
    State(state): State<AppState>,
    scoped: Scoped,
    Path(slug): Path<String>,
) -> Result<Json<PageView>, HttpError> {
    let page = pages::get_by_slug(&state.db, &scoped.scope, &slug)
        .await?
        .ok_or_else(|| PortalError::not_found("Page not found"))?;
    if !page.published {
        scoped.require_staff().map_err(|_| {
            HttpError::from(PortalError::not_found("Page not found"))
        })?;
    }

    let sections = sections::list_for_page(&state.db, &scoped.scope, page.id).await?;
    Ok(Json(PageView { page, sections }))
}

async fn get_one(
    State(state): State<AppState>,
    scoped: Scoped,
    Path(id): Path<i64>,
) -> Result<Json<Page>, HttpError> {
    scoped.require_staff()?;
    let page = pages::get(&state.db, &scoped.scope, id)
        .await?
        .ok_or_else(|| PortalError::not_found("Page not found"))?;
    Ok(Json(page))
}

async fn create(
    State(state): State<AppState>,
    scoped: Scoped,
    body: Result<Json<CreatePageBody>, JsonRejection>,
) -> Result<Json<Page>, HttpError> {
    scoped.require_staff()?;
    let Json(body) = body.map_err(map_json_rejection)?;

    let slug = body.slug.trim().to_string();
    if slug.is_empty() {
        return Err(PortalError::unprocessable("Invalid page")
            .with_errors(json!({"slug": ["required"]}))
            .into());
    }

    let page = pages::create(
        &state.db,
        &scoped.scope,
        pages::NewPage {
            slug,
            title: body.title,
            show_in_nav: body.show_in_nav,
            nav_order: body.nav_order,
            published: body.published,
        },
    )
    .await?;
    Ok(Json(page))
}

async fn update(
    State(state): State<AppState>,
    scoped: Scoped,
    Path(id): Path<i64>,
    body: Result<Json<UpdatePageBody>, JsonRejection>,
) -> Result<Json<Page>, HttpError> {
    scoped.require_staff()?;
    let Json(body) = body.map_err(map_json_rejection)?;

    let page = pages::update(
        &state.db,
        &scoped.scope,
        id,
        pages::PageUpdate {
            slug: body.slug,
            title: body.title,
            show_in_nav: body.show_in_nav,
            nav_order: body.nav_order,
            published: body.published,
        },
    )
    .await?
    .ok_or_else(|| PortalError::not_found("Page not found"))?;
    Ok(Json(page))
}

async fn remove(
    State(state): State<AppState>,
    scoped: Scoped,
    Path(id): Path<i64>,
) -> Result<Json<Value>, HttpError> {
    scoped.require_staff()?;
    let deleted = pages::soft_delete(&state.db, &scoped.scope, id).await?;
    if !deleted {
        return Err(PortalError::not_found("Page not found").into());
    }
    Ok(Json(json!({ "deleted": true })))
}
