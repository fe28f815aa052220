use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::HttpError;
use crate::extract::Scoped;
use crate::state::AppState;

use super::map_json_rejection;

#[derive(Deserialize)]
struct RequestCodeBody {
    email: String,
}

#[derive(Deserialize)]
struct VerifyCodeBody {
    email: String,
    code: String,
}

#[derive(Serialize)]
struct SessionBody {
    access_token: String,
    user_id: i64,
    org_id: i64,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/otp", post(request_code))
        .route("/auth/otp/verify", post(verify_code))
}

async fn request_code(
    State(state): State<AppState>,
    scoped: Scoped,
    body: Result<Json<RequestCodeBody>, JsonRejection>,
) -> Result<Json<Value>, HttpError> {
    let Json(body) = body.map_err(map_json_rejection)?;
    state.otp.request_code(&scoped.scope, &body.email).await?;
    Ok(Json(json!({ "status": "sent" })))
}

async fn verify_code(
    State(state): State<AppState>,
    scoped: Scoped,
    body: Result<Json<VerifyCodeBody>, JsonRejection>,
) -> Result<Json<SessionBody>, HttpError> {
    let Json(body) = body.map_err(map_json_rejection)?;
    let session = state
        .otp
        .verify_code(&scoped.scope, &body.email, &body.code)
        .await?;
    Ok(Json(SessionBody {
        access_token: session.access_token,
        user_id: session.user_id,
        org_id: session.org_id,
    }))
}
