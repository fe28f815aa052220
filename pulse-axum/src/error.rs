use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pulse_core::PortalError;

#[derive(Debug)]
pub struct HttpError(pub anyhow::Error);

impl From<anyhow::Error> for HttpError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl From<PortalError> for HttpError {
    fn from(e: PortalError) -> Self {
        Self(e.into_anyhow())
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        // If it's a PortalError (even when wrapped by anyhow contexts),
        // preserve its structured fields
        if let Some(portal) = PortalError::from_anyhow(&self.0) {
            let safe = portal.sanitize_for_client();
            let status =
                StatusCode::from_u16(safe.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            return (status, Json(safe.to_json())).into_response();
        }

        // Fallback: wrap anything else as a GeneralError
        let portal = PortalError::general_error(self.0.to_string());
        let safe = portal.sanitize_for_client();
        let status =
            StatusCode::from_u16(safe.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(safe.to_json())).into_response()
    }
}
