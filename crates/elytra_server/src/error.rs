// SPDX-License-Identifier: MIT

//! HTTP status-code mapping for [`ElytraError`] (spec.md §7).
//!
//! `ElytraError` lives in `elytra-core`, which has no `axum` dependency, so
//! this wrapper is the local type that carries the foreign `IntoResponse`
//! impl (Rust's orphan rule won't let us implement it directly on the
//! core error from here).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use elytra_core::ElytraError;
use elytra_protocol::ErrorBody;

pub struct ApiError(pub ElytraError);

impl From<ElytraError> for ApiError {
    fn from(err: ElytraError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ElytraError::MissingToken => StatusCode::UNAUTHORIZED,
            ElytraError::DatasetNotFound(_) => StatusCode::NOT_FOUND,
            ElytraError::NoWorkersAvailable => StatusCode::SERVICE_UNAVAILABLE,
            ElytraError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ElytraError::Downstream(_) | ElytraError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "internal error serving request");
        }
        (status, Json(ErrorBody { error: self.0.to_string() })).into_response()
    }
}
