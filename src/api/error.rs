use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json
};
use thiserror::Error;
use tracing::error;

use super::api_structs::ErrorResponse;
use crate::database::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    #[error("{}", .0.body_text())]
    InvalidBody(#[from] JsonRejection),

    #[error("{}", .0.body_text())]
    InvalidPath(#[from] PathRejection),

    #[error("{}", .0.body_text())]
    InvalidQuery(#[from] QueryRejection),

    #[error(transparent)]
    Store(#[from] StoreError)
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_)
            | ApiError::InvalidBody(_)
            | ApiError::InvalidPath(_)
            | ApiError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            ApiError::Store(StoreError::RecipeNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Store(StoreError::DuplicateVote { .. }) => StatusCode::CONFLICT,
            ApiError::Store(StoreError::Superseded { .. }) => StatusCode::CONFLICT,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let body = ErrorResponse {
            success: false,
            error: self.to_string()
        };

        (status, Json(body)).into_response()
    }
}
