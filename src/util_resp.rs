use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{
    store::StoreError,
    tournaments::save::{SaveError, Stage},
    validation::ErrorCode,
};

pub type ApiResponse<T> = Result<T, FailureResponse>;

pub fn err_not_found<T>() -> ApiResponse<T> {
    Err(FailureResponse::NotFound)
}

pub fn unprocessable<T>(code: ErrorCode) -> ApiResponse<T> {
    Err(FailureResponse::Unprocessable { stage: None, code })
}

#[derive(Debug)]
pub enum FailureResponse {
    /// The request body failed validation.
    Unprocessable {
        stage: Option<Stage>,
        code: ErrorCode,
    },
    NotFound,
    Conflict(String),
    ServerError,
}

impl IntoResponse for FailureResponse {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            FailureResponse::Unprocessable { stage, code } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": "invalid", "stage": stage, "code": code }),
            ),
            FailureResponse::NotFound => {
                (StatusCode::NOT_FOUND, json!({ "error": "not found" }))
            }
            FailureResponse::Conflict(message) => (
                StatusCode::CONFLICT,
                json!({ "error": "conflict", "message": message }),
            ),
            FailureResponse::ServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "server error" }),
            ),
        };
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for FailureResponse {
    fn from(err: StoreError) -> Self {
        match err {
            err if err.is_not_found() => FailureResponse::NotFound,
            StoreError::Conflict(message) => FailureResponse::Conflict(message),
            err => {
                tracing::error!(%err, "store failure");
                FailureResponse::ServerError
            }
        }
    }
}

impl From<SaveError> for FailureResponse {
    fn from(err: SaveError) -> Self {
        match err {
            SaveError::Invalid { stage, code } => {
                FailureResponse::Unprocessable {
                    stage: Some(stage),
                    code,
                }
            }
            SaveError::Io { stage, source } => {
                tracing::warn!(%stage, %source, "save stopped");
                FailureResponse::from(source)
            }
        }
    }
}
