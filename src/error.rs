use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{docdb::DocDbError, validation::ValidationErrors};

/// A backend could not complete an operation. Never used for "not found".
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    #[error("document store error: {0}")]
    Document(#[from] DocDbError),
    #[error("corrupt stored record: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("movie not found")]
    NotFound,
    #[error("backend fault: {0}")]
    Backend(#[from] StoreError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug)]
pub struct AppError(ServiceError);

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for AppError {}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self.0 {
            ServiceError::Validation(errors) => {
                (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "error": errors }))).into_response()
            },
            ServiceError::NotFound => not_found(),
            ServiceError::Backend(err) => {
                tracing::warn!(error = %err, "backend fault");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": err.to_string() })))
                    .into_response()
            },
        }
    }
}

pub fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" }))).into_response()
}

pub type AppResult<T> = Result<T, AppError>;
