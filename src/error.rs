//! Error types for the bookshelf server

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Mutation a validation error belongs to; selects the message prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookAction {
    Add,
    Update,
}

impl std::fmt::Display for BookAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookAction::Add => write!(f, "menambahkan buku"),
            BookAction::Update => write!(f, "memperbarui buku"),
        }
    }
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Gagal {0}. Mohon isi nama buku")]
    MissingName(BookAction),

    #[error("Gagal {0}. readPage tidak boleh lebih besar dari pageCount")]
    PageOverflow(BookAction),

    #[error("{0}")]
    NotFound(String),

    #[error("Gagal menambahkan buku")]
    InsertFailure,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("{0}")]
    BadRequest(String),
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Always `fail`
    pub status: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::MissingName(_)
            | AppError::PageOverflow(_)
            | AppError::InsertFailure
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(msg) => {
                tracing::error!("Unresolved id conflict: {}", msg);
                StatusCode::CONFLICT
            }
        };

        let body = Json(ErrorResponse {
            status: "fail".to_string(),
            message: self.to_string(),
        });

        (status, body).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::warn!("Rejected request body: {}", rejection.body_text());
        AppError::BadRequest(rejection.body_text())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
