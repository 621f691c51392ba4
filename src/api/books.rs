//! Book endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult, ErrorResponse},
    models::book::{Book, BookPayload, BookQuery, BookSummary},
};

const SUCCESS: &str = "success";

/// Status plus message, used by update and delete
#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub status: String,
    pub message: String,
}

impl MessageResponse {
    fn success(message: &str) -> Self {
        Self {
            status: SUCCESS.to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookIdData {
    pub book_id: String,
}

#[derive(Serialize, ToSchema)]
pub struct AddBookResponse {
    pub status: String,
    pub message: String,
    pub data: BookIdData,
}

#[derive(Serialize, ToSchema)]
pub struct BookListData {
    pub books: Vec<BookSummary>,
}

#[derive(Serialize, ToSchema)]
pub struct ListBooksResponse {
    pub status: String,
    pub data: BookListData,
}

#[derive(Serialize, ToSchema)]
pub struct BookData {
    pub book: Book,
}

#[derive(Serialize, ToSchema)]
pub struct GetBookResponse {
    pub status: String,
    pub data: BookData,
}

/// Add a book to the shelf
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    request_body = BookPayload,
    responses(
        (status = 201, description = "Book added", body = AddBookResponse),
        (status = 400, description = "Missing name, readPage above pageCount or malformed body", body = ErrorResponse)
    )
)]
pub async fn add_book(
    State(state): State<crate::AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<BookPayload>, AppError>,
) -> AppResult<(StatusCode, Json<AddBookResponse>)> {
    let book_id = state.services.books.add_book(payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(AddBookResponse {
            status: SUCCESS.to_string(),
            message: "Buku berhasil ditambahkan".to_string(),
            data: BookIdData { book_id },
        }),
    ))
}

/// List books, optionally filtered
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    params(
        ("name" = Option<String>, Query, description = "Case-insensitive search in book name"),
        ("reading" = Option<String>, Query, description = "1 for books being read, 0 otherwise"),
        ("finished" = Option<String>, Query, description = "1 for finished books, 0 otherwise")
    ),
    responses(
        (status = 200, description = "Book summaries", body = ListBooksResponse)
    )
)]
pub async fn list_books(
    State(state): State<crate::AppState>,
    params: Option<Query<Vec<(String, String)>>>,
) -> Json<ListBooksResponse> {
    // An undecodable query string lists everything rather than failing
    let query = params
        .map(|Query(pairs)| BookQuery::from_pairs(pairs))
        .unwrap_or_default();
    let books = state.services.books.list_books(&query).await;

    Json(ListBooksResponse {
        status: SUCCESS.to_string(),
        data: BookListData { books },
    })
}

/// Get a book by ID
#[utoipa::path(
    get,
    path = "/books/{bookId}",
    tag = "books",
    params(("bookId" = String, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = GetBookResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    Path(book_id): Path<String>,
) -> AppResult<Json<GetBookResponse>> {
    let book = state.services.books.get_book(&book_id).await?;

    Ok(Json(GetBookResponse {
        status: SUCCESS.to_string(),
        data: BookData { book },
    }))
}

/// Update a book
#[utoipa::path(
    put,
    path = "/books/{bookId}",
    tag = "books",
    params(("bookId" = String, Path, description = "Book ID")),
    request_body = BookPayload,
    responses(
        (status = 200, description = "Book updated", body = MessageResponse),
        (status = 400, description = "Missing name or readPage above pageCount", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    Path(book_id): Path<String>,
    WithRejection(Json(payload), _): WithRejection<Json<BookPayload>, AppError>,
) -> AppResult<Json<MessageResponse>> {
    state.services.books.update_book(&book_id, payload).await?;
    Ok(Json(MessageResponse::success("Buku berhasil diperbarui")))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/books/{bookId}",
    tag = "books",
    params(("bookId" = String, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book deleted", body = MessageResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    Path(book_id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state.services.books.delete_book(&book_id).await?;
    Ok(Json(MessageResponse::success("Buku berhasil dihapus")))
}
