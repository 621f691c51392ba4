//! Bookshelf service: validation, id generation and filtering on top of the store

use chrono::{DateTime, Duration, SubsecRound, Utc};
use rand::Rng;

use crate::{
    config::StoreConfig,
    error::{AppError, AppResult, BookAction},
    models::book::{Book, BookPayload, BookQuery, BookSummary},
    repository::Repository,
};

/// URL-safe alphabet used for book ids
const ID_ALPHABET: &[u8] = b"useandom-26T198340PX75pxJACKVERYMINDBUSHWOLF_GQZbfghjklqvwyzrict";

/// Attempts at drawing an unused id before giving up on an insert
const MAX_ID_ATTEMPTS: usize = 8;

/// Random id of `len` characters from [`ID_ALPHABET`]
pub fn generate_id(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

/// Current time at the precision timestamps are exposed with
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
    config: StoreConfig,
}

impl BooksService {
    pub fn new(repository: Repository, config: StoreConfig) -> Self {
        Self { repository, config }
    }

    /// Validate and store a new book, returning its id
    pub async fn add_book(&self, payload: BookPayload) -> AppResult<String> {
        let fields = payload.validate(BookAction::Add).map_err(|e| {
            tracing::warn!("Add book rejected: {}", e);
            e
        })?;
        let inserted_at = now();

        let mut attempts = 0;
        let id = loop {
            attempts += 1;
            let id = generate_id(self.config.id_length);
            let book = Book::new(id.clone(), fields.clone(), inserted_at);
            match self.repository.books.insert(book).await {
                Ok(()) => break id,
                Err(AppError::Conflict(msg)) if attempts < MAX_ID_ATTEMPTS => {
                    tracing::debug!("Regenerating book id: {}", msg);
                }
                Err(e) => {
                    tracing::error!("Add book failed after {} attempts: {}", attempts, e);
                    return Err(AppError::InsertFailure);
                }
            }
        };

        if !self.repository.books.contains(&id).await {
            tracing::error!("Book {} missing right after insert", id);
            return Err(AppError::InsertFailure);
        }

        tracing::info!("Book added: id={}", id);
        Ok(id)
    }

    /// List books matching `query`, projected to their summaries
    pub async fn list_books(&self, query: &BookQuery) -> Vec<BookSummary> {
        let filters = query.filters(self.config.filter_mode);
        tracing::debug!("Listing books with filters {:?}", filters);

        self.repository
            .books
            .list()
            .await
            .iter()
            .filter(|book| filters.iter().all(|filter| filter.matches(book)))
            .map(BookSummary::from)
            .collect()
    }

    pub async fn get_book(&self, id: &str) -> AppResult<Book> {
        self.repository
            .books
            .get_by_id(id)
            .await
            .ok_or_else(|| AppError::NotFound("Buku tidak ditemukan".to_string()))
    }

    /// Replace the mutable fields of a book. Validation runs before the lookup.
    pub async fn update_book(&self, id: &str, payload: BookPayload) -> AppResult<()> {
        let fields = payload.validate(BookAction::Update).map_err(|e| {
            tracing::warn!("Update of book {} rejected: {}", id, e);
            e
        })?;
        let at = now();

        self.repository
            .books
            .update(id, move |book| {
                // updatedAt must move forward even within the same millisecond
                let updated_at = if at > book.updated_at {
                    at
                } else {
                    book.updated_at + Duration::milliseconds(1)
                };
                book.apply(fields, updated_at);
            })
            .await
            .ok_or_else(|| {
                AppError::NotFound("Gagal memperbarui buku. Id tidak ditemukan".to_string())
            })?;

        tracing::info!("Book updated: id={}", id);
        Ok(())
    }

    pub async fn delete_book(&self, id: &str) -> AppResult<()> {
        self.repository
            .books
            .delete(id)
            .await
            .ok_or_else(|| {
                AppError::NotFound("Buku gagal dihapus. Id tidak ditemukan".to_string())
            })?;

        tracing::info!("Book deleted: id={}", id);
        Ok(())
    }

    /// Number of books currently on the shelf
    pub async fn count(&self) -> usize {
        self.repository.books.count().await
    }
}
