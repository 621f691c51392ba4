//! In-memory book storage

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use tokio::sync::RwLock;

use crate::{
    error::{AppError, AppResult},
    models::book::Book,
};

#[derive(Default)]
struct Shelf {
    /// Insertion ordered
    books: IndexMap<String, Book>,
    /// Every id ever stored, including deleted ones
    issued: HashSet<String>,
}

#[derive(Clone, Default)]
pub struct BooksRepository {
    shelf: Arc<RwLock<Shelf>>,
}

impl BooksRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// All books in insertion order
    pub async fn list(&self) -> Vec<Book> {
        let shelf = self.shelf.read().await;
        shelf.books.values().cloned().collect()
    }

    pub async fn get_by_id(&self, id: &str) -> Option<Book> {
        let shelf = self.shelf.read().await;
        shelf.books.get(id).cloned()
    }

    pub async fn contains(&self, id: &str) -> bool {
        let shelf = self.shelf.read().await;
        shelf.books.contains_key(id)
    }

    pub async fn count(&self) -> usize {
        let shelf = self.shelf.read().await;
        shelf.books.len()
    }

    /// Append a book. Fails with `Conflict` if its id was ever issued before.
    pub async fn insert(&self, book: Book) -> AppResult<()> {
        let mut shelf = self.shelf.write().await;
        if !shelf.issued.insert(book.id.clone()) {
            return Err(AppError::Conflict(format!("Book id {} already issued", book.id)));
        }
        shelf.books.insert(book.id.clone(), book);
        Ok(())
    }

    /// Run `f` on the stored book under the write lock.
    /// Returns `None` if no book has this id.
    pub async fn update<F, T>(&self, id: &str, f: F) -> Option<T>
    where
        F: FnOnce(&mut Book) -> T,
    {
        let mut shelf = self.shelf.write().await;
        shelf.books.get_mut(id).map(f)
    }

    /// Remove a book, keeping the order of the remaining ones
    pub async fn delete(&self, id: &str) -> Option<Book> {
        let mut shelf = self.shelf.write().await;
        shelf.books.shift_remove(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::book::BookFields;
    use chrono::Utc;

    fn book(id: &str, name: &str) -> Book {
        let fields = BookFields {
            name: name.to_string(),
            year: Some(2020),
            author: None,
            summary: None,
            publisher: Some("Dicoding".to_string()),
            page_count: Some(100),
            read_page: Some(0),
            reading: Some(false),
        };
        Book::new(id.to_string(), fields, Utc::now())
    }

    fn ids(books: &[Book]) -> Vec<&str> {
        books.iter().map(|b| b.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_insert_preserves_order() {
        let repo = BooksRepository::new();
        repo.insert(book("c", "C")).await.unwrap();
        repo.insert(book("a", "A")).await.unwrap();
        repo.insert(book("b", "B")).await.unwrap();

        assert_eq!(ids(&repo.list().await), vec!["c", "a", "b"]);
        assert_eq!(repo.count().await, 3);
    }

    #[tokio::test]
    async fn test_delete_keeps_remaining_order() {
        let repo = BooksRepository::new();
        for id in ["a", "b", "c", "d"] {
            repo.insert(book(id, id)).await.unwrap();
        }

        let removed = repo.delete("b").await.unwrap();
        assert_eq!(removed.id, "b");
        assert!(repo.delete("b").await.is_none());
        assert!(!repo.contains("b").await);
        assert_eq!(ids(&repo.list().await), vec!["a", "c", "d"]);
    }

    #[tokio::test]
    async fn test_ids_are_never_reused() {
        let repo = BooksRepository::new();
        repo.insert(book("a", "A")).await.unwrap();
        assert!(matches!(
            repo.insert(book("a", "again")).await,
            Err(AppError::Conflict(_))
        ));

        repo.delete("a").await.unwrap();
        assert!(matches!(
            repo.insert(book("a", "again")).await,
            Err(AppError::Conflict(_))
        ));
        assert_eq!(repo.count().await, 0);
    }

    #[tokio::test]
    async fn test_update_in_place() {
        let repo = BooksRepository::new();
        repo.insert(book("a", "A")).await.unwrap();
        repo.insert(book("b", "B")).await.unwrap();

        let renamed = repo
            .update("a", |b| {
                b.name = "Renamed".to_string();
                b.name.clone()
            })
            .await;
        assert_eq!(renamed.as_deref(), Some("Renamed"));
        assert!(repo.update("missing", |_| ()).await.is_none());

        let books = repo.list().await;
        assert_eq!(ids(&books), vec!["a", "b"]);
        assert_eq!(books[0].name, "Renamed");
    }

    #[tokio::test]
    async fn test_clones_share_storage() {
        let repo = BooksRepository::new();
        let other = repo.clone();
        repo.insert(book("a", "A")).await.unwrap();
        assert_eq!(other.get_by_id("a").await.map(|b| b.name), Some("A".to_string()));
    }
}
