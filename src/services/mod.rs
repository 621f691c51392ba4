//! Business logic services

pub mod books;

use crate::{config::StoreConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub books: books::BooksService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, store_config: StoreConfig) -> Self {
        Self {
            books: books::BooksService::new(repository, store_config),
        }
    }
}
