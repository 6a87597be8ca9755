//! Catalog management service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{Book, BookQuery, CreateBook, PageRequest, UpdateBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Search books with filters
    pub async fn search_books(&self, query: &BookQuery, page: PageRequest) -> AppResult<(Vec<Book>, i64)> {
        self.repository.books.search(query, page).await
    }

    pub async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    pub async fn book_exists(&self, id: i32) -> AppResult<bool> {
        self.repository.books.exists(id).await
    }

    /// Add a book to the catalog
    pub async fn create_book(&self, book: CreateBook) -> AppResult<Book> {
        book.validate()?;
        let available = book.initial_available()?;

        let created = self.repository.books.create(&book, available).await?;
        tracing::info!(book_id = created.id, isbn = %created.isbn, "Book created");
        Ok(created)
    }

    /// Update descriptive fields and the number of owned copies
    pub async fn update_book(&self, id: i32, changes: UpdateBook) -> AppResult<Book> {
        changes.validate()?;

        let mut tx = self.repository.borrows.begin().await?;
        let mut book = tx
            .lock_book(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        book.apply(&changes)?;

        let updated = tx.save_book(&book).await?;
        tx.commit().await?;
        Ok(updated)
    }

    /// Remove a book; refused while any copy is borrowed
    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        let mut tx = self.repository.borrows.begin().await?;
        let book = tx
            .lock_book(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        book.ensure_removable()?;

        tx.archive_book(id).await?;
        tx.commit().await?;

        tracing::info!(book_id = id, "Book deleted");
        Ok(())
    }
}
