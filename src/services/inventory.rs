//! Borrowing and returning of books
//!
//! Every operation that changes copy counts opens an inventory transaction,
//! locks the book row first, checks the rules against the locked state and
//! commits the book update together with the borrow record write. Concurrent
//! requests on the same book are therefore serialized by the store.

use chrono::{Duration, Utc};

use crate::{
    config::InventoryConfig,
    error::{AppError, AppResult, RuleViolation},
    models::{BorrowRecord, BorrowStatus, NewBorrowRecord, PageRequest},
    repository::Repository,
};

#[derive(Clone)]
pub struct InventoryService {
    repository: Repository,
    loan_period: Duration,
}

fn book_not_found(book_id: i32) -> AppError {
    AppError::NotFound(format!("Book with id {} not found", book_id))
}

impl InventoryService {
    pub fn new(repository: Repository, config: &InventoryConfig) -> Self {
        Self {
            repository,
            loan_period: Duration::days(config.loan_period_days),
        }
    }

    /// Lend one copy of a book to a user.
    ///
    /// Checked in order: the book exists, a copy is available, the user does
    /// not already hold this book.
    pub async fn borrow_book(&self, user_id: i32, book_id: i32) -> AppResult<BorrowRecord> {
        // Verify user exists
        self.repository.users.get_by_id(user_id).await?;

        let mut tx = self.repository.borrows.begin().await?;

        let mut book = tx
            .lock_book(book_id)
            .await?
            .ok_or_else(|| book_not_found(book_id))?;

        book.take_copy()?;

        if tx.active_record(user_id, book_id).await?.is_some() {
            return Err(RuleViolation::AlreadyBorrowed.into());
        }

        let book = tx.save_book(&book).await?;
        let record = tx
            .insert_record(&NewBorrowRecord::new(user_id, book_id, Utc::now(), self.loan_period))
            .await?;
        tx.commit().await?;

        tracing::info!(
            user_id,
            book_id,
            record_id = record.id,
            available_copies = book.available_copies,
            "Book borrowed"
        );

        Ok(record)
    }

    /// Bring back the copy a user holds
    pub async fn return_book(&self, user_id: i32, book_id: i32) -> AppResult<BorrowRecord> {
        let mut tx = self.repository.borrows.begin().await?;

        let mut book = tx
            .lock_book(book_id)
            .await?
            .ok_or_else(|| book_not_found(book_id))?;

        let mut record = tx
            .active_record(user_id, book_id)
            .await?
            .ok_or(RuleViolation::NotBorrowed)?;

        book.restore_copy()?;
        record.mark_returned(Utc::now())?;

        let book = tx.save_book(&book).await?;
        let record = tx.save_record(&record).await?;
        tx.commit().await?;

        tracing::info!(
            user_id,
            book_id,
            record_id = record.id,
            available_copies = book.available_copies,
            "Book returned"
        );

        Ok(record)
    }

    pub async fn has_user_borrowed_book(&self, user_id: i32, book_id: i32) -> AppResult<bool> {
        self.repository.borrows.has_active(user_id, book_id).await
    }

    /// Borrow records of a user, most recent first
    pub async fn get_user_borrow_records(
        &self,
        user_id: i32,
        page: PageRequest,
    ) -> AppResult<(Vec<BorrowRecord>, i64)> {
        self.repository.users.get_by_id(user_id).await?;
        self.repository.borrows.list_for_user(user_id, None, page).await
    }

    pub async fn get_user_borrow_records_by_status(
        &self,
        user_id: i32,
        status: BorrowStatus,
        page: PageRequest,
    ) -> AppResult<(Vec<BorrowRecord>, i64)> {
        self.repository.users.get_by_id(user_id).await?;
        self.repository
            .borrows
            .list_for_user(user_id, Some(status), page)
            .await
    }

    pub async fn count_active(&self) -> AppResult<i64> {
        self.repository.borrows.count_active().await
    }

    pub async fn count_overdue(&self) -> AppResult<i64> {
        self.repository.borrows.count_overdue(Utc::now()).await
    }
}
