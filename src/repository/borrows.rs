//! Borrow records repository and inventory transactions

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Transaction};

use super::is_unique_violation;
use crate::{
    error::{AppError, AppResult, RuleViolation},
    models::{Book, BorrowRecord, BorrowStatus, NewBorrowRecord, PageRequest},
};

/// Unit of work over one book row and its borrow records.
///
/// `lock_book` takes an exclusive lock on the book held until the
/// transaction ends. Dropping the transaction without `commit` rolls every
/// write back.
#[async_trait]
pub trait InventoryTx: Send {
    /// Lock a live book for the rest of the transaction
    async fn lock_book(&mut self, book_id: i32) -> AppResult<Option<Book>>;

    /// The BORROWED record for (user, book), if any
    async fn active_record(&mut self, user_id: i32, book_id: i32) -> AppResult<Option<BorrowRecord>>;

    /// Persist book fields and copy counts
    async fn save_book(&mut self, book: &Book) -> AppResult<Book>;

    /// Remove a book from the catalog, keeping its borrow history
    async fn archive_book(&mut self, book_id: i32) -> AppResult<()>;

    async fn insert_record(&mut self, record: &NewBorrowRecord) -> AppResult<BorrowRecord>;

    /// Persist status and return date of a record
    async fn save_record(&mut self, record: &BorrowRecord) -> AppResult<BorrowRecord>;

    async fn commit(self: Box<Self>) -> AppResult<()>;
}

#[async_trait]
pub trait BorrowsRepository: Send + Sync {
    /// Open an inventory transaction
    async fn begin(&self) -> AppResult<Box<dyn InventoryTx>>;

    /// True iff a BORROWED record exists for (user, book)
    async fn has_active(&self, user_id: i32, book_id: i32) -> AppResult<bool>;

    /// Records of a user, most recent borrow first
    async fn list_for_user(
        &self,
        user_id: i32,
        status: Option<BorrowStatus>,
        page: PageRequest,
    ) -> AppResult<(Vec<BorrowRecord>, i64)>;

    async fn count_active(&self) -> AppResult<i64>;

    async fn count_overdue(&self, now: DateTime<Utc>) -> AppResult<i64>;
}

#[derive(Clone)]
pub struct PgBorrowsRepository {
    pool: Pool<Postgres>,
}

impl PgBorrowsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BorrowsRepository for PgBorrowsRepository {
    async fn begin(&self) -> AppResult<Box<dyn InventoryTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgInventoryTx { tx }))
    }

    async fn has_active(&self, user_id: i32, book_id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM borrow_records
                WHERE user_id = $1 AND book_id = $2 AND status = 'borrowed'
            )
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn list_for_user(
        &self,
        user_id: i32,
        status: Option<BorrowStatus>,
        page: PageRequest,
    ) -> AppResult<(Vec<BorrowRecord>, i64)> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM borrow_records
            WHERE user_id = $1 AND ($2::TEXT IS NULL OR status = $2)
            "#,
        )
        .bind(user_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        let records = sqlx::query_as::<_, BorrowRecord>(
            r#"
            SELECT * FROM borrow_records
            WHERE user_id = $1 AND ($2::TEXT IS NULL OR status = $2)
            ORDER BY borrow_date DESC, id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(user_id)
        .bind(status)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((records, total))
    }

    async fn count_active(&self) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM borrow_records WHERE status = 'borrowed'")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    async fn count_overdue(&self, now: DateTime<Utc>) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrow_records WHERE status = 'borrowed' AND due_date < $1",
        )
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}

/// Inventory transaction on a PostgreSQL connection (`SELECT ... FOR UPDATE`)
pub struct PgInventoryTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl InventoryTx for PgInventoryTx {
    async fn lock_book(&mut self, book_id: i32) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(
            "SELECT * FROM books WHERE id = $1 AND archived_at IS NULL FOR UPDATE",
        )
        .bind(book_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(book)
    }

    async fn active_record(&mut self, user_id: i32, book_id: i32) -> AppResult<Option<BorrowRecord>> {
        let record = sqlx::query_as::<_, BorrowRecord>(
            r#"
            SELECT * FROM borrow_records
            WHERE user_id = $1 AND book_id = $2 AND status = 'borrowed'
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(record)
    }

    async fn save_book(&mut self, book: &Book) -> AppResult<Book> {
        book.check_copies()?;

        sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = $1, author = $2, genre = $3, description = $4, publication_date = $5,
                total_copies = $6, available_copies = $7, updated_at = NOW()
            WHERE id = $8 AND archived_at IS NULL
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.genre)
        .bind(&book.description)
        .bind(book.publication_date)
        .bind(book.total_copies)
        .bind(book.available_copies)
        .bind(book.id)
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", book.id)))
    }

    async fn archive_book(&mut self, book_id: i32) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE books SET archived_at = NOW() WHERE id = $1 AND archived_at IS NULL",
        )
        .bind(book_id)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", book_id)));
        }
        Ok(())
    }

    async fn insert_record(&mut self, record: &NewBorrowRecord) -> AppResult<BorrowRecord> {
        sqlx::query_as::<_, BorrowRecord>(
            r#"
            INSERT INTO borrow_records (user_id, book_id, borrow_date, due_date, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(record.user_id)
        .bind(record.book_id)
        .bind(record.borrow_date)
        .bind(record.due_date)
        .bind(BorrowStatus::Borrowed)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                RuleViolation::AlreadyBorrowed.into()
            } else {
                e.into()
            }
        })
    }

    async fn save_record(&mut self, record: &BorrowRecord) -> AppResult<BorrowRecord> {
        sqlx::query_as::<_, BorrowRecord>(
            r#"
            UPDATE borrow_records SET status = $1, return_date = $2
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(record.status)
        .bind(record.return_date)
        .bind(record.id)
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Borrow record {} not found", record.id)))
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
