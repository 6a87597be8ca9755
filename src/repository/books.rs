//! Books repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres, QueryBuilder};

#[cfg(test)]
use mockall::automock;

use super::is_unique_violation;
use crate::{
    error::{AppError, AppResult},
    models::{Book, BookQuery, CreateBook, PageRequest},
};

/// Read side of the book catalog plus book creation.
///
/// Every write that touches copy counts of an existing book goes through an
/// [`InventoryTx`](super::InventoryTx) so it runs under the book row lock.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait BooksRepository: Send + Sync {
    /// Get a live book by ID
    async fn get_by_id(&self, id: i32) -> AppResult<Book>;

    async fn exists(&self, id: i32) -> AppResult<bool>;

    /// Search live books, ordered by title then id
    async fn search(&self, query: &BookQuery, page: PageRequest) -> AppResult<(Vec<Book>, i64)>;

    /// Insert a book; a live book with the same ISBN is a conflict
    async fn create(&self, book: &CreateBook, available_copies: i32) -> AppResult<Book>;

    async fn count_all(&self) -> AppResult<i64>;

    /// Count books with at least one copy on the shelf
    async fn count_available(&self) -> AppResult<i64>;

    async fn count_available_by_genre(&self, genre: &str) -> AppResult<i64>;

    /// Books with at least one copy lent out
    async fn with_borrowed_copies(&self) -> AppResult<Vec<Book>>;

    /// Check the store is reachable
    async fn ping(&self) -> AppResult<()>;
}

#[derive(Clone)]
pub struct PgBooksRepository {
    pool: Pool<Postgres>,
}

impl PgBooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &BookQuery) {
        builder.push(" WHERE archived_at IS NULL");

        if let Some(ref title) = query.title {
            builder.push(" AND title ILIKE ").push_bind(format!("%{}%", title));
        }
        if let Some(ref author) = query.author {
            builder.push(" AND author ILIKE ").push_bind(format!("%{}%", author));
        }
        if let Some(ref genre) = query.genre {
            builder.push(" AND genre = ").push_bind(genre.clone());
        }
        if let Some(ref isbn) = query.isbn {
            builder.push(" AND isbn = ").push_bind(isbn.clone());
        }
    }
}

#[async_trait]
impl BooksRepository for PgBooksRepository {
    async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1 AND archived_at IS NULL")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    async fn exists(&self, id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM books WHERE id = $1 AND archived_at IS NULL)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn search(&self, query: &BookQuery, page: PageRequest) -> AppResult<(Vec<Book>, i64)> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM books");
        Self::push_filters(&mut count, query);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::new("SELECT * FROM books");
        Self::push_filters(&mut select, query);
        select
            .push(" ORDER BY LOWER(title), id LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let books = select.build_query_as::<Book>().fetch_all(&self.pool).await?;

        Ok((books, total))
    }

    async fn create(&self, book: &CreateBook, available_copies: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (isbn, title, author, genre, description, publication_date,
                               total_copies, available_copies)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&book.isbn)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.genre)
        .bind(&book.description)
        .bind(book.publication_date)
        .bind(book.total_copies)
        .bind(available_copies)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(format!("A book with ISBN {} already exists", book.isbn))
            } else {
                e.into()
            }
        })
    }

    async fn count_all(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE archived_at IS NULL")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_available(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM books WHERE archived_at IS NULL AND available_copies > 0",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn count_available_by_genre(&self, genre: &str) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM books
            WHERE archived_at IS NULL AND available_copies > 0 AND genre = $1
            "#,
        )
        .bind(genre)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn with_borrowed_copies(&self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT * FROM books
            WHERE archived_at IS NULL AND available_copies < total_copies
            ORDER BY LOWER(title), id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
