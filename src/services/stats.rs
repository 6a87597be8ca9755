//! Statistics service
//!
//! Read-only aggregates over the catalog. Each figure is read independently,
//! so a summary is not a snapshot when borrows run concurrently.

use chrono::Utc;

use crate::{
    api::stats::BookStatistics,
    error::AppResult,
    models::Book,
    repository::Repository,
};

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

/// Share of available books in percent, rounded to two decimals.
/// An empty catalog is 0% available.
pub fn availability_percentage(available: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let percentage = available as f64 / total as f64 * 100.0;
    (percentage * 100.0).round() / 100.0
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn count_all_books(&self) -> AppResult<i64> {
        self.repository.books.count_all().await
    }

    pub async fn count_available_books(&self) -> AppResult<i64> {
        self.repository.books.count_available().await
    }

    pub async fn count_available_books_by_genre(&self, genre: &str) -> AppResult<i64> {
        self.repository.books.count_available_by_genre(genre).await
    }

    pub async fn get_books_with_borrowed_copies(&self) -> AppResult<Vec<Book>> {
        self.repository.books.with_borrowed_copies().await
    }

    pub async fn get_availability_percentage(&self) -> AppResult<f64> {
        let total = self.count_all_books().await?;
        let available = self.count_available_books().await?;
        Ok(availability_percentage(available, total))
    }

    /// Store connectivity check used by the readiness probe
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.books.ping().await
    }

    /// All catalog figures in one response
    pub async fn summary(&self) -> AppResult<BookStatistics> {
        let total_books = self.count_all_books().await?;
        let available_books = self.count_available_books().await?;
        let books_with_borrowed_copies = self.get_books_with_borrowed_copies().await?.len() as i64;

        Ok(BookStatistics {
            total_books,
            available_books,
            books_with_borrowed_copies,
            availability_percentage: availability_percentage(available_books, total_books),
            active_borrows: self.repository.borrows.count_active().await?,
            overdue_borrows: self.repository.borrows.count_overdue(Utc::now()).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::repository::{books::MockBooksRepository, memory::MemoryStore};

    fn service_with(books: MockBooksRepository) -> StatsService {
        let store = Arc::new(MemoryStore::new());
        StatsService::new(Repository::from_parts(Arc::new(books), store.clone(), store))
    }

    #[test]
    fn percentage_is_rounded_not_truncated() {
        assert_eq!(availability_percentage(89, 137), 64.96);
        assert_eq!(availability_percentage(2, 3), 66.67);
        assert_eq!(availability_percentage(1, 3), 33.33);
        assert_eq!(availability_percentage(5, 5), 100.0);
    }

    #[test]
    fn empty_catalog_is_zero_percent() {
        assert_eq!(availability_percentage(0, 0), 0.0);
    }

    #[tokio::test]
    async fn percentage_reads_both_counts_from_the_store() {
        let mut books = MockBooksRepository::new();
        books.expect_count_all().times(1).returning(|| Ok(137));
        books.expect_count_available().times(1).returning(|| Ok(89));

        let percentage = service_with(books).get_availability_percentage().await.unwrap();
        assert_eq!(percentage, 64.96);
    }

    #[tokio::test]
    async fn genre_count_is_delegated_with_the_given_genre() {
        let mut books = MockBooksRepository::new();
        books
            .expect_count_available_by_genre()
            .times(1)
            .returning(|genre| Ok(if genre == "Science Fiction" { 12 } else { 0 }));

        let count = service_with(books)
            .count_available_books_by_genre("Science Fiction")
            .await
            .unwrap();
        assert_eq!(count, 12);
    }

    #[tokio::test]
    async fn store_errors_propagate() {
        let mut books = MockBooksRepository::new();
        books
            .expect_count_all()
            .returning(|| Err(crate::error::AppError::Internal("store unavailable".into())));

        let result = service_with(books).get_availability_percentage().await;
        tokio_test::assert_err!(result);
    }
}
