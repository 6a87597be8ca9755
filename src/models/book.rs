//! Book (catalog entry) model and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::{AppError, AppResult, RuleViolation};

/// Book model from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    /// Unique catalog key
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub genre: Option<String>,
    pub description: Option<String>,
    pub publication_date: Option<NaiveDate>,
    /// Copies owned by the library (at least 1)
    pub total_copies: i32,
    /// Copies not currently lent out
    pub available_copies: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    pub fn borrowed_copies(&self) -> i32 {
        self.total_copies - self.available_copies
    }

    pub fn is_available(&self) -> bool {
        self.available_copies > 0
    }

    /// Store-level guard: a book row must always satisfy
    /// `0 <= available_copies <= total_copies` and `total_copies >= 1`.
    pub fn check_copies(&self) -> AppResult<()> {
        if self.total_copies < 1
            || self.available_copies < 0
            || self.available_copies > self.total_copies
        {
            return Err(AppError::Internal(format!(
                "Inconsistent copy counts for book {}: {}/{}",
                self.id, self.available_copies, self.total_copies
            )));
        }
        Ok(())
    }

    /// Lend one copy out
    pub fn take_copy(&mut self) -> Result<(), RuleViolation> {
        if !self.is_available() {
            return Err(RuleViolation::NotAvailable);
        }
        self.available_copies -= 1;
        Ok(())
    }

    /// Bring one copy back
    pub fn restore_copy(&mut self) -> Result<(), RuleViolation> {
        if self.available_copies >= self.total_copies {
            return Err(RuleViolation::AllCopiesAvailable);
        }
        self.available_copies += 1;
        Ok(())
    }

    /// Change the number of owned copies, shifting available copies by the
    /// same amount so borrowed copies stay accounted for.
    pub fn resize(&mut self, total_copies: i32) -> Result<(), RuleViolation> {
        let borrowed = self.borrowed_copies();
        if total_copies < borrowed.max(1) {
            return Err(RuleViolation::TotalBelowBorrowed);
        }
        self.available_copies = total_copies - borrowed;
        self.total_copies = total_copies;
        Ok(())
    }

    /// A book can only leave the catalog when every copy is on the shelf
    pub fn ensure_removable(&self) -> Result<(), RuleViolation> {
        if self.available_copies < self.total_copies {
            return Err(RuleViolation::CopiesOnLoan);
        }
        Ok(())
    }

    /// Apply descriptive changes from an update request
    pub fn apply(&mut self, changes: &UpdateBook) -> Result<(), RuleViolation> {
        if let Some(ref title) = changes.title {
            self.title = title.clone();
        }
        if let Some(ref author) = changes.author {
            self.author = author.clone();
        }
        if changes.genre.is_some() {
            self.genre = changes.genre.clone();
        }
        if changes.description.is_some() {
            self.description = changes.description.clone();
        }
        if changes.publication_date.is_some() {
            self.publication_date = changes.publication_date;
        }
        if let Some(total) = changes.total_copies {
            self.resize(total)?;
        }
        Ok(())
    }
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 10, max = 17, message = "ISBN must be 10 to 17 characters"))]
    pub isbn: String,
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, max = 255, message = "Author is required"))]
    pub author: String,
    pub genre: Option<String>,
    pub description: Option<String>,
    pub publication_date: Option<NaiveDate>,
    #[validate(range(min = 1, message = "A book needs at least one copy"))]
    pub total_copies: i32,
    /// Defaults to `total_copies`
    #[validate(range(min = 0, message = "Available copies cannot be negative"))]
    pub available_copies: Option<i32>,
}

impl CreateBook {
    /// Initial available copies, checked against the total
    pub fn initial_available(&self) -> AppResult<i32> {
        let available = self.available_copies.unwrap_or(self.total_copies);
        if available > self.total_copies {
            return Err(AppError::Validation(
                "Available copies cannot exceed total copies".to_string(),
            ));
        }
        Ok(available)
    }
}

/// Update book request
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 255, message = "Title cannot be empty"))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 255, message = "Author cannot be empty"))]
    pub author: Option<String>,
    pub genre: Option<String>,
    pub description: Option<String>,
    pub publication_date: Option<NaiveDate>,
    #[validate(range(min = 1, message = "A book needs at least one copy"))]
    pub total_copies: Option<i32>,
}

/// Book search parameters
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    /// Case-insensitive substring of the title
    pub title: Option<String>,
    /// Case-insensitive substring of the author
    pub author: Option<String>,
    /// Exact genre
    pub genre: Option<String>,
    /// Exact ISBN
    pub isbn: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl BookQuery {
    /// In-memory equivalent of the SQL search filter
    pub fn matches(&self, book: &Book) -> bool {
        fn contains(haystack: &str, needle: &Option<String>) -> bool {
            needle
                .as_ref()
                .map(|n| haystack.to_lowercase().contains(&n.to_lowercase()))
                .unwrap_or(true)
        }

        contains(&book.title, &self.title)
            && contains(&book.author, &self.author)
            && self
                .genre
                .as_ref()
                .map(|g| book.genre.as_deref() == Some(g.as_str()))
                .unwrap_or(true)
            && self.isbn.as_ref().map(|i| &book.isbn == i).unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(total: i32, available: i32) -> Book {
        let now = Utc::now();
        Book {
            id: 1,
            isbn: "9780131103627".to_string(),
            title: "The C Programming Language".to_string(),
            author: "Kernighan & Ritchie".to_string(),
            genre: Some("Programming".to_string()),
            description: None,
            publication_date: NaiveDate::from_ymd_opt(1988, 3, 22),
            total_copies: total,
            available_copies: available,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn take_and_restore_round_trip() {
        let mut b = book(5, 5);
        b.take_copy().unwrap();
        assert_eq!(b.available_copies, 4);
        b.restore_copy().unwrap();
        assert_eq!(b.available_copies, 5);
    }

    #[test]
    fn take_copy_fails_when_none_left() {
        let mut b = book(2, 0);
        assert_eq!(b.take_copy(), Err(RuleViolation::NotAvailable));
        assert_eq!(b.available_copies, 0);
    }

    #[test]
    fn restore_copy_fails_when_all_on_shelf() {
        let mut b = book(3, 3);
        assert_eq!(b.restore_copy(), Err(RuleViolation::AllCopiesAvailable));
        assert_eq!(b.available_copies, 3);
    }

    #[test]
    fn resize_keeps_borrowed_copies() {
        let mut b = book(5, 2);
        b.resize(8).unwrap();
        assert_eq!((b.total_copies, b.available_copies), (8, 5));
        b.resize(3).unwrap();
        assert_eq!((b.total_copies, b.available_copies), (3, 0));
        assert_eq!(b.resize(2), Err(RuleViolation::TotalBelowBorrowed));
        assert_eq!((b.total_copies, b.available_copies), (3, 0));
    }

    #[test]
    fn removable_only_when_nothing_borrowed() {
        assert_eq!(book(4, 3).ensure_removable(), Err(RuleViolation::CopiesOnLoan));
        assert!(book(4, 4).ensure_removable().is_ok());
    }

    #[test]
    fn check_copies_rejects_out_of_range_counts() {
        assert!(book(3, 3).check_copies().is_ok());
        assert!(book(3, 4).check_copies().is_err());
        assert!(book(3, -1).check_copies().is_err());
        assert!(book(0, 0).check_copies().is_err());
    }

    #[test]
    fn create_request_defaults_available_to_total() {
        let request = CreateBook {
            isbn: "9780131103627".to_string(),
            title: "t".to_string(),
            author: "a".to_string(),
            genre: None,
            description: None,
            publication_date: None,
            total_copies: 4,
            available_copies: None,
        };
        assert_eq!(request.initial_available().unwrap(), 4);

        let too_many = CreateBook {
            available_copies: Some(5),
            ..request
        };
        assert!(matches!(too_many.initial_available(), Err(AppError::Validation(_))));
    }

    #[test]
    fn query_matching_is_case_insensitive_for_text() {
        let b = book(1, 1);
        let query = BookQuery {
            title: Some("programming".to_string()),
            ..Default::default()
        };
        assert!(query.matches(&b));

        let genre = BookQuery {
            genre: Some("programming".to_string()),
            ..Default::default()
        };
        assert!(!genre.matches(&b));
    }
}
