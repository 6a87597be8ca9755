//! In-memory storage backend
//!
//! All stores share one state behind an async mutex. An inventory
//! transaction holds that mutex for its whole lifetime and works on a staged
//! copy, so transactions are serialized and a dropped transaction leaves the
//! committed state untouched.
//!
//! Titles sort and emails match case-insensitively, the same way the
//! PostgreSQL store does with `LOWER(...)`.
//!
//! [`MemoryStore::fail_next_record_insert`] is a fault-injection switch for
//! exercising rollback; the server never calls it.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{BooksRepository, BorrowsRepository, InventoryTx, UsersRepository};
use crate::{
    error::{AppError, AppResult, RuleViolation},
    models::{
        Book, BookQuery, BorrowRecord, BorrowStatus, CreateBook, NewBorrowRecord, NewUser,
        PageRequest, Role, User,
    },
};

#[derive(Debug, Default, Clone)]
struct MemoryState {
    users: BTreeMap<i32, User>,
    books: BTreeMap<i32, Book>,
    archived_books: BTreeMap<i32, Book>,
    records: BTreeMap<i32, BorrowRecord>,
    next_user_id: i32,
    next_book_id: i32,
    next_record_id: i32,
    fail_next_record_insert: bool,
}

impl MemoryState {
    fn book(&self, id: i32) -> AppResult<&Book> {
        self.books
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    fn active_record(&self, user_id: i32, book_id: i32) -> Option<&BorrowRecord> {
        self.records
            .values()
            .find(|r| r.user_id == user_id && r.book_id == book_id && r.is_active())
    }

    fn sorted_books(&self, filter: impl Fn(&Book) -> bool) -> Vec<Book> {
        let mut books: Vec<Book> = self.books.values().filter(|b| filter(*b)).cloned().collect();
        books.sort_by_cached_key(|b| (b.title.to_lowercase(), b.id));
        books
    }
}

fn same_email(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Process-local implementation of every store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fault injection: the next borrow record insert fails with an internal
    /// error, as a lost connection would. One-shot; later inserts succeed.
    pub async fn fail_next_record_insert(&self) {
        self.state.lock().await.fail_next_record_insert = true;
    }
}

#[async_trait]
impl BooksRepository for MemoryStore {
    async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        self.state.lock().await.book(id).cloned()
    }

    async fn exists(&self, id: i32) -> AppResult<bool> {
        Ok(self.state.lock().await.books.contains_key(&id))
    }

    async fn search(&self, query: &BookQuery, page: PageRequest) -> AppResult<(Vec<Book>, i64)> {
        let books = self.state.lock().await.sorted_books(|b| query.matches(b));
        Ok((page.slice(&books), books.len() as i64))
    }

    async fn create(&self, book: &CreateBook, available_copies: i32) -> AppResult<Book> {
        let mut state = self.state.lock().await;

        if state.books.values().any(|b| b.isbn == book.isbn) {
            return Err(AppError::Conflict(format!(
                "A book with ISBN {} already exists",
                book.isbn
            )));
        }

        state.next_book_id += 1;
        let now = Utc::now();
        let created = Book {
            id: state.next_book_id,
            isbn: book.isbn.clone(),
            title: book.title.clone(),
            author: book.author.clone(),
            genre: book.genre.clone(),
            description: book.description.clone(),
            publication_date: book.publication_date,
            total_copies: book.total_copies,
            available_copies,
            created_at: now,
            updated_at: now,
        };
        created.check_copies()?;

        state.books.insert(created.id, created.clone());
        Ok(created)
    }

    async fn count_all(&self) -> AppResult<i64> {
        Ok(self.state.lock().await.books.len() as i64)
    }

    async fn count_available(&self) -> AppResult<i64> {
        let state = self.state.lock().await;
        Ok(state.books.values().filter(|b| b.is_available()).count() as i64)
    }

    async fn count_available_by_genre(&self, genre: &str) -> AppResult<i64> {
        let state = self.state.lock().await;
        Ok(state
            .books
            .values()
            .filter(|b| b.is_available() && b.genre.as_deref() == Some(genre))
            .count() as i64)
    }

    async fn with_borrowed_copies(&self) -> AppResult<Vec<Book>> {
        Ok(self.state.lock().await.sorted_books(|b| b.borrowed_copies() > 0))
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

#[async_trait]
impl BorrowsRepository for MemoryStore {
    async fn begin(&self) -> AppResult<Box<dyn InventoryTx>> {
        let committed = self.state.clone().lock_owned().await;
        let staged = committed.clone();
        Ok(Box::new(MemoryInventoryTx { committed, staged }))
    }

    async fn has_active(&self, user_id: i32, book_id: i32) -> AppResult<bool> {
        Ok(self.state.lock().await.active_record(user_id, book_id).is_some())
    }

    async fn list_for_user(
        &self,
        user_id: i32,
        status: Option<BorrowStatus>,
        page: PageRequest,
    ) -> AppResult<(Vec<BorrowRecord>, i64)> {
        let state = self.state.lock().await;
        let mut records: Vec<BorrowRecord> = state
            .records
            .values()
            .filter(|r| r.user_id == user_id && status.map(|s| r.status == s).unwrap_or(true))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.borrow_date.cmp(&a.borrow_date).then(b.id.cmp(&a.id)));

        Ok((page.slice(&records), records.len() as i64))
    }

    async fn count_active(&self) -> AppResult<i64> {
        let state = self.state.lock().await;
        Ok(state.records.values().filter(|r| r.is_active()).count() as i64)
    }

    async fn count_overdue(&self, now: DateTime<Utc>) -> AppResult<i64> {
        let state = self.state.lock().await;
        Ok(state.records.values().filter(|r| r.is_overdue(now)).count() as i64)
    }
}

#[async_trait]
impl UsersRepository for MemoryStore {
    async fn get_by_id(&self, id: i32) -> AppResult<User> {
        self.state
            .lock()
            .await
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .find(|u| same_email(&u.email, email))
            .cloned())
    }

    async fn create(&self, user: &NewUser) -> AppResult<User> {
        let mut state = self.state.lock().await;

        if state.users.values().any(|u| same_email(&u.email, &user.email)) {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        state.next_user_id += 1;
        let now = Utc::now();
        let created = User {
            id: state.next_user_id,
            email: user.email.clone(),
            password: user.password.clone(),
            firstname: user.firstname.clone(),
            lastname: user.lastname.clone(),
            role: user.role,
            created_at: now,
            updated_at: now,
        };

        state.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn list(&self, page: PageRequest) -> AppResult<(Vec<User>, i64)> {
        let state = self.state.lock().await;
        let users: Vec<User> = state.users.values().cloned().collect();
        Ok((page.slice(&users), users.len() as i64))
    }

    async fn update_role(&self, id: i32, role: Role) -> AppResult<User> {
        let mut state = self.state.lock().await;
        let user = state
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))?;
        user.role = role;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

/// Inventory transaction over the shared in-memory state
pub struct MemoryInventoryTx {
    committed: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
}

#[async_trait]
impl InventoryTx for MemoryInventoryTx {
    async fn lock_book(&mut self, book_id: i32) -> AppResult<Option<Book>> {
        Ok(self.staged.books.get(&book_id).cloned())
    }

    async fn active_record(&mut self, user_id: i32, book_id: i32) -> AppResult<Option<BorrowRecord>> {
        Ok(self.staged.active_record(user_id, book_id).cloned())
    }

    async fn save_book(&mut self, book: &Book) -> AppResult<Book> {
        book.check_copies()?;

        self.staged.book(book.id)?;
        let mut saved = book.clone();
        saved.updated_at = Utc::now();
        self.staged.books.insert(saved.id, saved.clone());
        Ok(saved)
    }

    async fn archive_book(&mut self, book_id: i32) -> AppResult<()> {
        let book = self
            .staged
            .books
            .remove(&book_id)
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", book_id)))?;
        self.staged.archived_books.insert(book_id, book);
        Ok(())
    }

    async fn insert_record(&mut self, record: &NewBorrowRecord) -> AppResult<BorrowRecord> {
        if self.committed.fail_next_record_insert {
            self.committed.fail_next_record_insert = false;
            return Err(AppError::Internal("borrow record insert failed".to_string()));
        }
        if self.staged.active_record(record.user_id, record.book_id).is_some() {
            return Err(RuleViolation::AlreadyBorrowed.into());
        }

        self.staged.next_record_id += 1;
        let created = BorrowRecord {
            id: self.staged.next_record_id,
            user_id: record.user_id,
            book_id: record.book_id,
            borrow_date: record.borrow_date,
            due_date: record.due_date,
            return_date: None,
            status: BorrowStatus::Borrowed,
        };
        self.staged.records.insert(created.id, created.clone());
        Ok(created)
    }

    async fn save_record(&mut self, record: &BorrowRecord) -> AppResult<BorrowRecord> {
        let stored = self
            .staged
            .records
            .get_mut(&record.id)
            .ok_or_else(|| AppError::NotFound(format!("Borrow record {} not found", record.id)))?;
        stored.status = record.status;
        stored.return_date = record.return_date;
        Ok(stored.clone())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemoryInventoryTx { mut committed, staged } = *self;
        let fail_next_record_insert = committed.fail_next_record_insert;
        *committed = MemoryState {
            fail_next_record_insert,
            ..staged
        };
        Ok(())
    }
}
