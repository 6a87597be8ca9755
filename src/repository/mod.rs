//! Repository layer for database operations
//!
//! Each store is a trait with a PostgreSQL implementation (`sqlx`) and an
//! in-memory one sharing the same semantics. Services only see the traits.

pub mod books;
pub mod borrows;
pub mod memory;
pub mod users;

use std::sync::Arc;

use sqlx::{Pool, Postgres};

pub use books::BooksRepository;
pub use borrows::{BorrowsRepository, InventoryTx};
pub use users::UsersRepository;

/// Main repository struct holding one handle per store
#[derive(Clone)]
pub struct Repository {
    pub books: Arc<dyn BooksRepository>,
    pub borrows: Arc<dyn BorrowsRepository>,
    pub users: Arc<dyn UsersRepository>,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: Arc::new(books::PgBooksRepository::new(pool.clone())),
            borrows: Arc::new(borrows::PgBorrowsRepository::new(pool.clone())),
            users: Arc::new(users::PgUsersRepository::new(pool)),
        }
    }

    /// Create a repository backed by process memory
    pub fn in_memory() -> Self {
        let store = Arc::new(memory::MemoryStore::default());
        Self {
            books: store.clone(),
            borrows: store.clone(),
            users: store,
        }
    }

    /// Assemble a repository from individual stores
    pub fn from_parts(
        books: Arc<dyn BooksRepository>,
        borrows: Arc<dyn BorrowsRepository>,
        users: Arc<dyn UsersRepository>,
    ) -> Self {
        Self { books, borrows, users }
    }
}

/// PostgreSQL unique_violation
pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}
