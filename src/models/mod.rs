//! Data models for the library server

pub mod book;
pub mod borrow;
pub mod page;
pub mod user;

// Re-export commonly used types
pub use book::{Book, BookQuery, CreateBook, UpdateBook};
pub use borrow::{BorrowQuery, BorrowRecord, BorrowStatus, NewBorrowRecord};
pub use page::PageRequest;
pub use user::{NewUser, Role, User, UserClaims};
