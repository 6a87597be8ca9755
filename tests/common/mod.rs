//! Shared fixtures for the in-memory integration suites
#![allow(dead_code)]

use std::sync::Arc;

use library_server::{
    config::AppConfig,
    models::{Book, CreateBook, NewUser, Role, User},
    repository::{memory::MemoryStore, Repository},
    AppState,
};

pub struct TestApp {
    pub state: AppState,
    pub repository: Repository,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let repository = Repository::from_parts(store.clone(), store.clone(), store.clone());
        let state = AppState::new(config, repository.clone());
        Self {
            state,
            repository,
            store,
        }
    }

    /// Insert a user directly, skipping password hashing
    pub async fn user(&self, email: &str, role: Role) -> User {
        self.repository
            .users
            .create(&NewUser {
                email: email.to_string(),
                password: "not-a-real-hash".to_string(),
                firstname: None,
                lastname: None,
                role,
            })
            .await
            .expect("user fixture")
    }

    pub async fn member(&self, email: &str) -> User {
        self.user(email, Role::Member).await
    }

    pub async fn book(&self, isbn: &str, title: &str, genre: &str, total_copies: i32) -> Book {
        self.book_with_available(isbn, title, genre, total_copies, None).await
    }

    pub async fn book_with_available(
        &self,
        isbn: &str,
        title: &str,
        genre: &str,
        total_copies: i32,
        available_copies: Option<i32>,
    ) -> Book {
        self.state
            .services
            .catalog
            .create_book(CreateBook {
                isbn: isbn.to_string(),
                title: title.to_string(),
                author: "Test Author".to_string(),
                genre: Some(genre.to_string()),
                description: None,
                publication_date: None,
                total_copies,
                available_copies,
            })
            .await
            .expect("book fixture")
    }

    pub async fn available_copies(&self, book_id: i32) -> i32 {
        self.repository
            .books
            .get_by_id(book_id)
            .await
            .expect("book lookup")
            .available_copies
    }

    pub fn token(&self, user: &User) -> String {
        self.state
            .services
            .auth
            .create_token_for_user(user)
            .expect("token")
    }
}
