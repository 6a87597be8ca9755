//! PostgreSQL store tests
//!
//! Run with: DATABASE_URL=postgres://... cargo test --test postgres_tests -- --ignored

use chrono::Utc;
use library_server::{
    config::AppConfig,
    error::RuleViolation,
    models::{CreateBook, NewUser, Role, User},
    repository::Repository,
    AppError, AppState,
};
use sqlx::postgres::PgPoolOptions;

async fn setup() -> (AppState, Repository) {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(16)
        .connect(&url)
        .await
        .expect("Failed to connect to database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let repository = Repository::new(pool);
    (AppState::new(AppConfig::default(), repository.clone()), repository)
}

/// Suffix keeping fixtures unique across runs against the same database
fn unique() -> String {
    format!("{}", Utc::now().timestamp_nanos_opt().unwrap_or_default() % 10_000_000_000)
}

async fn user(repository: &Repository, tag: &str) -> User {
    repository
        .users
        .create(&NewUser {
            email: format!("{}-{}@library.test", tag, unique()),
            password: "not-a-real-hash".to_string(),
            firstname: None,
            lastname: None,
            role: Role::Member,
        })
        .await
        .unwrap()
}

fn book(total_copies: i32) -> CreateBook {
    CreateBook {
        isbn: format!("978{:0>10}", unique()),
        title: "Postgres Test Book".to_string(),
        author: "Test Author".to_string(),
        genre: Some("Testing".to_string()),
        description: None,
        publication_date: None,
        total_copies,
        available_copies: None,
    }
}

#[tokio::test]
#[ignore]
async fn borrow_and_return_round_trip() {
    let (state, repository) = setup().await;
    let reader = user(&repository, "round-trip").await;
    let created = state.services.catalog.create_book(book(5)).await.unwrap();
    let inventory = &state.services.inventory;

    inventory.borrow_book(reader.id, created.id).await.unwrap();
    assert_eq!(state.services.catalog.get_book(created.id).await.unwrap().available_copies, 4);

    match inventory.borrow_book(reader.id, created.id).await {
        Err(AppError::BusinessRule(RuleViolation::AlreadyBorrowed)) => {}
        other => panic!("expected AlreadyBorrowed, got {:?}", other),
    }

    inventory.return_book(reader.id, created.id).await.unwrap();
    assert_eq!(state.services.catalog.get_book(created.id).await.unwrap().available_copies, 5);

    state.services.catalog.delete_book(created.id).await.unwrap();
    assert!(!state.services.catalog.book_exists(created.id).await.unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn concurrent_borrows_take_exactly_the_available_copies() {
    let (state, repository) = setup().await;
    let created = state.services.catalog.create_book(book(2)).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..8 {
        let reader = user(&repository, &format!("concurrent{}", i)).await;
        let inventory = state.services.inventory.clone();
        let book_id = created.id;
        handles.push(tokio::spawn(async move {
            inventory.borrow_book(reader.id, book_id).await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            successes += 1;
        }
    }

    assert_eq!(successes, 2);
    assert_eq!(state.services.catalog.get_book(created.id).await.unwrap().available_copies, 0);
}
