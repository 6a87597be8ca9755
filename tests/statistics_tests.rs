//! Catalog statistics on the in-memory store

mod common;

use common::TestApp;

#[tokio::test]
async fn empty_catalog_reports_zero() {
    let app = TestApp::new();
    let stats = &app.state.services.stats;

    assert_eq!(stats.count_all_books().await.unwrap(), 0);
    assert_eq!(stats.count_available_books().await.unwrap(), 0);
    assert_eq!(stats.get_availability_percentage().await.unwrap(), 0.0);
    assert!(stats.get_books_with_borrowed_copies().await.unwrap().is_empty());
}

#[tokio::test]
async fn counts_follow_borrows_and_returns() {
    let app = TestApp::new();
    let reader = app.member("reader@library.test").await;
    let dune = app.book("9780000000001", "Dune", "Science Fiction", 2).await;
    let solaris = app.book("9780000000002", "Solaris", "Science Fiction", 1).await;
    let hobbit = app.book("9780000000003", "The Hobbit", "Fantasy", 1).await;
    let inventory = &app.state.services.inventory;
    let stats = &app.state.services.stats;

    inventory.borrow_book(reader.id, solaris.id).await.unwrap();
    inventory.borrow_book(reader.id, hobbit.id).await.unwrap();
    inventory.borrow_book(reader.id, dune.id).await.unwrap();

    assert_eq!(stats.count_all_books().await.unwrap(), 3);
    assert_eq!(stats.count_available_books().await.unwrap(), 1);
    assert_eq!(stats.count_available_books_by_genre("Science Fiction").await.unwrap(), 1);
    assert_eq!(stats.count_available_books_by_genre("Fantasy").await.unwrap(), 0);
    assert_eq!(stats.count_available_books_by_genre("science fiction").await.unwrap(), 0);
    assert_eq!(stats.get_availability_percentage().await.unwrap(), 33.33);

    let borrowed: Vec<String> = stats
        .get_books_with_borrowed_copies()
        .await
        .unwrap()
        .into_iter()
        .map(|b| b.title)
        .collect();
    assert_eq!(borrowed, vec!["Dune", "Solaris", "The Hobbit"]);

    inventory.return_book(reader.id, hobbit.id).await.unwrap();
    let summary = stats.summary().await.unwrap();
    assert_eq!(summary.total_books, 3);
    assert_eq!(summary.available_books, 2);
    assert_eq!(summary.books_with_borrowed_copies, 2);
    assert_eq!(summary.availability_percentage, 66.67);
    assert_eq!(summary.active_borrows, 2);
    assert_eq!(summary.overdue_borrows, 0);
}

#[tokio::test]
async fn percentage_over_a_large_catalog_is_rounded() {
    let app = TestApp::new();

    for i in 0..137 {
        let available = if i < 89 { None } else { Some(0) };
        app.book_with_available(
            &format!("978{:010}", i),
            &format!("Title {:03}", i),
            "Reference",
            1,
            available,
        )
        .await;
    }

    let stats = &app.state.services.stats;
    assert_eq!(stats.count_all_books().await.unwrap(), 137);
    assert_eq!(stats.count_available_books().await.unwrap(), 89);
    assert_eq!(stats.get_availability_percentage().await.unwrap(), 64.96);
}

#[tokio::test]
async fn deleted_books_leave_the_statistics() {
    let app = TestApp::new();
    let book = app.book("9780000000004", "Gone", "Drama", 1).await;
    app.book("9780000000005", "Kept", "Drama", 1).await;

    app.state.services.catalog.delete_book(book.id).await.unwrap();

    let stats = &app.state.services.stats;
    assert_eq!(stats.count_all_books().await.unwrap(), 1);
    assert_eq!(stats.count_available_books_by_genre("Drama").await.unwrap(), 1);
}
