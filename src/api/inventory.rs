//! Borrow and return endpoints

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{BorrowQuery, BorrowRecord, PageRequest},
    policy::Action,
    AppState,
};

use super::{AuthenticatedUser, BorrowRecordPage, IdPath, PaginatedResponse, QueryParams};

/// Borrow one copy of a book
#[utoipa::path(
    post,
    path = "/inventory/books/{id}/borrow",
    tag = "inventory",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 201, description = "Book borrowed", body = BorrowRecord),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse),
        (status = 422, description = "No copy available or already borrowed", body = crate::error::ErrorResponse)
    )
)]
pub async fn borrow_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    IdPath(book_id): IdPath,
) -> AppResult<(StatusCode, Json<BorrowRecord>)> {
    claims.require(Action::BorrowBooks)?;

    let record = state
        .services
        .inventory
        .borrow_book(claims.user_id, book_id)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/inventory/books/{id}/return",
    tag = "inventory",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book returned", body = BorrowRecord),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse),
        (status = 422, description = "Book not borrowed by this user", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    IdPath(book_id): IdPath,
) -> AppResult<Json<BorrowRecord>> {
    claims.require(Action::BorrowBooks)?;

    let record = state
        .services
        .inventory
        .return_book(claims.user_id, book_id)
        .await?;
    Ok(Json(record))
}

/// Whether the current user holds a copy of the book
#[utoipa::path(
    get,
    path = "/inventory/books/{id}/borrowed-status",
    tag = "inventory",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Borrowed status", body = bool)
    )
)]
pub async fn borrowed_status(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    IdPath(book_id): IdPath,
) -> AppResult<Json<bool>> {
    claims.require(Action::ReadOwnBorrows)?;

    let borrowed = state
        .services
        .inventory
        .has_user_borrowed_book(claims.user_id, book_id)
        .await?;
    Ok(Json(borrowed))
}

/// Borrow records of the current user, most recent first
#[utoipa::path(
    get,
    path = "/inventory/borrows",
    tag = "inventory",
    security(("bearer_auth" = [])),
    params(BorrowQuery),
    responses(
        (status = 200, description = "Borrow records", body = BorrowRecordPage)
    )
)]
pub async fn my_borrows(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    QueryParams(query): QueryParams<BorrowQuery>,
) -> AppResult<Json<PaginatedResponse<BorrowRecord>>> {
    claims.require(Action::ReadOwnBorrows)?;

    let page = PageRequest::new(query.page, query.per_page, &state.config.inventory);
    let (records, total) = match query.status {
        Some(status) => {
            state
                .services
                .inventory
                .get_user_borrow_records_by_status(claims.user_id, status, page)
                .await?
        }
        None => {
            state
                .services
                .inventory
                .get_user_borrow_records(claims.user_id, page)
                .await?
        }
    };

    Ok(Json(PaginatedResponse::new(records, total, page)))
}
