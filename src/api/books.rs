//! Catalog endpoints

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{Book, BookQuery, CreateBook, PageRequest, UpdateBook},
    policy::Action,
    AppState,
};

use super::{AuthenticatedUser, BookPage, IdPath, JsonBody, PaginatedResponse, QueryParams};

/// List books with search and pagination
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    params(BookQuery),
    responses(
        (status = 200, description = "List of books", body = BookPage),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    QueryParams(query): QueryParams<BookQuery>,
) -> AppResult<Json<PaginatedResponse<Book>>> {
    claims.require(Action::ReadCatalog)?;

    let page = PageRequest::new(query.page, query.per_page, &state.config.inventory);
    let (books, total) = state.services.catalog.search_books(&query, page).await?;

    Ok(Json(PaginatedResponse::new(books, total, page)))
}

/// Get book details by ID
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    IdPath(id): IdPath,
) -> AppResult<Json<Book>> {
    claims.require(Action::ReadCatalog)?;

    let book = state.services.catalog.get_book(id).await?;
    Ok(Json(book))
}

/// Add a book to the catalog
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Admin only"),
        (status = 409, description = "ISBN already in the catalog")
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    JsonBody(book): JsonBody<CreateBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    claims.require(Action::ManageCatalog)?;

    let created = state.services.catalog.create_book(book).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update an existing book
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 404, description = "Book not found"),
        (status = 422, description = "Total copies below borrowed copies")
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    IdPath(id): IdPath,
    JsonBody(changes): JsonBody<UpdateBook>,
) -> AppResult<Json<Book>> {
    claims.require(Action::ManageCatalog)?;

    let updated = state.services.catalog.update_book(id, changes).await?;
    Ok(Json(updated))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 404, description = "Book not found"),
        (status = 422, description = "Copies still borrowed")
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    IdPath(id): IdPath,
) -> AppResult<StatusCode> {
    claims.require(Action::ManageCatalog)?;

    state.services.catalog.delete_book(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
