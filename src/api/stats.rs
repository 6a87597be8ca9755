//! Statistics endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::AppResult, models::Book, policy::Action, AppState};

use super::AuthenticatedUser;

/// Catalog statistics summary
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BookStatistics {
    /// Number of catalog entries
    pub total_books: i64,
    /// Entries with at least one copy on the shelf
    pub available_books: i64,
    /// Entries with at least one copy borrowed
    pub books_with_borrowed_copies: i64,
    /// available_books / total_books in percent, two decimals
    pub availability_percentage: f64,
    /// Borrow records not yet returned
    pub active_borrows: i64,
    /// Active borrow records past their due date
    pub overdue_borrows: i64,
}

/// All catalog figures
#[utoipa::path(
    get,
    path = "/statistics/books",
    tag = "statistics",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Catalog statistics", body = BookStatistics),
        (status = 403, description = "Admin only")
    )
)]
pub async fn summary(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<BookStatistics>> {
    claims.require(Action::ReadStatistics)?;

    Ok(Json(state.services.stats.summary().await?))
}

#[utoipa::path(
    get,
    path = "/statistics/books/total",
    tag = "statistics",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Number of books", body = i64))
)]
pub async fn total_books(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<i64>> {
    claims.require(Action::ReadStatistics)?;

    Ok(Json(state.services.stats.count_all_books().await?))
}

#[utoipa::path(
    get,
    path = "/statistics/books/available",
    tag = "statistics",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Number of books with a copy available", body = i64))
)]
pub async fn available_books(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<i64>> {
    claims.require(Action::ReadStatistics)?;

    Ok(Json(state.services.stats.count_available_books().await?))
}

#[utoipa::path(
    get,
    path = "/statistics/books/available/{genre}",
    tag = "statistics",
    security(("bearer_auth" = [])),
    params(("genre" = String, Path, description = "Exact genre")),
    responses((status = 200, description = "Number of available books in the genre", body = i64))
)]
pub async fn available_books_by_genre(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(genre): Path<String>,
) -> AppResult<Json<i64>> {
    claims.require(Action::ReadStatistics)?;

    Ok(Json(
        state
            .services
            .stats
            .count_available_books_by_genre(&genre)
            .await?,
    ))
}

/// Books with at least one copy borrowed
#[utoipa::path(
    get,
    path = "/statistics/books/borrowed",
    tag = "statistics",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Books with borrowed copies", body = Vec<Book>))
)]
pub async fn borrowed_books(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Book>>> {
    claims.require(Action::ReadStatistics)?;

    Ok(Json(state.services.stats.get_books_with_borrowed_copies().await?))
}

#[utoipa::path(
    get,
    path = "/statistics/books/availability-percentage",
    tag = "statistics",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Share of available books in percent", body = f64))
)]
pub async fn availability_percentage(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<f64>> {
    claims.require(Action::ReadStatistics)?;

    Ok(Json(state.services.stats.get_availability_percentage().await?))
}
