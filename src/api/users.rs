//! User management endpoints

use axum::{
    extract::State,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        user::{UpdateRole, UserQuery},
        BorrowQuery, BorrowRecord, PageRequest, User,
    },
    policy::Action,
    AppState,
};

use super::{
    AuthenticatedUser, BorrowRecordPage, IdPath, JsonBody, PaginatedResponse, QueryParams, UserPage,
};

/// List users
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    params(UserQuery),
    responses(
        (status = 200, description = "List of users", body = UserPage),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin only")
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    QueryParams(query): QueryParams<UserQuery>,
) -> AppResult<Json<PaginatedResponse<User>>> {
    claims.require(Action::ManageUsers)?;

    let page = PageRequest::new(query.page, query.per_page, &state.config.inventory);
    let (users, total) = state.services.users.list_users(page).await?;

    Ok(Json(PaginatedResponse::new(users, total, page)))
}

/// Get user details by ID
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User details", body = User),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    IdPath(id): IdPath,
) -> AppResult<Json<User>> {
    claims.require(Action::ManageUsers)?;

    let user = state.services.users.get_by_id(id).await?;
    Ok(Json(user))
}

/// Change a user's role
#[utoipa::path(
    put,
    path = "/users/{id}/role",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateRole,
    responses(
        (status = 200, description = "Role updated", body = User),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_role(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    IdPath(id): IdPath,
    JsonBody(request): JsonBody<UpdateRole>,
) -> AppResult<Json<User>> {
    claims.require(Action::ManageUsers)?;

    let user = state.services.users.update_role(id, request.role).await?;
    Ok(Json(user))
}

/// Borrow records of any user
#[utoipa::path(
    get,
    path = "/users/{id}/borrows",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID"),
        BorrowQuery
    ),
    responses(
        (status = 200, description = "Borrow records", body = BorrowRecordPage),
        (status = 404, description = "User not found")
    )
)]
pub async fn user_borrows(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    IdPath(id): IdPath,
    QueryParams(query): QueryParams<BorrowQuery>,
) -> AppResult<Json<PaginatedResponse<BorrowRecord>>> {
    claims.require(Action::ReadAnyBorrows)?;

    let page = PageRequest::new(query.page, query.per_page, &state.config.inventory);
    let inventory = &state.services.inventory;
    let (records, total) = match query.status {
        Some(status) => inventory.get_user_borrow_records_by_status(id, status, page).await?,
        None => inventory.get_user_borrow_records(id, page).await?,
    };

    Ok(Json(PaginatedResponse::new(records, total, page)))
}
