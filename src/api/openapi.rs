//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, health, inventory, stats, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Library API",
        version = "1.0.0",
        description = "Library catalog and inventory REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::register,
        auth::login,
        auth::me,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Inventory
        inventory::borrow_book,
        inventory::return_book,
        inventory::borrowed_status,
        inventory::my_borrows,
        // Users
        users::list_users,
        users::get_user,
        users::update_role,
        users::user_borrows,
        // Statistics
        stats::summary,
        stats::total_books,
        stats::available_books,
        stats::available_books_by_genre,
        stats::borrowed_books,
        stats::availability_percentage,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            crate::models::user::RegisterUser,
            // Books
            crate::models::Book,
            crate::models::CreateBook,
            crate::models::UpdateBook,
            super::BookPage,
            // Inventory
            crate::models::BorrowRecord,
            crate::models::BorrowStatus,
            super::BorrowRecordPage,
            // Users
            crate::models::User,
            crate::models::Role,
            crate::models::user::UpdateRole,
            super::UserPage,
            // Stats
            stats::BookStatistics,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "books", description = "Catalog management"),
        (name = "inventory", description = "Borrowing and returning books"),
        (name = "users", description = "User management"),
        (name = "statistics", description = "Catalog statistics")
    )
)]
pub struct ApiDoc;

/// Registers the bearer token scheme referenced by secured paths
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
