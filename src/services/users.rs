//! User management service

use crate::{
    error::AppResult,
    models::{PageRequest, Role, User},
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
}

impl UsersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list_users(&self, page: PageRequest) -> AppResult<(Vec<User>, i64)> {
        self.repository.users.list(page).await
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// Change a user's role (admin only)
    pub async fn update_role(&self, id: i32, role: Role) -> AppResult<User> {
        let updated = self.repository.users.update_role(id, role).await?;
        tracing::info!(user_id = id, role = %role, "User role updated");
        Ok(updated)
    }
}
