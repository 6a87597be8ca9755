//! Business logic services

pub mod auth;
pub mod catalog;
pub mod inventory;
pub mod stats;
pub mod users;

use crate::{config::AppConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub users: users::UsersService,
    pub catalog: catalog::CatalogService,
    pub inventory: inventory::InventoryService,
    pub stats: stats::StatsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        Self {
            auth: auth::AuthService::new(repository.clone(), config.auth.clone()),
            users: users::UsersService::new(repository.clone()),
            catalog: catalog::CatalogService::new(repository.clone()),
            inventory: inventory::InventoryService::new(repository.clone(), &config.inventory),
            stats: stats::StatsService::new(repository),
        }
    }
}
