use chrono::Utc;
use sea_orm::{ entity::prelude::*, DatabaseConnection, Set };

use crate::enums::PresaleStatus;
use crate::error::Result;

pub mod entity;
pub use entity::*;

mod token_deployment_repository;
pub use token_deployment_repository::{ NewTokenDeployment, TokenDeploymentRepository };

mod presale_repository;
pub use presale_repository::{ NewPresaleDeployment, PresaleChainState, PresaleRepository };

mod factory_repository;
pub use factory_repository::FactoryRepository;

/// Shared list filter for deployment queries.
#[derive(Debug, Clone, Default)]
pub struct DeploymentFilter {
    pub network: Option<String>,
    pub owner: Option<String>,
    pub status: Option<PresaleStatus>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl DeploymentFilter {
    pub const DEFAULT_LIMIT: u64 = 50;
    pub const MAX_LIMIT: u64 = 200;

    pub fn effective_limit(&self) -> u64 {
        self.limit.unwrap_or(Self::DEFAULT_LIMIT).min(Self::MAX_LIMIT)
    }
}

#[derive(Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find_by_address(&self, address: &str) -> Result<Option<entity::user::Model>> {
        let user = entity::user::Entity
            ::find_by_id(address.to_lowercase())
            .one(&self.db).await?;
        Ok(user)
    }

    /// Store a fresh challenge nonce, creating the user on first contact.
    pub async fn upsert_nonce(&self, address: &str, nonce: &str) -> Result<entity::user::Model> {
        let now = Utc::now();

        if let Some(existing) = self.find_by_address(address).await? {
            let mut active: entity::user::ActiveModel = existing.into();
            active.nonce = Set(nonce.to_string());
            active.nonce_issued_at = Set(now);
            let model = active.update(&self.db).await?;
            return Ok(model);
        }

        let user = entity::user::ActiveModel {
            address: Set(address.to_lowercase()),
            nonce: Set(nonce.to_string()),
            nonce_issued_at: Set(now),
            token_balance: Set(None),
            last_login_at: Set(None),
            created_at: Set(now),
        };

        let user = user.insert(&self.db).await?;
        Ok(user)
    }

    /// Rotate the nonce after a successful login and refresh cached balance.
    pub async fn record_login(
        &self,
        user: entity::user::Model,
        next_nonce: &str,
        token_balance: Option<String>
    ) -> Result<entity::user::Model> {
        let now = Utc::now();
        let mut active: entity::user::ActiveModel = user.into();
        active.nonce = Set(next_nonce.to_string());
        active.nonce_issued_at = Set(now);
        active.last_login_at = Set(Some(now));
        if token_balance.is_some() {
            active.token_balance = Set(token_balance);
        }

        let model = active.update(&self.db).await?;
        Ok(model)
    }
}

/// Fresh in-memory SQLite database with all migrations applied.
#[cfg(test)]
pub(crate) async fn test_connection() -> DatabaseConnection {
    use migration::{ Migrator, MigratorTrait };
    use sea_orm::{ ConnectOptions, Database };

    // A single connection keeps every query on the same in-memory database
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1).sqlx_logging(false);

    let db = Database::connect(options).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}
