use chrono::Utc;
use sea_orm::{ ActiveModelTrait, ActiveValue, DatabaseConnection, EntityTrait };

use crate::db::entity::factory;
use crate::enums::Network;
use crate::error::Result;

#[derive(Clone)]
pub struct FactoryRepository {
    db: DatabaseConnection,
}

impl FactoryRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find(&self, network: Network) -> Result<Option<factory::Model>> {
        let result = factory::Entity::find_by_id(network.as_str().to_string()).one(&self.db).await?;
        Ok(result)
    }

    pub async fn create(
        &self,
        network: Network,
        contract_address: &str,
        tx_hash: &str
    ) -> Result<factory::Model> {
        let model = factory::ActiveModel {
            network: ActiveValue::Set(network.as_str().to_string()),
            contract_address: ActiveValue::Set(contract_address.to_lowercase()),
            tx_hash: ActiveValue::Set(tx_hash.to_lowercase()),
            created_at: ActiveValue::Set(Utc::now()),
        };

        let model = model.insert(&self.db).await?;
        Ok(model)
    }
}
