use chrono::Utc;
use sea_orm::{
    ActiveModelTrait,
    ActiveValue,
    ColumnTrait,
    DatabaseConnection,
    EntityTrait,
    QueryFilter,
    QueryOrder,
    QuerySelect,
};
use uuid::Uuid;

use crate::db::entity::token_deployment;
use crate::db::DeploymentFilter;
use crate::enums::VerificationStatus;
use crate::error::{ AppError, Result };

pub struct NewTokenDeployment {
    pub network: String,
    pub contract_address: String,
    pub contract_type: String,
    pub name: String,
    pub symbol: String,
    pub decimals: i16,
    pub total_supply: String,
    pub owner_address: String,
    pub constructor_args: serde_json::Value,
    pub tx_hash: String,
    pub gas_used: Option<String>,
    pub is_burnable: bool,
    pub is_mintable: bool,
    pub has_fee: bool,
    pub has_redistribution: bool,
    pub fee_percent: Option<f64>,
    pub redistribution_percent: Option<f64>,
    pub verification_status: VerificationStatus,
    pub metadata_uri: Option<String>,
}

#[derive(Clone)]
pub struct TokenDeploymentRepository {
    db: DatabaseConnection,
}

impl TokenDeploymentRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, input: NewTokenDeployment) -> Result<token_deployment::Model> {
        let model = token_deployment::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            network: ActiveValue::Set(input.network),
            contract_address: ActiveValue::Set(input.contract_address.to_lowercase()),
            contract_type: ActiveValue::Set(input.contract_type),
            name: ActiveValue::Set(input.name),
            symbol: ActiveValue::Set(input.symbol),
            decimals: ActiveValue::Set(input.decimals),
            total_supply: ActiveValue::Set(input.total_supply),
            owner_address: ActiveValue::Set(input.owner_address.to_lowercase()),
            constructor_args: ActiveValue::Set(input.constructor_args),
            tx_hash: ActiveValue::Set(input.tx_hash.to_lowercase()),
            gas_used: ActiveValue::Set(input.gas_used),
            is_burnable: ActiveValue::Set(input.is_burnable),
            is_mintable: ActiveValue::Set(input.is_mintable),
            has_fee: ActiveValue::Set(input.has_fee),
            has_redistribution: ActiveValue::Set(input.has_redistribution),
            fee_percent: ActiveValue::Set(input.fee_percent),
            redistribution_percent: ActiveValue::Set(input.redistribution_percent),
            verification_status: ActiveValue::Set(input.verification_status.to_string()),
            verification_error: ActiveValue::Set(None),
            metadata_uri: ActiveValue::Set(input.metadata_uri),
            cached_total_supply: ActiveValue::Set(None),
            stats_updated_at: ActiveValue::Set(None),
            created_at: ActiveValue::Set(Utc::now()),
        };

        let model = model.insert(&self.db).await?;
        Ok(model)
    }

    pub async fn find_by_network_and_address(
        &self,
        network: &str,
        address: &str
    ) -> Result<Option<token_deployment::Model>> {
        let result = token_deployment::Entity
            ::find()
            .filter(token_deployment::Column::Network.eq(network))
            .filter(token_deployment::Column::ContractAddress.eq(address.to_lowercase()))
            .one(&self.db).await?;
        Ok(result)
    }

    pub async fn find_by_tx_hash(&self, tx_hash: &str) -> Result<Option<token_deployment::Model>> {
        let result = token_deployment::Entity
            ::find()
            .filter(token_deployment::Column::TxHash.eq(tx_hash.to_lowercase()))
            .one(&self.db).await?;
        Ok(result)
    }

    pub async fn list(&self, filter: &DeploymentFilter) -> Result<Vec<token_deployment::Model>> {
        let mut query = token_deployment::Entity
            ::find()
            .order_by_desc(token_deployment::Column::CreatedAt);

        if let Some(network) = &filter.network {
            query = query.filter(token_deployment::Column::Network.eq(network.as_str()));
        }
        if let Some(owner) = &filter.owner {
            query = query.filter(token_deployment::Column::OwnerAddress.eq(owner.to_lowercase()));
        }

        let results = query
            .limit(filter.effective_limit())
            .offset(filter.offset)
            .all(&self.db).await?;
        Ok(results)
    }

    pub async fn count(&self) -> Result<u64> {
        use sea_orm::PaginatorTrait;
        let count = token_deployment::Entity::find().count(&self.db).await?;
        Ok(count)
    }

    pub async fn set_verification(
        &self,
        id: Uuid,
        status: VerificationStatus,
        error: Option<String>
    ) -> Result<token_deployment::Model> {
        let existing = self.find_by_id(id).await?;
        let mut active: token_deployment::ActiveModel = existing.into();
        active.verification_status = ActiveValue::Set(status.to_string());
        active.verification_error = ActiveValue::Set(error);
        let model = active.update(&self.db).await?;
        Ok(model)
    }

    pub async fn set_metadata_uri(&self, id: Uuid, uri: String) -> Result<token_deployment::Model> {
        let existing = self.find_by_id(id).await?;
        let mut active: token_deployment::ActiveModel = existing.into();
        active.metadata_uri = ActiveValue::Set(Some(uri));
        let model = active.update(&self.db).await?;
        Ok(model)
    }

    pub async fn update_stats(
        &self,
        id: Uuid,
        total_supply: String
    ) -> Result<token_deployment::Model> {
        let existing = self.find_by_id(id).await?;
        let mut active: token_deployment::ActiveModel = existing.into();
        active.cached_total_supply = ActiveValue::Set(Some(total_supply));
        active.stats_updated_at = ActiveValue::Set(Some(Utc::now()));
        let model = active.update(&self.db).await?;
        Ok(model)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<token_deployment::Model> {
        token_deployment::Entity
            ::find_by_id(id)
            .one(&self.db).await?
            .ok_or_else(|| AppError::NotFound("Token deployment".to_string()))
    }
}
