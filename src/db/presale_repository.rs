use chrono::{ DateTime, Utc };
use sea_orm::{
    ActiveModelTrait,
    ActiveValue,
    ColumnTrait,
    Condition,
    DatabaseConnection,
    EntityTrait,
    QueryFilter,
    QueryOrder,
    QuerySelect,
};
use uuid::Uuid;

use crate::db::entity::presale_deployment;
use crate::db::DeploymentFilter;
use crate::enums::{ PresaleStatus, VerificationStatus };
use crate::error::{ AppError, Result };

pub struct NewPresaleDeployment {
    pub network: String,
    pub contract_address: String,
    pub token_address: String,
    pub owner_address: String,
    pub fund_recipient: String,
    pub soft_cap: String,
    pub hard_cap: String,
    pub token_price: String,
    pub min_purchase: String,
    pub max_purchase: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub vesting_enabled: bool,
    pub vesting_initial_percent: Option<i16>,
    pub vesting_cliff_days: Option<i32>,
    pub vesting_period_days: Option<i32>,
    pub factory_address: Option<String>,
    pub constructor_args: serde_json::Value,
    pub tx_hash: String,
    pub gas_used: Option<String>,
    pub status: PresaleStatus,
    pub verification_status: VerificationStatus,
}

/// Snapshot of a presale read from chain.
#[derive(Debug, Clone)]
pub struct PresaleChainState {
    pub status: PresaleStatus,
    pub finalized: bool,
    pub total_raised: String,
    pub contributors: i64,
}

#[derive(Clone)]
pub struct PresaleRepository {
    db: DatabaseConnection,
}

impl PresaleRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, input: NewPresaleDeployment) -> Result<presale_deployment::Model> {
        let model = presale_deployment::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            network: ActiveValue::Set(input.network),
            contract_address: ActiveValue::Set(input.contract_address.to_lowercase()),
            token_address: ActiveValue::Set(input.token_address.to_lowercase()),
            owner_address: ActiveValue::Set(input.owner_address.to_lowercase()),
            fund_recipient: ActiveValue::Set(input.fund_recipient.to_lowercase()),
            soft_cap: ActiveValue::Set(input.soft_cap),
            hard_cap: ActiveValue::Set(input.hard_cap),
            token_price: ActiveValue::Set(input.token_price),
            min_purchase: ActiveValue::Set(input.min_purchase),
            max_purchase: ActiveValue::Set(input.max_purchase),
            start_time: ActiveValue::Set(input.start_time),
            end_time: ActiveValue::Set(input.end_time),
            vesting_enabled: ActiveValue::Set(input.vesting_enabled),
            vesting_initial_percent: ActiveValue::Set(input.vesting_initial_percent),
            vesting_cliff_days: ActiveValue::Set(input.vesting_cliff_days),
            vesting_period_days: ActiveValue::Set(input.vesting_period_days),
            factory_address: ActiveValue::Set(input.factory_address),
            constructor_args: ActiveValue::Set(input.constructor_args),
            tx_hash: ActiveValue::Set(input.tx_hash.to_lowercase()),
            gas_used: ActiveValue::Set(input.gas_used),
            status: ActiveValue::Set(input.status.to_string()),
            finalized: ActiveValue::Set(false),
            total_raised: ActiveValue::Set(None),
            contributors: ActiveValue::Set(None),
            stats_updated_at: ActiveValue::Set(None),
            verification_status: ActiveValue::Set(input.verification_status.to_string()),
            verification_error: ActiveValue::Set(None),
            created_at: ActiveValue::Set(Utc::now()),
        };

        let model = model.insert(&self.db).await?;
        Ok(model)
    }

    pub async fn find_by_network_and_address(
        &self,
        network: &str,
        address: &str
    ) -> Result<Option<presale_deployment::Model>> {
        let result = presale_deployment::Entity
            ::find()
            .filter(presale_deployment::Column::Network.eq(network))
            .filter(presale_deployment::Column::ContractAddress.eq(address.to_lowercase()))
            .one(&self.db).await?;
        Ok(result)
    }

    pub async fn find_by_tx_hash(
        &self,
        tx_hash: &str
    ) -> Result<Option<presale_deployment::Model>> {
        let result = presale_deployment::Entity
            ::find()
            .filter(presale_deployment::Column::TxHash.eq(tx_hash.to_lowercase()))
            .one(&self.db).await?;
        Ok(result)
    }

    /// Status filters match the window around `now`, not the stored status column,
    /// so results agree with the status reported for each row.
    pub async fn list(
        &self,
        filter: &DeploymentFilter,
        now: DateTime<Utc>
    ) -> Result<Vec<presale_deployment::Model>> {
        let mut query = presale_deployment::Entity
            ::find()
            .order_by_desc(presale_deployment::Column::CreatedAt);

        if let Some(network) = &filter.network {
            query = query.filter(presale_deployment::Column::Network.eq(network.as_str()));
        }
        if let Some(owner) = &filter.owner {
            query = query.filter(presale_deployment::Column::OwnerAddress.eq(owner.to_lowercase()));
        }
        if let Some(status) = filter.status {
            query = query.filter(status_window(status, now));
        }

        let results = query
            .limit(filter.effective_limit())
            .offset(filter.offset)
            .all(&self.db).await?;
        Ok(results)
    }

    /// Presales whose state can still change on chain.
    pub async fn find_unfinalized(&self) -> Result<Vec<presale_deployment::Model>> {
        let results = presale_deployment::Entity
            ::find()
            .filter(presale_deployment::Column::Finalized.eq(false))
            .all(&self.db).await?;
        Ok(results)
    }

    pub async fn set_verification(
        &self,
        id: Uuid,
        status: VerificationStatus,
        error: Option<String>
    ) -> Result<presale_deployment::Model> {
        let existing = self.find_by_id(id).await?;
        let mut active: presale_deployment::ActiveModel = existing.into();
        active.verification_status = ActiveValue::Set(status.to_string());
        active.verification_error = ActiveValue::Set(error);
        let model = active.update(&self.db).await?;
        Ok(model)
    }

    pub async fn update_chain_state(
        &self,
        id: Uuid,
        state: PresaleChainState
    ) -> Result<presale_deployment::Model> {
        let existing = self.find_by_id(id).await?;
        let mut active: presale_deployment::ActiveModel = existing.into();
        active.status = ActiveValue::Set(state.status.to_string());
        active.finalized = ActiveValue::Set(state.finalized);
        active.total_raised = ActiveValue::Set(Some(state.total_raised));
        active.contributors = ActiveValue::Set(Some(state.contributors));
        active.stats_updated_at = ActiveValue::Set(Some(Utc::now()));
        let model = active.update(&self.db).await?;
        Ok(model)
    }

    pub async fn set_status(
        &self,
        id: Uuid,
        status: PresaleStatus
    ) -> Result<presale_deployment::Model> {
        let existing = self.find_by_id(id).await?;
        let mut active: presale_deployment::ActiveModel = existing.into();
        active.status = ActiveValue::Set(status.to_string());
        let model = active.update(&self.db).await?;
        Ok(model)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<presale_deployment::Model> {
        presale_deployment::Entity
            ::find_by_id(id)
            .one(&self.db).await?
            .ok_or_else(|| AppError::NotFound("Presale deployment".to_string()))
    }
}

/// SQL form of `PresaleStatus::derive`.
fn status_window(status: PresaleStatus, now: DateTime<Utc>) -> Condition {
    use presale_deployment::Column;

    match status {
        PresaleStatus::Ended =>
            Condition::any().add(Column::Finalized.eq(true)).add(Column::EndTime.lte(now)),
        PresaleStatus::Upcoming =>
            Condition::all()
                .add(Column::Finalized.eq(false))
                .add(Column::StartTime.gt(now))
                .add(Column::EndTime.gt(now)),
        PresaleStatus::Live =>
            Condition::all()
                .add(Column::Finalized.eq(false))
                .add(Column::StartTime.lte(now))
                .add(Column::EndTime.gt(now)),
    }
}
