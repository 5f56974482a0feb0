use sea_orm::entity::prelude::*;
use serde::{ Deserialize, Serialize };

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "presale_deployments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
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
    pub start_time: DateTimeUtc,
    pub end_time: DateTimeUtc,
    pub vesting_enabled: bool,
    pub vesting_initial_percent: Option<i16>,
    pub vesting_cliff_days: Option<i32>,
    pub vesting_period_days: Option<i32>,
    pub factory_address: Option<String>,
    pub constructor_args: Json,
    pub tx_hash: String,
    pub gas_used: Option<String>,
    pub status: String,
    pub finalized: bool,
    pub total_raised: Option<String>,
    pub contributors: Option<i64>,
    pub stats_updated_at: Option<DateTimeUtc>,
    pub verification_status: String,
    pub verification_error: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
