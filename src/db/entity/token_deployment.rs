use sea_orm::entity::prelude::*;
use serde::{ Deserialize, Serialize };

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "token_deployments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub network: String,
    pub contract_address: String,
    pub contract_type: String,
    pub name: String,
    pub symbol: String,
    pub decimals: i16,
    pub total_supply: String,
    pub owner_address: String,
    pub constructor_args: Json,
    pub tx_hash: String,
    pub gas_used: Option<String>,
    pub is_burnable: bool,
    pub is_mintable: bool,
    pub has_fee: bool,
    pub has_redistribution: bool,
    pub fee_percent: Option<f64>,
    pub redistribution_percent: Option<f64>,
    pub verification_status: String,
    pub verification_error: Option<String>,
    pub metadata_uri: Option<String>,
    pub cached_total_supply: Option<String>,
    pub stats_updated_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
