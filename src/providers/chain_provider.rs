use async_trait::async_trait;
use serde::{ Deserialize, Serialize };

use crate::enums::TxStatus;
use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxReceiptInfo {
    pub tx_hash: String,
    pub status: TxStatus,
    pub block_number: Option<u64>,
    pub gas_used: Option<String>,
    pub contract_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentCost {
    pub gas_limit: u64,
    pub gas_price_gwei: String,
    pub cost_native: String,
    pub native_symbol: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresaleOnChainState {
    pub finalized: bool,
    /// Raised amount in whole units of the base asset.
    pub total_raised: String,
    pub contributors: u64,
}

/// Read-only view of an EVM network used by the launchpad.
#[async_trait]
pub trait ChainProvider: Send + Sync {
    /// Receipt-derived status of a transaction; pending when mined receipt is absent
    async fn get_transaction_status(&self, tx_hash: &str) -> Result<TxReceiptInfo>;

    /// Price a deployment of `gas_limit` gas at current fees
    async fn estimate_deployment_cost(&self, gas_limit: u64) -> Result<DeploymentCost>;

    /// ERC20 totalSupply formatted with the token's decimals
    async fn get_token_total_supply(&self, token_address: &str) -> Result<String>;

    /// ERC20 balanceOf formatted with the token's decimals
    async fn get_token_balance(&self, token_address: &str, holder: &str) -> Result<String>;

    /// Sale progress as reported by the presale contract
    async fn get_presale_state(&self, presale_address: &str) -> Result<PresaleOnChainState>;
}
