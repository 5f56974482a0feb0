use async_trait::async_trait;

use crate::error::{ AppError, Result };
use crate::providers::{ ChainProvider, DeploymentCost, PresaleOnChainState, TxReceiptInfo };

/// Canned chain answers; any field left as `None` fails like an unreachable node.
#[derive(Default, Clone)]
pub(crate) struct FakeChain {
    pub receipt: Option<TxReceiptInfo>,
    pub balance: Option<String>,
    pub total_supply: Option<String>,
    pub presale: Option<PresaleOnChainState>,
}

fn unavailable<T>() -> Result<T> {
    Err(AppError::Rpc("node unavailable".to_string()))
}

#[async_trait]
impl ChainProvider for FakeChain {
    async fn get_transaction_status(&self, _tx_hash: &str) -> Result<TxReceiptInfo> {
        self.receipt.clone().map_or_else(unavailable, Ok)
    }

    async fn estimate_deployment_cost(&self, gas_limit: u64) -> Result<DeploymentCost> {
        Ok(DeploymentCost {
            gas_limit,
            gas_price_gwei: "20".to_string(),
            cost_native: format!("{}", (gas_limit as f64) * 20e-9),
            native_symbol: "ETH".to_string(),
        })
    }

    async fn get_token_total_supply(&self, _token_address: &str) -> Result<String> {
        self.total_supply.clone().map_or_else(unavailable, Ok)
    }

    async fn get_token_balance(&self, _token_address: &str, _holder: &str) -> Result<String> {
        self.balance.clone().map_or_else(unavailable, Ok)
    }

    async fn get_presale_state(&self, _presale_address: &str) -> Result<PresaleOnChainState> {
        self.presale.clone().map_or_else(unavailable, Ok)
    }
}
