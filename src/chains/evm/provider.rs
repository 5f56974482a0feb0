use async_trait::async_trait;
use ethers::{
    prelude::*,
    providers::{ Http, JsonRpcClient, Provider },
    types::{ Address, H256, U256 },
};
use std::str::FromStr;
use std::sync::Arc;

use crate::chains::evm::abi;
use crate::enums::TxStatus;
use crate::error::{ AppError, Result };
use crate::providers::{ ChainProvider, DeploymentCost, PresaleOnChainState, TxReceiptInfo };

#[derive(Clone)]
pub struct EvmProvider<P = Http> {
    provider: Arc<Provider<P>>,
    native_symbol: String,
}

impl EvmProvider<Http> {
    pub fn new(rpc_url: &str, native_symbol: &str) -> Result<Self> {
        let provider = Provider::<Http>
            ::try_from(rpc_url)
            .map_err(|e| AppError::Rpc(format!("Failed to create provider: {}", e)))?;

        Ok(Self::with_provider(provider, native_symbol))
    }
}

impl<P: JsonRpcClient + 'static> EvmProvider<P> {
    pub fn with_provider(provider: Provider<P>, native_symbol: &str) -> Self {
        Self {
            provider: Arc::new(provider),
            native_symbol: native_symbol.to_string(),
        }
    }

    fn erc20(&self, token_address: &str) -> Result<Contract<Provider<P>>> {
        let token_addr: Address = token_address.parse().map_err(|_| AppError::InvalidAddress)?;
        Ok(Contract::new(token_addr, abi::erc20()?, self.provider.clone()))
    }

    async fn token_decimals(&self, contract: &Contract<Provider<P>>) -> u8 {
        match contract.method::<_, u8>("decimals", ()) {
            Ok(method) => method.call().await.ok().unwrap_or(18),
            Err(_) => 18,
        }
    }
}

#[async_trait]
impl<P: JsonRpcClient + 'static> ChainProvider for EvmProvider<P> {
    async fn get_transaction_status(&self, tx_hash: &str) -> Result<TxReceiptInfo> {
        let hash = H256::from_str(tx_hash.trim()).map_err(|_|
            AppError::InvalidInput(format!("Invalid transaction hash: {}", tx_hash))
        )?;

        let receipt = self.provider
            .get_transaction_receipt(hash).await
            .map_err(|e| AppError::Rpc(format!("Failed to get receipt: {}", e)))?;

        let Some(receipt) = receipt else {
            // Not mined yet, or unknown to this node
            let tx = self.provider
                .get_transaction(hash).await
                .map_err(|e| AppError::Rpc(format!("Failed to get transaction: {}", e)))?;

            return match tx {
                Some(_) =>
                    Ok(TxReceiptInfo {
                        tx_hash: format!("{:?}", hash),
                        status: TxStatus::Pending,
                        block_number: None,
                        gas_used: None,
                        contract_address: None,
                    }),
                None => Err(AppError::NotFound("Transaction".to_string())),
            };
        };

        let status = match receipt.status {
            Some(s) if s.as_u64() == 1 => TxStatus::Confirmed,
            _ => TxStatus::Failed,
        };

        Ok(TxReceiptInfo {
            tx_hash: format!("{:?}", hash),
            status,
            block_number: receipt.block_number.map(|b| b.as_u64()),
            gas_used: receipt.gas_used.map(|g| g.to_string()),
            contract_address: receipt.contract_address.map(|a| format!("{:?}", a)),
        })
    }

    /// Cost at the node's current gas price, so `gas_limit * gas_price` is exactly the cost.
    async fn estimate_deployment_cost(&self, gas_limit: u64) -> Result<DeploymentCost> {
        let gas_price = self.provider
            .get_gas_price().await
            .map_err(|e| AppError::Rpc(format!("Failed to get gas price: {}", e)))?;

        let total_cost_wei = U256::from(gas_limit)
            .checked_mul(gas_price)
            .ok_or_else(|| AppError::Internal("Deployment cost overflow".to_string()))?;
        let cost_native = ethers::utils
            ::format_units(total_cost_wei, 18)
            .map_err(|_| AppError::Internal("Failed to format units".to_string()))?;
        let gas_price_gwei = ethers::utils
            ::format_units(gas_price, "gwei")
            .map_err(|_| AppError::Internal("Failed to format units".to_string()))?;

        Ok(DeploymentCost {
            gas_limit,
            gas_price_gwei,
            cost_native,
            native_symbol: self.native_symbol.clone(),
        })
    }

    async fn get_token_total_supply(&self, token_address: &str) -> Result<String> {
        let contract = self.erc20(token_address)?;

        let supply: U256 = contract
            .method::<_, U256>("totalSupply", ())
            .map_err(|e| AppError::Rpc(format!("Failed to call totalSupply: {}", e)))?
            .call().await
            .map_err(|e| AppError::Rpc(format!("totalSupply call failed: {}", e)))?;

        let decimals = self.token_decimals(&contract).await;
        ethers::utils
            ::format_units(supply, decimals as u32)
            .map_err(|e| AppError::Internal(format!("Failed to format supply: {}", e)))
    }

    async fn get_token_balance(&self, token_address: &str, holder: &str) -> Result<String> {
        let holder_addr: Address = holder.parse().map_err(|_| AppError::InvalidAddress)?;
        let contract = self.erc20(token_address)?;

        let balance: U256 = contract
            .method::<_, U256>("balanceOf", holder_addr)
            .map_err(|e| AppError::Rpc(format!("Failed to call balanceOf: {}", e)))?
            .call().await
            .map_err(|e| AppError::Rpc(format!("balanceOf call failed: {}", e)))?;

        let decimals = self.token_decimals(&contract).await;
        ethers::utils
            ::format_units(balance, decimals as u32)
            .map_err(|e| AppError::Internal(format!("Failed to format balance: {}", e)))
    }

    async fn get_presale_state(&self, presale_address: &str) -> Result<PresaleOnChainState> {
        let presale_addr: Address = presale_address
            .parse()
            .map_err(|_| AppError::InvalidAddress)?;
        let contract = Contract::new(presale_addr, abi::presale()?, self.provider.clone());

        let finalized: bool = contract
            .method::<_, bool>("finalized", ())
            .map_err(|e| AppError::Rpc(format!("Failed to call finalized: {}", e)))?
            .call().await
            .map_err(|e| AppError::Rpc(format!("finalized call failed: {}", e)))?;

        let total_raised: U256 = contract
            .method::<_, U256>("totalRaised", ())
            .map_err(|e| AppError::Rpc(format!("Failed to call totalRaised: {}", e)))?
            .call().await
            .map_err(|e| AppError::Rpc(format!("totalRaised call failed: {}", e)))?;

        let contributors: U256 = contract
            .method::<_, U256>("contributorCount", ())
            .map_err(|e| AppError::Rpc(format!("Failed to call contributorCount: {}", e)))?
            .call().await
            .map_err(|e| AppError::Rpc(format!("contributorCount call failed: {}", e)))?;

        Ok(PresaleOnChainState {
            finalized,
            total_raised: ethers::utils::format_ether(total_raised),
            contributors: contributors.low_u64(),
        })
    }
}
