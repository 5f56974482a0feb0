use std::sync::Arc;

use chrono::Utc;
use serde::{ Deserialize, Serialize };
use tracing::{ error, info, warn };
use uuid::Uuid;

use crate::config::{ Config, NetworkConfig };
use crate::db::{
    NewPresaleDeployment,
    NewTokenDeployment,
    PresaleRepository,
    TokenDeploymentRepository,
};
use crate::deploy::validation::{ validate_presale, validate_token };
use crate::deploy::{
    verify_with_retry,
    ContractVerifier,
    DeployInvocation,
    DeployRunner,
    DeploymentResult,
    FactoryRegistry,
    PresaleDeployRequest,
    SnapshotWriter,
    TokenDeployRequest,
    VerifyRequest,
};
use crate::enums::{ ContractType, Network, PresaleStatus, TxStatus, VerificationStatus };
use crate::error::{ AppError, Result };
use crate::rpc::RpcManager;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentResponse {
    pub success: bool,
    pub deployment_id: Uuid,
    pub contract_address: String,
    pub tx_hash: String,
    pub gas_used: Option<String>,
    pub network: Network,
    pub contract_type: ContractType,
    pub verified: bool,
    pub verification_status: VerificationStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub verification_errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub factory_address: Option<String>,
    pub explorer_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentStatusResponse {
    pub tx_hash: String,
    pub network: Network,
    pub status: TxStatus,
    pub block_number: Option<u64>,
    pub gas_used: Option<String>,
    pub contract_address: Option<String>,
    pub explorer_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateRequest {
    pub network: String,
    pub contract_type: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateResponse {
    pub network: Network,
    pub contract_type: ContractType,
    pub gas_limit: u64,
    pub gas_price_gwei: String,
    pub estimated_cost: String,
    pub native_symbol: String,
}

/// Drives a deployment from validated request to persisted, verified contract.
pub struct DeploymentService {
    config: Arc<Config>,
    tokens: TokenDeploymentRepository,
    presales: PresaleRepository,
    runner: Arc<dyn DeployRunner>,
    verifier: Arc<dyn ContractVerifier>,
    factories: Arc<FactoryRegistry>,
    snapshots: SnapshotWriter,
    rpc_manager: Arc<RpcManager>,
}

impl DeploymentService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Arc<Config>,
        tokens: TokenDeploymentRepository,
        presales: PresaleRepository,
        runner: Arc<dyn DeployRunner>,
        verifier: Arc<dyn ContractVerifier>,
        factories: Arc<FactoryRegistry>,
        snapshots: SnapshotWriter,
        rpc_manager: Arc<RpcManager>
    ) -> Self {
        Self {
            config,
            tokens,
            presales,
            runner,
            verifier,
            factories,
            snapshots,
            rpc_manager,
        }
    }

    fn network_config(&self, network: Network) -> Result<&NetworkConfig> {
        self.config
            .network(network)
            .ok_or_else(|| AppError::UnsupportedNetwork(format!("{} (not configured)", network)))
    }

    fn rpc_url(&self, network: Network) -> Result<String> {
        self.network_config(network)?
            .rpc_urls.first()
            .cloned()
            .ok_or_else(|| AppError::Config(format!("No RPC URL configured for {}", network)))
    }

    pub async fn deploy_token(&self, owner: &str, request: &TokenDeployRequest) -> Result<DeploymentResponse> {
        let token = validate_token(request)?;
        let network = token.network;
        let rpc_url = self.rpc_url(network)?;

        let params = token.deploy_params(owner);
        let result = self.runner.deploy(
            &(DeployInvocation {
                network,
                rpc_url,
                contract_type: token.contract_type,
                params: params.clone(),
            })
        ).await?;

        info!(
            network = %network,
            address = %result.address,
            tx_hash = %result.tx_hash,
            contract = token.contract_type.as_str(),
            "Token deployed"
        );

        self.snapshots.record(network, token.contract_type, owner, params, &result).await;

        let constructor_args = token.constructor_args(owner);
        let row = self.tokens
            .create(NewTokenDeployment {
                network: network.as_str().to_string(),
                contract_address: result.address.clone(),
                contract_type: token.contract_type.as_str().to_string(),
                name: token.name.clone(),
                symbol: token.symbol.clone(),
                decimals: token.decimals as i16,
                total_supply: token.total_supply.clone(),
                owner_address: owner.to_string(),
                constructor_args: serde_json::json!(constructor_args),
                tx_hash: result.tx_hash.clone(),
                gas_used: result.gas_used.clone(),
                is_burnable: token.contract_type.is_burnable(),
                is_mintable: token.contract_type.is_mintable(),
                has_fee: token.contract_type.has_fee(),
                has_redistribution: token.contract_type.has_redistribution(),
                fee_percent: token.fee_percent,
                redistribution_percent: token.redistribution_percent,
                verification_status: initial_verification_status(network),
                metadata_uri: token.metadata_uri.clone(),
            }).await
            .map_err(|e| self.unrecorded(network, &result, e))?;

        let verification = self.verify(network, &row.contract_address, constructor_args).await;
        let status = verification.status;
        if status != VerificationStatus::Skipped {
            if
                let Err(e) = self.tokens.set_verification(
                    row.id,
                    status,
                    verification.joined_errors()
                ).await
            {
                warn!(network = %network, address = %row.contract_address, error = %e, "Failed to store verification result");
            }
        }

        Ok(DeploymentResponse {
            success: true,
            deployment_id: row.id,
            explorer_url: self.config.get_address_explorer_url(network, &row.contract_address),
            contract_address: row.contract_address,
            tx_hash: row.tx_hash,
            gas_used: row.gas_used,
            network,
            contract_type: token.contract_type,
            verified: status == VerificationStatus::Verified,
            verification_status: status,
            verification_errors: verification.errors,
            factory_address: None,
        })
    }

    pub async fn deploy_presale(&self, owner: &str, request: &PresaleDeployRequest) -> Result<DeploymentResponse> {
        let now = Utc::now();
        let presale = validate_presale(request, now)?;
        let network = presale.network;
        let rpc_url = self.rpc_url(network)?;

        let fund_recipient = presale.fund_recipient.clone().unwrap_or_else(|| owner.to_string());
        let factory = self.factories.ensure_factory(network, &rpc_url, owner).await?;

        let params = presale.deploy_params(owner, &fund_recipient, &factory);
        let result = self.runner.deploy(
            &(DeployInvocation {
                network,
                rpc_url,
                contract_type: ContractType::Presale,
                params: params.clone(),
            })
        ).await?;

        info!(
            network = %network,
            address = %result.address,
            tx_hash = %result.tx_hash,
            token = %presale.token_address,
            "Presale deployed"
        );

        self.snapshots.record(network, ContractType::Presale, owner, params, &result).await;

        let constructor_args = presale.constructor_args(owner, &fund_recipient);
        let vesting = presale.vesting.as_ref();
        let row = self.presales
            .create(NewPresaleDeployment {
                network: network.as_str().to_string(),
                contract_address: result.address.clone(),
                token_address: presale.token_address.clone(),
                owner_address: owner.to_string(),
                fund_recipient,
                soft_cap: presale.soft_cap.clone(),
                hard_cap: presale.hard_cap.clone(),
                token_price: presale.token_price.clone(),
                min_purchase: presale.min_purchase.clone(),
                max_purchase: presale.max_purchase.clone(),
                start_time: presale.start_time,
                end_time: presale.end_time,
                vesting_enabled: vesting.is_some(),
                vesting_initial_percent: vesting.map(|v| v.initial_percent as i16),
                vesting_cliff_days: vesting.map(|v| v.cliff_days as i32),
                vesting_period_days: vesting.map(|v| v.period_days as i32),
                factory_address: Some(factory.clone()),
                constructor_args: serde_json::json!(constructor_args),
                tx_hash: result.tx_hash.clone(),
                gas_used: result.gas_used.clone(),
                status: PresaleStatus::derive(now, presale.start_time, presale.end_time, false),
                verification_status: initial_verification_status(network),
            }).await
            .map_err(|e| self.unrecorded(network, &result, e))?;

        let verification = self.verify(network, &row.contract_address, constructor_args).await;
        let status = verification.status;
        if status != VerificationStatus::Skipped {
            if
                let Err(e) = self.presales.set_verification(
                    row.id,
                    status,
                    verification.joined_errors()
                ).await
            {
                warn!(network = %network, address = %row.contract_address, error = %e, "Failed to store verification result");
            }
        }

        Ok(DeploymentResponse {
            success: true,
            deployment_id: row.id,
            explorer_url: self.config.get_address_explorer_url(network, &row.contract_address),
            contract_address: row.contract_address,
            tx_hash: row.tx_hash,
            gas_used: row.gas_used,
            network,
            contract_type: ContractType::Presale,
            verified: status == VerificationStatus::Verified,
            verification_status: status,
            verification_errors: verification.errors,
            factory_address: Some(factory),
        })
    }

    /// Receipt status of a deployment transaction.
    ///
    /// Without an explicit network the transaction must be one we deployed.
    pub async fn get_deployment_status(
        &self,
        tx_hash: &str,
        network: Option<&str>
    ) -> Result<DeploymentStatusResponse> {
        let network = match network {
            Some(network) => network.parse::<Network>()?,
            None => self.network_of_tx(tx_hash).await?,
        };
        self.network_config(network)?;

        let provider = self.rpc_manager.get_provider(network).await?;
        let receipt = match provider.get_transaction_status(tx_hash).await {
            Ok(receipt) => receipt,
            Err(e @ AppError::Rpc(_)) => {
                let _ = self.rpc_manager.rotate_provider(network).await;
                return Err(e);
            }
            Err(e) => {
                return Err(e);
            }
        };

        Ok(DeploymentStatusResponse {
            explorer_url: self.config.get_tx_explorer_url(network, &receipt.tx_hash),
            tx_hash: receipt.tx_hash,
            network,
            status: receipt.status,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
            contract_address: receipt.contract_address,
        })
    }

    async fn network_of_tx(&self, tx_hash: &str) -> Result<Network> {
        if let Some(token) = self.tokens.find_by_tx_hash(tx_hash).await? {
            return token.network.parse();
        }
        if let Some(presale) = self.presales.find_by_tx_hash(tx_hash).await? {
            return presale.network.parse();
        }
        Err(AppError::InvalidInput("network is required for transactions not deployed here".to_string()))
    }

    pub async fn estimate(&self, request: &EstimateRequest) -> Result<EstimateResponse> {
        let contract_type: ContractType = request.contract_type.parse()?;
        let network: Network = request.network.parse()?;
        self.network_config(network)?;

        let provider = self.rpc_manager.get_provider(network).await?;
        let cost = provider.estimate_deployment_cost(contract_type.estimated_gas()).await?;

        Ok(EstimateResponse {
            network,
            contract_type,
            gas_limit: cost.gas_limit,
            gas_price_gwei: cost.gas_price_gwei,
            estimated_cost: cost.cost_native,
            native_symbol: cost.native_symbol,
        })
    }

    fn unrecorded(&self, network: Network, result: &DeploymentResult, e: AppError) -> AppError {
        error!(
            network = %network,
            address = %result.address,
            tx_hash = %result.tx_hash,
            error = %e,
            "Contract deployed but not recorded"
        );
        result.not_recorded(e)
    }

    async fn verify(&self, network: Network, address: &str, constructor_args: Vec<String>) -> Verification {
        if network.is_testnet() {
            return Verification { status: VerificationStatus::Skipped, errors: Vec::new() };
        }

        let request = VerifyRequest {
            network,
            address: address.to_string(),
            constructor_args,
        };
        let outcome = verify_with_retry(
            self.verifier.as_ref(),
            &request,
            self.config.toolchain.verify_retry_delay
        ).await;

        Verification {
            status: if outcome.verified {
                VerificationStatus::Verified
            } else {
                VerificationStatus::Failed
            },
            errors: outcome.errors,
        }
    }
}

struct Verification {
    status: VerificationStatus,
    errors: Vec<String>,
}

impl Verification {
    /// Stored alongside a failed verification; a late success clears it.
    fn joined_errors(&self) -> Option<String> {
        if self.status == VerificationStatus::Failed && !self.errors.is_empty() {
            Some(self.errors.join("; "))
        } else {
            None
        }
    }
}

fn initial_verification_status(network: Network) -> VerificationStatus {
    if network.is_testnet() { VerificationStatus::Skipped } else { VerificationStatus::Pending }
}
