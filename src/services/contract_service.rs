use std::sync::Arc;

use chrono::{ DateTime, Utc };
use serde::Serialize;
use tracing::{ debug, warn };
use uuid::Uuid;

use crate::crypto::signature::normalize_address;
use crate::db::entity::{ presale_deployment, token_deployment };
use crate::db::{ DeploymentFilter, PresaleChainState, PresaleRepository, TokenDeploymentRepository };
use crate::enums::{ Network, PresaleStatus };
use crate::error::{ AppError, Result };
use crate::rpc::RpcManager;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenView {
    pub id: Uuid,
    pub network: String,
    pub contract_address: String,
    pub contract_type: String,
    pub name: String,
    pub symbol: String,
    pub decimals: i16,
    pub total_supply: String,
    pub owner_address: String,
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
    pub stats_updated_at: Option<DateTime<Utc>>,
    pub explorer_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<token_deployment::Model> for TokenView {
    fn from(m: token_deployment::Model) -> Self {
        Self {
            explorer_url: explorer_address_url(&m.network, &m.contract_address),
            id: m.id,
            network: m.network,
            contract_address: m.contract_address,
            contract_type: m.contract_type,
            name: m.name,
            symbol: m.symbol,
            decimals: m.decimals,
            total_supply: m.total_supply,
            owner_address: m.owner_address,
            tx_hash: m.tx_hash,
            gas_used: m.gas_used,
            is_burnable: m.is_burnable,
            is_mintable: m.is_mintable,
            has_fee: m.has_fee,
            has_redistribution: m.has_redistribution,
            fee_percent: m.fee_percent,
            redistribution_percent: m.redistribution_percent,
            verification_status: m.verification_status,
            verification_error: m.verification_error,
            metadata_uri: m.metadata_uri,
            cached_total_supply: m.cached_total_supply,
            stats_updated_at: m.stats_updated_at,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VestingView {
    pub initial_percent: Option<i16>,
    pub cliff_days: Option<i32>,
    pub period_days: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresaleView {
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
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub vesting: Option<VestingView>,
    pub factory_address: Option<String>,
    pub tx_hash: String,
    pub gas_used: Option<String>,
    pub status: PresaleStatus,
    pub finalized: bool,
    pub total_raised: Option<String>,
    pub contributors: Option<i64>,
    pub stats_updated_at: Option<DateTime<Utc>>,
    pub verification_status: String,
    pub verification_error: Option<String>,
    pub explorer_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PresaleView {
    /// Build the view with status derived from `now` rather than the stored value.
    pub fn at(m: presale_deployment::Model, now: DateTime<Utc>) -> Self {
        let vesting = m.vesting_enabled.then(|| VestingView {
            initial_percent: m.vesting_initial_percent,
            cliff_days: m.vesting_cliff_days,
            period_days: m.vesting_period_days,
        });

        Self {
            status: PresaleStatus::derive(now, m.start_time, m.end_time, m.finalized),
            explorer_url: explorer_address_url(&m.network, &m.contract_address),
            id: m.id,
            network: m.network,
            contract_address: m.contract_address,
            token_address: m.token_address,
            owner_address: m.owner_address,
            fund_recipient: m.fund_recipient,
            soft_cap: m.soft_cap,
            hard_cap: m.hard_cap,
            token_price: m.token_price,
            min_purchase: m.min_purchase,
            max_purchase: m.max_purchase,
            start_time: m.start_time,
            end_time: m.end_time,
            vesting,
            factory_address: m.factory_address,
            tx_hash: m.tx_hash,
            gas_used: m.gas_used,
            finalized: m.finalized,
            total_raised: m.total_raised,
            contributors: m.contributors,
            stats_updated_at: m.stats_updated_at,
            verification_status: m.verification_status,
            verification_error: m.verification_error,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MyDeployments {
    pub tokens: Vec<TokenView>,
    pub presales: Vec<PresaleView>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSummary {
    pub refreshed: usize,
    pub failed: usize,
}

fn explorer_address_url(network: &str, address: &str) -> Option<String> {
    network
        .parse::<Network>()
        .ok()
        .map(|n| format!("{}/address/{}", n.explorer_url(), address))
}

/// Read side of the launchpad plus on-chain refreshes of cached state.
pub struct ContractService {
    tokens: TokenDeploymentRepository,
    presales: PresaleRepository,
    rpc_manager: Arc<RpcManager>,
}

impl ContractService {
    pub fn new(
        tokens: TokenDeploymentRepository,
        presales: PresaleRepository,
        rpc_manager: Arc<RpcManager>
    ) -> Self {
        Self {
            tokens,
            presales,
            rpc_manager,
        }
    }

    pub async fn list_tokens(&self, filter: &DeploymentFilter) -> Result<Vec<TokenView>> {
        let rows = self.tokens.list(filter).await?;
        Ok(rows.into_iter().map(TokenView::from).collect())
    }

    pub async fn get_token(&self, network: &str, address: &str) -> Result<TokenView> {
        Ok(self.find_token(network, address).await?.into())
    }

    /// Re-read the token's total supply from chain and cache it.
    pub async fn refresh_token(&self, network: &str, address: &str) -> Result<TokenView> {
        let row = self.find_token(network, address).await?;
        let network: Network = row.network.parse()?;

        let provider = self.rpc_manager.get_provider(network).await?;
        let supply = match provider.get_token_total_supply(&row.contract_address).await {
            Ok(supply) => supply,
            Err(e) => {
                let _ = self.rpc_manager.rotate_provider(network).await;
                return Err(e);
            }
        };

        let row = self.tokens.update_stats(row.id, supply).await?;
        Ok(row.into())
    }

    async fn find_token(&self, network: &str, address: &str) -> Result<token_deployment::Model> {
        let network: Network = network.parse()?;
        let address = normalize_address(address)?;

        self.tokens
            .find_by_network_and_address(network.as_str(), &address).await?
            .ok_or_else(|| AppError::NotFound("Token".to_string()))
    }

    pub async fn list_presales(&self, filter: &DeploymentFilter) -> Result<Vec<PresaleView>> {
        let now = Utc::now();
        let rows = self.presales.list(filter, now).await?;
        Ok(
            rows
                .into_iter()
                .map(|m| PresaleView::at(m, now))
                .collect()
        )
    }

    pub async fn get_presale(&self, network: &str, address: &str) -> Result<PresaleView> {
        let row = self.find_presale(network, address).await?;
        Ok(PresaleView::at(row, Utc::now()))
    }

    pub async fn refresh_presale(&self, network: &str, address: &str) -> Result<PresaleView> {
        let row = self.find_presale(network, address).await?;
        let row = self.refresh_presale_row(row).await?;
        Ok(PresaleView::at(row, Utc::now()))
    }

    async fn find_presale(&self, network: &str, address: &str) -> Result<presale_deployment::Model> {
        let network: Network = network.parse()?;
        let address = normalize_address(address)?;

        self.presales
            .find_by_network_and_address(network.as_str(), &address).await?
            .ok_or_else(|| AppError::NotFound("Presale".to_string()))
    }

    async fn refresh_presale_row(&self, row: presale_deployment::Model) -> Result<presale_deployment::Model> {
        let network: Network = row.network.parse()?;
        let provider = self.rpc_manager.get_provider(network).await?;

        let state = match provider.get_presale_state(&row.contract_address).await {
            Ok(state) => state,
            Err(e) => {
                let _ = self.rpc_manager.rotate_provider(network).await;
                return Err(e);
            }
        };

        let status = PresaleStatus::derive(Utc::now(), row.start_time, row.end_time, state.finalized);
        debug!(
            network = %network,
            address = %row.contract_address,
            status = %status,
            raised = %state.total_raised,
            "Presale state refreshed"
        );

        self.presales.update_chain_state(row.id, PresaleChainState {
            status,
            finalized: state.finalized,
            total_raised: state.total_raised,
            contributors: state.contributors as i64,
        }).await
    }

    /// Refresh every presale that is not finalized yet.
    ///
    /// A presale whose chain read fails still gets its clock-derived status stored.
    pub async fn refresh_open_presales(&self) -> Result<RefreshSummary> {
        let mut summary = RefreshSummary::default();
        let now = Utc::now();

        for row in self.presales.find_unfinalized().await? {
            let network_ready = row.network
                .parse::<Network>()
                .map(|n| self.rpc_manager.is_configured(n))
                .unwrap_or(false);

            let fallback_status = PresaleStatus::derive(now, row.start_time, row.end_time, false);
            let (id, stored_status, address) = (row.id, row.status.clone(), row.contract_address.clone());

            let result = if network_ready {
                self.refresh_presale_row(row).await.map(|_| ())
            } else {
                Err(AppError::UnsupportedNetwork(format!("{} (not configured)", row.network)))
            };

            match result {
                Ok(()) => {
                    summary.refreshed += 1;
                }
                Err(e) => {
                    warn!(address = %address, error = %e, "Presale refresh failed");
                    summary.failed += 1;
                    if stored_status != fallback_status.as_str() {
                        if let Err(e) = self.presales.set_status(id, fallback_status).await {
                            warn!(address = %address, error = %e, "Failed to store presale status");
                        }
                    }
                }
            }
        }

        Ok(summary)
    }

    /// Everything `owner` has deployed.
    pub async fn my_deployments(&self, owner: &str) -> Result<MyDeployments> {
        let filter = DeploymentFilter {
            owner: Some(owner.to_lowercase()),
            limit: Some(DeploymentFilter::MAX_LIMIT),
            ..Default::default()
        };

        Ok(MyDeployments {
            tokens: self.list_tokens(&filter).await?,
            presales: self.list_presales(&filter).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ test_connection, NewPresaleDeployment, NewTokenDeployment };
    use crate::enums::VerificationStatus;
    use crate::providers::fake::FakeChain;
    use crate::providers::{ ChainProvider, DeploymentCost, PresaleOnChainState, TxReceiptInfo };
    use async_trait::async_trait;
    use chrono::Duration;
    use sea_orm::{ DatabaseConnection, EntityTrait };
    use serde_json::json;
    use std::collections::HashMap;

    const OWNER: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";
    const PRESALE: &str = "0x5fbdb2315678afecb367f032d93f642f64180aa3";
    const TOKEN: &str = "0xe7f1725e7734ce288f8367e1bb143e90bb3f0512";

    struct Fixture {
        service: ContractService,
        tokens: TokenDeploymentRepository,
        presales: PresaleRepository,
    }

    async fn fixture(chain: Option<FakeChain>) -> Fixture {
        let db = test_connection().await;
        let mut providers: HashMap<Network, Vec<Arc<dyn ChainProvider>>> = HashMap::new();
        if let Some(chain) = chain {
            providers.insert(Network::Sepolia, vec![Arc::new(chain)]);
        }

        let tokens = TokenDeploymentRepository::new(db.clone());
        let presales = PresaleRepository::new(db);
        Fixture {
            service: ContractService::new(
                tokens.clone(),
                presales.clone(),
                Arc::new(RpcManager::from_providers(providers))
            ),
            tokens,
            presales,
        }
    }

    fn new_token(address: &str) -> NewTokenDeployment {
        NewTokenDeployment {
            network: Network::Sepolia.as_str().to_string(),
            contract_address: address.to_string(),
            contract_type: "standard".to_string(),
            name: "Moon".to_string(),
            symbol: "MOON".to_string(),
            decimals: 18,
            total_supply: "1000000".to_string(),
            owner_address: OWNER.to_string(),
            constructor_args: json!([]),
            tx_hash: "0xaa".to_string(),
            gas_used: Some("1200000".to_string()),
            is_burnable: false,
            is_mintable: false,
            has_fee: false,
            has_redistribution: false,
            fee_percent: None,
            redistribution_percent: None,
            verification_status: VerificationStatus::Skipped,
            metadata_uri: None,
        }
    }

    fn new_presale(start: DateTime<Utc>, end: DateTime<Utc>) -> NewPresaleDeployment {
        NewPresaleDeployment {
            network: Network::Sepolia.as_str().to_string(),
            contract_address: PRESALE.to_string(),
            token_address: TOKEN.to_string(),
            owner_address: OWNER.to_string(),
            fund_recipient: OWNER.to_string(),
            soft_cap: "10".to_string(),
            hard_cap: "50".to_string(),
            token_price: "1000".to_string(),
            min_purchase: "0.1".to_string(),
            max_purchase: "5".to_string(),
            start_time: start,
            end_time: end,
            vesting_enabled: false,
            vesting_initial_percent: None,
            vesting_cliff_days: None,
            vesting_period_days: None,
            factory_address: None,
            constructor_args: json!([]),
            tx_hash: "0xbb".to_string(),
            gas_used: None,
            status: PresaleStatus::Upcoming,
            verification_status: VerificationStatus::Skipped,
        }
    }

    #[tokio::test]
    async fn test_get_token_by_mixed_case_address() {
        let f = fixture(None).await;
        f.tokens.create(new_token(TOKEN)).await.unwrap();

        let view = f.service
            .get_token("sepolia", "0xE7f1725E7734CE288F8367e1Bb143E90bb3F0512").await
            .unwrap();
        assert_eq!(view.contract_address, TOKEN);
        assert_eq!(
            view.explorer_url.as_deref(),
            Some("https://sepolia.etherscan.io/address/0xe7f1725e7734ce288f8367e1bb143e90bb3f0512")
        );

        let missing = f.service.get_token("sepolia", PRESALE).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_presale_status_recomputed_on_read() {
        let f = fixture(None).await;
        let now = Utc::now();
        // Stored as upcoming, but the window already opened
        f.presales.create(new_presale(now - Duration::hours(1), now + Duration::hours(1))).await.unwrap();

        let view = f.service.get_presale("sepolia", PRESALE).await.unwrap();
        assert_eq!(view.status, PresaleStatus::Live);
    }

    #[tokio::test]
    async fn test_status_filter_follows_clock() {
        let f = fixture(None).await;
        let now = Utc::now();
        // Stored as upcoming, opened a minute ago
        f.presales.create(new_presale(now - Duration::minutes(1), now + Duration::hours(1))).await.unwrap();

        let live = DeploymentFilter { status: Some(PresaleStatus::Live), ..Default::default() };
        let rows = f.service.list_presales(&live).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, PresaleStatus::Live);

        let upcoming = DeploymentFilter { status: Some(PresaleStatus::Upcoming), ..Default::default() };
        assert!(f.service.list_presales(&upcoming).await.unwrap().is_empty());

        let ended = DeploymentFilter { status: Some(PresaleStatus::Ended), ..Default::default() };
        assert!(f.service.list_presales(&ended).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_presale_reads_chain() {
        let chain = FakeChain {
            presale: Some(PresaleOnChainState {
                finalized: true,
                total_raised: "42.5".to_string(),
                contributors: 17,
            }),
            ..Default::default()
        };
        let f = fixture(Some(chain)).await;
        let now = Utc::now();
        f.presales.create(new_presale(now - Duration::hours(1), now + Duration::hours(1))).await.unwrap();

        let view = f.service.refresh_presale("sepolia", PRESALE).await.unwrap();
        assert!(view.finalized);
        assert_eq!(view.status, PresaleStatus::Ended);
        assert_eq!(view.total_raised.as_deref(), Some("42.5"));
        assert_eq!(view.contributors, Some(17));
        assert!(view.stats_updated_at.is_some());

        // Finalized presales drop out of the background refresh
        assert!(f.presales.find_unfinalized().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_open_presales_tolerates_rpc_failure() {
        let f = fixture(Some(FakeChain::default())).await;
        let now = Utc::now();
        let row = f.presales
            .create(new_presale(now - Duration::hours(2), now - Duration::hours(1))).await
            .unwrap();

        let summary = f.service.refresh_open_presales().await.unwrap();
        assert_eq!(summary, RefreshSummary { refreshed: 0, failed: 1 });

        // Clock-derived status is still persisted
        let stored = f.presales
            .find_by_network_and_address(&row.network, PRESALE).await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, "ended");
    }

    /// Chain whose presale read deletes every stored presale first.
    struct VanishingRows {
        db: DatabaseConnection,
    }

    #[async_trait]
    impl ChainProvider for VanishingRows {
        async fn get_transaction_status(&self, tx_hash: &str) -> Result<TxReceiptInfo> {
            FakeChain::default().get_transaction_status(tx_hash).await
        }

        async fn estimate_deployment_cost(&self, gas_limit: u64) -> Result<DeploymentCost> {
            FakeChain::default().estimate_deployment_cost(gas_limit).await
        }

        async fn get_token_total_supply(&self, token_address: &str) -> Result<String> {
            FakeChain::default().get_token_total_supply(token_address).await
        }

        async fn get_token_balance(&self, token_address: &str, holder: &str) -> Result<String> {
            FakeChain::default().get_token_balance(token_address, holder).await
        }

        async fn get_presale_state(&self, _presale_address: &str) -> Result<PresaleOnChainState> {
            presale_deployment::Entity::delete_many().exec(&self.db).await?;
            Err(AppError::Rpc("node unavailable".to_string()))
        }
    }

    #[tokio::test]
    async fn test_refresh_open_presales_survives_status_write_failure() {
        let db = test_connection().await;
        let presales = PresaleRepository::new(db.clone());
        let now = Utc::now();
        for address in [PRESALE, "0xcf7ed3acca5a467e9e704c703e8d87f634fb0fc9"] {
            let mut input = new_presale(now - Duration::hours(2), now - Duration::hours(1));
            input.contract_address = address.to_string();
            presales.create(input).await.unwrap();
        }

        let mut providers: HashMap<Network, Vec<Arc<dyn ChainProvider>>> = HashMap::new();
        providers.insert(Network::Sepolia, vec![Arc::new(VanishingRows { db: db.clone() })]);
        let service = ContractService::new(
            TokenDeploymentRepository::new(db),
            presales,
            Arc::new(RpcManager::from_providers(providers))
        );

        // Neither status write can land, and the pass still visits both rows
        let summary = service.refresh_open_presales().await.unwrap();
        assert_eq!(summary, RefreshSummary { refreshed: 0, failed: 2 });
    }

    #[tokio::test]
    async fn test_refresh_token_caches_supply() {
        let chain = FakeChain { total_supply: Some("999000.0".to_string()), ..Default::default() };
        let f = fixture(Some(chain)).await;
        f.tokens.create(new_token(TOKEN)).await.unwrap();

        let view = f.service.refresh_token("sepolia", TOKEN).await.unwrap();
        assert_eq!(view.cached_total_supply.as_deref(), Some("999000.0"));
    }

    #[tokio::test]
    async fn test_my_deployments_only_returns_owned() {
        let f = fixture(None).await;
        let now = Utc::now();
        f.tokens.create(new_token(TOKEN)).await.unwrap();
        let mut foreign = new_token("0x9fe46736679d2d9a65f0992f2272de9f3c7fa6e0");
        foreign.owner_address = "0x3c44cdddb6a900fa2b585dd299e03d12fa4293bc".to_string();
        f.tokens.create(foreign).await.unwrap();
        f.presales.create(new_presale(now, now + Duration::days(1))).await.unwrap();

        let mine = f.service.my_deployments(&OWNER.to_uppercase().replace("0X", "0x")).await.unwrap();
        assert_eq!(mine.tokens.len(), 1);
        assert_eq!(mine.tokens[0].contract_address, TOKEN);
        assert_eq!(mine.presales.len(), 1);
    }
}
