use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;
use tokio::sync::Mutex;
use tracing::info;

use crate::db::FactoryRepository;
use crate::deploy::{ DeployInvocation, DeployRunner, SnapshotWriter };
use crate::enums::{ ContractType, Network };
use crate::error::Result;

/// Hands out the presale factory for a network, deploying it on first use.
///
/// Lookups and creation for one network are serialized behind a per-network
/// lock, so two presales racing on a fresh network share a single factory.
pub struct FactoryRegistry {
    repo: FactoryRepository,
    runner: Arc<dyn DeployRunner>,
    snapshots: SnapshotWriter,
    locks: Mutex<HashMap<Network, Arc<Mutex<()>>>>,
}

impl FactoryRegistry {
    pub fn new(repo: FactoryRepository, runner: Arc<dyn DeployRunner>, snapshots: SnapshotWriter) -> Self {
        Self {
            repo,
            runner,
            snapshots,
            locks: Mutex::new(HashMap::new()),
        }
    }

    async fn lock_for(&self, network: Network) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(network).or_default().clone()
    }

    pub async fn find(&self, network: Network) -> Result<Option<String>> {
        Ok(self.repo.find(network).await?.map(|f| f.contract_address))
    }

    /// Address of the network's factory, deploying one (owned by `owner`) if none exists.
    pub async fn ensure_factory(&self, network: Network, rpc_url: &str, owner: &str) -> Result<String> {
        let lock = self.lock_for(network).await;
        let _guard = lock.lock().await;

        if let Some(existing) = self.repo.find(network).await? {
            return Ok(existing.contract_address);
        }

        info!(network = %network, "No presale factory yet, deploying one");

        let params = json!({ "owner": owner });
        let result = self.runner.deploy(
            &(DeployInvocation {
                network,
                rpc_url: rpc_url.to_string(),
                contract_type: ContractType::PresaleFactory,
                params: params.clone(),
            })
        ).await?;

        self.snapshots.record(network, ContractType::PresaleFactory, owner, params, &result).await;

        let factory = self.repo
            .create(network, &result.address, &result.tx_hash).await
            .map_err(|e| result.not_recorded(e))?;

        info!(network = %network, address = %factory.contract_address, "Presale factory deployed");
        Ok(factory.contract_address)
    }
}
