use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::chains::evm::EvmProvider;
use crate::config::Config;
use crate::enums::Network;
use crate::error::{ AppError, Result };
use crate::providers::ChainProvider;

struct ProviderPool {
    providers: Vec<Arc<dyn ChainProvider>>,
    current_index: RwLock<usize>,
}

/// Round-robin access to the RPC endpoints of every configured network.
pub struct RpcManager {
    pools: HashMap<Network, ProviderPool>,
}

impl RpcManager {
    pub fn new(config: &Config) -> Result<Self> {
        let mut providers: HashMap<Network, Vec<Arc<dyn ChainProvider>>> = HashMap::new();

        for (network, network_config) in &config.networks {
            let mut pool: Vec<Arc<dyn ChainProvider>> = Vec::new();

            for url in &network_config.rpc_urls {
                match EvmProvider::new(url, network.native_symbol()) {
                    Ok(provider) => pool.push(Arc::new(provider)),
                    Err(e) => tracing::warn!("Failed to create {} provider for {}: {}", network, url, e),
                }
            }

            if pool.is_empty() {
                return Err(AppError::Config(format!("No valid {} RPC providers configured", network)));
            }

            providers.insert(*network, pool);
        }

        Ok(Self::from_providers(providers))
    }

    pub fn from_providers(providers: HashMap<Network, Vec<Arc<dyn ChainProvider>>>) -> Self {
        let pools = providers
            .into_iter()
            .filter(|(_, list)| !list.is_empty())
            .map(|(network, list)| {
                (network, ProviderPool {
                    providers: list,
                    current_index: RwLock::new(0),
                })
            })
            .collect();

        Self { pools }
    }

    pub fn is_configured(&self, network: Network) -> bool {
        self.pools.contains_key(&network)
    }

    pub async fn get_provider(&self, network: Network) -> Result<Arc<dyn ChainProvider>> {
        let pool = self.pools
            .get(&network)
            .ok_or_else(|| AppError::UnsupportedNetwork(format!("{} (not configured)", network)))?;

        let mut index_guard = pool.current_index.write().await;
        let provider = pool.providers[*index_guard].clone();

        // Round-robin to next provider for next request
        *index_guard = (*index_guard + 1) % pool.providers.len();

        Ok(provider)
    }

    /// Skip the next provider in line (useful when the current one fails)
    pub async fn rotate_provider(&self, network: Network) -> Result<()> {
        let pool = self.pools
            .get(&network)
            .ok_or_else(|| AppError::UnsupportedNetwork(network.to_string()))?;

        let mut index = pool.current_index.write().await;
        *index = (*index + 1) % pool.providers.len();
        tracing::info!("Rotated {} provider to index {}", network, *index);
        Ok(())
    }
}
