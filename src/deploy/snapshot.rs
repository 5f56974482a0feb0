use std::path::PathBuf;

use chrono::{ DateTime, Utc };
use serde::Serialize;
use tracing::{ debug, warn };

use crate::deploy::DeploymentResult;
use crate::enums::{ ContractType, Network };
use crate::error::{ AppError, Result };

/// Audit record written next to the toolchain's own artifacts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentSnapshot {
    pub network: Network,
    pub chain_id: u64,
    pub contract_type: ContractType,
    pub contract_address: String,
    pub tx_hash: String,
    pub gas_used: Option<String>,
    pub owner: String,
    pub params: serde_json::Value,
    pub deployed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    root: PathBuf,
}

impl SnapshotWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<root>/<network>/<contract_address>.json`
    pub fn path_for(&self, network: Network, contract_address: &str) -> PathBuf {
        self.root
            .join(network.toolchain_name())
            .join(format!("{}.json", contract_address.to_lowercase()))
    }

    pub async fn write(&self, snapshot: &DeploymentSnapshot) -> Result<PathBuf> {
        let path = self.path_for(snapshot.network, &snapshot.contract_address);

        if let Some(dir) = path.parent() {
            tokio::fs
                ::create_dir_all(dir).await
                .map_err(|e| AppError::Internal(format!("Failed to create {}: {}", dir.display(), e)))?;
        }

        let body = serde_json
            ::to_vec_pretty(snapshot)
            .map_err(|e| AppError::Internal(format!("Failed to serialize snapshot: {}", e)))?;

        tokio::fs
            ::write(&path, body).await
            .map_err(|e| AppError::Internal(format!("Failed to write {}: {}", path.display(), e)))?;

        debug!(path = %path.display(), "Deployment snapshot written");
        Ok(path)
    }

    /// Snapshot a fresh toolchain result. Failures are logged, never returned:
    /// by now the contract exists on chain whatever happens to the file.
    pub async fn record(
        &self,
        network: Network,
        contract_type: ContractType,
        owner: &str,
        params: serde_json::Value,
        result: &DeploymentResult
    ) -> Option<PathBuf> {
        let snapshot = DeploymentSnapshot {
            network,
            chain_id: network.chain_id(),
            contract_type,
            contract_address: result.address.clone(),
            tx_hash: result.tx_hash.clone(),
            gas_used: result.gas_used.clone(),
            owner: owner.to_string(),
            params,
            deployed_at: Utc::now(),
        };

        match self.write(&snapshot).await {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(network = %network, address = %result.address, error = %e, "Failed to write deployment snapshot");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot() -> DeploymentSnapshot {
        DeploymentSnapshot {
            network: Network::BscTestnet,
            chain_id: Network::BscTestnet.chain_id(),
            contract_type: ContractType::FeeToken,
            contract_address: "0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string(),
            tx_hash: "0xabc".to_string(),
            gas_used: Some("1500000".to_string()),
            owner: "0x70997970c51812dc3a010c7d01b50e0d17dc79c8".to_string(),
            params: json!({ "name": "Moon", "feeBps": 250 }),
            deployed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_write_snapshot_location() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::new(dir.path());

        let path = writer.write(&snapshot()).await.unwrap();

        assert_eq!(
            path,
            dir.path().join("bscTestnet").join("0x5fbdb2315678afecb367f032d93f642f64180aa3.json")
        );

        let written: serde_json::Value = serde_json
            ::from_slice(&std::fs::read(&path).unwrap())
            .unwrap();
        assert_eq!(written["contractType"], "fee");
        assert_eq!(written["txHash"], "0xabc");
        assert_eq!(written["params"]["feeBps"], 250);
    }

    #[tokio::test]
    async fn test_overwrite_is_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::new(dir.path());

        writer.write(&snapshot()).await.unwrap();
        let mut second = snapshot();
        second.tx_hash = "0xdef".to_string();
        let path = writer.write(&second).await.unwrap();

        let written: serde_json::Value = serde_json
            ::from_slice(&std::fs::read(&path).unwrap())
            .unwrap();
        assert_eq!(written["txHash"], "0xdef");
    }

    #[tokio::test]
    async fn test_record_swallows_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        // A plain file where the network directory should go
        let blocker = dir.path().join("blocked");
        std::fs::write(&blocker, b"").unwrap();
        let writer = SnapshotWriter::new(&blocker);
        let result = DeploymentResult {
            address: "0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string(),
            tx_hash: "0xabc".to_string(),
            gas_used: None,
        };

        let path = writer.record(Network::Sepolia, ContractType::StandardToken, "0xowner", json!({}), &result).await;
        assert!(path.is_none());

        let writer = SnapshotWriter::new(dir.path());
        let path = writer
            .record(Network::Sepolia, ContractType::PresaleFactory, "0xowner", json!({}), &result).await
            .unwrap();
        let written: serde_json::Value = serde_json
            ::from_slice(&std::fs::read(&path).unwrap())
            .unwrap();
        assert_eq!(written["contractType"], "presale_factory");
        assert_eq!(written["chainId"], 11155111);
    }
}
