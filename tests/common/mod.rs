#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{ AtomicUsize, Ordering };
use std::sync::{ Arc, Mutex };
use std::time::Duration;

use async_trait::async_trait;
use axum::{ body::Body, http::{ header, Request, StatusCode }, Router };
use sea_orm::{ ConnectOptions, Database, DatabaseConnection };
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use launchpad::api::{ self, AppState };
use launchpad::config::{ AuthConfig, Config, Environment, IpfsConfig, NetworkConfig, ToolchainConfig };
use launchpad::crypto::JwtManager;
use launchpad::db::{ FactoryRepository, PresaleRepository, TokenDeploymentRepository, UserRepository };
use launchpad::deploy::{
    ContractVerifier,
    DeployInvocation,
    DeployRunner,
    DeploymentResult,
    FactoryRegistry,
    SnapshotWriter,
    VerifyRequest,
};
use launchpad::providers::{ ChainProvider, DeploymentCost, PresaleOnChainState, TxReceiptInfo };
use launchpad::rpc::RpcManager;
use launchpad::services::{ AuthService, ContractService, DeploymentService, MetadataService };
use launchpad::{ AppError, ContractType, Network, Result, TxStatus };
use migration::{ Migrator, MigratorTrait };

pub const JWT_SECRET: &str = "integration-test-secret-0123456789abcdef";
pub const OWNER: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";

/// Deterministic toolchain stand-in: every deployment gets the next address.
#[derive(Default)]
pub struct FakeRunner {
    pub invocations: Mutex<Vec<DeployInvocation>>,
    pub fail_with_stderr: Option<String>,
    /// Hand out the first address every time, like a freshly restarted dev node.
    pub reuse_first_address: bool,
}

impl FakeRunner {
    pub fn calls(&self) -> usize {
        self.invocations.lock().unwrap().len()
    }

    pub fn calls_for(&self, contract_type: ContractType) -> usize {
        self.invocations
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.contract_type == contract_type)
            .count()
    }

    pub fn result_for(n: usize) -> DeploymentResult {
        DeploymentResult {
            address: format!("0x{:040x}", 0xabc000 + n),
            tx_hash: format!("0x{:064x}", 0xdef000 + n),
            gas_used: Some("1234567".to_string()),
        }
    }
}

#[async_trait]
impl DeployRunner for FakeRunner {
    async fn deploy(&self, invocation: &DeployInvocation) -> Result<DeploymentResult> {
        let n = {
            let mut invocations = self.invocations.lock().unwrap();
            invocations.push(invocation.clone());
            invocations.len()
        };

        if let Some(stderr) = &self.fail_with_stderr {
            return Err(AppError::Deployment {
                message: "Deployment script exited with exit status: 1".to_string(),
                stderr: stderr.clone(),
            });
        }
        if self.reuse_first_address {
            let mut result = Self::result_for(1);
            result.tx_hash = Self::result_for(n).tx_hash;
            return Ok(result);
        }
        Ok(Self::result_for(n))
    }
}

pub struct FakeVerifier {
    pub succeed: bool,
    pub calls: AtomicUsize,
    /// Closed during verification, so every later query fails.
    pub close_db_on_verify: Mutex<Option<DatabaseConnection>>,
}

#[async_trait]
impl ContractVerifier for FakeVerifier {
    async fn verify(&self, _request: &VerifyRequest) -> Result<()> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let db = self.close_db_on_verify.lock().unwrap().take();
        if let Some(db) = db {
            db.close().await.unwrap();
        }
        if self.succeed {
            Ok(())
        } else {
            Err(AppError::External(format!("explorer rejected attempt {}", n)))
        }
    }
}

/// Chain that has mined every transaction it is asked about.
pub struct MinedChain;

#[async_trait]
impl ChainProvider for MinedChain {
    async fn get_transaction_status(&self, tx_hash: &str) -> Result<TxReceiptInfo> {
        Ok(TxReceiptInfo {
            tx_hash: tx_hash.to_lowercase(),
            status: TxStatus::Confirmed,
            block_number: Some(19_000_000),
            gas_used: Some("1234567".to_string()),
            contract_address: None,
        })
    }

    async fn estimate_deployment_cost(&self, gas_limit: u64) -> Result<DeploymentCost> {
        Ok(DeploymentCost {
            gas_limit,
            gas_price_gwei: "20.0".to_string(),
            cost_native: "0.024".to_string(),
            native_symbol: "ETH".to_string(),
        })
    }

    async fn get_token_total_supply(&self, _token_address: &str) -> Result<String> {
        Ok("1000000.0".to_string())
    }

    async fn get_token_balance(&self, _token_address: &str, _holder: &str) -> Result<String> {
        Ok("0.0".to_string())
    }

    async fn get_presale_state(&self, _presale_address: &str) -> Result<PresaleOnChainState> {
        Ok(PresaleOnChainState { finalized: false, total_raised: "0.0".to_string(), contributors: 0 })
    }
}

pub fn test_config(deployments_dir: &Path) -> Config {
    let networks = [Network::Sepolia, Network::Ethereum]
        .into_iter()
        .map(|network| {
            (network, NetworkConfig {
                network,
                rpc_urls: vec!["http://127.0.0.1:8545".to_string()],
                explorer_api_key: Some("explorer-key".to_string()),
            })
        })
        .collect();

    Config {
        environment: Environment::Development,
        database_url: "sqlite::memory:".to_string(),
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        networks,
        toolchain: ToolchainConfig {
            deploy_command: vec!["true".to_string()],
            verify_command: vec!["true".to_string()],
            working_dir: None,
            deployer_private_key: None,
            verify_retry_delay: Duration::ZERO,
        },
        auth: AuthConfig {
            jwt_secret: JWT_SECRET.to_string(),
            jwt_expiry_secs: 3600,
            nonce_ttl_secs: 600,
        },
        ipfs: IpfsConfig {
            pinata_jwt: None,
            pinata_api_url: "http://127.0.0.1:9".to_string(),
            gateway_url: "http://127.0.0.1:9/ipfs".to_string(),
        },
        deployments_dir: deployments_dir.to_path_buf(),
        presale_refresh_interval: Duration::from_secs(60),
        platform_token: None,
    }
}

pub struct TestApp {
    pub router: Router,
    pub runner: Arc<FakeRunner>,
    pub verifier: Arc<FakeVerifier>,
    pub tokens: TokenDeploymentRepository,
    pub presales: PresaleRepository,
    pub db: DatabaseConnection,
    pub deployments_dir: TempDir,
}

pub async fn spawn_app(runner: FakeRunner, verifier_succeeds: bool) -> TestApp {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    Migrator::up(&db, None).await.unwrap();

    let deployments_dir = tempfile::tempdir().unwrap();
    let config = Arc::new(test_config(deployments_dir.path()));

    let mut providers: HashMap<Network, Vec<Arc<dyn ChainProvider>>> = HashMap::new();
    providers.insert(Network::Sepolia, vec![Arc::new(MinedChain)]);
    providers.insert(Network::Ethereum, vec![Arc::new(MinedChain)]);
    let rpc_manager = Arc::new(RpcManager::from_providers(providers));

    let runner = Arc::new(runner);
    let verifier = Arc::new(FakeVerifier {
        succeed: verifier_succeeds,
        calls: AtomicUsize::new(0),
        close_db_on_verify: Mutex::new(None),
    });

    let tokens = TokenDeploymentRepository::new(db.clone());
    let presales = PresaleRepository::new(db.clone());
    let snapshots = SnapshotWriter::new(deployments_dir.path());
    let factories = Arc::new(
        FactoryRegistry::new(FactoryRepository::new(db.clone()), runner.clone(), snapshots.clone())
    );

    let auth_service = Arc::new(
        AuthService::new(
            UserRepository::new(db.clone()),
            JwtManager::new(JWT_SECRET, config.auth.jwt_expiry_secs),
            config.auth.nonce_ttl_secs,
            rpc_manager.clone(),
            None
        )
    );
    let deployment_service = Arc::new(
        DeploymentService::new(
            config.clone(),
            tokens.clone(),
            presales.clone(),
            runner.clone(),
            verifier.clone(),
            factories,
            snapshots,
            rpc_manager.clone()
        )
    );
    let contract_service = Arc::new(
        ContractService::new(tokens.clone(), presales.clone(), rpc_manager)
    );
    let metadata_service = Arc::new(MetadataService::new(config.ipfs.clone(), tokens.clone()).unwrap());

    let router = api::router(
        AppState::new(auth_service, deployment_service, contract_service, metadata_service)
    );

    TestApp {
        router,
        runner,
        verifier,
        tokens,
        presales,
        db,
        deployments_dir,
    }
}

/// Bearer token for `address`, signed with the app's secret.
pub fn token_for(address: &str) -> String {
    JwtManager::new(JWT_SECRET, 3600).issue(address).unwrap().0
}

pub async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) =>
            builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };

    (status, json)
}
