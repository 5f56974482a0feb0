use std::sync::Arc;

use anyhow::Context;
use launchpad::{
    api::{ self, AppState },
    crypto::JwtManager,
    db::{ FactoryRepository, PresaleRepository, TokenDeploymentRepository, UserRepository },
    deploy::{ FactoryRegistry, ScriptRunner, ScriptVerifier, SnapshotWriter },
    error::set_expose_internal_errors,
    refresher::PresaleRefresher,
    rpc::RpcManager,
    services::{ AuthService, ContractService, DeploymentService, MetadataService },
    Config,
};
use migration::{ Migrator, MigratorTrait };
use tracing_subscriber::{ layer::SubscriberExt, util::SubscriberInitExt };

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber
        ::registry()
        .with(
            tracing_subscriber::EnvFilter
                ::try_from_default_env()
                .unwrap_or_else(|_| "launchpad=debug,tower_http=debug".into())
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
    set_expose_internal_errors(!config.is_production());

    tracing::info!(
        environment = ?config.environment,
        networks = ?config.configured_networks(),
        "Starting launchpad"
    );

    // Initialize database connection
    let db = sea_orm::Database::connect(&config.database_url).await.context("Failed to connect to database")?;
    tracing::info!("Database connected successfully");

    Migrator::up(&db, None).await.context("Failed to run migrations")?;
    tracing::info!("Migrations completed successfully");

    let rpc_manager = Arc::new(RpcManager::new(&config)?);
    tracing::info!("RPC manager initialized");

    // Repositories
    let users = UserRepository::new(db.clone());
    let tokens = TokenDeploymentRepository::new(db.clone());
    let presales = PresaleRepository::new(db.clone());
    let factories = FactoryRepository::new(db);

    // Toolchain
    let runner = Arc::new(ScriptRunner::from_config(&config.toolchain));
    let verifier = Arc::new(ScriptVerifier::from_config(&config));
    let snapshots = SnapshotWriter::new(config.deployments_dir.clone());
    let factory_registry = Arc::new(FactoryRegistry::new(factories, runner.clone(), snapshots.clone()));

    // Services
    let auth_service = Arc::new(
        AuthService::new(
            users,
            JwtManager::new(&config.auth.jwt_secret, config.auth.jwt_expiry_secs),
            config.auth.nonce_ttl_secs,
            rpc_manager.clone(),
            config.platform_token.clone()
        )
    );

    let contract_service = Arc::new(
        ContractService::new(tokens.clone(), presales.clone(), rpc_manager.clone())
    );

    let metadata_service = Arc::new(MetadataService::new(config.ipfs.clone(), tokens.clone())?);

    let config = Arc::new(config);
    let deployment_service = Arc::new(
        DeploymentService::new(
            config.clone(),
            tokens,
            presales,
            runner,
            verifier,
            factory_registry,
            snapshots,
            rpc_manager
        )
    );

    // Background presale refresh
    let refresher = PresaleRefresher::new(contract_service.clone(), config.presale_refresh_interval);
    tokio::spawn(refresher.start());

    let app_state = AppState::new(auth_service, deployment_service, contract_service, metadata_service);
    let app = api::router(app_state);

    // Start server
    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = tokio::net::TcpListener
        ::bind(&addr).await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
