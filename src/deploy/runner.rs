use std::path::PathBuf;
use std::process::Stdio;
use std::str::FromStr;

use async_trait::async_trait;
use ethers::types::{ Address, H256 };
use serde::{ Deserialize, Serialize };
use tokio::process::Command;
use tracing::{ debug, info, warn };

use crate::config::ToolchainConfig;
use crate::enums::{ ContractType, Network };
use crate::error::{ AppError, Result };

use super::opt_string_or_number;

/// The final JSON line the deployment script prints on success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentResult {
    pub address: String,
    #[serde(rename = "txHash")]
    pub tx_hash: String,
    #[serde(rename = "gasUsed", default, deserialize_with = "opt_string_or_number")]
    pub gas_used: Option<String>,
}

impl DeploymentResult {
    /// The contract is on chain but the database write after it failed.
    pub fn not_recorded(&self, reason: AppError) -> AppError {
        AppError::DeploymentNotRecorded {
            address: self.address.clone(),
            tx_hash: self.tx_hash.clone(),
            reason: reason.to_string(),
        }
    }
}

/// Everything the toolchain needs for one deployment.
#[derive(Debug, Clone)]
pub struct DeployInvocation {
    pub network: Network,
    pub rpc_url: String,
    pub contract_type: ContractType,
    pub params: serde_json::Value,
}

#[async_trait]
pub trait DeployRunner: Send + Sync {
    async fn deploy(&self, invocation: &DeployInvocation) -> Result<DeploymentResult>;
}

/// Runs the configured deployment command as a child process.
///
/// The child gets `--network <name>` appended to its arguments and receives
/// its parameters through `DEPLOY_PARAMS`. The call blocks until the child
/// exits; there is no timeout.
pub struct ScriptRunner {
    command: Vec<String>,
    working_dir: Option<PathBuf>,
    private_key: Option<String>,
}

impl ScriptRunner {
    pub fn new(command: Vec<String>, working_dir: Option<PathBuf>, private_key: Option<String>) -> Self {
        Self {
            command,
            working_dir,
            private_key,
        }
    }

    pub fn from_config(config: &ToolchainConfig) -> Self {
        Self::new(
            config.deploy_command.clone(),
            config.working_dir.clone(),
            config.deployer_private_key.clone()
        )
    }

    fn build_command(&self, invocation: &DeployInvocation) -> Result<Command> {
        let (program, args) = self.command
            .split_first()
            .ok_or_else(|| AppError::Config("Deployment command is empty".to_string()))?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .arg("--network")
            .arg(invocation.network.toolchain_name())
            .env("DEPLOY_CONTRACT_TYPE", invocation.contract_type.artifact_name())
            .env("DEPLOY_PARAMS", invocation.params.to_string())
            .env("DEPLOY_RPC_URL", &invocation.rpc_url)
            .env("DEPLOY_CHAIN_ID", invocation.network.chain_id().to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(key) = &self.private_key {
            cmd.env("DEPLOYER_PRIVATE_KEY", key);
        }
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        Ok(cmd)
    }
}

#[async_trait]
impl DeployRunner for ScriptRunner {
    async fn deploy(&self, invocation: &DeployInvocation) -> Result<DeploymentResult> {
        let mut cmd = self.build_command(invocation)?;

        info!(
            network = %invocation.network,
            contract = invocation.contract_type.artifact_name(),
            "Starting deployment script"
        );

        let output = cmd.output().await.map_err(|e| AppError::Deployment {
            message: format!("Failed to run deployment script: {}", e),
            stderr: String::new(),
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            warn!(
                network = %invocation.network,
                status = %output.status,
                stderr = %stderr,
                "Deployment script failed"
            );
            return Err(AppError::Deployment {
                message: format!("Deployment script exited with {}", output.status),
                stderr: stderr.into_owned(),
            });
        }

        debug!(stdout = %stdout, "Deployment script output");
        parse_result(&stdout)
    }
}

/// Extract the result from the last non-empty stdout line.
pub fn parse_result(stdout: &str) -> Result<DeploymentResult> {
    let line = stdout
        .lines()
        .map(str::trim)
        .rev()
        .find(|line| !line.is_empty())
        .ok_or_else(|| AppError::ResultParse("deployment script produced no output".to_string()))?;

    let result: DeploymentResult = serde_json
        ::from_str(line)
        .map_err(|e| AppError::ResultParse(format!("{} (line: {})", e, line)))?;

    if Address::from_str(&result.address).is_err() {
        return Err(AppError::ResultParse(format!("invalid contract address: {}", result.address)));
    }
    if H256::from_str(&result.tx_hash).is_err() {
        return Err(AppError::ResultParse(format!("invalid transaction hash: {}", result.tx_hash)));
    }

    Ok(result)
}
