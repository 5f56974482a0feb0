use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{ info, warn };

use crate::config::Config;
use crate::enums::Network;
use crate::error::{ AppError, Result };

#[derive(Debug, Clone)]
pub struct VerifyRequest {
    pub network: Network,
    pub address: String,
    pub constructor_args: Vec<String>,
}

/// Publishes contract source to a block explorer.
#[async_trait]
pub trait ContractVerifier: Send + Sync {
    async fn verify(&self, request: &VerifyRequest) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct VerificationOutcome {
    pub verified: bool,
    pub errors: Vec<String>,
}

/// Verify once; on failure wait `retry_delay` and try exactly one more time.
pub async fn verify_with_retry(
    verifier: &dyn ContractVerifier,
    request: &VerifyRequest,
    retry_delay: Duration
) -> VerificationOutcome {
    let mut errors = Vec::new();

    for attempt in 1..=2 {
        match verifier.verify(request).await {
            Ok(()) => {
                info!(network = %request.network, address = %request.address, attempt, "Contract verified");
                return VerificationOutcome { verified: true, errors };
            }
            Err(e) => {
                warn!(
                    network = %request.network,
                    address = %request.address,
                    attempt,
                    error = %e,
                    "Explorer verification failed"
                );
                errors.push(e.to_string());
                if attempt == 1 {
                    tokio::time::sleep(retry_delay).await;
                }
            }
        }
    }

    VerificationOutcome { verified: false, errors }
}

/// Runs the toolchain's verify task (`<cmd> --network <n> <address> <args..>`).
pub struct ScriptVerifier {
    command: Vec<String>,
    working_dir: Option<PathBuf>,
    api_keys: HashMap<Network, String>,
}

impl ScriptVerifier {
    pub fn new(
        command: Vec<String>,
        working_dir: Option<PathBuf>,
        api_keys: HashMap<Network, String>
    ) -> Self {
        Self {
            command,
            working_dir,
            api_keys,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let api_keys = config.networks
            .iter()
            .filter_map(|(network, nc)| nc.explorer_api_key.clone().map(|key| (*network, key)))
            .collect();

        Self::new(
            config.toolchain.verify_command.clone(),
            config.toolchain.working_dir.clone(),
            api_keys
        )
    }
}

#[async_trait]
impl ContractVerifier for ScriptVerifier {
    async fn verify(&self, request: &VerifyRequest) -> Result<()> {
        let (program, args) = self.command
            .split_first()
            .ok_or_else(|| AppError::Config("Verify command is empty".to_string()))?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .arg("--network")
            .arg(request.network.toolchain_name())
            .arg(&request.address)
            .args(&request.constructor_args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(key) = self.api_keys.get(&request.network) {
            cmd.env("ETHERSCAN_API_KEY", key);
        }
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        let output = cmd
            .output().await
            .map_err(|e| AppError::External(format!("Failed to run verify command: {}", e)))?;

        if output.status.success() {
            return Ok(());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        // Re-verifying is reported as a failure by most explorers
        if is_already_verified(&stdout) || is_already_verified(&stderr) {
            return Ok(());
        }

        let detail = if stderr.trim().is_empty() { stdout.trim() } else { stderr.trim() };
        Err(AppError::External(format!("Verification exited with {}: {}", output.status, detail)))
    }
}

fn is_already_verified(output: &str) -> bool {
    output.to_lowercase().contains("already verified")
}
