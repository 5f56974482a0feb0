use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::enums::Network;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

/// Per-network configuration resolved from environment variables.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub network: Network,
    pub rpc_urls: Vec<String>,
    pub explorer_api_key: Option<String>,
}

/// How the external deployment toolchain is invoked.
#[derive(Debug, Clone)]
pub struct ToolchainConfig {
    /// Program followed by its leading arguments.
    pub deploy_command: Vec<String>,
    pub verify_command: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub deployer_private_key: Option<String>,
    pub verify_retry_delay: Duration,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiry_secs: u64,
    pub nonce_ttl_secs: i64,
}

#[derive(Debug, Clone)]
pub struct IpfsConfig {
    pub pinata_jwt: Option<String>,
    pub pinata_api_url: String,
    pub gateway_url: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub networks: HashMap<Network, NetworkConfig>,
    pub toolchain: ToolchainConfig,
    pub auth: AuthConfig,
    pub ipfs: IpfsConfig,
    pub deployments_dir: PathBuf,
    pub presale_refresh_interval: Duration,
    pub platform_token: Option<(Network, String)>,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenv::dotenv().ok();

        let environment = match
            env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()).to_lowercase().as_str()
        {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        };

        let database_url = env::var("DATABASE_URL")?;

        // Only networks with RPC URLs set are enabled
        let mut networks = HashMap::new();
        for &network in Network::all() {
            let rpc_key = format!("{}_RPC_URLS", network.as_str());
            let api_key_key = format!("{}_EXPLORER_API_KEY", network.as_str());

            if let Ok(rpc_val) = env::var(&rpc_key) {
                let rpc_urls = Self::parse_list(&rpc_val);
                if rpc_urls.is_empty() {
                    return Err(format!("{} cannot be empty", rpc_key).into());
                }

                networks.insert(network, NetworkConfig {
                    network,
                    rpc_urls,
                    explorer_api_key: env::var(&api_key_key).ok(),
                });
            }
        }

        if networks.is_empty() {
            return Err("No network RPC URLs configured. Set at least one *_RPC_URLS env var.".into());
        }

        let jwt_secret = env::var("JWT_SECRET")?;
        if jwt_secret.len() < 32 {
            return Err("JWT_SECRET must be at least 32 characters".into());
        }

        let toolchain = ToolchainConfig {
            deploy_command: Self::parse_command(
                &env::var("DEPLOY_COMMAND").unwrap_or_else(|_| "npx hardhat run scripts/deploy.js".to_string())
            )?,
            verify_command: Self::parse_command(
                &env::var("VERIFY_COMMAND").unwrap_or_else(|_| "npx hardhat verify".to_string())
            )?,
            working_dir: env::var("TOOLCHAIN_DIR").ok().map(PathBuf::from),
            deployer_private_key: env::var("DEPLOYER_PRIVATE_KEY").ok(),
            verify_retry_delay: Duration::from_secs(
                env::var("VERIFY_RETRY_DELAY_SECS").unwrap_or_else(|_| "30".to_string()).parse()?
            ),
        };

        let auth = AuthConfig {
            jwt_secret,
            jwt_expiry_secs: env::var("JWT_EXPIRY_SECS")
                .unwrap_or_else(|_| "86400".to_string())
                .parse()?,
            nonce_ttl_secs: env::var("NONCE_TTL_SECS")
                .unwrap_or_else(|_| "600".to_string())
                .parse()?,
        };

        let ipfs = IpfsConfig {
            pinata_jwt: env::var("PINATA_JWT").ok(),
            pinata_api_url: env::var("PINATA_API_URL").unwrap_or_else(|_|
                "https://api.pinata.cloud".to_string()
            ),
            gateway_url: env::var("IPFS_GATEWAY_URL").unwrap_or_else(|_|
                "https://gateway.pinata.cloud/ipfs".to_string()
            ),
        };

        let platform_token = match
            (env::var("PLATFORM_TOKEN_NETWORK").ok(), env::var("PLATFORM_TOKEN_ADDRESS").ok())
        {
            (Some(network), Some(address)) => Some((network.parse::<Network>()?, address)),
            _ => None,
        };

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()?;

        Ok(Config {
            environment,
            database_url,
            server_host,
            server_port,
            networks,
            toolchain,
            auth,
            ipfs,
            deployments_dir: PathBuf::from(
                env::var("DEPLOYMENTS_DIR").unwrap_or_else(|_| "deployments".to_string())
            ),
            presale_refresh_interval: Duration::from_secs(
                env::var("PRESALE_REFRESH_SECS").unwrap_or_else(|_| "60".to_string()).parse()?
            ),
            platform_token,
        })
    }

    fn parse_list(value: &str) -> Vec<String> {
        value
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    fn parse_command(value: &str) -> Result<Vec<String>, Box<dyn std::error::Error>> {
        let parts: Vec<String> = value.split_whitespace().map(str::to_string).collect();
        if parts.is_empty() {
            return Err("Toolchain command cannot be empty".into());
        }
        Ok(parts)
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Look up a network that is both allow-listed and configured.
    pub fn network(&self, network: Network) -> Option<&NetworkConfig> {
        self.networks.get(&network)
    }

    pub fn configured_networks(&self) -> Vec<Network> {
        self.networks.keys().copied().collect()
    }

    pub fn get_address_explorer_url(&self, network: Network, address: &str) -> String {
        format!("{}/address/{}", network.explorer_url(), address)
    }

    pub fn get_tx_explorer_url(&self, network: Network, tx_hash: &str) -> String {
        format!("{}/tx/{}", network.explorer_url(), tx_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_skips_blanks() {
        let urls = Config::parse_list(" https://a.example , ,https://b.example,");
        assert_eq!(urls, vec!["https://a.example", "https://b.example"]);
    }

    #[test]
    fn test_parse_command() {
        let cmd = Config::parse_command("npx  hardhat run scripts/deploy.js").unwrap();
        assert_eq!(cmd, vec!["npx", "hardhat", "run", "scripts/deploy.js"]);
        assert!(Config::parse_command("   ").is_err());
    }
}
