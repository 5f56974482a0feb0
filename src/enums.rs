use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

// ─── Network ─────────────────────────────────────────────────────────

/// Networks the launchpad is allowed to deploy to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Network {
    Ethereum,
    Sepolia,
    Bsc,
    BscTestnet,
    Polygon,
    Amoy,
    Arbitrum,
    ArbitrumSepolia,
    Base,
    BaseSepolia,
    Localhost,
}

impl Network {
    /// Canonical string stored in the database and used as the env prefix.
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Ethereum => "ETHEREUM",
            Network::Sepolia => "SEPOLIA",
            Network::Bsc => "BSC",
            Network::BscTestnet => "BSC_TESTNET",
            Network::Polygon => "POLYGON",
            Network::Amoy => "AMOY",
            Network::Arbitrum => "ARBITRUM",
            Network::ArbitrumSepolia => "ARBITRUM_SEPOLIA",
            Network::Base => "BASE",
            Network::BaseSepolia => "BASE_SEPOLIA",
            Network::Localhost => "LOCALHOST",
        }
    }

    /// Network name understood by the deployment toolchain (`--network`).
    pub fn toolchain_name(&self) -> &'static str {
        match self {
            Network::Ethereum => "mainnet",
            Network::Sepolia => "sepolia",
            Network::Bsc => "bsc",
            Network::BscTestnet => "bscTestnet",
            Network::Polygon => "polygon",
            Network::Amoy => "amoy",
            Network::Arbitrum => "arbitrum",
            Network::ArbitrumSepolia => "arbitrumSepolia",
            Network::Base => "base",
            Network::BaseSepolia => "baseSepolia",
            Network::Localhost => "localhost",
        }
    }

    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Ethereum => 1,
            Network::Sepolia => 11155111,
            Network::Bsc => 56,
            Network::BscTestnet => 97,
            Network::Polygon => 137,
            Network::Amoy => 80002,
            Network::Arbitrum => 42161,
            Network::ArbitrumSepolia => 421614,
            Network::Base => 8453,
            Network::BaseSepolia => 84532,
            Network::Localhost => 31337,
        }
    }

    /// Test networks are never verified on an explorer.
    pub fn is_testnet(&self) -> bool {
        matches!(
            self,
            Network::Sepolia
                | Network::BscTestnet
                | Network::Amoy
                | Network::ArbitrumSepolia
                | Network::BaseSepolia
                | Network::Localhost
        )
    }

    pub fn native_symbol(&self) -> &'static str {
        match self {
            Network::Bsc | Network::BscTestnet => "BNB",
            Network::Polygon | Network::Amoy => "POL",
            _ => "ETH",
        }
    }

    /// Default block explorer URL.
    pub fn explorer_url(&self) -> &'static str {
        match self {
            Network::Ethereum => "https://etherscan.io",
            Network::Sepolia => "https://sepolia.etherscan.io",
            Network::Bsc => "https://bscscan.com",
            Network::BscTestnet => "https://testnet.bscscan.com",
            Network::Polygon => "https://polygonscan.com",
            Network::Amoy => "https://amoy.polygonscan.com",
            Network::Arbitrum => "https://arbiscan.io",
            Network::ArbitrumSepolia => "https://sepolia.arbiscan.io",
            Network::Base => "https://basescan.org",
            Network::BaseSepolia => "https://sepolia.basescan.org",
            Network::Localhost => "http://localhost",
        }
    }

    pub fn all() -> &'static [Network] {
        &[
            Network::Ethereum,
            Network::Sepolia,
            Network::Bsc,
            Network::BscTestnet,
            Network::Polygon,
            Network::Amoy,
            Network::Arbitrum,
            Network::ArbitrumSepolia,
            Network::Base,
            Network::BaseSepolia,
            Network::Localhost,
        ]
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace('-', "_");
        match normalized.as_str() {
            "ETHEREUM" | "ETH" | "MAINNET" => Ok(Network::Ethereum),
            "SEPOLIA" => Ok(Network::Sepolia),
            "BSC" | "BNB" => Ok(Network::Bsc),
            "BSC_TESTNET" | "BSCTESTNET" => Ok(Network::BscTestnet),
            "POLYGON" | "MATIC" => Ok(Network::Polygon),
            "AMOY" => Ok(Network::Amoy),
            "ARBITRUM" | "ARB" => Ok(Network::Arbitrum),
            "ARBITRUM_SEPOLIA" | "ARBITRUMSEPOLIA" => Ok(Network::ArbitrumSepolia),
            "BASE" => Ok(Network::Base),
            "BASE_SEPOLIA" | "BASESEPOLIA" => Ok(Network::BaseSepolia),
            "LOCALHOST" | "HARDHAT" => Ok(Network::Localhost),
            _ => Err(AppError::UnsupportedNetwork(s.to_string())),
        }
    }
}

// ─── ContractType ────────────────────────────────────────────────────

/// Contract templates the toolchain knows how to deploy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractType {
    #[serde(rename = "standard")]
    StandardToken,
    #[serde(rename = "burnable")]
    BurnableToken,
    #[serde(rename = "mintable")]
    MintableToken,
    #[serde(rename = "fee")]
    FeeToken,
    #[serde(rename = "redistribution")]
    RedistributionToken,
    #[serde(rename = "advanced")]
    AdvancedToken,
    #[serde(rename = "presale")]
    Presale,
    #[serde(rename = "presale_factory")]
    PresaleFactory,
}

impl ContractType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractType::StandardToken => "standard",
            ContractType::BurnableToken => "burnable",
            ContractType::MintableToken => "mintable",
            ContractType::FeeToken => "fee",
            ContractType::RedistributionToken => "redistribution",
            ContractType::AdvancedToken => "advanced",
            ContractType::Presale => "presale",
            ContractType::PresaleFactory => "presale_factory",
        }
    }

    /// Contract name the toolchain compiles and deploys.
    pub fn artifact_name(&self) -> &'static str {
        match self {
            ContractType::StandardToken => "StandardToken",
            ContractType::BurnableToken => "BurnableToken",
            ContractType::MintableToken => "MintableToken",
            ContractType::FeeToken => "FeeToken",
            ContractType::RedistributionToken => "RedistributionToken",
            ContractType::AdvancedToken => "AdvancedToken",
            ContractType::Presale => "Presale",
            ContractType::PresaleFactory => "PresaleFactory",
        }
    }

    pub fn is_token(&self) -> bool {
        !matches!(self, ContractType::Presale | ContractType::PresaleFactory)
    }

    pub fn is_burnable(&self) -> bool {
        matches!(self, ContractType::BurnableToken | ContractType::AdvancedToken)
    }

    pub fn is_mintable(&self) -> bool {
        matches!(self, ContractType::MintableToken | ContractType::AdvancedToken)
    }

    pub fn has_fee(&self) -> bool {
        matches!(self, ContractType::FeeToken | ContractType::AdvancedToken)
    }

    pub fn has_redistribution(&self) -> bool {
        matches!(self, ContractType::RedistributionToken | ContractType::AdvancedToken)
    }

    /// Gas limit used for cost estimates, measured on the toolchain's templates.
    pub fn estimated_gas(&self) -> u64 {
        match self {
            ContractType::StandardToken => 1_200_000,
            ContractType::BurnableToken => 1_350_000,
            ContractType::MintableToken => 1_450_000,
            ContractType::FeeToken => 2_100_000,
            ContractType::RedistributionToken => 2_600_000,
            ContractType::AdvancedToken => 3_400_000,
            ContractType::Presale => 3_000_000,
            ContractType::PresaleFactory => 4_500_000,
        }
    }
}

impl fmt::Display for ContractType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContractType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standard" | "standard_token" | "standardtoken" => Ok(ContractType::StandardToken),
            "burnable" | "burnable_token" | "burnabletoken" => Ok(ContractType::BurnableToken),
            "mintable" | "mintable_token" | "mintabletoken" => Ok(ContractType::MintableToken),
            "fee" | "fee_token" | "feetoken" => Ok(ContractType::FeeToken),
            "redistribution" | "redistribution_token" | "redistributiontoken" => {
                Ok(ContractType::RedistributionToken)
            }
            "advanced" | "advanced_token" | "advancedtoken" => Ok(ContractType::AdvancedToken),
            "presale" => Ok(ContractType::Presale),
            "presale_factory" | "presalefactory" => Ok(ContractType::PresaleFactory),
            _ => Err(AppError::InvalidContractType(s.to_string())),
        }
    }
}

// ─── VerificationStatus ─────────────────────────────────────────────

/// Explorer verification state of a deployed contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Pending,
    Verified,
    Failed,
    Skipped,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Verified => "verified",
            VerificationStatus::Failed => "failed",
            VerificationStatus::Skipped => "skipped",
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── PresaleStatus ──────────────────────────────────────────────────

/// Lifecycle of a presale as seen by buyers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresaleStatus {
    Upcoming,
    Live,
    Ended,
}

impl PresaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PresaleStatus::Upcoming => "upcoming",
            PresaleStatus::Live => "live",
            PresaleStatus::Ended => "ended",
        }
    }

    /// Clock-derived status; an on-chain finalization always wins.
    pub fn derive(
        now: DateTime<Utc>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        finalized: bool
    ) -> Self {
        if finalized || now >= end {
            PresaleStatus::Ended
        } else if now < start {
            PresaleStatus::Upcoming
        } else {
            PresaleStatus::Live
        }
    }
}

impl fmt::Display for PresaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PresaleStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "upcoming" => Ok(PresaleStatus::Upcoming),
            "live" => Ok(PresaleStatus::Live),
            "ended" => Ok(PresaleStatus::Ended),
            _ => Err(AppError::InvalidInput(format!(
                "Invalid presale status: {}. Supported: upcoming, live, ended",
                s
            ))),
        }
    }
}

// ─── TxStatus ───────────────────────────────────────────────────────

/// Status of a deployment transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Pending,
    Confirmed,
    Failed,
}

impl TxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxStatus::Pending => "pending",
            TxStatus::Confirmed => "confirmed",
            TxStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
