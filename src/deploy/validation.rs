use chrono::{ DateTime, Utc };
use ethers::types::U256;
use ethers::utils::parse_units;
use serde::{ Deserialize, Serialize };
use serde_json::json;

use crate::crypto::signature::normalize_address;
use crate::enums::{ ContractType, Network };
use crate::error::{ AppError, Result };

use super::string_or_number;

const MAX_NAME_LEN: usize = 64;
const MAX_SYMBOL_LEN: usize = 11;
const MAX_DECIMALS: i64 = 18;
/// Upper bound on transfer taxes (fee + redistribution), in percent.
const MAX_TOTAL_TAX_PERCENT: f64 = 25.0;
/// Base asset of every presale is the network's native coin.
const BASE_ASSET_DECIMALS: u32 = 18;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDeployRequest {
    pub network: String,
    pub contract_type: String,
    pub name: String,
    pub symbol: String,
    pub decimals: i64,
    #[serde(deserialize_with = "string_or_number")]
    pub total_supply: String,
    #[serde(default)]
    pub fee_percent: Option<f64>,
    #[serde(default)]
    pub fee_recipient: Option<String>,
    #[serde(default)]
    pub redistribution_percent: Option<f64>,
    #[serde(default)]
    pub metadata_uri: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VestingRequest {
    pub initial_percent: i64,
    #[serde(default)]
    pub cliff_days: i64,
    pub period_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresaleDeployRequest {
    pub network: String,
    #[serde(default = "default_presale_type")]
    pub contract_type: String,
    pub token_address: String,
    #[serde(default)]
    pub fund_recipient: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub soft_cap: String,
    #[serde(deserialize_with = "string_or_number")]
    pub hard_cap: String,
    #[serde(deserialize_with = "string_or_number")]
    pub token_price: String,
    #[serde(deserialize_with = "string_or_number")]
    pub min_purchase: String,
    #[serde(deserialize_with = "string_or_number")]
    pub max_purchase: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub vesting: Option<VestingRequest>,
}

fn default_presale_type() -> String {
    ContractType::Presale.as_str().to_string()
}

/// A token configuration that passed every shape and range check.
#[derive(Debug, Clone)]
pub struct ValidatedToken {
    pub network: Network,
    pub contract_type: ContractType,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    /// Whole tokens, as requested.
    pub total_supply: String,
    /// Smallest units (`total_supply * 10^decimals`).
    pub total_supply_raw: U256,
    pub fee_percent: Option<f64>,
    pub fee_recipient: Option<String>,
    pub redistribution_percent: Option<f64>,
    pub metadata_uri: Option<String>,
}

impl ValidatedToken {
    /// Parameters handed to the toolchain; percentages go out in basis points.
    pub fn deploy_params(&self, owner: &str) -> serde_json::Value {
        json!({
            "contract": self.contract_type.artifact_name(),
            "name": self.name,
            "symbol": self.symbol,
            "decimals": self.decimals,
            "totalSupply": self.total_supply_raw.to_string(),
            "owner": owner,
            "feeBps": self.fee_percent.map(percent_to_bps),
            "feeRecipient": self.fee_recipient,
            "redistributionBps": self.redistribution_percent.map(percent_to_bps),
        })
    }

    /// Constructor arguments in declaration order, for explorer verification.
    pub fn constructor_args(&self, owner: &str) -> Vec<String> {
        let mut args = vec![
            self.name.clone(),
            self.symbol.clone(),
            self.decimals.to_string(),
            self.total_supply_raw.to_string(),
            owner.to_string()
        ];
        if self.contract_type.has_fee() {
            args.push(self.fee_percent.map(percent_to_bps).unwrap_or_default().to_string());
            args.push(self.fee_recipient.clone().unwrap_or_default());
        }
        if self.contract_type.has_redistribution() {
            args.push(self.redistribution_percent.map(percent_to_bps).unwrap_or_default().to_string());
        }
        args
    }
}

#[derive(Debug, Clone)]
pub struct ValidatedVesting {
    pub initial_percent: u8,
    pub cliff_days: u32,
    pub period_days: u32,
}

#[derive(Debug, Clone)]
pub struct ValidatedPresale {
    pub network: Network,
    pub token_address: String,
    pub fund_recipient: Option<String>,
    pub soft_cap: String,
    pub hard_cap: String,
    pub token_price: String,
    pub min_purchase: String,
    pub max_purchase: String,
    pub soft_cap_wei: U256,
    pub hard_cap_wei: U256,
    pub token_price_wei: U256,
    pub min_purchase_wei: U256,
    pub max_purchase_wei: U256,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub vesting: Option<ValidatedVesting>,
}

impl ValidatedPresale {
    pub fn deploy_params(&self, owner: &str, fund_recipient: &str, factory: &str) -> serde_json::Value {
        json!({
            "contract": ContractType::Presale.artifact_name(),
            "factory": factory,
            "token": self.token_address,
            "owner": owner,
            "fundRecipient": fund_recipient,
            "softCap": self.soft_cap_wei.to_string(),
            "hardCap": self.hard_cap_wei.to_string(),
            "rate": self.token_price_wei.to_string(),
            "minPurchase": self.min_purchase_wei.to_string(),
            "maxPurchase": self.max_purchase_wei.to_string(),
            "startTime": self.start_time.timestamp(),
            "endTime": self.end_time.timestamp(),
            "vestingEnabled": self.vesting.is_some(),
            "vestingInitialPercent": self.vesting.as_ref().map(|v| v.initial_percent),
            "vestingCliffDays": self.vesting.as_ref().map(|v| v.cliff_days),
            "vestingPeriodDays": self.vesting.as_ref().map(|v| v.period_days),
        })
    }

    pub fn constructor_args(&self, owner: &str, fund_recipient: &str) -> Vec<String> {
        let vesting = self.vesting.as_ref();
        vec![
            self.token_address.clone(),
            owner.to_string(),
            fund_recipient.to_string(),
            self.soft_cap_wei.to_string(),
            self.hard_cap_wei.to_string(),
            self.token_price_wei.to_string(),
            self.min_purchase_wei.to_string(),
            self.max_purchase_wei.to_string(),
            self.start_time.timestamp().to_string(),
            self.end_time.timestamp().to_string(),
            vesting.map(|v| v.initial_percent).unwrap_or(100).to_string(),
            vesting.map(|v| v.cliff_days).unwrap_or(0).to_string(),
            vesting.map(|v| v.period_days).unwrap_or(0).to_string()
        ]
    }
}

fn percent_to_bps(percent: f64) -> u32 {
    (percent * 100.0).round() as u32
}

pub fn validate_token(request: &TokenDeployRequest) -> Result<ValidatedToken> {
    let contract_type: ContractType = request.contract_type.parse()?;
    if !contract_type.is_token() {
        return Err(AppError::InvalidContractType(request.contract_type.clone()));
    }

    let network: Network = request.network.parse()?;

    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput("name must not be empty".to_string()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(
            AppError::InvalidInput(format!("name must be at most {} characters", MAX_NAME_LEN))
        );
    }

    let symbol = request.symbol.trim();
    if symbol.is_empty() {
        return Err(AppError::InvalidInput("symbol must not be empty".to_string()));
    }
    if symbol.len() > MAX_SYMBOL_LEN || !symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(
            AppError::InvalidInput(
                format!("symbol must be 1-{} alphanumeric characters", MAX_SYMBOL_LEN)
            )
        );
    }

    if !(0..=MAX_DECIMALS).contains(&request.decimals) {
        return Err(AppError::InvalidInput(format!("decimals must be between 0 and {}", MAX_DECIMALS)));
    }
    let decimals = request.decimals as u8;

    let total_supply = request.total_supply.trim();
    if total_supply.is_empty() || !total_supply.chars().all(|c| c.is_ascii_digit()) {
        return Err(
            AppError::InvalidInput("totalSupply must be a positive whole number".to_string())
        );
    }
    let supply = U256::from_dec_str(total_supply).map_err(|_|
        AppError::InvalidInput("totalSupply is too large".to_string())
    )?;
    if supply.is_zero() {
        return Err(AppError::InvalidInput("totalSupply must be greater than zero".to_string()));
    }
    let total_supply_raw = supply
        .checked_mul(U256::exp10(decimals as usize))
        .ok_or_else(|| AppError::InvalidInput("totalSupply is too large".to_string()))?;

    let (fee_percent, fee_recipient) = if contract_type.has_fee() {
        let percent = request.fee_percent.ok_or_else(||
            AppError::InvalidInput("feePercent is required for fee tokens".to_string())
        )?;
        check_tax_percent("feePercent", percent)?;
        let recipient = request.fee_recipient
            .as_deref()
            .ok_or_else(|| AppError::InvalidInput("feeRecipient is required for fee tokens".to_string()))?;
        (Some(percent), Some(normalize_address(recipient)?))
    } else if request.fee_percent.is_some() || request.fee_recipient.is_some() {
        return Err(
            AppError::InvalidInput(
                format!("{} tokens do not support transfer fees", contract_type)
            )
        );
    } else {
        (None, None)
    };

    let redistribution_percent = if contract_type.has_redistribution() {
        let percent = request.redistribution_percent.ok_or_else(||
            AppError::InvalidInput(
                "redistributionPercent is required for redistribution tokens".to_string()
            )
        )?;
        check_tax_percent("redistributionPercent", percent)?;
        Some(percent)
    } else if request.redistribution_percent.is_some() {
        return Err(
            AppError::InvalidInput(format!("{} tokens do not support redistribution", contract_type))
        );
    } else {
        None
    };

    let total_tax = fee_percent.unwrap_or(0.0) + redistribution_percent.unwrap_or(0.0);
    if total_tax > MAX_TOTAL_TAX_PERCENT {
        return Err(
            AppError::InvalidInput(
                format!("combined fees must not exceed {}%", MAX_TOTAL_TAX_PERCENT)
            )
        );
    }

    Ok(ValidatedToken {
        network,
        contract_type,
        name: name.to_string(),
        symbol: symbol.to_string(),
        decimals,
        total_supply: total_supply.to_string(),
        total_supply_raw,
        fee_percent,
        fee_recipient,
        redistribution_percent,
        metadata_uri: request.metadata_uri.clone().filter(|uri| !uri.trim().is_empty()),
    })
}

fn check_tax_percent(field: &str, percent: f64) -> Result<()> {
    if !percent.is_finite() || percent <= 0.0 || percent > MAX_TOTAL_TAX_PERCENT {
        return Err(
            AppError::InvalidInput(
                format!("{} must be greater than 0 and at most {}", field, MAX_TOTAL_TAX_PERCENT)
            )
        );
    }
    Ok(())
}

/// Parse a positive base-asset amount into wei.
fn parse_amount(field: &str, amount: &str) -> Result<U256> {
    let amount = amount.trim();
    if amount.is_empty() || amount.starts_with('-') {
        return Err(AppError::InvalidInput(format!("{} must be a positive amount", field)));
    }

    let wei: U256 = parse_units(amount, BASE_ASSET_DECIMALS)
        .map_err(|_| AppError::InvalidInput(format!("{} is not a valid amount", field)))?
        .into();

    if wei.is_zero() {
        return Err(AppError::InvalidInput(format!("{} must be greater than zero", field)));
    }
    Ok(wei)
}

pub fn validate_presale(request: &PresaleDeployRequest, now: DateTime<Utc>) -> Result<ValidatedPresale> {
    let contract_type: ContractType = request.contract_type.parse()?;
    if contract_type != ContractType::Presale {
        return Err(AppError::InvalidContractType(request.contract_type.clone()));
    }

    let network: Network = request.network.parse()?;
    let token_address = normalize_address(&request.token_address)?;
    let fund_recipient = request.fund_recipient.as_deref().map(normalize_address).transpose()?;

    let soft_cap_wei = parse_amount("softCap", &request.soft_cap)?;
    let hard_cap_wei = parse_amount("hardCap", &request.hard_cap)?;
    let token_price_wei = parse_amount("tokenPrice", &request.token_price)?;
    let min_purchase_wei = parse_amount("minPurchase", &request.min_purchase)?;
    let max_purchase_wei = parse_amount("maxPurchase", &request.max_purchase)?;

    if hard_cap_wei <= soft_cap_wei {
        return Err(AppError::InvalidInput("hardCap must be greater than softCap".to_string()));
    }
    if max_purchase_wei <= min_purchase_wei {
        return Err(
            AppError::InvalidInput("maxPurchase must be greater than minPurchase".to_string())
        );
    }
    if max_purchase_wei > hard_cap_wei {
        return Err(AppError::InvalidInput("maxPurchase must not exceed hardCap".to_string()));
    }

    if request.end_time <= request.start_time {
        return Err(AppError::InvalidInput("endTime must be after startTime".to_string()));
    }
    if request.end_time <= now {
        return Err(AppError::InvalidInput("endTime must be in the future".to_string()));
    }

    let vesting = match &request.vesting {
        Some(v) => {
            if !(0..=100).contains(&v.initial_percent) {
                return Err(
                    AppError::InvalidInput("vesting.initialPercent must be between 0 and 100".to_string())
                );
            }
            if v.cliff_days < 0 || v.cliff_days > u32::MAX as i64 {
                return Err(AppError::InvalidInput("vesting.cliffDays must not be negative".to_string()));
            }
            if v.period_days < 1 || v.period_days > u32::MAX as i64 {
                return Err(AppError::InvalidInput("vesting.periodDays must be at least 1".to_string()));
            }
            Some(ValidatedVesting {
                initial_percent: v.initial_percent as u8,
                cliff_days: v.cliff_days as u32,
                period_days: v.period_days as u32,
            })
        }
        None => None,
    };

    Ok(ValidatedPresale {
        network,
        token_address,
        fund_recipient,
        soft_cap: request.soft_cap.trim().to_string(),
        hard_cap: request.hard_cap.trim().to_string(),
        token_price: request.token_price.trim().to_string(),
        min_purchase: request.min_purchase.trim().to_string(),
        max_purchase: request.max_purchase.trim().to_string(),
        soft_cap_wei,
        hard_cap_wei,
        token_price_wei,
        min_purchase_wei,
        max_purchase_wei,
        start_time: request.start_time,
        end_time: request.end_time,
        vesting,
    })
}
