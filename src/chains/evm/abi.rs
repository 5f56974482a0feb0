use ethers::abi::{ parse_abi, Abi };

use crate::error::{ AppError, Result };

/// Human-readable ABI fragments for the contracts we read from.
const ERC20_ABI: &[&str] = &[
    "function totalSupply() external view returns (uint256)",
    "function balanceOf(address) external view returns (uint256)",
    "function decimals() external view returns (uint8)",
    "function symbol() external view returns (string)",
];

const PRESALE_ABI: &[&str] = &[
    "function finalized() external view returns (bool)",
    "function totalRaised() external view returns (uint256)",
    "function contributorCount() external view returns (uint256)",
];

pub fn erc20() -> Result<Abi> {
    parse_abi(ERC20_ABI).map_err(|e| AppError::Internal(format!("Failed to parse ABI: {}", e)))
}

pub fn presale() -> Result<Abi> {
    parse_abi(PRESALE_ABI).map_err(|e| AppError::Internal(format!("Failed to parse ABI: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abis_parse() {
        let erc20 = erc20().unwrap();
        assert!(erc20.function("totalSupply").is_ok());
        assert!(erc20.function("balanceOf").is_ok());

        let presale = presale().unwrap();
        assert!(presale.function("finalized").is_ok());
        assert!(presale.function("contributorCount").is_ok());
    }
}
