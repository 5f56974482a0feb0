pub mod chain_provider;

pub use chain_provider::{ ChainProvider, DeploymentCost, PresaleOnChainState, TxReceiptInfo };

#[cfg(test)]
pub(crate) mod fake;
