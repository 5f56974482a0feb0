pub mod abi;
pub mod provider;

pub use provider::EvmProvider;
