pub mod config;
pub mod enums;
pub mod error;
pub mod crypto;
pub mod db;
pub mod providers;
pub mod chains;
pub mod rpc;
pub mod deploy;
pub mod services;
pub mod refresher;
pub mod api;

pub use config::Config;
pub use enums::{ ContractType, Network, PresaleStatus, TxStatus, VerificationStatus };
pub use error::{ AppError, Result };
