pub mod auth_service;
pub mod contract_service;
pub mod deployment_service;
pub mod metadata_service;

pub use auth_service::AuthService;
pub use contract_service::ContractService;
pub use deployment_service::DeploymentService;
pub use metadata_service::MetadataService;
