pub mod user;
pub mod token_deployment;
pub mod presale_deployment;
pub mod factory;

pub use user::Entity as User;
pub use token_deployment::Entity as TokenDeployment;
pub use presale_deployment::Entity as PresaleDeployment;
pub use factory::Entity as Factory;
