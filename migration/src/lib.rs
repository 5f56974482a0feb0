pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_users_table;
mod m20240102_000001_create_token_deployments_table;
mod m20240103_000001_create_presale_deployments_table;
mod m20240104_000001_create_factories_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_users_table::Migration),
            Box::new(m20240102_000001_create_token_deployments_table::Migration),
            Box::new(m20240103_000001_create_presale_deployments_table::Migration),
            Box::new(m20240104_000001_create_factories_table::Migration)
        ]
    }
}
