use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(
            Table::create()
                .table(Factories::Table)
                .if_not_exists()
                .col(ColumnDef::new(Factories::Network).string().not_null().primary_key())
                .col(ColumnDef::new(Factories::ContractAddress).string().not_null())
                .col(ColumnDef::new(Factories::TxHash).string().not_null())
                .col(
                    ColumnDef::new(Factories::CreatedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                        .default(Expr::current_timestamp())
                )
                .to_owned()
        ).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Factories::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Factories {
    Table,
    Network,
    ContractAddress,
    TxHash,
    CreatedAt,
}
