use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(
            Table::create()
                .table(Users::Table)
                .if_not_exists()
                .col(ColumnDef::new(Users::Address).string().not_null().primary_key())
                .col(ColumnDef::new(Users::Nonce).string().not_null())
                .col(ColumnDef::new(Users::NonceIssuedAt).timestamp_with_time_zone().not_null())
                .col(ColumnDef::new(Users::TokenBalance).string().null())
                .col(ColumnDef::new(Users::LastLoginAt).timestamp_with_time_zone().null())
                .col(
                    ColumnDef::new(Users::CreatedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                        .default(Expr::current_timestamp())
                )
                .to_owned()
        ).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Users::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Address,
    Nonce,
    NonceIssuedAt,
    TokenBalance,
    LastLoginAt,
    CreatedAt,
}
