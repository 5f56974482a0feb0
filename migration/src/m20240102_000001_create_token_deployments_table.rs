use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(
            Table::create()
                .table(TokenDeployments::Table)
                .if_not_exists()
                .col(ColumnDef::new(TokenDeployments::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(TokenDeployments::Network).string().not_null())
                .col(ColumnDef::new(TokenDeployments::ContractAddress).string().not_null())
                .col(ColumnDef::new(TokenDeployments::ContractType).string().not_null())
                .col(ColumnDef::new(TokenDeployments::Name).string().not_null())
                .col(ColumnDef::new(TokenDeployments::Symbol).string().not_null())
                .col(ColumnDef::new(TokenDeployments::Decimals).small_integer().not_null())
                .col(ColumnDef::new(TokenDeployments::TotalSupply).string().not_null())
                .col(ColumnDef::new(TokenDeployments::OwnerAddress).string().not_null())
                .col(ColumnDef::new(TokenDeployments::ConstructorArgs).json().not_null())
                .col(ColumnDef::new(TokenDeployments::TxHash).string().not_null())
                .col(ColumnDef::new(TokenDeployments::GasUsed).string().null())
                .col(
                    ColumnDef::new(TokenDeployments::IsBurnable)
                        .boolean()
                        .not_null()
                        .default(false)
                )
                .col(
                    ColumnDef::new(TokenDeployments::IsMintable)
                        .boolean()
                        .not_null()
                        .default(false)
                )
                .col(ColumnDef::new(TokenDeployments::HasFee).boolean().not_null().default(false))
                .col(
                    ColumnDef::new(TokenDeployments::HasRedistribution)
                        .boolean()
                        .not_null()
                        .default(false)
                )
                .col(ColumnDef::new(TokenDeployments::FeePercent).double().null())
                .col(ColumnDef::new(TokenDeployments::RedistributionPercent).double().null())
                .col(ColumnDef::new(TokenDeployments::VerificationStatus).string().not_null())
                .col(ColumnDef::new(TokenDeployments::VerificationError).text().null())
                .col(ColumnDef::new(TokenDeployments::MetadataUri).string().null())
                .col(ColumnDef::new(TokenDeployments::CachedTotalSupply).string().null())
                .col(
                    ColumnDef::new(TokenDeployments::StatsUpdatedAt)
                        .timestamp_with_time_zone()
                        .null()
                )
                .col(
                    ColumnDef::new(TokenDeployments::CreatedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                        .default(Expr::current_timestamp())
                )
                .to_owned()
        ).await?;

        // Unique constraint on (network, contract_address)
        manager.create_index(
            Index::create()
                .if_not_exists()
                .name("idx_token_deployments_network_address")
                .table(TokenDeployments::Table)
                .col(TokenDeployments::Network)
                .col(TokenDeployments::ContractAddress)
                .unique()
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .if_not_exists()
                .name("idx_token_deployments_owner")
                .table(TokenDeployments::Table)
                .col(TokenDeployments::OwnerAddress)
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .if_not_exists()
                .name("idx_token_deployments_tx_hash")
                .table(TokenDeployments::Table)
                .col(TokenDeployments::TxHash)
                .to_owned()
        ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(TokenDeployments::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum TokenDeployments {
    Table,
    Id,
    Network,
    ContractAddress,
    ContractType,
    Name,
    Symbol,
    Decimals,
    TotalSupply,
    OwnerAddress,
    ConstructorArgs,
    TxHash,
    GasUsed,
    IsBurnable,
    IsMintable,
    HasFee,
    HasRedistribution,
    FeePercent,
    RedistributionPercent,
    VerificationStatus,
    VerificationError,
    MetadataUri,
    CachedTotalSupply,
    StatsUpdatedAt,
    CreatedAt,
}
