use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(
            Table::create()
                .table(PresaleDeployments::Table)
                .if_not_exists()
                .col(ColumnDef::new(PresaleDeployments::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(PresaleDeployments::Network).string().not_null())
                .col(ColumnDef::new(PresaleDeployments::ContractAddress).string().not_null())
                .col(ColumnDef::new(PresaleDeployments::TokenAddress).string().not_null())
                .col(ColumnDef::new(PresaleDeployments::OwnerAddress).string().not_null())
                .col(ColumnDef::new(PresaleDeployments::FundRecipient).string().not_null())
                .col(ColumnDef::new(PresaleDeployments::SoftCap).string().not_null())
                .col(ColumnDef::new(PresaleDeployments::HardCap).string().not_null())
                .col(ColumnDef::new(PresaleDeployments::TokenPrice).string().not_null())
                .col(ColumnDef::new(PresaleDeployments::MinPurchase).string().not_null())
                .col(ColumnDef::new(PresaleDeployments::MaxPurchase).string().not_null())
                .col(
                    ColumnDef::new(PresaleDeployments::StartTime)
                        .timestamp_with_time_zone()
                        .not_null()
                )
                .col(ColumnDef::new(PresaleDeployments::EndTime).timestamp_with_time_zone().not_null())
                .col(
                    ColumnDef::new(PresaleDeployments::VestingEnabled)
                        .boolean()
                        .not_null()
                        .default(false)
                )
                .col(ColumnDef::new(PresaleDeployments::VestingInitialPercent).small_integer().null())
                .col(ColumnDef::new(PresaleDeployments::VestingCliffDays).integer().null())
                .col(ColumnDef::new(PresaleDeployments::VestingPeriodDays).integer().null())
                .col(ColumnDef::new(PresaleDeployments::FactoryAddress).string().null())
                .col(ColumnDef::new(PresaleDeployments::ConstructorArgs).json().not_null())
                .col(ColumnDef::new(PresaleDeployments::TxHash).string().not_null())
                .col(ColumnDef::new(PresaleDeployments::GasUsed).string().null())
                .col(ColumnDef::new(PresaleDeployments::Status).string().not_null())
                .col(
                    ColumnDef::new(PresaleDeployments::Finalized)
                        .boolean()
                        .not_null()
                        .default(false)
                )
                .col(ColumnDef::new(PresaleDeployments::TotalRaised).string().null())
                .col(ColumnDef::new(PresaleDeployments::Contributors).big_integer().null())
                .col(
                    ColumnDef::new(PresaleDeployments::StatsUpdatedAt)
                        .timestamp_with_time_zone()
                        .null()
                )
                .col(ColumnDef::new(PresaleDeployments::VerificationStatus).string().not_null())
                .col(ColumnDef::new(PresaleDeployments::VerificationError).text().null())
                .col(
                    ColumnDef::new(PresaleDeployments::CreatedAt)
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
                .name("idx_presale_deployments_network_address")
                .table(PresaleDeployments::Table)
                .col(PresaleDeployments::Network)
                .col(PresaleDeployments::ContractAddress)
                .unique()
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .if_not_exists()
                .name("idx_presale_deployments_owner")
                .table(PresaleDeployments::Table)
                .col(PresaleDeployments::OwnerAddress)
                .to_owned()
        ).await?;

        // Refresher scans non-finalized presales
        manager.create_index(
            Index::create()
                .if_not_exists()
                .name("idx_presale_deployments_finalized")
                .table(PresaleDeployments::Table)
                .col(PresaleDeployments::Finalized)
                .to_owned()
        ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(PresaleDeployments::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum PresaleDeployments {
    Table,
    Id,
    Network,
    ContractAddress,
    TokenAddress,
    OwnerAddress,
    FundRecipient,
    SoftCap,
    HardCap,
    TokenPrice,
    MinPurchase,
    MaxPurchase,
    StartTime,
    EndTime,
    VestingEnabled,
    VestingInitialPercent,
    VestingCliffDays,
    VestingPeriodDays,
    FactoryAddress,
    ConstructorArgs,
    TxHash,
    GasUsed,
    Status,
    Finalized,
    TotalRaised,
    Contributors,
    StatsUpdatedAt,
    VerificationStatus,
    VerificationError,
    CreatedAt,
}
