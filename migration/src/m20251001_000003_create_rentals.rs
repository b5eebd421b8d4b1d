use sea_orm_migration::prelude::*;

use crate::m20251001_000001_create_users_and_wallets::Users;
use crate::m20251001_000002_create_stations::{PowerBanks, RentalPackages, Stations};

#[derive(DeriveIden)]
enum Rentals {
    Table,
    Id,
    RentalCode,
    UserId,
    StationId,
    ReturnStationId,
    SlotId,
    PowerBankId,
    PackageId,
    Status,
    AmountPaid,
    RatePerMinute,
    StartedAt,
    DueAt,
    EndedAt,
    OverdueMinutes,
    LateFee,
    LateFeePaid,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Rentals::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Rentals::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Rentals::RentalCode)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Rentals::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Rentals::StationId).big_integer().not_null())
                    .col(ColumnDef::new(Rentals::ReturnStationId).big_integer().null())
                    .col(ColumnDef::new(Rentals::SlotId).big_integer().not_null())
                    .col(ColumnDef::new(Rentals::PowerBankId).big_integer().not_null())
                    .col(ColumnDef::new(Rentals::PackageId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Rentals::Status)
                            .string_len(16)
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(ColumnDef::new(Rentals::AmountPaid).decimal_len(10, 2).not_null())
                    .col(ColumnDef::new(Rentals::RatePerMinute).decimal_len(12, 4).not_null())
                    .col(ColumnDef::new(Rentals::StartedAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Rentals::DueAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Rentals::EndedAt).timestamp_with_time_zone().null())
                    .col(
                        ColumnDef::new(Rentals::OverdueMinutes)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Rentals::LateFee)
                            .decimal_len(10, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Rentals::LateFeePaid)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Rentals::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(Rentals::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rentals_user")
                            .from(Rentals::Table, Rentals::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rentals_station")
                            .from(Rentals::Table, Rentals::StationId)
                            .to(Stations::Table, Stations::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rentals_power_bank")
                            .from(Rentals::Table, Rentals::PowerBankId)
                            .to(PowerBanks::Table, PowerBanks::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rentals_package")
                            .from(Rentals::Table, Rentals::PackageId)
                            .to(RentalPackages::Table, RentalPackages::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_rentals_user_status")
                    .table(Rentals::Table)
                    .col(Rentals::UserId)
                    .col(Rentals::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_rentals_status_due")
                    .table(Rentals::Table)
                    .col(Rentals::Status)
                    .col(Rentals::DueAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Rentals::Table).to_owned())
            .await?;
        Ok(())
    }
}
