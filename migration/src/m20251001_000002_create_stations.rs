use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Statement;

#[derive(DeriveIden)]
pub(crate) enum Stations {
    Table,
    Id,
    SerialNumber,
    Imei,
    Name,
    Address,
    Latitude,
    Longitude,
    TotalSlots,
    Status,
    IsMaintenance,
    LastHeartbeat,
    HardwareInfo,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum StationSlots {
    Table,
    Id,
    StationId,
    SlotNumber,
    Status,
    BatteryLevel,
    PowerBankId,
    LastUpdated,
}

#[derive(DeriveIden)]
pub(crate) enum PowerBanks {
    Table,
    Id,
    SerialNumber,
    Model,
    CapacityMah,
    Status,
    BatteryLevel,
    CurrentStationId,
    CurrentSlotId,
    LastUpdated,
    CreatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum RentalPackages {
    Table,
    Id,
    Name,
    DurationMinutes,
    Price,
    IsActive,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Stations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Stations::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Stations::SerialNumber)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Stations::Imei).string_len(32).not_null())
                    .col(ColumnDef::new(Stations::Name).string_len(120).not_null())
                    .col(ColumnDef::new(Stations::Address).string().not_null().default(""))
                    .col(ColumnDef::new(Stations::Latitude).decimal_len(10, 6).null())
                    .col(ColumnDef::new(Stations::Longitude).decimal_len(10, 6).null())
                    .col(
                        ColumnDef::new(Stations::TotalSlots)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Stations::Status)
                            .string_len(16)
                            .not_null()
                            .default("OFFLINE"),
                    )
                    .col(
                        ColumnDef::new(Stations::IsMaintenance)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Stations::LastHeartbeat).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Stations::HardwareInfo).json_binary().null())
                    .col(
                        ColumnDef::new(Stations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(Stations::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PowerBanks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PowerBanks::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PowerBanks::SerialNumber)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(PowerBanks::Model)
                            .string_len(64)
                            .not_null()
                            .default("standard"),
                    )
                    .col(
                        ColumnDef::new(PowerBanks::CapacityMah)
                            .integer()
                            .not_null()
                            .default(5000),
                    )
                    .col(
                        ColumnDef::new(PowerBanks::Status)
                            .string_len(16)
                            .not_null()
                            .default("AVAILABLE"),
                    )
                    .col(
                        ColumnDef::new(PowerBanks::BatteryLevel)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(PowerBanks::CurrentStationId).big_integer().null())
                    .col(ColumnDef::new(PowerBanks::CurrentSlotId).big_integer().null())
                    .col(
                        ColumnDef::new(PowerBanks::LastUpdated)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(PowerBanks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_power_banks_station")
                            .from(PowerBanks::Table, PowerBanks::CurrentStationId)
                            .to(Stations::Table, Stations::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(StationSlots::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StationSlots::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(StationSlots::StationId).big_integer().not_null())
                    .col(ColumnDef::new(StationSlots::SlotNumber).integer().not_null())
                    .col(
                        ColumnDef::new(StationSlots::Status)
                            .string_len(16)
                            .not_null()
                            .default("AVAILABLE"),
                    )
                    .col(
                        ColumnDef::new(StationSlots::BatteryLevel)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(StationSlots::PowerBankId).big_integer().null())
                    .col(
                        ColumnDef::new(StationSlots::LastUpdated)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_station_slots_station")
                            .from(StationSlots::Table, StationSlots::StationId)
                            .to(Stations::Table, Stations::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_station_slots_power_bank")
                            .from(StationSlots::Table, StationSlots::PowerBankId)
                            .to(PowerBanks::Table, PowerBanks::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // one row per physical slot
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_station_slots_station_slot")
                    .table(StationSlots::Table)
                    .col(StationSlots::StationId)
                    .col(StationSlots::SlotNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RentalPackages::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RentalPackages::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RentalPackages::Name)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(RentalPackages::DurationMinutes)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(RentalPackages::Price).decimal_len(10, 2).not_null())
                    .col(
                        ColumnDef::new(RentalPackages::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(RentalPackages::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        let conn = manager.get_connection();
        let insert_sql = r#"
INSERT INTO rental_packages (name, duration_minutes, price, is_active)
VALUES
 ('1 Hour', 60, 50.00, TRUE),
 ('4 Hours', 240, 150.00, TRUE),
 ('1 Day', 1440, 400.00, TRUE)
ON CONFLICT (name) DO NOTHING;
"#;
        conn.execute(Statement::from_string(
            manager.get_database_backend(),
            insert_sql.to_string(),
        ))
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RentalPackages::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(StationSlots::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PowerBanks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Stations::Table).to_owned())
            .await?;
        Ok(())
    }
}
