use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Statement;

#[derive(DeriveIden)]
enum LateFeeConfigurations {
    Table,
    Id,
    Name,
    FeeType,
    Multiplier,
    FlatRatePerHour,
    GracePeriodMinutes,
    MaxDailyRate,
    IsActive,
    ApplicablePackageTypes,
    Metadata,
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
                    .table(LateFeeConfigurations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LateFeeConfigurations::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LateFeeConfigurations::Name)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LateFeeConfigurations::FeeType)
                            .string_len(16)
                            .not_null()
                            .default("MULTIPLIER"),
                    )
                    .col(
                        ColumnDef::new(LateFeeConfigurations::Multiplier)
                            .decimal_len(5, 2)
                            .not_null()
                            .default(2.0),
                    )
                    .col(
                        ColumnDef::new(LateFeeConfigurations::FlatRatePerHour)
                            .decimal_len(10, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(LateFeeConfigurations::GracePeriodMinutes)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(LateFeeConfigurations::MaxDailyRate)
                            .decimal_len(10, 2)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(LateFeeConfigurations::IsActive)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(LateFeeConfigurations::ApplicablePackageTypes)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(
                        ColumnDef::new(LateFeeConfigurations::Metadata)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'{}'::jsonb")),
                    )
                    .col(
                        ColumnDef::new(LateFeeConfigurations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(LateFeeConfigurations::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        // At most one active configuration. The activation path deactivates the
        // others first; this index rejects anything that slips past it.
        let conn = manager.get_connection();
        conn.execute(Statement::from_string(
            manager.get_database_backend(),
            "CREATE UNIQUE INDEX IF NOT EXISTS uq_late_fee_configurations_single_active \
             ON late_fee_configurations (is_active) WHERE is_active"
                .to_string(),
        ))
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LateFeeConfigurations::Table).to_owned())
            .await?;
        Ok(())
    }
}
