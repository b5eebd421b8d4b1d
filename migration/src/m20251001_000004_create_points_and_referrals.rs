use sea_orm_migration::prelude::*;

use crate::m20251001_000001_create_users_and_wallets::Users;

#[derive(DeriveIden)]
enum UserPoints {
    Table,
    Id,
    UserId,
    CurrentPoints,
    TotalPoints,
    LastUpdated,
}

/// Every row keeps both balances, not only the delta.
#[derive(DeriveIden)]
enum PointsTransactions {
    Table,
    Id,
    UserId,
    TransactionType,
    Source,
    Points,
    BalanceBefore,
    BalanceAfter,
    Description,
    RelatedRentalId,
    RelatedReferralId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Referrals {
    Table,
    Id,
    InviterId,
    InviteeId,
    ReferralCode,
    Status,
    InviterPointsAwarded,
    InviteePointsAwarded,
    FirstRentalCompleted,
    CompletedAt,
    ExpiresAt,
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
                    .table(UserPoints::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserPoints::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(UserPoints::UserId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(UserPoints::CurrentPoints)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(UserPoints::TotalPoints)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(UserPoints::LastUpdated)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_points_user")
                            .from(UserPoints::Table, UserPoints::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PointsTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PointsTransactions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PointsTransactions::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PointsTransactions::TransactionType)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PointsTransactions::Source)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PointsTransactions::Points)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PointsTransactions::BalanceBefore)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PointsTransactions::BalanceAfter)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PointsTransactions::Description)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(PointsTransactions::RelatedRentalId)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PointsTransactions::RelatedReferralId)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PointsTransactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_points_transactions_user")
                            .from(PointsTransactions::Table, PointsTransactions::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_points_transactions_user_created")
                    .table(PointsTransactions::Table)
                    .col(PointsTransactions::UserId)
                    .col(PointsTransactions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Referrals::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Referrals::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Referrals::InviterId).big_integer().not_null())
                    .col(ColumnDef::new(Referrals::InviteeId).big_integer().not_null())
                    .col(ColumnDef::new(Referrals::ReferralCode).string_len(16).not_null())
                    .col(
                        ColumnDef::new(Referrals::Status)
                            .string_len(16)
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(
                        ColumnDef::new(Referrals::InviterPointsAwarded)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Referrals::InviteePointsAwarded)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Referrals::FirstRentalCompleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Referrals::CompletedAt).timestamp_with_time_zone().null())
                    .col(
                        ColumnDef::new(Referrals::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Referrals::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(Referrals::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_referrals_inviter")
                            .from(Referrals::Table, Referrals::InviterId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_referrals_invitee")
                            .from(Referrals::Table, Referrals::InviteeId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // one referral per (inviter, invitee)
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_referrals_inviter_invitee")
                    .table(Referrals::Table)
                    .col(Referrals::InviterId)
                    .col(Referrals::InviteeId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Referrals::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PointsTransactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserPoints::Table).to_owned())
            .await?;
        Ok(())
    }
}
