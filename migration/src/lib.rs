pub use sea_orm_migration::prelude::*;

mod m20251001_000001_create_users_and_wallets;
mod m20251001_000002_create_stations;
mod m20251001_000003_create_rentals;
mod m20251001_000004_create_points_and_referrals;
mod m20251001_000005_create_late_fee_configurations;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251001_000001_create_users_and_wallets::Migration),
            Box::new(m20251001_000002_create_stations::Migration),
            Box::new(m20251001_000003_create_rentals::Migration),
            Box::new(m20251001_000004_create_points_and_referrals::Migration),
            Box::new(m20251001_000005_create_late_fee_configurations::Migration),
        ]
    }
}
