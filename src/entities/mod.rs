pub mod late_fee_configurations;
pub mod points_transactions;
pub mod power_banks;
pub mod referrals;
pub mod rental_packages;
pub mod rentals;
pub mod station_slots;
pub mod stations;
pub mod transactions;
pub mod user_points;
pub mod users;
pub mod wallets;

pub use late_fee_configurations as late_fee_config_entity;
pub use points_transactions as points_transaction_entity;
pub use power_banks as power_bank_entity;
pub use referrals as referral_entity;
pub use rental_packages as rental_package_entity;
pub use rentals as rental_entity;
pub use station_slots as station_slot_entity;
pub use stations as station_entity;
pub use transactions as transaction_entity;
pub use user_points as user_points_entity;
pub use users as user_entity;
pub use wallets as wallet_entity;

pub use late_fee_configurations::LateFeeType;
pub use points_transactions::{PointsSource, PointsTransactionType};
pub use power_banks::PowerBankStatus;
pub use referrals::ReferralStatus;
pub use rentals::RentalStatus;
pub use station_slots::SlotStatus;
pub use stations::StationStatus;
pub use transactions::{PaymentMethod, TransactionStatus, TransactionType};
pub use users::UserStatus;
