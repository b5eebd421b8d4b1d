pub mod admin;
pub mod auth;
pub mod iot;
pub mod late_fee;
pub mod points;
pub mod referral;
pub mod rental;
pub mod station;
pub mod user;
pub mod wallet;

pub use admin::admin_config;
pub use auth::auth_config;
pub use iot::iot_config;
pub use points::points_config;
pub use referral::referral_config;
pub use rental::rental_config;
pub use station::station_config;
pub use user::user_config;
pub use wallet::{wallet_config, webhook_config};
