pub mod admin_service;
pub mod auth_service;
pub mod iot_service;
pub mod late_fee_service;
pub mod points_service;
pub mod referral_service;
pub mod rental_service;
pub mod station_service;
pub mod user_service;
pub mod wallet_service;

pub use admin_service::*;
pub use auth_service::*;
pub use iot_service::*;
pub use late_fee_service::*;
pub use points_service::*;
pub use referral_service::*;
pub use rental_service::*;
pub use station_service::*;
pub use user_service::*;
pub use wallet_service::*;
