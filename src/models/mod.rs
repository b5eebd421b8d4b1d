pub mod admin;
pub mod common;
pub mod iot;
pub mod late_fee;
pub mod pagination;
pub mod points;
pub mod referral;
pub mod rental;
pub mod station;
pub mod user;
pub mod wallet;

pub use admin::*;
pub use common::*;
pub use iot::*;
pub use late_fee::*;
pub use pagination::*;
pub use points::*;
pub use referral::*;
pub use rental::*;
pub use station::*;
pub use user::*;
pub use wallet::*;
