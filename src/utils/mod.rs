pub mod code_generator;
pub mod jwt;
pub mod password;
pub mod phone;
pub mod signature;

pub use code_generator::*;
pub use jwt::*;
pub use password::*;
pub use phone::*;
pub use signature::*;
