pub mod auth_service;
pub mod booking_service;
pub mod user_service;

pub use auth_service::*;
pub use booking_service::*;
pub use user_service::*;
