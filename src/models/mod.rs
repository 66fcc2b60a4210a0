pub mod auth;
pub mod booking;
pub mod common;
pub mod pagination;
pub mod user;

pub use auth::*;
pub use booking::*;
pub use common::*;
pub use pagination::*;
pub use user::*;
