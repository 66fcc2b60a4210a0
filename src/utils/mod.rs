pub mod password;
pub mod phone;
pub mod session;

pub use password::*;
pub use phone::*;
pub use session::*;
