pub mod admins;
pub mod bookings;
pub mod users;

pub use admins as admin_entity;
pub use bookings as booking_entity;
pub use users as user_entity;
