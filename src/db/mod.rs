pub mod bookings;
pub mod connection;
pub mod listings;
pub mod reviews;
pub mod users;

pub use connection::Database;
