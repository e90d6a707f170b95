pub mod booking;
pub mod listing;
pub mod review;
