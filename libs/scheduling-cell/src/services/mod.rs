pub mod availability;
pub mod billing;
pub mod blocking;
pub mod booking;
pub mod directory;
pub mod lifecycle;
pub mod notify;
