pub mod booking;
pub mod booking_flow;
pub mod catalog;
pub mod format;
pub mod pricing;
pub mod slots;
