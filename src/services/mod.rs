//! Booking workflow rules, independent of HTTP.

pub mod approval;
pub mod booking;
