pub mod admin;
pub mod appointment;
pub mod booking;
pub mod doctor;
