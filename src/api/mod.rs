pub mod admin;
pub mod appointment;
pub mod booking;
pub mod docs;
pub mod doctor;
pub mod health;
