pub mod config;
pub mod health;
pub mod medication;
pub mod reminders;
pub mod status;
pub mod sync;
