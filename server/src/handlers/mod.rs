pub mod admin;
pub mod applications;
pub mod auth;
pub mod entry_types;
pub mod health;
pub mod payments;
pub mod purchases;
pub mod tickets;
pub mod venues;

pub use health::health_check;
