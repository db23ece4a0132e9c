pub mod expiry;

pub use expiry::spawn_expiry_sweeper;
