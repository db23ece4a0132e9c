//! SQL access, one module per table group. Functions take any `PgExecutor`
//! so they run equally against the pool or inside a transaction.

pub mod applications;
pub mod distributions;
pub mod entry_types;
pub mod purchases;
pub mod ratings;
pub mod tickets;
pub mod users;
pub mod venues;
