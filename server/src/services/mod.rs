//! Request-independent operations. Handlers parse and authorise, then call in
//! here; everything that needs a transaction opens it here.

pub mod availability;
pub mod catalog;
pub mod checkout;
pub mod distributions;
pub mod onboarding;
pub mod payments;
pub mod ratings;
pub mod tickets;
