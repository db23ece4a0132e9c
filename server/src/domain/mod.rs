pub mod availability;
pub mod commission;
pub mod qr_token;
pub mod validation;
