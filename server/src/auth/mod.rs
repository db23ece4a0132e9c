pub mod extractor;
pub mod password;
pub mod rate_limit;
pub mod token;

pub use extractor::AuthUser;
pub use rate_limit::LoginRateLimiter;
pub use token::{SessionClaims, TokenSigner};
