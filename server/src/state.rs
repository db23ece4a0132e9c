use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use sqlx::PgPool;

use crate::auth::{LoginRateLimiter, TokenSigner};
use crate::config::Config;
use crate::domain::qr_token::QrCipher;
use crate::notifications::Mailer;
use crate::utils::time::local_date;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub qr: QrCipher,
    pub tokens: TokenSigner,
    pub login_limiter: Arc<LoginRateLimiter>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config, mailer: Arc<dyn Mailer>) -> Self {
        let qr = QrCipher::new(&config.qr_encryption_key);
        let tokens = TokenSigner::new(config.auth_token_secret.clone(), config.auth_token_ttl);
        let login_limiter = Arc::new(LoginRateLimiter::new(
            config.login_max_attempts,
            config.login_lockout,
        ));

        Self {
            pool,
            config: Arc::new(config),
            qr,
            tokens,
            login_limiter,
            mailer,
        }
    }

    /// Today's date in venue-local time.
    pub fn today(&self) -> NaiveDate {
        local_date(Utc::now(), self.config.venue_utc_offset)
    }
}
