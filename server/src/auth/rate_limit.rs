use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use crate::utils::AppError;

/// Counts failed logins per email and per client IP over a sliding window.
pub struct LoginRateLimiter {
    max_attempts: u32,
    window: Duration,
    failures: Mutex<HashMap<String, Vec<DateTime<Utc>>>>,
}

fn email_key(email: &str) -> String {
    format!("email:{}", email.trim().to_lowercase())
}

fn ip_key(ip: &str) -> String {
    format!("ip:{ip}")
}

impl LoginRateLimiter {
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            max_attempts,
            window,
            failures: Mutex::new(HashMap::new()),
        }
    }

    fn keys(email: &str, ip: Option<&str>) -> Vec<String> {
        let mut keys = vec![email_key(email)];
        if let Some(ip) = ip {
            keys.push(ip_key(ip));
        }
        keys
    }

    pub async fn check(&self, email: &str, ip: Option<&str>, now: DateTime<Utc>) -> Result<(), AppError> {
        let cutoff = now - self.window;
        let mut failures = self.failures.lock().await;

        for key in Self::keys(email, ip) {
            if let Some(attempts) = failures.get_mut(&key) {
                attempts.retain(|at| *at > cutoff);
                if attempts.len() >= self.max_attempts as usize {
                    tracing::warn!(key = %key, "Login locked out after repeated failures");
                    return Err(AppError::RateLimited(
                        "Too many failed login attempts, try again later".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    pub async fn record_failure(&self, email: &str, ip: Option<&str>, now: DateTime<Utc>) {
        let mut failures = self.failures.lock().await;
        for key in Self::keys(email, ip) {
            failures.entry(key).or_default().push(now);
        }
    }

    pub async fn record_success(&self, email: &str) {
        self.failures.lock().await.remove(&email_key(email));
    }

    /// Drops entries whose attempts have all aged out of the window.
    pub async fn prune(&self, now: DateTime<Utc>) {
        let cutoff = now - self.window;
        self.failures
            .lock()
            .await
            .retain(|_, attempts| attempts.iter().any(|at| *at > cutoff));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_locks_after_max_failures() {
        let limiter = LoginRateLimiter::new(3, Duration::minutes(15));
        let now = Utc::now();
        for _ in 0..3 {
            assert!(limiter.check("a@b.cl", None, now).await.is_ok());
            limiter.record_failure("a@b.cl", None, now).await;
        }
        assert!(matches!(
            limiter.check("A@B.cl", None, now).await,
            Err(AppError::RateLimited(_))
        ));
    }

    #[tokio::test]
    async fn test_window_expires() {
        let limiter = LoginRateLimiter::new(2, Duration::minutes(15));
        let now = Utc::now();
        limiter.record_failure("a@b.cl", None, now).await;
        limiter.record_failure("a@b.cl", None, now).await;
        assert!(limiter.check("a@b.cl", None, now).await.is_err());
        assert!(limiter
            .check("a@b.cl", None, now + Duration::minutes(16))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_ip_is_limited_across_emails() {
        let limiter = LoginRateLimiter::new(2, Duration::minutes(15));
        let now = Utc::now();
        limiter.record_failure("one@b.cl", Some("10.0.0.1"), now).await;
        limiter.record_failure("two@b.cl", Some("10.0.0.1"), now).await;
        assert!(limiter
            .check("three@b.cl", Some("10.0.0.1"), now)
            .await
            .is_err());
        assert!(limiter
            .check("three@b.cl", Some("10.0.0.2"), now)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_success_clears_email_counter() {
        let limiter = LoginRateLimiter::new(2, Duration::minutes(15));
        let now = Utc::now();
        limiter.record_failure("a@b.cl", None, now).await;
        limiter.record_failure("a@b.cl", None, now).await;
        limiter.record_success("a@b.cl").await;
        assert!(limiter.check("a@b.cl", None, now).await.is_ok());
    }

    #[tokio::test]
    async fn test_prune_removes_stale_entries() {
        let limiter = LoginRateLimiter::new(2, Duration::minutes(15));
        let now = Utc::now();
        limiter.record_failure("a@b.cl", Some("1.1.1.1"), now).await;
        limiter.prune(now + Duration::hours(1)).await;
        assert!(limiter.failures.lock().await.is_empty());
    }
}
