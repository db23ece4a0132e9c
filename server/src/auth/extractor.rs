use axum::async_trait;
use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::header::{AUTHORIZATION, USER_AGENT};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use chrono::Utc;
use uuid::Uuid;

use crate::models::Role;
use crate::state::AppState;
use crate::utils::AppError;

/// The caller identified by a valid bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
    pub venue_id: Option<Uuid>,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| AppError::AuthError("Bearer token required".to_string()))?;
        let claims = state.tokens.verify(token, Utc::now())?;

        Ok(AuthUser {
            id: claims.sub,
            role: claims.role,
            venue_id: claims.venue_id,
        })
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() {
        Some(token.trim())
    } else {
        None
    }
}

impl AuthUser {
    pub fn require_role(&self, allowed: &[Role]) -> Result<(), AppError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "You do not have permission to perform this action".to_string(),
            ))
        }
    }

    pub fn is_platform_admin(&self) -> bool {
        self.role == Role::PlatformAdmin
    }

    /// Venue admins and workers of `venue_id`, or a platform admin.
    pub fn require_venue_staff(&self, venue_id: Uuid) -> Result<(), AppError> {
        if self.is_platform_admin()
            || (self.role.is_venue_staff() && self.venue_id == Some(venue_id))
        {
            return Ok(());
        }
        Err(AppError::Forbidden(
            "You are not staff of this venue".to_string(),
        ))
    }

    pub fn require_venue_admin(&self, venue_id: Uuid) -> Result<(), AppError> {
        if self.role == Role::VenueAdmin && self.venue_id == Some(venue_id) {
            return Ok(());
        }
        Err(AppError::Forbidden(
            "Only the administrator of this venue can do that".to_string(),
        ))
    }

    /// The venue a gate worker scans for.
    pub fn worker_venue(&self) -> Result<Uuid, AppError> {
        self.require_role(&[Role::Worker])?;
        self.venue_id.ok_or_else(|| {
            AppError::Forbidden("No venue is assigned to your account".to_string())
        })
    }
}

/// Caller network details recorded in audit rows and used for per-IP
/// login throttling.
#[derive(Debug, Clone, Default)]
pub struct ClientMeta {
    pub ip: Option<IpAddr>,
    pub user_agent: Option<String>,
}

impl ClientMeta {
    pub fn ip_string(&self) -> Option<String> {
        self.ip.map(|ip| ip.to_string())
    }
}

#[async_trait]
impl FromRequestParts<AppState> for ClientMeta {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        Ok(client_meta(&parts.headers, peer, state.config.trust_proxy_headers))
    }
}

/// Resolves the client address. Forwarding headers are read only when
/// `trust_proxy_headers` is set; otherwise the socket peer is used.
pub fn client_meta(headers: &HeaderMap, peer: Option<IpAddr>, trust_proxy_headers: bool) -> ClientMeta {
    let forwarded = || {
        // The trusted proxy appends the address it saw, so the last entry is
        // the only one it vouches for.
        let from_chain = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|raw| raw.rsplit(',').next())
            .and_then(|ip| ip.trim().parse::<IpAddr>().ok());
        from_chain.or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .and_then(|ip| ip.trim().parse::<IpAddr>().ok())
        })
    };

    let ip = if trust_proxy_headers {
        forwarded().or(peer)
    } else {
        peer
    };

    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|ua| ua.chars().take(255).collect());

    ClientMeta { ip, user_agent }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn user(role: Role, venue_id: Option<Uuid>) -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            role,
            venue_id,
        }
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_venue_staff_guard() {
        let venue = Uuid::new_v4();
        assert!(user(Role::Worker, Some(venue)).require_venue_staff(venue).is_ok());
        assert!(user(Role::VenueAdmin, Some(venue)).require_venue_staff(venue).is_ok());
        assert!(user(Role::PlatformAdmin, None).require_venue_staff(venue).is_ok());
        assert!(user(Role::Worker, Some(Uuid::new_v4()))
            .require_venue_staff(venue)
            .is_err());
        assert!(user(Role::Customer, Some(venue)).require_venue_staff(venue).is_err());
    }

    #[test]
    fn test_venue_admin_guard() {
        let venue = Uuid::new_v4();
        assert!(user(Role::VenueAdmin, Some(venue)).require_venue_admin(venue).is_ok());
        assert!(user(Role::Worker, Some(venue)).require_venue_admin(venue).is_err());
        assert!(user(Role::PlatformAdmin, None).require_venue_admin(venue).is_err());
    }

    #[test]
    fn test_worker_venue() {
        let venue = Uuid::new_v4();
        assert_eq!(user(Role::Worker, Some(venue)).worker_venue().unwrap(), venue);
        assert!(user(Role::Worker, None).worker_venue().is_err());
        assert!(user(Role::VenueAdmin, Some(venue)).worker_venue().is_err());
    }

    fn peer() -> Option<IpAddr> {
        Some("198.51.100.20".parse().unwrap())
    }

    fn spoofed_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.9"));
        headers.insert(USER_AGENT, HeaderValue::from_static("GateScanner/1.0"));
        headers
    }

    #[test]
    fn test_forwarding_headers_ignored_without_trusted_proxy() {
        let meta = client_meta(&spoofed_headers(), peer(), false);
        assert_eq!(meta.ip, peer());
        assert_eq!(meta.user_agent.as_deref(), Some("GateScanner/1.0"));
    }

    #[test]
    fn test_rotating_forwarded_for_does_not_change_identity() {
        let mut headers = HeaderMap::new();
        let mut seen = Vec::new();
        for fake in ["1.1.1.1", "2.2.2.2", "3.3.3.3"] {
            headers.insert("x-forwarded-for", HeaderValue::from_static(fake));
            seen.push(client_meta(&headers, peer(), false).ip);
        }
        assert!(seen.iter().all(|ip| *ip == peer()));
    }

    #[test]
    fn test_trusted_proxy_uses_last_forwarded_hop() {
        let meta = client_meta(&spoofed_headers(), peer(), true);
        assert_eq!(meta.ip, Some("10.0.0.1".parse().unwrap()));
        assert_eq!(meta.ip_string().as_deref(), Some("10.0.0.1"));
    }

    #[test]
    fn test_unparseable_forwarded_value_falls_back() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("not-an-ip"));
        assert_eq!(client_meta(&headers, peer(), true).ip, peer());

        headers.insert("x-real-ip", HeaderValue::from_static("2001:db8::1"));
        assert_eq!(
            client_meta(&headers, peer(), true).ip,
            Some("2001:db8::1".parse().unwrap())
        );
        assert_eq!(client_meta(&headers, None, false).ip, None);
    }
}
