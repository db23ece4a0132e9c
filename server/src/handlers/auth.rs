use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::auth::extractor::ClientMeta;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::AuthUser;
use crate::db::{self, users::NewUser};
use crate::models::{Role, User};
use crate::notifications::messages;
use crate::state::AppState;
use crate::utils::response::{created, success};
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(custom(function = "crate::utils::validation::not_blank"))]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct StaffRequest {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(custom(function = "crate::utils::validation::not_blank"))]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub role: Role,
}

#[derive(Serialize)]
struct Session {
    token: String,
    expires_at: DateTime<Utc>,
    user: User,
}

fn session(state: &AppState, user: User) -> AppResult<Session> {
    let (token, expires_at) = state.tokens.issue(user.id, user.role, user.venue_id, Utc::now())?;
    Ok(Session {
        token,
        expires_at,
        user,
    })
}

pub async fn login(
    State(state): State<AppState>,
    meta: ClientMeta,
    Json(body): Json<LoginRequest>,
) -> AppResult<Response> {
    let now = Utc::now();
    let ip = meta.ip_string();
    let ip = ip.as_deref();
    state.login_limiter.check(&body.email, ip, now).await?;

    let user = db::users::find_by_email(&state.pool, &body.email).await?;
    let valid = verify_password(&body.password, user.as_ref().map(|u| u.password_hash.as_str())).await;

    let user = match user {
        Some(user) if valid && user.active => user,
        _ => {
            state.login_limiter.record_failure(&body.email, ip, now).await;
            return Err(AppError::AuthError("Invalid email or password".to_string()));
        }
    };

    state.login_limiter.record_success(&body.email).await;
    info!(user_id = %user.id, role = ?user.role, "User logged in");
    Ok(success(session(&state, user)?, "Login successful"))
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> AppResult<Response> {
    body.validate()?;
    if db::users::email_taken(&state.pool, &body.email).await? {
        return Err(AppError::Conflict("That email is already registered".to_string()));
    }

    let password_hash = hash_password(&body.password).await?;
    let user = db::users::insert(
        &state.pool,
        NewUser {
            email: &body.email,
            first_name: &body.first_name,
            last_name: &body.last_name,
            password_hash: &password_hash,
            role: Role::Customer,
            venue_id: None,
        },
    )
    .await?;

    info!(user_id = %user.id, "Customer registered");
    Ok(created(session(&state, user)?, "Account created"))
}

/// Venue admins add gate workers; platform admins may also add venue admins.
pub async fn create_staff(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(venue_id): Path<Uuid>,
    Json(body): Json<StaffRequest>,
) -> AppResult<Response> {
    match body.role {
        Role::Worker if !caller.is_platform_admin() => caller.require_venue_admin(venue_id)?,
        Role::Worker | Role::VenueAdmin => caller.require_role(&[Role::PlatformAdmin])?,
        _ => {
            return Err(AppError::ValidationError(
                "Staff must be a worker or a venue admin".to_string(),
            ))
        }
    }
    body.validate()?;

    let venue = db::venues::find(&state.pool, venue_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Venue not found".to_string()))?;
    if db::users::email_taken(&state.pool, &body.email).await? {
        return Err(AppError::Conflict("That email is already registered".to_string()));
    }

    let password_hash = hash_password(&body.password).await?;
    let user = db::users::insert(
        &state.pool,
        NewUser {
            email: &body.email,
            first_name: &body.first_name,
            last_name: &body.last_name,
            password_hash: &password_hash,
            role: body.role,
            venue_id: Some(venue.id),
        },
    )
    .await?;

    if let Err(e) = state.mailer.send(messages::staff_welcome(&user, &venue)).await {
        tracing::warn!(user_id = %user.id, error = %e, "Could not send staff welcome email");
    }
    info!(user_id = %user.id, venue_id = %venue.id, role = ?user.role, "Staff account created");
    Ok(created(user, "Staff account created"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(email: &str, password: &str, first_name: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            first_name: first_name.to_string(),
            last_name: String::new(),
        }
    }

    #[test]
    fn test_register_request_validation() {
        assert!(register("ana@termas.cl", "correcto123", "Ana").validate().is_ok());
        assert!(register("ana.termas.cl", "correcto123", "Ana").validate().is_err());
        assert!(register("@termas.cl", "correcto123", "Ana").validate().is_err());
        assert!(register("ana@termas.cl", "corto", "Ana").validate().is_err());
        assert!(register("ana@termas.cl", "correcto123", "   ").validate().is_err());
    }

    #[test]
    fn test_validation_errors_become_bad_request() {
        let err: AppError = register("ana@termas.cl", "corto", "Ana")
            .validate()
            .unwrap_err()
            .into();
        assert!(matches!(
            err,
            AppError::ValidationError(ref m) if m.contains("at least 8 characters")
        ));
    }

    #[test]
    fn test_staff_request_validation() {
        let staff = StaffRequest {
            email: "portero@termas.cl".to_string(),
            password: "correcto123".to_string(),
            first_name: "Luis".to_string(),
            last_name: String::new(),
            role: Role::Worker,
        };
        assert!(staff.validate().is_ok());

        let bad = StaffRequest {
            email: "portero".to_string(),
            ..staff
        };
        assert!(bad.validate().is_err());
    }
}
