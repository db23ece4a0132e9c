use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::{Role, User};

pub struct NewUser<'a> {
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub password_hash: &'a str,
    pub role: Role,
    pub venue_id: Option<Uuid>,
}

pub async fn find_by_email(ex: impl PgExecutor<'_>, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email.trim().to_lowercase())
        .fetch_optional(ex)
        .await
}

pub async fn find(ex: impl PgExecutor<'_>, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(ex)
        .await
}

pub async fn email_taken(ex: impl PgExecutor<'_>, email: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
        .bind(email.trim().to_lowercase())
        .fetch_one(ex)
        .await
}

pub async fn insert(ex: impl PgExecutor<'_>, user: NewUser<'_>) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, email, first_name, last_name, password_hash, role, venue_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.email.trim().to_lowercase())
    .bind(user.first_name.trim())
    .bind(user.last_name.trim())
    .bind(user.password_hash)
    .bind(user.role)
    .bind(user.venue_id)
    .fetch_one(ex)
    .await
}

/// Makes a customer the administrator of `venue_id`. `None` when the user is
/// not a customer any more.
pub async fn promote_to_venue_admin(
    ex: impl PgExecutor<'_>,
    user_id: Uuid,
    venue_id: Uuid,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET role = 'venue_admin', venue_id = $2, updated_at = NOW()
        WHERE id = $1 AND role = 'customer'
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(venue_id)
    .fetch_optional(ex)
    .await
}
