use crate::utils::AppError;

/// bcrypt hash of a password nobody can type, used to keep the login path
/// doing the same amount of work when the email is unknown.
const DUMMY_HASH: &str = "$2b$12$C6UzMDM.H6dfI/f/IKcEeO5J3cBQZgq8d.8X4f/W7mWcYe0H5F3lK";

/// Hashes on the blocking pool; bcrypt at the default cost takes a few
/// hundred milliseconds.
pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| AppError::InternalServerError(format!("password hashing task failed: {e}")))?
        .map_err(|e| AppError::InternalServerError(format!("password hashing failed: {e}")))
}

/// Checks a password against a stored hash. Malformed hashes count as a
/// mismatch.
pub async fn verify_password(password: &str, hash: Option<&str>) -> bool {
    let password = password.to_owned();
    let hash = hash.map(str::to_owned);
    tokio::task::spawn_blocking(move || match hash {
        Some(hash) => bcrypt::verify(password, &hash).unwrap_or(false),
        None => {
            let _ = bcrypt::verify(password, DUMMY_HASH);
            false
        }
    })
    .await
    .unwrap_or(false)
}
