//! Credential helpers for the administrative surface.

use anyhow::{anyhow, Context, Result};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use axum::http::{header::AUTHORIZATION, HeaderMap};
use base64ct::{Base64UrlUnpadded, Encoding};
use password_hash::{PasswordHash, SaltString};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use url::Url;

/// Hash an administrator password into a PHC string for storage.
pub(super) fn hash_password(password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; 16];
    OsRng
        .try_fill_bytes(&mut salt_bytes)
        .context("failed to generate password salt")?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|err| anyhow!(err.to_string()))?;

    let phc = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow!(err.to_string()))?
        .to_string();

    Ok(phc)
}

/// Verify a login password against a stored PHC string. Malformed hashes
/// count as a failed verification rather than an error.
pub(super) fn verify_password(hash: &str, password: &str) -> bool {
    if let Ok(parsed) = PasswordHash::new(hash) {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    } else {
        false
    }
}

/// Create a bearer token for an admin session.
/// The raw value goes to the client; the database only sees its hash.
pub(super) fn generate_admin_token() -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate admin session token")?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}

/// Hash an admin session token for storage and lookup.
pub(super) fn hash_admin_token(token: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().to_vec()
}

/// Pull the bearer token out of the Authorization header, if any.
pub(super) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Location URL fields are optional, but when present they must parse.
pub(super) fn valid_optional_url(value: Option<&str>) -> bool {
    match value {
        None => true,
        Some(value) if value.is_empty() => true,
        Some(value) => Url::parse(value).is_ok(),
    }
}
