//! Per-session RADIUS credential generation.

use anyhow::{Context, Result};
use rand::{rngs::OsRng, RngCore};

/// Entropy behind each issued credential. 8 bytes encode to the 16 hex
/// characters the NAS submits back as the PAP password.
pub const CREDENTIAL_BYTES: usize = 8;

/// Issue a fresh random secret for one authorization replacement.
///
/// The raw value is handed to the portal and stored as the
/// `Cleartext-Password` check attribute; the downstream PAP exchange needs
/// the reversible secret, so it is never hashed.
pub fn issue_credential() -> Result<String> {
    let mut bytes = [0u8; CREDENTIAL_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate network credential")?;
    Ok(hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_is_sixteen_lowercase_hex_chars() {
        let credential = issue_credential().expect("credential");
        assert_eq!(credential.len(), CREDENTIAL_BYTES * 2);
        assert!(credential
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn consecutive_credentials_differ() {
        let first = issue_credential().expect("credential");
        let second = issue_credential().expect("credential");
        assert_ne!(first, second);
    }
}
