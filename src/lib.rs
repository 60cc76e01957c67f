//! # Gastejo (Guest Wi-Fi Provisioning Bridge)
//!
//! `gastejo` sits between a captive portal and a RADIUS daemon. It turns a
//! guest's one-time identity assertion (email, phone, or a plain
//! click-through) into time-bounded AAA credentials and tracks the resulting
//! network session until accounting or an administrator closes it.
//!
//! ## Identity Model
//!
//! The client's hardware address is the identity. Every raw address is
//! normalized to lowercase colon-separated hex, and that canonical form keys
//! the guest profile, the session rows, and the three RADIUS attribute
//! collections (`radcheck`, `radreply`, `radusergroup`).
//!
//! - **One guest per address:** repeat visits merge profile fields through a
//!   single conditional write and bump the visit counter.
//! - **Replace-all authorization:** every provisioning event deletes the full
//!   attribute set for the address and inserts a complete new one inside one
//!   transaction, so the RADIUS daemon never reads a half-old mixture.
//! - **Append-only sessions:** a new provisioning never closes an earlier
//!   active session; rows leave `active` only through an accounting stop or
//!   an administrative disconnect.
//!
//! ## Protocol Boundary
//!
//! Gastejo is not a RADIUS server. It writes the authorization rows an
//! external RADIUS daemon reads and never performs any PAP/CHAP/EAP
//! handshake itself. The issued secret is stored in clear under
//! `Cleartext-Password` because the downstream PAP exchange requires a
//! reversible value.

pub mod api;
pub mod cli;
pub mod provision;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        // Should be a hex string (full SHA-1 is 40 chars, but could be short)
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
