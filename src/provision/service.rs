//! Provisioning orchestration.
//!
//! `authenticate_guest` is the single all-or-nothing unit of work per portal
//! request; the session-lifecycle operations (`disconnect`,
//! `record_accounting`) run independently of it.

use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::{debug, info};

use super::credential::issue_credential;
use super::mac::canonical_mac;
use super::models::{
    AccountingEvent, AuthorizationStatus, GuestAuthRequest, GuestAuthResponse, ProvisionError,
};
use super::policy::AccessPolicy;
use super::repo;

/// Location the portal falls back to when the splash page does not send one.
pub const DEFAULT_LOCATION_ID: i64 = 1;

const BYTES_PER_MEGABYTE: f64 = 1_048_576.0;

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn octets_to_mb(octets: i64) -> f64 {
    octets as f64 / BYTES_PER_MEGABYTE
}

/// Provision network access for one portal authentication request.
///
/// Canonicalizes the hardware identity, issues a credential, and runs the
/// guest upsert, authorization replacement, and session open inside one
/// transaction. Any failure rolls the whole unit back; the caller only ever
/// observes full success or no effect.
pub async fn authenticate_guest(
    pool: &PgPool,
    request: &GuestAuthRequest,
) -> Result<GuestAuthResponse, ProvisionError> {
    let username = canonical_mac(&request.mac_address);
    if username.is_empty() {
        return Err(ProvisionError::MissingAddress);
    }

    let password = issue_credential()?;

    let email = non_empty(request.email.as_deref()).map(normalize_email);
    let phone = non_empty(request.phone.as_deref());
    let name = non_empty(request.name.as_deref());
    let location_id = request.location_id.unwrap_or(DEFAULT_LOCATION_ID);

    let mut tx = pool
        .begin()
        .await
        .context("failed to begin provisioning transaction")?;

    let guest_id = repo::upsert_guest(
        &mut tx,
        &username,
        email.as_deref(),
        phone,
        name,
        request.auth_method,
        location_id,
    )
    .await?;

    let location = repo::load_location(&mut tx, location_id).await?;
    if location.is_none() {
        debug!(location_id, "Unknown location, using default policy");
    }
    let policy = AccessPolicy::resolve(location);

    repo::replace_authorization(&mut tx, &username, &password, &policy).await?;

    let session_id =
        repo::open_session(&mut tx, guest_id, location_id, &username, &policy.nas_ip).await?;

    tx.commit()
        .await
        .context("failed to commit provisioning transaction")?;

    info!(%username, %guest_id, %session_id, "Provisioned guest access");

    Ok(GuestAuthResponse {
        username,
        password,
        session_timeout: policy.effective_session_timeout(),
        redirect_url: policy.redirect_url,
    })
}

/// Whether a hardware address currently holds authorization state.
pub async fn authorization_status(
    pool: &PgPool,
    raw_mac: &str,
) -> Result<AuthorizationStatus, ProvisionError> {
    let username = canonical_mac(raw_mac);
    let authorized = repo::authorization_exists(pool, &username).await?;

    Ok(AuthorizationStatus {
        authorized,
        username: authorized.then_some(username),
    })
}

/// Administrative disconnect: remove all authorization attributes for the
/// address and mark its active sessions disconnected, as one unit of work.
/// Returns the canonical username for the acknowledgement.
pub async fn disconnect(pool: &PgPool, raw_mac: &str) -> Result<String, ProvisionError> {
    let username = canonical_mac(raw_mac);
    if username.is_empty() {
        return Err(ProvisionError::MissingAddress);
    }

    let mut tx = pool
        .begin()
        .await
        .context("failed to begin disconnect transaction")?;

    repo::clear_authorization(&mut tx, &username).await?;
    let closed = repo::close_active_sessions(&mut tx, &username).await?;

    tx.commit()
        .await
        .context("failed to commit disconnect transaction")?;

    info!(%username, closed, "Disconnected guest");

    Ok(username)
}

/// Apply one accounting record. Only `Stop` events mutate state; everything
/// else, including stops for unknown or already-closed sessions, is a silent
/// no-op because accounting delivery is best-effort and may arrive late or
/// duplicated.
pub async fn record_accounting(pool: &PgPool, event: &AccountingEvent) -> Result<()> {
    if !event.is_stop() {
        debug!(
            username = %event.username,
            status_type = %event.acct_status_type,
            "Ignoring non-stop accounting event"
        );
        return Ok(());
    }

    let data_up_mb = octets_to_mb(event.input_octets.unwrap_or(0));
    let data_down_mb = octets_to_mb(event.output_octets.unwrap_or(0));

    let expired = repo::expire_active_sessions(pool, event, data_up_mb, data_down_mb).await?;

    if expired == 0 {
        debug!(username = %event.username, "Accounting stop matched no active session");
    } else {
        info!(username = %event.username, expired, "Expired session from accounting stop");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn octets_convert_to_megabytes() {
        assert_eq!(octets_to_mb(0), 0.0);
        assert_eq!(octets_to_mb(1_048_576), 1.0);
        assert_eq!(octets_to_mb(524_288), 0.5);
    }

    #[test]
    fn email_is_trimmed_and_lowercased() {
        assert_eq!(normalize_email(" Guest@Example.COM "), "guest@example.com");
    }

    #[test]
    fn blank_fields_are_treated_as_absent() {
        assert_eq!(non_empty(Some("   ")), None);
        assert_eq!(non_empty(Some(" Ada ")), Some("Ada"));
        assert_eq!(non_empty(None), None);
    }
}
