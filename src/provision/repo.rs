//! SQL storage for guests, RADIUS attribute collections, and sessions.
//!
//! Functions taking a [`sqlx::Transaction`] run inside the caller's unit of
//! work; the orchestrator owns begin/commit so partial writes never become
//! visible.

use anyhow::{Context, Result};
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::Instrument;
use uuid::Uuid;

use super::models::{AccountingEvent, AuthMethod, SessionStatus};
use super::policy::{AccessPolicy, LocationRow, GUEST_GROUP, GUEST_GROUP_PRIORITY};

/// Check attribute carrying the issued secret; the PAP flow downstream needs
/// it reversible, so the value is the raw credential.
const CHECK_ATTRIBUTE: &str = "Cleartext-Password";
const CHECK_OP: &str = ":=";
const REPLY_OP: &str = "=";

fn db_span(operation: &str, statement: &str) -> tracing::Span {
    tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

/// Insert-or-update the guest profile for a canonical hardware address.
///
/// One conditional write keyed by the unique `mac_address` column: concurrent
/// first visits cannot create two rows, non-null incoming fields overwrite,
/// null fields never erase, and the visit counter increments on conflict.
pub(crate) async fn upsert_guest(
    tx: &mut Transaction<'_, Postgres>,
    username: &str,
    email: Option<&str>,
    phone: Option<&str>,
    name: Option<&str>,
    method: AuthMethod,
    location_id: i64,
) -> Result<Uuid> {
    let query = r"
        INSERT INTO guests
            (mac_address, email, phone, name, auth_method, location_id, last_seen, visit_count)
        VALUES ($1, $2, $3, $4, $5, $6, NOW(), 1)
        ON CONFLICT (mac_address) DO UPDATE SET
            email = COALESCE(EXCLUDED.email, guests.email),
            phone = COALESCE(EXCLUDED.phone, guests.phone),
            name = COALESCE(EXCLUDED.name, guests.name),
            auth_method = EXCLUDED.auth_method,
            location_id = EXCLUDED.location_id,
            last_seen = NOW(),
            visit_count = guests.visit_count + 1
        RETURNING id
    ";
    let row = sqlx::query(query)
        .bind(username)
        .bind(email)
        .bind(phone)
        .bind(name)
        .bind(method.as_str())
        .bind(location_id)
        .fetch_one(&mut **tx)
        .instrument(db_span("INSERT", query))
        .await
        .context("failed to upsert guest")?;

    Ok(row.get("id"))
}

/// Load the policy columns for a Location. A miss is not an error; the
/// caller falls back to the default policy.
pub(crate) async fn load_location(
    tx: &mut Transaction<'_, Postgres>,
    location_id: i64,
) -> Result<Option<LocationRow>> {
    let query = r"
        SELECT nas_ip, session_timeout, idle_timeout,
               bandwidth_limit_up, bandwidth_limit_down, redirect_url
        FROM locations
        WHERE id = $1
    ";
    let row = sqlx::query(query)
        .bind(location_id)
        .fetch_optional(&mut **tx)
        .instrument(db_span("SELECT", query))
        .await
        .context("failed to load location policy")?;

    Ok(row.map(|row| LocationRow {
        nas_ip: row.get("nas_ip"),
        session_timeout: row.get("session_timeout"),
        idle_timeout: row.get("idle_timeout"),
        bandwidth_limit_up: row.get("bandwidth_limit_up"),
        bandwidth_limit_down: row.get("bandwidth_limit_down"),
        redirect_url: row.get("redirect_url"),
    }))
}

/// Delete every authorization attribute for a username across all three
/// collections. Shared by replacement and administrative disconnect.
pub(crate) async fn clear_authorization(
    tx: &mut Transaction<'_, Postgres>,
    username: &str,
) -> Result<()> {
    for table in ["radcheck", "radreply", "radusergroup"] {
        let query = format!("DELETE FROM {table} WHERE username = $1");
        sqlx::query(&query)
            .bind(username)
            .execute(&mut **tx)
            .instrument(db_span("DELETE", &query))
            .await
            .with_context(|| format!("failed to clear {table} rows"))?;
    }

    Ok(())
}

/// Replace-all authorization state for a username: drop whatever set exists,
/// then insert the complete new one derived from the policy. Never patches,
/// so no attribute from an earlier policy revision can linger.
pub(crate) async fn replace_authorization(
    tx: &mut Transaction<'_, Postgres>,
    username: &str,
    password: &str,
    policy: &AccessPolicy,
) -> Result<()> {
    clear_authorization(tx, username).await?;

    let query = "INSERT INTO radcheck (username, attribute, op, value) VALUES ($1, $2, $3, $4)";
    sqlx::query(query)
        .bind(username)
        .bind(CHECK_ATTRIBUTE)
        .bind(CHECK_OP)
        .bind(password)
        .execute(&mut **tx)
        .instrument(db_span("INSERT", query))
        .await
        .context("failed to insert credential check attribute")?;

    for (attribute, value) in policy.reply_attributes() {
        let query = "INSERT INTO radreply (username, attribute, op, value) VALUES ($1, $2, $3, $4)";
        sqlx::query(query)
            .bind(username)
            .bind(attribute)
            .bind(REPLY_OP)
            .bind(&value)
            .execute(&mut **tx)
            .instrument(db_span("INSERT", query))
            .await
            .with_context(|| format!("failed to insert {attribute} reply attribute"))?;
    }

    let query = "INSERT INTO radusergroup (username, groupname, priority) VALUES ($1, $2, $3)";
    sqlx::query(query)
        .bind(username)
        .bind(GUEST_GROUP)
        .bind(GUEST_GROUP_PRIORITY)
        .execute(&mut **tx)
        .instrument(db_span("INSERT", query))
        .await
        .context("failed to insert group membership")?;

    Ok(())
}

/// Open a fresh `active` session row. Deliberately does not close earlier
/// active sessions for the same address; those age out through accounting or
/// administrative disconnect.
pub(crate) async fn open_session(
    tx: &mut Transaction<'_, Postgres>,
    guest_id: Uuid,
    location_id: i64,
    username: &str,
    nas_ip: &str,
) -> Result<Uuid> {
    let query = r"
        INSERT INTO sessions (guest_id, location_id, mac_address, nas_ip, status)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
    ";
    let row = sqlx::query(query)
        .bind(guest_id)
        .bind(location_id)
        .bind(username)
        .bind(nas_ip)
        .bind(SessionStatus::Active.as_str())
        .fetch_one(&mut **tx)
        .instrument(db_span("INSERT", query))
        .await
        .context("failed to open session")?;

    Ok(row.get("id"))
}

/// Mark every active session for a username as administratively
/// disconnected. Returns how many rows transitioned.
pub(crate) async fn close_active_sessions(
    tx: &mut Transaction<'_, Postgres>,
    username: &str,
) -> Result<u64> {
    let query = r"
        UPDATE sessions
        SET status = $2, ended_at = NOW()
        WHERE mac_address = $1 AND status = $3
    ";
    let result = sqlx::query(query)
        .bind(username)
        .bind(SessionStatus::Disconnected.as_str())
        .bind(SessionStatus::Active.as_str())
        .execute(&mut **tx)
        .instrument(db_span("UPDATE", query))
        .await
        .context("failed to disconnect active sessions")?;

    Ok(result.rows_affected())
}

/// Transition active sessions matching an accounting stop record to
/// `expired`, recording usage totals. Unknown or already-terminal usernames
/// simply affect zero rows.
pub(crate) async fn expire_active_sessions(
    pool: &PgPool,
    event: &AccountingEvent,
    data_up_mb: f64,
    data_down_mb: f64,
) -> Result<u64> {
    let query = r"
        UPDATE sessions
        SET status = $2,
            ended_at = NOW(),
            duration_seconds = $3,
            data_up_mb = $4,
            data_down_mb = $5,
            radius_session_id = $6
        WHERE mac_address = $1 AND status = $7
    ";
    let result = sqlx::query(query)
        .bind(&event.username)
        .bind(SessionStatus::Expired.as_str())
        .bind(event.session_time.unwrap_or(0))
        .bind(data_up_mb)
        .bind(data_down_mb)
        .bind(event.session_id.as_deref())
        .bind(SessionStatus::Active.as_str())
        .execute(pool)
        .instrument(db_span("UPDATE", query))
        .await
        .context("failed to expire sessions from accounting stop")?;

    Ok(result.rows_affected())
}

/// Whether any credential-check row exists for a username.
pub(crate) async fn authorization_exists(pool: &PgPool, username: &str) -> Result<bool> {
    let query = "SELECT EXISTS (SELECT 1 FROM radcheck WHERE username = $1) AS authorized";
    let row = sqlx::query(query)
        .bind(username)
        .fetch_one(pool)
        .instrument(db_span("SELECT", query))
        .await
        .context("failed to check authorization status")?;

    Ok(row.get("authorized"))
}
