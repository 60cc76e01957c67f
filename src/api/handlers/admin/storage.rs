//! SQL helpers for administrator accounts, bearer sessions, and the
//! dashboard listings.

use anyhow::{Context, Result};
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::types::{GuestSummary, LocationResponse, SessionSummary};
use super::AdminPrincipal;

fn db_span(operation: &str, statement: &str) -> tracing::Span {
    tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

pub(super) struct AdminAccountRow {
    pub(super) id: Uuid,
    pub(super) email: String,
    pub(super) name: String,
    pub(super) role: String,
    pub(super) password_hash: String,
}

pub(super) async fn lookup_admin_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<AdminAccountRow>> {
    let query = "SELECT id, email, name, role, password_hash FROM admins WHERE email = $1";
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(db_span("SELECT", query))
        .await
        .context("failed to lookup admin account")?;

    Ok(row.map(|row| AdminAccountRow {
        id: row.get("id"),
        email: row.get("email"),
        name: row.get("name"),
        role: row.get("role"),
        password_hash: row.get("password_hash"),
    }))
}

pub(super) async fn insert_admin_session(
    pool: &PgPool,
    admin_id: Uuid,
    token_hash: &[u8],
    ttl_seconds: i64,
) -> Result<()> {
    let query = r"
        INSERT INTO admin_sessions (admin_id, token_hash, expires_at)
        VALUES ($1, $2, NOW() + ($3 * INTERVAL '1 second'))
    ";
    sqlx::query(query)
        .bind(admin_id)
        .bind(token_hash)
        .bind(ttl_seconds)
        .execute(pool)
        .instrument(db_span("INSERT", query))
        .await
        .context("failed to insert admin session")?;

    Ok(())
}

pub(super) async fn lookup_admin_session(
    pool: &PgPool,
    token_hash: &[u8],
) -> Result<Option<AdminPrincipal>> {
    let query = r"
        SELECT a.id, a.email, a.role
        FROM admin_sessions s
        JOIN admins a ON a.id = s.admin_id
        WHERE s.token_hash = $1 AND s.expires_at > NOW()
    ";
    let row = sqlx::query(query)
        .bind(token_hash)
        .fetch_optional(pool)
        .instrument(db_span("SELECT", query))
        .await
        .context("failed to lookup admin session")?;

    Ok(row.map(|row| AdminPrincipal {
        admin_id: row.get("id"),
        email: row.get("email"),
        role: row.get("role"),
    }))
}

/// Insert the bootstrap administrator unless the email is already taken.
/// Returns whether a row was created.
pub(super) async fn ensure_admin(pool: &PgPool, email: &str, password_hash: &str) -> Result<bool> {
    let query = r"
        INSERT INTO admins (email, password_hash)
        VALUES ($1, $2)
        ON CONFLICT (email) DO NOTHING
    ";
    let result = sqlx::query(query)
        .bind(email)
        .bind(password_hash)
        .execute(pool)
        .instrument(db_span("INSERT", query))
        .await
        .context("failed to ensure bootstrap admin")?;

    Ok(result.rows_affected() > 0)
}

fn guest_summary(row: &PgRow) -> GuestSummary {
    GuestSummary {
        id: row.get::<Uuid, _>("id").to_string(),
        mac_address: row.get("mac_address"),
        email: row.get("email"),
        phone: row.get("phone"),
        name: row.get("name"),
        auth_method: row.get("auth_method"),
        location_id: row.get("location_id"),
        location_name: row.get("location_name"),
        visit_count: row.get("visit_count"),
        created_at: row.get("created_at"),
        last_seen: row.get("last_seen"),
    }
}

const GUEST_COLUMNS: &str = r"
    g.id, g.mac_address, g.email, g.phone, g.name, g.auth_method,
    g.location_id, l.name AS location_name, g.visit_count,
    g.created_at::text AS created_at, g.last_seen::text AS last_seen
";

pub(super) struct DashboardCounts {
    pub(super) total_guests: i64,
    pub(super) total_sessions: i64,
    pub(super) active_sessions: i64,
    pub(super) total_locations: i64,
    pub(super) today_guests: i64,
}

pub(super) async fn dashboard_counts(pool: &PgPool) -> Result<DashboardCounts> {
    let count = |query: &'static str| {
        sqlx::query_scalar::<_, i64>(query)
            .fetch_one(pool)
            .instrument(db_span("SELECT", query))
    };

    let (total_guests, total_sessions, active_sessions, total_locations, today_guests) =
        tokio::try_join!(
            count("SELECT COUNT(*) FROM guests"),
            count("SELECT COUNT(*) FROM sessions"),
            count("SELECT COUNT(*) FROM sessions WHERE status = 'active'"),
            count("SELECT COUNT(*) FROM locations"),
            count("SELECT COUNT(*) FROM guests WHERE created_at >= CURRENT_DATE"),
        )
        .context("failed to collect dashboard counts")?;

    Ok(DashboardCounts {
        total_guests,
        total_sessions,
        active_sessions,
        total_locations,
        today_guests,
    })
}

pub(super) async fn recent_guests(pool: &PgPool, limit: i64) -> Result<Vec<GuestSummary>> {
    let query = format!(
        r"
        SELECT {GUEST_COLUMNS}
        FROM guests g
        LEFT JOIN locations l ON g.location_id = l.id
        ORDER BY g.last_seen DESC
        LIMIT $1
        "
    );
    let rows = sqlx::query(&query)
        .bind(limit)
        .fetch_all(pool)
        .instrument(db_span("SELECT", &query))
        .await
        .context("failed to list recent guests")?;

    Ok(rows.iter().map(guest_summary).collect())
}

pub(super) async fn list_guests(
    pool: &PgPool,
    search: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<GuestSummary>, i64)> {
    let pattern = search.map(|term| format!("%{term}%"));

    let count_query = r"
        SELECT COUNT(*)
        FROM guests g
        WHERE ($1::text IS NULL
               OR g.email ILIKE $1 OR g.phone ILIKE $1
               OR g.name ILIKE $1 OR g.mac_address ILIKE $1)
    ";
    let total = sqlx::query_scalar::<_, i64>(count_query)
        .bind(pattern.as_deref())
        .fetch_one(pool)
        .instrument(db_span("SELECT", count_query))
        .await
        .context("failed to count guests")?;

    let query = format!(
        r"
        SELECT {GUEST_COLUMNS}
        FROM guests g
        LEFT JOIN locations l ON g.location_id = l.id
        WHERE ($1::text IS NULL
               OR g.email ILIKE $1 OR g.phone ILIKE $1
               OR g.name ILIKE $1 OR g.mac_address ILIKE $1)
        ORDER BY g.last_seen DESC
        LIMIT $2 OFFSET $3
        "
    );
    let rows = sqlx::query(&query)
        .bind(pattern.as_deref())
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .instrument(db_span("SELECT", &query))
        .await
        .context("failed to list guests")?;

    Ok((rows.iter().map(guest_summary).collect(), total))
}

pub(super) async fn list_sessions(
    pool: &PgPool,
    status: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<SessionSummary>> {
    let query = r"
        SELECT s.id, s.mac_address, s.nas_ip, s.status,
               s.started_at::text AS started_at, s.ended_at::text AS ended_at,
               s.duration_seconds, s.data_up_mb, s.data_down_mb,
               s.radius_session_id, s.location_id,
               g.email AS guest_email, g.phone AS guest_phone, g.name AS guest_name,
               l.name AS location_name
        FROM sessions s
        LEFT JOIN guests g ON s.guest_id = g.id
        LEFT JOIN locations l ON s.location_id = l.id
        WHERE ($1::text IS NULL OR s.status = $1)
        ORDER BY s.started_at DESC
        LIMIT $2 OFFSET $3
    ";
    let rows = sqlx::query(query)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .instrument(db_span("SELECT", query))
        .await
        .context("failed to list sessions")?;

    Ok(rows
        .iter()
        .map(|row| SessionSummary {
            id: row.get::<Uuid, _>("id").to_string(),
            mac_address: row.get("mac_address"),
            nas_ip: row.get("nas_ip"),
            status: row.get("status"),
            started_at: row.get("started_at"),
            ended_at: row.get("ended_at"),
            duration_seconds: row.get("duration_seconds"),
            data_up_mb: row.get("data_up_mb"),
            data_down_mb: row.get("data_down_mb"),
            radius_session_id: row.get("radius_session_id"),
            location_id: row.get("location_id"),
            location_name: row.get("location_name"),
            guest_email: row.get("guest_email"),
            guest_phone: row.get("guest_phone"),
            guest_name: row.get("guest_name"),
        })
        .collect())
}

fn location_response(row: &PgRow) -> LocationResponse {
    LocationResponse {
        id: row.get("id"),
        name: row.get("name"),
        address: row.get("address"),
        ssid: row.get("ssid"),
        nas_ip: row.get("nas_ip"),
        bandwidth_limit_up: row.get("bandwidth_limit_up"),
        bandwidth_limit_down: row.get("bandwidth_limit_down"),
        session_timeout: row.get("session_timeout"),
        idle_timeout: row.get("idle_timeout"),
        daily_data_limit_mb: row.get("daily_data_limit_mb"),
        daily_time_limit_seconds: row.get("daily_time_limit_seconds"),
        splash_message: row.get("splash_message"),
        redirect_url: row.get("redirect_url"),
        terms_url: row.get("terms_url"),
        logo_url: row.get("logo_url"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const LOCATION_COLUMNS: &str = r"
    id, name, address, ssid, nas_ip,
    bandwidth_limit_up, bandwidth_limit_down,
    session_timeout, idle_timeout,
    daily_data_limit_mb, daily_time_limit_seconds,
    splash_message, redirect_url, terms_url, logo_url,
    created_at::text AS created_at, updated_at::text AS updated_at
";

pub(super) async fn list_locations(pool: &PgPool) -> Result<Vec<LocationResponse>> {
    let query = format!("SELECT {LOCATION_COLUMNS} FROM locations ORDER BY created_at DESC");
    let rows = sqlx::query(&query)
        .fetch_all(pool)
        .instrument(db_span("SELECT", &query))
        .await
        .context("failed to list locations")?;

    Ok(rows.iter().map(location_response).collect())
}

pub(super) async fn create_location(
    pool: &PgPool,
    request: &super::types::CreateLocationRequest,
) -> Result<LocationResponse> {
    let query = format!(
        r"
        INSERT INTO locations
            (name, address, ssid, nas_ip,
             bandwidth_limit_up, bandwidth_limit_down,
             session_timeout, idle_timeout,
             daily_data_limit_mb, daily_time_limit_seconds,
             splash_message, redirect_url, terms_url, logo_url)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        RETURNING {LOCATION_COLUMNS}
        "
    );
    let row = sqlx::query(&query)
        .bind(&request.name)
        .bind(request.address.as_deref().unwrap_or(""))
        .bind(request.ssid.as_deref().unwrap_or(""))
        .bind(request.nas_ip.as_deref().unwrap_or("0.0.0.0"))
        .bind(request.bandwidth_limit_up.unwrap_or(0))
        .bind(request.bandwidth_limit_down.unwrap_or(0))
        .bind(request.session_timeout.unwrap_or(3600))
        .bind(request.idle_timeout.unwrap_or(600))
        .bind(request.daily_data_limit_mb.unwrap_or(0))
        .bind(request.daily_time_limit_seconds.unwrap_or(0))
        .bind(request.splash_message.as_deref().unwrap_or(""))
        .bind(request.redirect_url.as_deref().unwrap_or(""))
        .bind(request.terms_url.as_deref().unwrap_or(""))
        .bind(request.logo_url.as_deref().unwrap_or(""))
        .fetch_one(pool)
        .instrument(db_span("INSERT", &query))
        .await
        .context("failed to create location")?;

    Ok(location_response(&row))
}

pub(super) async fn update_location(
    pool: &PgPool,
    id: i64,
    request: &super::types::UpdateLocationRequest,
) -> Result<Option<LocationResponse>> {
    let query = format!(
        r"
        UPDATE locations SET
            name = COALESCE($2, name),
            address = COALESCE($3, address),
            ssid = COALESCE($4, ssid),
            nas_ip = COALESCE($5, nas_ip),
            bandwidth_limit_up = COALESCE($6, bandwidth_limit_up),
            bandwidth_limit_down = COALESCE($7, bandwidth_limit_down),
            session_timeout = COALESCE($8, session_timeout),
            idle_timeout = COALESCE($9, idle_timeout),
            daily_data_limit_mb = COALESCE($10, daily_data_limit_mb),
            daily_time_limit_seconds = COALESCE($11, daily_time_limit_seconds),
            splash_message = COALESCE($12, splash_message),
            redirect_url = COALESCE($13, redirect_url),
            terms_url = COALESCE($14, terms_url),
            logo_url = COALESCE($15, logo_url),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {LOCATION_COLUMNS}
        "
    );
    let row = sqlx::query(&query)
        .bind(id)
        .bind(request.name.as_deref())
        .bind(request.address.as_deref())
        .bind(request.ssid.as_deref())
        .bind(request.nas_ip.as_deref())
        .bind(request.bandwidth_limit_up)
        .bind(request.bandwidth_limit_down)
        .bind(request.session_timeout)
        .bind(request.idle_timeout)
        .bind(request.daily_data_limit_mb)
        .bind(request.daily_time_limit_seconds)
        .bind(request.splash_message.as_deref())
        .bind(request.redirect_url.as_deref())
        .bind(request.terms_url.as_deref())
        .bind(request.logo_url.as_deref())
        .fetch_optional(pool)
        .instrument(db_span("UPDATE", &query))
        .await
        .context("failed to update location")?;

    Ok(row.as_ref().map(location_response))
}
