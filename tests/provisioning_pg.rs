//! Provisioning and session-lifecycle properties against a real Postgres.
//!
//! These tests need a database. Point `GASTEJO_TEST_DSN` at a scratch
//! Postgres to run them; without it every test skips. The schema from
//! `sql/schema.sql` is applied once per process and every test works on its
//! own random hardware addresses, so the suite can run in parallel and
//! repeatedly against the same database.

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use tokio::sync::Mutex;
use uuid::Uuid;

use gastejo::provision::{canonical_mac, service, AccountingEvent, AuthMethod, GuestAuthRequest};

const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));

static SCHEMA_READY: Lazy<Mutex<bool>> = Lazy::new(|| Mutex::new(false));

async fn test_pool() -> Result<Option<PgPool>> {
    let Ok(dsn) = std::env::var("GASTEJO_TEST_DSN") else {
        eprintln!("Skipping integration test: GASTEJO_TEST_DSN is not set");
        return Ok(None);
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&dsn)
        .await
        .context("failed to connect to GASTEJO_TEST_DSN")?;

    let mut ready = SCHEMA_READY.lock().await;
    if !*ready {
        apply_schema(&pool).await?;
        *ready = true;
    }

    Ok(Some(pool))
}

async fn apply_schema(pool: &PgPool) -> Result<()> {
    for (index, statement) in split_sql_statements(SCHEMA_SQL).iter().enumerate() {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("failed to execute schema statement {}", index + 1))?;
    }

    Ok(())
}

fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    for line in sql.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("--") {
            continue;
        }

        current.push_str(line);
        current.push('\n');

        if trimmed.ends_with(';') {
            statements.push(current.trim().trim_end_matches(';').to_string());
            current.clear();
        }
    }

    if !current.trim().is_empty() {
        statements.push(current.trim().to_string());
    }

    statements
}

/// Fresh canonical address per call so tests never collide.
fn random_mac() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    canonical_mac(&hex[..12])
}

fn auth_request(mac: &str) -> GuestAuthRequest {
    GuestAuthRequest {
        mac_address: mac.to_string(),
        email: None,
        phone: None,
        name: None,
        auth_method: AuthMethod::ClickThrough,
        location_id: None,
        ap_mac: None,
        login_url: None,
    }
}

fn stop_event(username: &str) -> AccountingEvent {
    AccountingEvent {
        username: username.to_string(),
        acct_status_type: "Stop".to_string(),
        session_id: Some("acct-0001".to_string()),
        session_time: Some(120),
        input_octets: Some(1_048_576),
        output_octets: Some(2_097_152),
    }
}

async fn authenticate(pool: &PgPool, request: &GuestAuthRequest) -> Result<gastejo::provision::GuestAuthResponse> {
    service::authenticate_guest(pool, request)
        .await
        .map_err(|err| anyhow!("authenticate_guest failed: {err:?}"))
}

async fn insert_location(
    pool: &PgPool,
    session_timeout: i64,
    idle_timeout: i64,
    bandwidth_up: i64,
    bandwidth_down: i64,
    redirect_url: &str,
) -> Result<i64> {
    sqlx::query_scalar::<_, i64>(
        r"
        INSERT INTO locations
            (name, session_timeout, idle_timeout,
             bandwidth_limit_up, bandwidth_limit_down, redirect_url)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        ",
    )
    .bind("Test Cafe")
    .bind(session_timeout)
    .bind(idle_timeout)
    .bind(bandwidth_up)
    .bind(bandwidth_down)
    .bind(redirect_url)
    .fetch_one(pool)
    .await
    .context("failed to insert test location")
}

async fn attribute_count(pool: &PgPool, table: &str, username: &str) -> Result<i64> {
    let query = format!("SELECT COUNT(*) FROM {table} WHERE username = $1");
    sqlx::query_scalar::<_, i64>(&query)
        .bind(username)
        .fetch_one(pool)
        .await
        .with_context(|| format!("failed to count {table} rows"))
}

async fn reply_value(pool: &PgPool, username: &str, attribute: &str) -> Result<Option<String>> {
    sqlx::query_scalar::<_, String>(
        "SELECT value FROM radreply WHERE username = $1 AND attribute = $2",
    )
    .bind(username)
    .bind(attribute)
    .fetch_optional(pool)
    .await
    .context("failed to read reply attribute")
}

#[tokio::test]
async fn authorization_set_is_replaced_wholesale() -> Result<()> {
    let Some(pool) = test_pool().await? else {
        return Ok(());
    };

    let location_id = insert_location(&pool, 1800, 600, 0, 512, "https://example.com/welcome").await?;

    let mac = random_mac();
    let mut request = auth_request(&mac);
    request.location_id = Some(location_id);

    let first = authenticate(&pool, &request).await?;
    assert_eq!(first.username, mac);
    assert_eq!(first.session_timeout, 1800);
    assert_eq!(first.redirect_url, "https://example.com/welcome");

    // Scenario from the policy contract: 1800 s timeout, 512 kbit/s down.
    assert_eq!(reply_value(&pool, &mac, "Session-Timeout").await?.as_deref(), Some("1800"));
    assert_eq!(reply_value(&pool, &mac, "Idle-Timeout").await?.as_deref(), Some("600"));
    assert_eq!(
        reply_value(&pool, &mac, "WISPr-Bandwidth-Max-Down").await?.as_deref(),
        Some("512000")
    );
    assert_eq!(reply_value(&pool, &mac, "WISPr-Bandwidth-Max-Up").await?, None);

    let second = authenticate(&pool, &request).await?;
    assert_ne!(first.password, second.password);

    // Exactly one complete set; nothing left over from the first grant.
    assert_eq!(attribute_count(&pool, "radcheck", &mac).await?, 1);
    assert_eq!(attribute_count(&pool, "radreply", &mac).await?, 3);
    assert_eq!(attribute_count(&pool, "radusergroup", &mac).await?, 1);

    let row = sqlx::query("SELECT attribute, op, value FROM radcheck WHERE username = $1")
        .bind(&mac)
        .fetch_one(&pool)
        .await?;
    assert_eq!(row.get::<String, _>("attribute"), "Cleartext-Password");
    assert_eq!(row.get::<String, _>("op"), ":=");
    assert_eq!(row.get::<String, _>("value"), second.password);

    let group = sqlx::query("SELECT groupname, priority FROM radusergroup WHERE username = $1")
        .bind(&mac)
        .fetch_one(&pool)
        .await?;
    assert_eq!(group.get::<String, _>("groupname"), "guests");
    assert_eq!(group.get::<i32, _>("priority"), 1);

    Ok(())
}

#[tokio::test]
async fn revisit_merges_profile_and_counts_visits() -> Result<()> {
    let Some(pool) = test_pool().await? else {
        return Ok(());
    };

    let mac = random_mac();

    let mut first = auth_request(&mac);
    first.email = Some("First@Example.COM".to_string());
    first.name = Some("Ada".to_string());
    first.auth_method = AuthMethod::Email;
    authenticate(&pool, &first).await?;

    // Second visit omits the email; it must survive the merge.
    let mut second = auth_request(&mac);
    second.phone = Some("555-0100".to_string());
    second.auth_method = AuthMethod::Phone;
    authenticate(&pool, &second).await?;

    let row = sqlx::query(
        "SELECT email, phone, name, auth_method, visit_count FROM guests WHERE mac_address = $1",
    )
    .bind(&mac)
    .fetch_one(&pool)
    .await?;

    assert_eq!(row.get::<Option<String>, _>("email").as_deref(), Some("first@example.com"));
    assert_eq!(row.get::<Option<String>, _>("phone").as_deref(), Some("555-0100"));
    assert_eq!(row.get::<Option<String>, _>("name").as_deref(), Some("Ada"));
    assert_eq!(row.get::<String, _>("auth_method"), "phone");
    assert_eq!(row.get::<i64, _>("visit_count"), 2);

    Ok(())
}

#[tokio::test]
async fn concurrent_first_visits_create_one_guest() -> Result<()> {
    let Some(pool) = test_pool().await? else {
        return Ok(());
    };

    let mac = random_mac();
    let request_a = auth_request(&mac);
    let request_b = auth_request(&mac);

    let (first, second) = tokio::join!(
        authenticate(&pool, &request_a),
        authenticate(&pool, &request_b),
    );
    first?;
    second?;

    let guests = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM guests WHERE mac_address = $1")
        .bind(&mac)
        .fetch_one(&pool)
        .await?;
    assert_eq!(guests, 1);

    let visits = sqlx::query_scalar::<_, i64>("SELECT visit_count FROM guests WHERE mac_address = $1")
        .bind(&mac)
        .fetch_one(&pool)
        .await?;
    assert_eq!(visits, 2);

    // The upsert serializes same-address provisioning, so the loser's
    // replacement ran after the winner's and exactly one set remains.
    assert_eq!(attribute_count(&pool, "radcheck", &mac).await?, 1);

    Ok(())
}

#[tokio::test]
async fn accounting_stop_expires_sessions() -> Result<()> {
    let Some(pool) = test_pool().await? else {
        return Ok(());
    };

    let mac = random_mac();
    authenticate(&pool, &auth_request(&mac)).await?;

    service::record_accounting(&pool, &stop_event(&mac)).await?;

    let row = sqlx::query(
        r"
        SELECT status, duration_seconds, data_up_mb, data_down_mb,
               radius_session_id, ended_at IS NOT NULL AS ended
        FROM sessions
        WHERE mac_address = $1
        ",
    )
    .bind(&mac)
    .fetch_one(&pool)
    .await?;

    assert_eq!(row.get::<String, _>("status"), "expired");
    assert_eq!(row.get::<i64, _>("duration_seconds"), 120);
    assert!((row.get::<f64, _>("data_up_mb") - 1.0).abs() < f64::EPSILON);
    assert!((row.get::<f64, _>("data_down_mb") - 2.0).abs() < f64::EPSILON);
    assert_eq!(row.get::<Option<String>, _>("radius_session_id").as_deref(), Some("acct-0001"));
    assert!(row.get::<bool, _>("ended"));

    // A duplicate stop and a stop for an unknown address are both silent.
    service::record_accounting(&pool, &stop_event(&mac)).await?;
    service::record_accounting(&pool, &stop_event(&random_mac())).await?;

    let expired = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM sessions WHERE mac_address = $1 AND status = 'expired'",
    )
    .bind(&mac)
    .fetch_one(&pool)
    .await?;
    assert_eq!(expired, 1);

    Ok(())
}

#[tokio::test]
async fn non_stop_accounting_is_acknowledged_without_changes() -> Result<()> {
    let Some(pool) = test_pool().await? else {
        return Ok(());
    };

    let mac = random_mac();
    authenticate(&pool, &auth_request(&mac)).await?;

    for status_type in ["Start", "Interim-Update", "stop"] {
        let mut event = stop_event(&mac);
        event.acct_status_type = status_type.to_string();
        service::record_accounting(&pool, &event).await?;
    }

    let status = sqlx::query_scalar::<_, String>("SELECT status FROM sessions WHERE mac_address = $1")
        .bind(&mac)
        .fetch_one(&pool)
        .await?;
    assert_eq!(status, "active");

    Ok(())
}

#[tokio::test]
async fn disconnect_removes_authorization_and_closes_sessions() -> Result<()> {
    let Some(pool) = test_pool().await? else {
        return Ok(());
    };

    let mac = random_mac();
    authenticate(&pool, &auth_request(&mac)).await?;

    let before = service::authorization_status(&pool, &mac)
        .await
        .map_err(|err| anyhow!("{err:?}"))?;
    assert!(before.authorized);
    assert_eq!(before.username.as_deref(), Some(mac.as_str()));

    // Disconnect with a differently-formatted rendition of the same address.
    let shouty = mac.replace(':', "-").to_uppercase();
    let username = service::disconnect(&pool, &shouty)
        .await
        .map_err(|err| anyhow!("{err:?}"))?;
    assert_eq!(username, mac);

    for table in ["radcheck", "radreply", "radusergroup"] {
        assert_eq!(attribute_count(&pool, table, &mac).await?, 0);
    }

    let row = sqlx::query(
        "SELECT status, ended_at IS NOT NULL AS ended FROM sessions WHERE mac_address = $1",
    )
    .bind(&mac)
    .fetch_one(&pool)
    .await?;
    assert_eq!(row.get::<String, _>("status"), "disconnected");
    assert!(row.get::<bool, _>("ended"));

    let after = service::authorization_status(&pool, &mac)
        .await
        .map_err(|err| anyhow!("{err:?}"))?;
    assert!(!after.authorized);
    assert_eq!(after.username, None);

    Ok(())
}

#[tokio::test]
async fn missing_mac_is_rejected_before_any_write() -> Result<()> {
    let Some(pool) = test_pool().await? else {
        return Ok(());
    };

    // Empty and hex-free addresses both canonicalize to nothing.
    for raw in ["", "   ", "zz--!!"] {
        let result = service::authenticate_guest(&pool, &auth_request(raw)).await;
        assert!(
            matches!(result, Err(gastejo::provision::ProvisionError::MissingAddress)),
            "input {raw:?} should be rejected"
        );
    }

    // Nothing may exist under the empty canonical key those inputs map to.
    for table in ["guests", "sessions"] {
        let query = format!("SELECT COUNT(*) FROM {table} WHERE mac_address = ''");
        let rows = sqlx::query_scalar::<_, i64>(&query).fetch_one(&pool).await?;
        assert_eq!(rows, 0, "{table} must hold no rows for the empty address");
    }

    Ok(())
}

#[tokio::test]
async fn unknown_location_uses_fallback_policy() -> Result<()> {
    let Some(pool) = test_pool().await? else {
        return Ok(());
    };

    let mac = random_mac();
    let mut request = auth_request(&mac);
    request.location_id = Some(987_654_321);

    let response = authenticate(&pool, &request).await?;
    assert_eq!(response.session_timeout, 3600);
    assert_eq!(response.redirect_url, "");

    // Default policy grants no reply attributes, only the credential and
    // the group membership.
    assert_eq!(attribute_count(&pool, "radcheck", &mac).await?, 1);
    assert_eq!(attribute_count(&pool, "radreply", &mac).await?, 0);
    assert_eq!(attribute_count(&pool, "radusergroup", &mac).await?, 1);

    let nas_ip = sqlx::query_scalar::<_, String>("SELECT nas_ip FROM sessions WHERE mac_address = $1")
        .bind(&mac)
        .fetch_one(&pool)
        .await?;
    assert_eq!(nas_ip, "0.0.0.0");

    Ok(())
}

#[tokio::test]
async fn open_sessions_accumulate_until_closed() -> Result<()> {
    let Some(pool) = test_pool().await? else {
        return Ok(());
    };

    let mac = random_mac();
    authenticate(&pool, &auth_request(&mac)).await?;
    authenticate(&pool, &auth_request(&mac)).await?;

    // Re-provisioning never closes the earlier session; both stay active
    // until accounting or an administrator ends them.
    let active = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM sessions WHERE mac_address = $1 AND status = 'active'",
    )
    .bind(&mac)
    .fetch_one(&pool)
    .await?;
    assert_eq!(active, 2);

    service::record_accounting(&pool, &stop_event(&mac)).await?;

    let still_active = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM sessions WHERE mac_address = $1 AND status = 'active'",
    )
    .bind(&mac)
    .fetch_one(&pool)
    .await?;
    assert_eq!(still_active, 0);

    Ok(())
}
