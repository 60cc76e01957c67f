//! Administrative surface: bearer-token login and the dashboard API.
//!
//! Administrators authenticate with email + password and receive an opaque
//! bearer token; the database only ever stores the token's SHA-256 hash.
//! Every dashboard handler re-resolves the token on each request, so token
//! expiry and revocation take effect immediately.

use axum::{
    extract::{Extension, Path, Query},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::api::AdminBootstrap;
use crate::provision::{models::ProvisionError, service};

pub(crate) mod storage;
pub mod types;
mod utils;

use types::{
    AdminProfile, CreateLocationRequest, DisconnectResponse, GuestListQuery, GuestListResponse,
    LoginRequest, LoginResponse, SessionListQuery, StatsResponse, UpdateLocationRequest,
};

/// Bearer tokens expire a day after login; the dashboard re-authenticates.
const SESSION_TTL_SECONDS: i64 = 24 * 60 * 60;

const RECENT_GUESTS: i64 = 10;

/// The administrator resolved from a bearer token.
#[derive(Debug, Clone)]
pub(crate) struct AdminPrincipal {
    pub(crate) admin_id: Uuid,
    pub(crate) email: String,
    pub(crate) role: String,
}

/// Resolve the request's bearer token into a principal, or produce the
/// response that ends the request.
async fn authorize(
    pool: &PgPool,
    headers: &HeaderMap,
) -> Result<AdminPrincipal, axum::response::Response> {
    let Some(token) = utils::bearer_token(headers) else {
        return Err((StatusCode::UNAUTHORIZED, "Missing bearer token").into_response());
    };

    match storage::lookup_admin_session(pool, &utils::hash_admin_token(token)).await {
        Ok(Some(principal)) => Ok(principal),
        Ok(None) => Err((StatusCode::UNAUTHORIZED, "Invalid or expired token").into_response()),
        Err(err) => {
            error!("Admin session lookup failed: {err:#}");
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Authorization check failed").into_response())
        }
    }
}

/// Insert the bootstrap administrator on startup when configured and absent.
pub(crate) async fn bootstrap(pool: &PgPool, bootstrap: &AdminBootstrap) -> anyhow::Result<()> {
    let password_hash = utils::hash_password(bootstrap.password.expose_secret())?;

    if storage::ensure_admin(pool, &bootstrap.email, &password_hash).await? {
        info!(email = %bootstrap.email, "Created bootstrap administrator");
    }

    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/admin/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Bearer token issued", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Login failed")
    ),
    tag = "admin"
)]
pub async fn login(
    pool: Extension<PgPool>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload").into_response();
    };

    let account = match storage::lookup_admin_by_email(&pool, request.email.trim()).await {
        Ok(account) => account,
        Err(err) => {
            error!("Admin lookup failed: {err:#}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Login failed").into_response();
        }
    };

    // One rejection path for unknown email and wrong password.
    let Some(account) = account.filter(|a| utils::verify_password(&a.password_hash, &request.password))
    else {
        warn!(email = %request.email, "Rejected admin login");
        return (StatusCode::UNAUTHORIZED, "Invalid credentials").into_response();
    };

    let token = match utils::generate_admin_token() {
        Ok(token) => token,
        Err(err) => {
            error!("Admin token generation failed: {err:#}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Login failed").into_response();
        }
    };

    if let Err(err) = storage::insert_admin_session(
        &pool,
        account.id,
        &utils::hash_admin_token(&token),
        SESSION_TTL_SECONDS,
    )
    .await
    {
        error!("Admin session insert failed: {err:#}");
        return (StatusCode::INTERNAL_SERVER_ERROR, "Login failed").into_response();
    }

    info!(email = %account.email, "Admin logged in");

    let response = LoginResponse {
        token,
        admin: AdminProfile {
            id: account.id.to_string(),
            email: account.email,
            name: account.name,
            role: account.role,
        },
    };

    (StatusCode::OK, Json(response)).into_response()
}

#[utoipa::path(
    get,
    path = "/api/admin/stats",
    responses(
        (status = 200, description = "Dashboard totals and recent guests", body = StatsResponse),
        (status = 401, description = "Missing or invalid bearer token")
    ),
    tag = "admin"
)]
pub async fn stats(pool: Extension<PgPool>, headers: HeaderMap) -> impl IntoResponse {
    if let Err(response) = authorize(&pool, &headers).await {
        return response;
    }

    let counts = match storage::dashboard_counts(&pool).await {
        Ok(counts) => counts,
        Err(err) => {
            error!("Dashboard counts failed: {err:#}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to load stats").into_response();
        }
    };

    let recent_guests = match storage::recent_guests(&pool, RECENT_GUESTS).await {
        Ok(guests) => guests,
        Err(err) => {
            error!("Recent guest listing failed: {err:#}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to load stats").into_response();
        }
    };

    let response = StatsResponse {
        total_guests: counts.total_guests,
        total_sessions: counts.total_sessions,
        active_sessions: counts.active_sessions,
        total_locations: counts.total_locations,
        today_guests: counts.today_guests,
        recent_guests,
    };

    (StatusCode::OK, Json(response)).into_response()
}

#[utoipa::path(
    get,
    path = "/api/admin/guests",
    params(GuestListQuery),
    responses(
        (status = 200, description = "Paginated guest listing", body = GuestListResponse),
        (status = 401, description = "Missing or invalid bearer token")
    ),
    tag = "admin"
)]
pub async fn guests(
    pool: Extension<PgPool>,
    headers: HeaderMap,
    Query(query): Query<GuestListQuery>,
) -> impl IntoResponse {
    if let Err(response) = authorize(&pool, &headers).await {
        return response;
    }

    let (page, limit, offset) = types::page_window(query.page, query.limit);
    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|term| !term.is_empty());

    match storage::list_guests(&pool, search, limit, offset).await {
        Ok((guests, total)) => {
            let response = GuestListResponse {
                guests,
                total,
                page,
                pages: (total + limit - 1) / limit,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => {
            error!("Guest listing failed: {err:#}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to list guests").into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/admin/sessions",
    params(SessionListQuery),
    responses(
        (status = 200, description = "Paginated session listing", body = [types::SessionSummary]),
        (status = 401, description = "Missing or invalid bearer token")
    ),
    tag = "admin"
)]
pub async fn sessions(
    pool: Extension<PgPool>,
    headers: HeaderMap,
    Query(query): Query<SessionListQuery>,
) -> impl IntoResponse {
    if let Err(response) = authorize(&pool, &headers).await {
        return response;
    }

    let (_, limit, offset) = types::page_window(query.page, query.limit);
    // Anything that is not a known state ("all" included) means no filter.
    let status = query
        .status
        .as_deref()
        .and_then(crate::provision::SessionStatus::parse)
        .map(crate::provision::SessionStatus::as_str);

    match storage::list_sessions(&pool, status, limit, offset).await {
        Ok(sessions) => (StatusCode::OK, Json(sessions)).into_response(),
        Err(err) => {
            error!("Session listing failed: {err:#}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to list sessions").into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/admin/locations",
    responses(
        (status = 200, description = "All locations", body = [types::LocationResponse]),
        (status = 401, description = "Missing or invalid bearer token")
    ),
    tag = "admin"
)]
pub async fn locations(pool: Extension<PgPool>, headers: HeaderMap) -> impl IntoResponse {
    if let Err(response) = authorize(&pool, &headers).await {
        return response;
    }

    match storage::list_locations(&pool).await {
        Ok(locations) => (StatusCode::OK, Json(locations)).into_response(),
        Err(err) => {
            error!("Location listing failed: {err:#}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to list locations").into_response()
        }
    }
}

fn invalid_location_urls(urls: &[Option<&str>]) -> bool {
    urls.iter().any(|url| !utils::valid_optional_url(*url))
}

#[utoipa::path(
    post,
    path = "/api/admin/locations",
    request_body = CreateLocationRequest,
    responses(
        (status = 201, description = "Location created", body = types::LocationResponse),
        (status = 400, description = "Invalid location payload"),
        (status = 401, description = "Missing or invalid bearer token")
    ),
    tag = "admin"
)]
pub async fn create_location(
    pool: Extension<PgPool>,
    headers: HeaderMap,
    payload: Option<Json<CreateLocationRequest>>,
) -> impl IntoResponse {
    if let Err(response) = authorize(&pool, &headers).await {
        return response;
    }

    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload").into_response();
    };

    if request.name.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "Location name is required").into_response();
    }

    if invalid_location_urls(&[
        request.redirect_url.as_deref(),
        request.terms_url.as_deref(),
        request.logo_url.as_deref(),
    ]) {
        return (StatusCode::BAD_REQUEST, "Invalid URL").into_response();
    }

    match storage::create_location(&pool, &request).await {
        Ok(location) => (StatusCode::CREATED, Json(location)).into_response(),
        Err(err) => {
            error!("Location create failed: {err:#}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to create location").into_response()
        }
    }
}

#[utoipa::path(
    put,
    path = "/api/admin/locations/{id}",
    params(("id" = i64, Path, description = "Location id")),
    request_body = UpdateLocationRequest,
    responses(
        (status = 200, description = "Location updated", body = types::LocationResponse),
        (status = 400, description = "Invalid location payload"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "Location not found")
    ),
    tag = "admin"
)]
pub async fn update_location(
    pool: Extension<PgPool>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    payload: Option<Json<UpdateLocationRequest>>,
) -> impl IntoResponse {
    if let Err(response) = authorize(&pool, &headers).await {
        return response;
    }

    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload").into_response();
    };

    if invalid_location_urls(&[
        request.redirect_url.as_deref(),
        request.terms_url.as_deref(),
        request.logo_url.as_deref(),
    ]) {
        return (StatusCode::BAD_REQUEST, "Invalid URL").into_response();
    }

    match storage::update_location(&pool, id, &request).await {
        Ok(Some(location)) => (StatusCode::OK, Json(location)).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Location not found").into_response(),
        Err(err) => {
            error!("Location update failed: {err:#}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to update location").into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/admin/disconnect/{mac}",
    params(("mac" = String, Path, description = "Hardware address, any separator style")),
    responses(
        (status = 200, description = "Authorization removed, active sessions closed", body = DisconnectResponse),
        (status = 400, description = "Missing hardware address"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 500, description = "Disconnect failed")
    ),
    tag = "admin"
)]
pub async fn disconnect(
    pool: Extension<PgPool>,
    headers: HeaderMap,
    Path(mac): Path<String>,
) -> impl IntoResponse {
    let principal = match authorize(&pool, &headers).await {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    match service::disconnect(&pool, &mac).await {
        Ok(username) => {
            info!(admin = %principal.email, %username, "Administrative disconnect");
            let response = DisconnectResponse {
                message: format!("Disconnected {username}"),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(ProvisionError::MissingAddress) => {
            (StatusCode::BAD_REQUEST, "MAC address is required").into_response()
        }
        Err(ProvisionError::Internal(err)) => {
            // Admin failure wording stays distinct from the guest-facing
            // "Authentication failed".
            error!("Disconnect failed: {err:#}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Disconnect failed").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_batch_validation_flags_any_bad_entry() {
        assert!(!invalid_location_urls(&[None, Some(""), Some("https://example.com")]));
        assert!(invalid_location_urls(&[
            Some("https://example.com"),
            Some("not a url"),
            None
        ]));
    }
}
