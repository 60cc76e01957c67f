//! Portal-facing guest endpoints.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use sqlx::PgPool;
use tracing::error;

use crate::provision::{
    models::{GuestAuthRequest, ProvisionError},
    service,
};

#[utoipa::path(
    post,
    path = "/api/auth/guest",
    request_body = GuestAuthRequest,
    responses(
        (status = 200, description = "Guest provisioned, RADIUS credentials returned", body = crate::provision::GuestAuthResponse),
        (status = 400, description = "Missing hardware address"),
        (status = 500, description = "Authentication failed")
    ),
    tag = "portal"
)]
pub async fn authenticate(
    pool: Extension<PgPool>,
    payload: Option<Json<GuestAuthRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload").into_response();
    };

    match service::authenticate_guest(&pool, &request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/auth/status/{mac}",
    params(("mac" = String, Path, description = "Hardware address, any separator style")),
    responses(
        (status = 200, description = "Authorization state for the address", body = crate::provision::AuthorizationStatus)
    ),
    tag = "portal"
)]
pub async fn status(Path(mac): Path<String>, pool: Extension<PgPool>) -> impl IntoResponse {
    match service::authorization_status(&pool, &mac).await {
        Ok(status) => (StatusCode::OK, Json(status)).into_response(),
        Err(ProvisionError::Internal(err)) => {
            error!("Authorization status check failed: {err:#}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Status check failed").into_response()
        }
        Err(err) => err.into_response(),
    }
}
