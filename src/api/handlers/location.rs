//! Public splash-page branding lookup.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use sqlx::{PgPool, Row};
use tracing::{error, Instrument};
use utoipa::ToSchema;

/// Branding subset of a Location; safe to expose without authentication.
#[derive(Debug, Serialize, ToSchema)]
pub struct SplashLocation {
    pub id: i64,
    pub name: String,
    pub ssid: String,
    pub splash_message: String,
    pub redirect_url: String,
    pub terms_url: String,
    pub logo_url: String,
}

#[utoipa::path(
    get,
    path = "/api/location/{id}",
    params(("id" = i64, Path, description = "Location id from the NAS redirect")),
    responses(
        (status = 200, description = "Splash-page branding", body = SplashLocation),
        (status = 404, description = "Location not found")
    ),
    tag = "portal"
)]
pub async fn splash(Path(id): Path<i64>, pool: Extension<PgPool>) -> impl IntoResponse {
    let query = r"
        SELECT id, name, ssid, splash_message, redirect_url, terms_url, logo_url
        FROM locations
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );

    match sqlx::query(query)
        .bind(id)
        .fetch_optional(&pool.0)
        .instrument(span)
        .await
    {
        Ok(Some(row)) => {
            let location = SplashLocation {
                id: row.get("id"),
                name: row.get("name"),
                ssid: row.get("ssid"),
                splash_message: row.get("splash_message"),
                redirect_url: row.get("redirect_url"),
                terms_url: row.get("terms_url"),
                logo_url: row.get("logo_url"),
            };
            (StatusCode::OK, Json(location)).into_response()
        }
        Ok(None) => (StatusCode::NOT_FOUND, "Location not found").into_response(),
        Err(err) => {
            error!("Failed to fetch location: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch location").into_response()
        }
    }
}
