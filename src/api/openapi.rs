//! OpenAPI document served through Swagger UI.

use utoipa::OpenApi;

use crate::api::handlers::{accounting, admin, guest, health, location};
use crate::provision::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        guest::authenticate,
        guest::status,
        location::splash,
        accounting::accounting,
        admin::login,
        admin::stats,
        admin::guests,
        admin::sessions,
        admin::locations,
        admin::create_location,
        admin::update_location,
        admin::disconnect,
        health::health,
    ),
    components(schemas(
        models::AuthMethod,
        models::GuestAuthRequest,
        models::GuestAuthResponse,
        models::AuthorizationStatus,
        models::AccountingEvent,
        location::SplashLocation,
        admin::types::LoginRequest,
        admin::types::LoginResponse,
        admin::types::AdminProfile,
        admin::types::StatsResponse,
        admin::types::GuestSummary,
        admin::types::GuestListResponse,
        admin::types::SessionSummary,
        admin::types::CreateLocationRequest,
        admin::types::UpdateLocationRequest,
        admin::types::LocationResponse,
        admin::types::DisconnectResponse,
        health::Health,
    )),
    tags(
        (name = "portal", description = "Captive-portal guest provisioning"),
        (name = "infrastructure", description = "RADIUS accounting webhook"),
        (name = "admin", description = "Dashboard API, bearer-token authenticated"),
        (name = "health", description = "Service health")
    )
)]
pub(crate) struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_covers_every_route() {
        let doc = ApiDoc::openapi();

        for path in [
            "/api/auth/guest",
            "/api/auth/status/{mac}",
            "/api/location/{id}",
            "/api/radius/accounting",
            "/api/admin/login",
            "/api/admin/stats",
            "/api/admin/guests",
            "/api/admin/sessions",
            "/api/admin/locations",
            "/api/admin/locations/{id}",
            "/api/admin/disconnect/{mac}",
            "/health",
        ] {
            assert!(
                doc.paths.paths.contains_key(path),
                "missing path in OpenAPI document: {path}"
            );
        }
    }
}
