//! Wire and domain types for the provisioning engine.

use axum::{http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

/// How the guest identified themselves on the splash page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum AuthMethod {
    #[default]
    Email,
    Phone,
    ClickThrough,
}

impl AuthMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Phone => "phone",
            Self::ClickThrough => "click-through",
        }
    }
}

/// Session lifecycle states. `Active` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Active,
    Disconnected,
    Expired,
}

impl SessionStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Disconnected => "disconnected",
            Self::Expired => "expired",
        }
    }

    /// Parse an admin filter value. `None` for anything that is not a state.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "disconnected" => Some(Self::Disconnected),
            "expired" => Some(Self::Expired),
            _ => None,
        }
    }
}

/// Portal authentication request, field names matching the splash-page form
/// and the NAS redirect parameters.
#[derive(Debug, Deserialize, ToSchema)]
pub struct GuestAuthRequest {
    /// Raw hardware address as the NAS redirect delivered it.
    #[serde(default)]
    pub mac_address: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub auth_method: AuthMethod,
    pub location_id: Option<i64>,
    /// Access-point address from the redirect parameters; recorded for
    /// wire-contract parity, not used for provisioning.
    pub ap_mac: Option<String>,
    /// NAS login URL the portal bounces the guest back to.
    pub login_url: Option<String>,
}

/// Credentials and policy handed back to the portal on success.
#[derive(Debug, Serialize, ToSchema)]
pub struct GuestAuthResponse {
    /// Canonical hardware address; doubles as the RADIUS username.
    pub username: String,
    /// Plaintext one-time secret the NAS submits over PAP.
    pub password: String,
    pub session_timeout: i64,
    pub redirect_url: String,
}

/// Result of an authorization lookup for one hardware address.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthorizationStatus {
    pub authorized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Accounting webhook payload from the network infrastructure.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AccountingEvent {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub acct_status_type: String,
    pub session_id: Option<String>,
    pub session_time: Option<i64>,
    pub input_octets: Option<i64>,
    pub output_octets: Option<i64>,
}

impl AccountingEvent {
    /// Only stop records mutate session state; everything else is
    /// acknowledged and dropped.
    #[must_use]
    pub fn is_stop(&self) -> bool {
        self.acct_status_type == "Stop"
    }
}

/// Engine failure taxonomy at the orchestrator boundary.
///
/// Storage detail never reaches the guest-facing caller; it is logged here
/// and collapsed into one opaque failure outcome.
#[derive(Debug)]
pub enum ProvisionError {
    /// The request carried no usable hardware address. Reported before any
    /// storage access.
    MissingAddress,
    /// Any storage or internal failure inside the provisioning unit of work.
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for ProvisionError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

impl IntoResponse for ProvisionError {
    fn into_response(self) -> axum::response::Response {
        match self {
            Self::MissingAddress => {
                (StatusCode::BAD_REQUEST, "MAC address is required").into_response()
            }
            Self::Internal(err) => {
                error!("Guest provisioning failed: {err:#}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Authentication failed").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_method_uses_kebab_case_on_the_wire() {
        let method: AuthMethod = serde_json::from_str("\"click-through\"").expect("deserialize");
        assert_eq!(method, AuthMethod::ClickThrough);
        assert_eq!(method.as_str(), "click-through");
    }

    #[test]
    fn auth_method_defaults_to_email() {
        let request: GuestAuthRequest =
            serde_json::from_str(r#"{"mac_address": "aa"}"#).expect("deserialize");
        assert_eq!(request.auth_method, AuthMethod::Email);
    }

    #[test]
    fn missing_mac_address_deserializes_to_empty() {
        let request: GuestAuthRequest = serde_json::from_str("{}").expect("deserialize");
        assert_eq!(request.mac_address, "");
    }

    #[test]
    fn only_literal_stop_is_a_stop_event() {
        let stop: AccountingEvent =
            serde_json::from_str(r#"{"username": "aa", "acct_status_type": "Stop"}"#)
                .expect("deserialize");
        assert!(stop.is_stop());

        for other in ["Start", "Interim-Update", "stop", ""] {
            let event = AccountingEvent {
                username: String::new(),
                acct_status_type: other.to_string(),
                session_id: None,
                session_time: None,
                input_octets: None,
                output_octets: None,
            };
            assert!(!event.is_stop(), "status type: {other:?}");
        }
    }

    #[test]
    fn session_status_round_trips_through_parse() {
        for status in [
            SessionStatus::Active,
            SessionStatus::Disconnected,
            SessionStatus::Expired,
        ] {
            assert_eq!(SessionStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(SessionStatus::parse("all"), None);
    }
}
