//! Request/response types for the admin dashboard API.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Hard ceiling on page size so a dashboard query cannot scan the world.
pub(super) const MAX_PAGE_SIZE: i64 = 100;
const DEFAULT_PAGE_SIZE: i64 = 25;

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub admin: AdminProfile,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct GuestListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// Substring match over email, phone, name, and hardware address.
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SessionListQuery {
    /// `active`, `disconnected`, `expired`, or `all` (default).
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GuestSummary {
    pub id: String,
    pub mac_address: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub name: Option<String>,
    pub auth_method: String,
    pub location_id: i64,
    pub location_name: Option<String>,
    pub visit_count: i64,
    pub created_at: String,
    pub last_seen: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GuestListResponse {
    pub guests: Vec<GuestSummary>,
    pub total: i64,
    pub page: i64,
    pub pages: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionSummary {
    pub id: String,
    pub mac_address: String,
    pub nas_ip: String,
    pub status: String,
    pub started_at: String,
    pub ended_at: Option<String>,
    pub duration_seconds: i64,
    pub data_up_mb: f64,
    pub data_down_mb: f64,
    pub radius_session_id: Option<String>,
    pub location_id: i64,
    pub location_name: Option<String>,
    pub guest_email: Option<String>,
    pub guest_phone: Option<String>,
    pub guest_name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    pub total_guests: i64,
    pub total_sessions: i64,
    pub active_sessions: i64,
    pub total_locations: i64,
    pub today_guests: i64,
    pub recent_guests: Vec<GuestSummary>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLocationRequest {
    pub name: String,
    pub address: Option<String>,
    pub ssid: Option<String>,
    pub nas_ip: Option<String>,
    pub bandwidth_limit_up: Option<i64>,
    pub bandwidth_limit_down: Option<i64>,
    pub session_timeout: Option<i64>,
    pub idle_timeout: Option<i64>,
    pub daily_data_limit_mb: Option<i64>,
    pub daily_time_limit_seconds: Option<i64>,
    pub splash_message: Option<String>,
    pub redirect_url: Option<String>,
    pub terms_url: Option<String>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateLocationRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub ssid: Option<String>,
    pub nas_ip: Option<String>,
    pub bandwidth_limit_up: Option<i64>,
    pub bandwidth_limit_down: Option<i64>,
    pub session_timeout: Option<i64>,
    pub idle_timeout: Option<i64>,
    pub daily_data_limit_mb: Option<i64>,
    pub daily_time_limit_seconds: Option<i64>,
    pub splash_message: Option<String>,
    pub redirect_url: Option<String>,
    pub terms_url: Option<String>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LocationResponse {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub ssid: String,
    pub nas_ip: String,
    pub bandwidth_limit_up: i64,
    pub bandwidth_limit_down: i64,
    pub session_timeout: i64,
    pub idle_timeout: i64,
    pub daily_data_limit_mb: i64,
    pub daily_time_limit_seconds: i64,
    pub splash_message: String,
    pub redirect_url: String,
    pub terms_url: String,
    pub logo_url: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DisconnectResponse {
    pub message: String,
}

/// Normalize raw pagination parameters into (page, limit, offset).
pub(super) fn page_window(page: Option<i64>, limit: Option<i64>) -> (i64, i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    (page, limit, (page - 1) * limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_window_defaults() {
        assert_eq!(page_window(None, None), (1, 25, 0));
    }

    #[test]
    fn page_window_clamps_abuse() {
        assert_eq!(page_window(Some(0), Some(0)), (1, 1, 0));
        assert_eq!(page_window(Some(-3), Some(10_000)), (1, 100, 0));
    }

    #[test]
    fn page_window_computes_offset() {
        assert_eq!(page_window(Some(3), Some(25)), (3, 25, 50));
    }
}
