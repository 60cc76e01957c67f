//! Location policy resolution.
//!
//! Every fallback the engine applies lives here, resolved once per
//! provisioning request; both the authorization provisioner and the response
//! builder consume the same resolved struct.

/// RADIUS reply-attribute names the provisioner emits.
pub const ATTR_SESSION_TIMEOUT: &str = "Session-Timeout";
pub const ATTR_IDLE_TIMEOUT: &str = "Idle-Timeout";
pub const ATTR_BANDWIDTH_DOWN: &str = "WISPr-Bandwidth-Max-Down";
pub const ATTR_BANDWIDTH_UP: &str = "WISPr-Bandwidth-Max-Up";

/// Group every provisioned address is placed in.
pub const GUEST_GROUP: &str = "guests";
pub const GUEST_GROUP_PRIORITY: i32 = 1;

/// Session timeout returned to the portal when the Location does not set one.
pub const FALLBACK_SESSION_TIMEOUT: i64 = 3600;

const FALLBACK_NAS_IP: &str = "0.0.0.0";

/// Raw Location policy columns as read from storage.
#[derive(Debug, Clone, Default)]
pub struct LocationRow {
    pub nas_ip: Option<String>,
    pub session_timeout: Option<i64>,
    pub idle_timeout: Option<i64>,
    pub bandwidth_limit_up: Option<i64>,
    pub bandwidth_limit_down: Option<i64>,
    pub redirect_url: Option<String>,
}

/// A fully-resolved access policy with all defaults applied.
///
/// Timeouts and bandwidth ceilings are `Some` only when positive; a zero or
/// missing value means "do not emit that reply attribute".
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    pub nas_ip: String,
    pub session_timeout: Option<i64>,
    pub idle_timeout: Option<i64>,
    pub bandwidth_up_kbps: Option<i64>,
    pub bandwidth_down_kbps: Option<i64>,
    pub redirect_url: String,
}

impl AccessPolicy {
    /// Resolve a Location lookup result into a complete policy. A lookup
    /// miss is not an error; it yields the default policy with fallback
    /// timeouts and no bandwidth caps.
    pub fn resolve(row: Option<LocationRow>) -> Self {
        let row = row.unwrap_or_default();

        Self {
            nas_ip: row
                .nas_ip
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| FALLBACK_NAS_IP.to_string()),
            session_timeout: row.session_timeout.filter(|value| *value > 0),
            idle_timeout: row.idle_timeout.filter(|value| *value > 0),
            bandwidth_up_kbps: row.bandwidth_limit_up.filter(|value| *value > 0),
            bandwidth_down_kbps: row.bandwidth_limit_down.filter(|value| *value > 0),
            redirect_url: row.redirect_url.unwrap_or_default(),
        }
    }

    /// Session timeout reported to the portal, with the fixed fallback when
    /// the Location leaves it unset.
    #[must_use]
    pub fn effective_session_timeout(&self) -> i64 {
        self.session_timeout.unwrap_or(FALLBACK_SESSION_TIMEOUT)
    }

    /// Derive the reply-attribute set for this policy. Bandwidth ceilings are
    /// configured in kbit/s and emitted in bit/s as WISPr expects.
    #[must_use]
    pub fn reply_attributes(&self) -> Vec<(&'static str, String)> {
        let mut attributes = Vec::with_capacity(4);

        if let Some(timeout) = self.session_timeout {
            attributes.push((ATTR_SESSION_TIMEOUT, timeout.to_string()));
        }
        if let Some(timeout) = self.idle_timeout {
            attributes.push((ATTR_IDLE_TIMEOUT, timeout.to_string()));
        }
        if let Some(kbps) = self.bandwidth_down_kbps {
            attributes.push((ATTR_BANDWIDTH_DOWN, (kbps * 1000).to_string()));
        }
        if let Some(kbps) = self.bandwidth_up_kbps {
            attributes.push((ATTR_BANDWIDTH_UP, (kbps * 1000).to_string()));
        }

        attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_miss_resolves_to_defaults() {
        let policy = AccessPolicy::resolve(None);

        assert_eq!(policy.nas_ip, "0.0.0.0");
        assert_eq!(policy.session_timeout, None);
        assert_eq!(policy.effective_session_timeout(), 3600);
        assert_eq!(policy.redirect_url, "");
        assert!(policy.reply_attributes().is_empty());
    }

    #[test]
    fn zero_limits_emit_no_attributes() {
        let policy = AccessPolicy::resolve(Some(LocationRow {
            session_timeout: Some(0),
            idle_timeout: Some(0),
            bandwidth_limit_up: Some(0),
            bandwidth_limit_down: Some(0),
            ..LocationRow::default()
        }));

        assert!(policy.reply_attributes().is_empty());
        assert_eq!(policy.effective_session_timeout(), 3600);
    }

    #[test]
    fn configured_location_drives_attribute_values() {
        let policy = AccessPolicy::resolve(Some(LocationRow {
            nas_ip: Some("10.0.0.1".to_string()),
            session_timeout: Some(1800),
            idle_timeout: None,
            bandwidth_limit_up: None,
            bandwidth_limit_down: Some(512),
            redirect_url: Some("https://example.com/welcome".to_string()),
        }));

        assert_eq!(policy.effective_session_timeout(), 1800);
        assert_eq!(
            policy.reply_attributes(),
            vec![
                (ATTR_SESSION_TIMEOUT, "1800".to_string()),
                (ATTR_BANDWIDTH_DOWN, "512000".to_string()),
            ]
        );
        assert_eq!(policy.redirect_url, "https://example.com/welcome");
    }

    #[test]
    fn bandwidth_is_converted_from_kbps_to_bps() {
        let policy = AccessPolicy::resolve(Some(LocationRow {
            bandwidth_limit_up: Some(2048),
            bandwidth_limit_down: Some(10240),
            ..LocationRow::default()
        }));

        let attributes = policy.reply_attributes();
        assert!(attributes.contains(&(ATTR_BANDWIDTH_UP, "2048000".to_string())));
        assert!(attributes.contains(&(ATTR_BANDWIDTH_DOWN, "10240000".to_string())));
    }
}
