// src/client/types.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Bearer token returned by the panel's token endpoint. Replaced wholesale
/// when the session re-authenticates, never field-by-field.
#[derive(Debug, Clone, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
}

impl Token {
    /// `Authorization` header value: `<token_type> <access_token>`.
    pub(crate) fn header_value(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}

/// Admin credentials held by a [`Session`](super::Session) for the whole of
/// its lifetime. The password is never logged or serialized.
///
/// [`Session`]: super::Session
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// User status values recognized by the panel. `add_user` only accepts
/// [`ACTIVE`](status::ACTIVE) and [`ON_HOLD`](status::ON_HOLD); the rest are
/// states the server assigns on its own.
pub mod status {
    pub const ACTIVE: &str = "active";
    pub const ON_HOLD: &str = "on_hold";
    pub const DISABLED: &str = "disabled";
    pub const LIMITED: &str = "limited";
    pub const EXPIRED: &str = "expired";
}

pub mod data_limit_reset_strategy {
    pub const NO_RESET: &str = "no_reset";
    pub const DAY: &str = "day";
    pub const WEEK: &str = "week";
    pub const MONTH: &str = "month";
    pub const YEAR: &str = "year";
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VlessSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShadowsocksSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Proxies {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vless: Option<VlessSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadowsocks: Option<ShadowsocksSettings>,
}

/// A panel user. Every field is optional because the same shape is used both
/// for requests (sparse) and responses (server fills in what it knows).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxies: Option<Proxies>,
    /// Protocol name to inbound tags.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inbounds: Option<HashMap<String, Vec<String>>>,
    /// UTC timestamp; 0 or absent means never.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire: Option<u64>,
    /// Bytes; 0 or absent means unlimited.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_limit_reset_strategy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_updated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_last_user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub online_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_hold_expire_duration: Option<u64>,
    /// Date-time string, e.g. `2023-11-03T20:30:00`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_hold_timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_delete_in_days: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_traffic: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lifetime_used_traffic: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excluded_inbounds: Option<HashMap<String, Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin: Option<Admin>,
}

/// Page of users returned by the listing endpoint.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Users {
    pub users: Vec<User>,
    #[serde(default)]
    pub total: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Admin {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Only meaningful when creating or modifying an admin; the server never
    /// echoes it back.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_sudo: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telegram_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discord_webhook: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users_usage: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Host {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sni: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alpn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowinsecure: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_disabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mux_enable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_sni_as_host: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub random_user_agent: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noise_setting: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fragment_setting: Option<String>,
}

/// Inbound tag to its hosts, keyed the way the panel stores them.
pub type Hosts = HashMap<String, Vec<Host>>;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Inbound {
    pub tag: String,
    pub protocol: String,
    pub network: String,
    pub tls: String,
    pub port: Option<serde_json::Value>,
}

/// Protocol name to its configured inbounds.
pub type Inbounds = HashMap<String, Vec<Inbound>>;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SystemStats {
    pub version: Option<String>,
    pub mem_total: Option<u64>,
    pub mem_used: Option<u64>,
    pub cpu_cores: Option<u64>,
    pub cpu_usage: Option<f64>,
    pub total_user: Option<u64>,
    pub users_active: Option<u64>,
    pub users_on_hold: Option<u64>,
    pub users_disabled: Option<u64>,
    pub users_expired: Option<u64>,
    pub users_limited: Option<u64>,
    pub online_users: Option<u64>,
    pub incoming_bandwidth: Option<u64>,
    pub outgoing_bandwidth: Option<u64>,
    pub incoming_bandwidth_speed: Option<u64>,
    pub outgoing_bandwidth_speed: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct NodeUsage {
    pub node_id: Option<u64>,
    pub node_name: Option<String>,
    pub used_traffic: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UserUsage {
    pub username: String,
    #[serde(default)]
    pub usages: Vec<NodeUsage>,
}

/// Optional filters for the user listing endpoint. Query parameters are
/// emitted in a fixed order: limit, offset, sort, status, then one
/// `username` pair per entry.
#[derive(Debug, Clone, Default)]
pub struct ListUsersParams {
    pub offset: Option<u64>,
    pub limit: Option<u64>,
    pub username: Vec<String>,
    pub status: Option<String>,
    pub sort: Option<String>,
}

/// Optional filters for the admin listing endpoint; emitted as limit,
/// offset, then repeated `username` pairs.
#[derive(Debug, Clone, Default)]
pub struct ListAdminsParams {
    pub offset: Option<u64>,
    pub limit: Option<u64>,
    pub username: Vec<String>,
}

/// Time window for the expired-users endpoints.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpiredUsersParams {
    pub before: Option<DateTime<Utc>>,
    pub after: Option<DateTime<Utc>>,
}
