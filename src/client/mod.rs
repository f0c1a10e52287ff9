// src/client/mod.rs

// Declare modules
pub mod implementation;
pub mod interface;
pub mod session;
pub mod types;
pub mod util;

#[cfg(test)]
mod session_tests;

// Re-export public API
pub use self::implementation::ApiClient;
pub use self::interface::MarzbanApi;
pub use self::session::Session;

pub use self::types::{
    Admin, Credentials, ExpiredUsersParams, Host, Hosts, Inbound, Inbounds, ListAdminsParams,
    ListUsersParams, NodeUsage, Proxies, ShadowsocksSettings, SystemStats, Token, User, UserUsage,
    Users, VlessSettings,
};
