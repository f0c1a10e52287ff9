// src/lib.rs

// Declare modules
pub mod client;
pub mod error;

// Re-export the surface most callers need
pub use client::{
    Admin, ApiClient, Credentials, ExpiredUsersParams, Host, Hosts, Inbounds, ListAdminsParams,
    ListUsersParams, MarzbanApi, Session, SystemStats, Token, User, UserUsage, Users,
};
pub use error::{ApiError, RawResponse};
