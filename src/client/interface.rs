// src/client/interface.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::ApiError;

use super::types::{
    Admin, ExpiredUsersParams, Hosts, Inbounds, ListAdminsParams, ListUsersParams, SystemStats,
    Token, User, UserUsage, Users,
};

/// The panel's operation set, implemented by [`ApiClient`] directly and by
/// [`Session`] with transparent re-authentication layered on top. Having the
/// trait at this seam also allows mocking the whole API in tests.
///
/// [`ApiClient`]: super::ApiClient
/// [`Session`]: super::Session
#[async_trait]
pub trait MarzbanApi: Send + Sync {
    /// Replaces the stored bearer token wholesale.
    fn set_token(&self, token: Token);

    // Admins
    async fn current_admin(&self) -> Result<Admin, ApiError>;
    async fn create_admin(&self, admin: &Admin) -> Result<Admin, ApiError>;
    async fn modify_admin(&self, username: &str, admin: &Admin) -> Result<Admin, ApiError>;
    async fn remove_admin(&self, username: &str) -> Result<(), ApiError>;
    async fn admins(&self, params: &ListAdminsParams) -> Result<Vec<Admin>, ApiError>;

    // System
    async fn system_stats(&self) -> Result<SystemStats, ApiError>;
    async fn inbounds(&self) -> Result<Inbounds, ApiError>;
    async fn hosts(&self) -> Result<Hosts, ApiError>;
    async fn modify_hosts(&self, hosts: &Hosts) -> Result<Hosts, ApiError>;

    // Users
    async fn add_user(&self, user: &User) -> Result<User, ApiError>;
    async fn user(&self, username: &str) -> Result<User, ApiError>;
    async fn modify_user(&self, username: &str, user: &User) -> Result<User, ApiError>;
    async fn remove_user(&self, username: &str) -> Result<(), ApiError>;
    async fn reset_user_data_usage(&self, username: &str) -> Result<User, ApiError>;
    async fn revoke_subscription(&self, username: &str) -> Result<User, ApiError>;
    async fn users(&self, params: &ListUsersParams) -> Result<Users, ApiError>;
    async fn reset_users_data_usage(&self) -> Result<(), ApiError>;
    async fn user_usage(
        &self,
        username: &str,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Result<UserUsage, ApiError>;
    async fn set_owner(&self, username: &str, admin_username: &str) -> Result<User, ApiError>;
    async fn expired_users(&self, params: &ExpiredUsersParams) -> Result<Vec<String>, ApiError>;
    async fn delete_expired_users(
        &self,
        params: &ExpiredUsersParams,
    ) -> Result<Vec<String>, ApiError>;
}
