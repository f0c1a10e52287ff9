// src/client/session.rs

use std::future::Future;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client as ReqwestClient, Url};

use crate::error::ApiError;

use super::implementation::ApiClient;
use super::interface::MarzbanApi;
use super::types::{
    Admin, Credentials, ExpiredUsersParams, Hosts, Inbounds, ListAdminsParams, ListUsersParams,
    SystemStats, Token, User, UserUsage, Users,
};

/// Authenticated session over an [`ApiClient`].
///
/// Bearer tokens issued by the panel expire server-side without warning; the
/// first sign is a 401 on an otherwise valid call. `Session` keeps the login
/// credentials for its whole lifetime and absorbs that case: on a 401 it
/// re-authenticates once, swaps the stored token, and repeats the original
/// call once. Nothing else is ever retried, so a revoked account yields a
/// clean `Unauthorized` instead of a login loop, and transport or validation
/// errors pass straight through.
pub struct Session {
    api: ApiClient,
    credentials: Credentials,
}

impl Session {
    /// Logs in and returns a ready-to-use session. A failed login is
    /// terminal [`ApiError::Auth`]; no retry is attempted on the token
    /// endpoint itself.
    pub async fn connect(
        http: ReqwestClient,
        base_url: Url,
        credentials: Credentials,
    ) -> Result<Self, ApiError> {
        let token = ApiClient::issue_token(&http, &base_url, &credentials).await?;
        tracing::info!(target: "marzban_client::client::session", username = %credentials.username, "authenticated");

        Ok(Self {
            api: ApiClient::new(http, base_url, token),
            credentials,
        })
    }

    /// Wraps an existing client, e.g. one seeded with a known-good token.
    pub fn from_client(api: ApiClient, credentials: Credentials) -> Self {
        Self { api, credentials }
    }

    /// Runs `op`; on `Unauthorized` re-authenticates exactly once and runs
    /// `op` exactly once more, returning whatever the second attempt yields.
    async fn with_reauth<T, F, Fut>(&self, op: F) -> Result<T, ApiError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        match op().await {
            Err(err) if err.is_unauthorized() => {
                tracing::info!(
                    target: "marzban_client::client::session",
                    username = %self.credentials.username,
                    "token rejected, re-authenticating once"
                );
                let token = ApiClient::issue_token(
                    self.api.http(),
                    self.api.base_url(),
                    &self.credentials,
                )
                .await?;
                self.api.set_token(token);
                op().await
            }
            result => result,
        }
    }
}

#[async_trait]
impl MarzbanApi for Session {
    fn set_token(&self, token: Token) {
        self.api.set_token(token);
    }

    async fn current_admin(&self) -> Result<Admin, ApiError> {
        self.with_reauth(|| self.api.current_admin()).await
    }

    async fn create_admin(&self, admin: &Admin) -> Result<Admin, ApiError> {
        self.with_reauth(|| self.api.create_admin(admin)).await
    }

    async fn modify_admin(&self, username: &str, admin: &Admin) -> Result<Admin, ApiError> {
        self.with_reauth(|| self.api.modify_admin(username, admin))
            .await
    }

    async fn remove_admin(&self, username: &str) -> Result<(), ApiError> {
        self.with_reauth(|| self.api.remove_admin(username)).await
    }

    async fn admins(&self, params: &ListAdminsParams) -> Result<Vec<Admin>, ApiError> {
        self.with_reauth(|| self.api.admins(params)).await
    }

    async fn system_stats(&self) -> Result<SystemStats, ApiError> {
        self.with_reauth(|| self.api.system_stats()).await
    }

    async fn inbounds(&self) -> Result<Inbounds, ApiError> {
        self.with_reauth(|| self.api.inbounds()).await
    }

    async fn hosts(&self) -> Result<Hosts, ApiError> {
        self.with_reauth(|| self.api.hosts()).await
    }

    async fn modify_hosts(&self, hosts: &Hosts) -> Result<Hosts, ApiError> {
        self.with_reauth(|| self.api.modify_hosts(hosts)).await
    }

    async fn add_user(&self, user: &User) -> Result<User, ApiError> {
        self.with_reauth(|| self.api.add_user(user)).await
    }

    async fn user(&self, username: &str) -> Result<User, ApiError> {
        self.with_reauth(|| self.api.user(username)).await
    }

    async fn modify_user(&self, username: &str, user: &User) -> Result<User, ApiError> {
        self.with_reauth(|| self.api.modify_user(username, user))
            .await
    }

    async fn remove_user(&self, username: &str) -> Result<(), ApiError> {
        self.with_reauth(|| self.api.remove_user(username)).await
    }

    async fn reset_user_data_usage(&self, username: &str) -> Result<User, ApiError> {
        self.with_reauth(|| self.api.reset_user_data_usage(username))
            .await
    }

    async fn revoke_subscription(&self, username: &str) -> Result<User, ApiError> {
        self.with_reauth(|| self.api.revoke_subscription(username))
            .await
    }

    async fn users(&self, params: &ListUsersParams) -> Result<Users, ApiError> {
        self.with_reauth(|| self.api.users(params)).await
    }

    async fn reset_users_data_usage(&self) -> Result<(), ApiError> {
        self.with_reauth(|| self.api.reset_users_data_usage()).await
    }

    async fn user_usage(
        &self,
        username: &str,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Result<UserUsage, ApiError> {
        self.with_reauth(|| self.api.user_usage(username, start, end))
            .await
    }

    async fn set_owner(&self, username: &str, admin_username: &str) -> Result<User, ApiError> {
        self.with_reauth(|| self.api.set_owner(username, admin_username))
            .await
    }

    async fn expired_users(&self, params: &ExpiredUsersParams) -> Result<Vec<String>, ApiError> {
        self.with_reauth(|| self.api.expired_users(params)).await
    }

    async fn delete_expired_users(
        &self,
        params: &ExpiredUsersParams,
    ) -> Result<Vec<String>, ApiError> {
        self.with_reauth(|| self.api.delete_expired_users(params))
            .await
    }
}
