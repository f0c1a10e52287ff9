// src/client/implementation.rs

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client as ReqwestClient, Method, Url};
use secrecy::ExposeSecret;
use serde::Serialize;

use crate::error::ApiError;

use super::interface::MarzbanApi;
use super::types::{
    status, Admin, Credentials, ExpiredUsersParams, Hosts, Inbounds, ListAdminsParams,
    ListUsersParams, SystemStats, Token, User, UserUsage, Users,
};
use super::util::{build_url, decode, ensure_success, format_timestamp, read_raw};

/// Direct client for the panel API. Issues one request per operation with the
/// stored bearer token attached; does not react to 401 in any way. Wrap it in
/// a [`Session`](super::Session) to get transparent re-authentication.
pub struct ApiClient {
    http: ReqwestClient,
    base_url: Url,
    // Guards read-for-request and replace-on-401 so concurrent callers never
    // observe a half-written token.
    token: Mutex<Token>,
}

impl ApiClient {
    pub fn new(http: ReqwestClient, base_url: Url, token: Token) -> Self {
        Self {
            http,
            base_url,
            token: Mutex::new(token),
        }
    }

    /// Requests a fresh bearer token from the panel. Credentials go out
    /// form-encoded, exactly as the panel's token endpoint expects. Any
    /// failure is wrapped in [`ApiError::Auth`], which the session layer
    /// treats as terminal.
    pub async fn issue_token(
        http: &ReqwestClient,
        base_url: &Url,
        credentials: &Credentials,
    ) -> Result<Token, ApiError> {
        let url = build_url(base_url, "/api/admin/token").map_err(|err| ApiError::Auth(Box::new(err)))?;
        tracing::debug!(target: "marzban_client::client::implementation", %url, username = %credentials.username, "requesting admin token");

        let form = [
            ("username", credentials.username.as_str()),
            ("password", credentials.password.expose_secret()),
        ];
        let response = http
            .post(url)
            .form(&form)
            .send()
            .await
            .map_err(|err| ApiError::Auth(Box::new(ApiError::Transport(err))))?;

        let raw = read_raw(response)
            .await
            .map_err(|err| ApiError::Auth(Box::new(err)))?;
        decode::<Token>(raw).map_err(|err| ApiError::Auth(Box::new(err)))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(super) fn http(&self) -> &ReqwestClient {
        &self.http
    }

    fn bearer(&self) -> String {
        self.token.lock().unwrap().header_value()
    }

    /// Sends one request with the current token and runs the raw response
    /// through the decoder. Every endpoint funnels through here.
    async fn request<T: serde::de::DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<String>,
    ) -> Result<T, ApiError> {
        let raw = self.request_raw(method, url, body).await?;
        decode(raw)
    }

    /// Same as [`request`](Self::request) but only checks the status code;
    /// used for endpoints whose response body carries nothing of interest.
    async fn request_status(
        &self,
        method: Method,
        url: Url,
        body: Option<String>,
    ) -> Result<(), ApiError> {
        let raw = self.request_raw(method, url, body).await?;
        ensure_success(raw)?;
        Ok(())
    }

    async fn request_raw(
        &self,
        method: Method,
        url: Url,
        body: Option<String>,
    ) -> Result<crate::error::RawResponse, ApiError> {
        tracing::debug!(target: "marzban_client::client::implementation", %method, %url, "sending request");

        let mut builder = self
            .http
            .request(method, url)
            .header(AUTHORIZATION, self.bearer());
        if let Some(body) = body {
            builder = builder
                .header(CONTENT_TYPE, "application/json")
                .body(body);
        }

        let response = builder.send().await.map_err(ApiError::Transport)?;
        read_raw(response).await
    }

    /// Serializes a request body before anything touches the network, so an
    /// un-encodable value surfaces as a local error rather than a server one.
    fn encode_body<B: Serialize>(body: &B) -> Result<String, ApiError> {
        serde_json::to_string(body).map_err(ApiError::Serialize)
    }

    fn users_url(&self, params: &ListUsersParams) -> Result<Url, ApiError> {
        let mut url = build_url(&self.base_url, "/api/users/")?;
        {
            // Emission order is fixed: limit, offset, sort, status, then one
            // pair per username.
            let mut pairs = url.query_pairs_mut();
            if let Some(limit) = params.limit {
                pairs.append_pair("limit", &limit.to_string());
            }
            if let Some(offset) = params.offset {
                pairs.append_pair("offset", &offset.to_string());
            }
            if let Some(sort) = &params.sort {
                pairs.append_pair("sort", sort);
            }
            if let Some(status) = &params.status {
                pairs.append_pair("status", status);
            }
            for username in &params.username {
                pairs.append_pair("username", username);
            }
        }
        Ok(url)
    }

    fn admins_url(&self, params: &ListAdminsParams) -> Result<Url, ApiError> {
        let mut url = build_url(&self.base_url, "/api/admins/")?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(limit) = params.limit {
                pairs.append_pair("limit", &limit.to_string());
            }
            if let Some(offset) = params.offset {
                pairs.append_pair("offset", &offset.to_string());
            }
            for username in &params.username {
                pairs.append_pair("username", username);
            }
        }
        Ok(url)
    }

    fn expired_users_url(&self, params: &ExpiredUsersParams) -> Result<Url, ApiError> {
        let mut url = build_url(&self.base_url, "/api/users/expired/")?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(before) = &params.before {
                pairs.append_pair("expired_before", &format_timestamp(before));
            }
            if let Some(after) = &params.after {
                pairs.append_pair("expired_after", &format_timestamp(after));
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl MarzbanApi for ApiClient {
    fn set_token(&self, token: Token) {
        *self.token.lock().unwrap() = token;
    }

    async fn current_admin(&self) -> Result<Admin, ApiError> {
        let url = build_url(&self.base_url, "/api/admin")?;
        self.request(Method::GET, url, None).await
    }

    async fn create_admin(&self, admin: &Admin) -> Result<Admin, ApiError> {
        let url = build_url(&self.base_url, "/api/admin")?;
        let body = Self::encode_body(admin)?;
        self.request(Method::POST, url, Some(body)).await
    }

    async fn modify_admin(&self, username: &str, admin: &Admin) -> Result<Admin, ApiError> {
        let url = build_url(&self.base_url, &format!("/api/admin/{username}"))?;
        let body = Self::encode_body(admin)?;
        self.request(Method::PUT, url, Some(body)).await
    }

    async fn remove_admin(&self, username: &str) -> Result<(), ApiError> {
        let url = build_url(&self.base_url, &format!("/api/admin/{username}"))?;
        self.request_status(Method::DELETE, url, None).await
    }

    async fn admins(&self, params: &ListAdminsParams) -> Result<Vec<Admin>, ApiError> {
        let url = self.admins_url(params)?;
        self.request(Method::GET, url, None).await
    }

    async fn system_stats(&self) -> Result<SystemStats, ApiError> {
        let url = build_url(&self.base_url, "/api/system/")?;
        self.request(Method::GET, url, None).await
    }

    async fn inbounds(&self) -> Result<Inbounds, ApiError> {
        let url = build_url(&self.base_url, "/api/inbounds/")?;
        self.request(Method::GET, url, None).await
    }

    async fn hosts(&self) -> Result<Hosts, ApiError> {
        let url = build_url(&self.base_url, "/api/hosts/")?;
        self.request(Method::GET, url, None).await
    }

    async fn modify_hosts(&self, hosts: &Hosts) -> Result<Hosts, ApiError> {
        let url = build_url(&self.base_url, "/api/hosts/")?;
        let body = Self::encode_body(hosts)?;
        self.request(Method::PUT, url, Some(body)).await
    }

    async fn add_user(&self, user: &User) -> Result<User, ApiError> {
        if user.username.as_deref().unwrap_or("").is_empty() {
            return Err(ApiError::InvalidInput(
                "'username' field must be set".to_string(),
            ));
        }
        match user.status.as_deref() {
            Some(status::ACTIVE) | Some(status::ON_HOLD) => {}
            other => {
                return Err(ApiError::InvalidInput(format!(
                    "user status must be '{}' or '{}', got {:?}",
                    status::ACTIVE,
                    status::ON_HOLD,
                    other
                )));
            }
        }

        let url = build_url(&self.base_url, "/api/user/")?;
        let body = Self::encode_body(user)?;
        self.request(Method::POST, url, Some(body)).await
    }

    async fn user(&self, username: &str) -> Result<User, ApiError> {
        let url = build_url(&self.base_url, &format!("/api/user/{username}"))?;
        self.request(Method::GET, url, None).await
    }

    async fn modify_user(&self, username: &str, user: &User) -> Result<User, ApiError> {
        if username.is_empty() {
            return Err(ApiError::InvalidInput(
                "username must not be empty".to_string(),
            ));
        }

        let url = build_url(&self.base_url, &format!("/api/user/{username}"))?;
        let body = Self::encode_body(user)?;
        self.request(Method::PUT, url, Some(body)).await
    }

    async fn remove_user(&self, username: &str) -> Result<(), ApiError> {
        let url = build_url(&self.base_url, &format!("/api/user/{username}"))?;
        self.request_status(Method::DELETE, url, None).await
    }

    async fn reset_user_data_usage(&self, username: &str) -> Result<User, ApiError> {
        let url = build_url(&self.base_url, &format!("/api/user/{username}/reset"))?;
        self.request(Method::POST, url, None).await
    }

    async fn revoke_subscription(&self, username: &str) -> Result<User, ApiError> {
        let url = build_url(&self.base_url, &format!("/api/user/{username}/revoke_sub"))?;
        self.request(Method::POST, url, None).await
    }

    async fn users(&self, params: &ListUsersParams) -> Result<Users, ApiError> {
        let url = self.users_url(params)?;
        self.request(Method::GET, url, None).await
    }

    async fn reset_users_data_usage(&self) -> Result<(), ApiError> {
        let url = build_url(&self.base_url, "/api/users/reset")?;
        self.request_status(Method::POST, url, None).await
    }

    async fn user_usage(
        &self,
        username: &str,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Result<UserUsage, ApiError> {
        let mut url = build_url(&self.base_url, &format!("/api/user/{username}/usage/"))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("start", &format_timestamp(&start));
            if let Some(end) = &end {
                pairs.append_pair("end", &format_timestamp(end));
            }
        }
        self.request(Method::GET, url, None).await
    }

    async fn set_owner(&self, username: &str, admin_username: &str) -> Result<User, ApiError> {
        let mut url = build_url(&self.base_url, &format!("/api/user/{username}/set-owner"))?;
        url.query_pairs_mut()
            .append_pair("admin_username", admin_username);
        self.request(Method::PUT, url, None).await
    }

    async fn expired_users(&self, params: &ExpiredUsersParams) -> Result<Vec<String>, ApiError> {
        let url = self.expired_users_url(params)?;
        self.request(Method::GET, url, None).await
    }

    async fn delete_expired_users(
        &self,
        params: &ExpiredUsersParams,
    ) -> Result<Vec<String>, ApiError> {
        let url = self.expired_users_url(params)?;
        self.request(Method::DELETE, url, None).await
    }
}
