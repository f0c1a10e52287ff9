// src/client/util.rs

use chrono::{DateTime, Utc};
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;

use crate::error::{ApiError, RawResponse};

/// The only status the panel uses for success; everything else is classified
/// without looking at the body.
const STATUS_OK: u16 = 200;

// Helper to join path to base URL
pub(super) fn build_url(base: &Url, path: &str) -> Result<Url, ApiError> {
    base.join(path).map_err(ApiError::UrlParse)
}

/// Drains a transport response into a [`RawResponse`]. Header lines keep the
/// order the server sent them in. Failing to read the body counts as a
/// transport failure since no complete response was obtained.
pub(super) async fn read_raw(response: Response) -> Result<RawResponse, ApiError> {
    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .map(|(name, value)| format!("{}: {}", name, String::from_utf8_lossy(value.as_bytes())))
        .collect();
    let body = response.text().await.map_err(|err| {
        tracing::debug!(target: "marzban_client::client::util", %status, error = ?err, "failed to read response body");
        ApiError::Transport(err)
    })?;

    Ok(RawResponse {
        status,
        body,
        headers,
    })
}

/// Classifies a raw response and, on success, parses its body into `T`.
///
/// Pure and deterministic: the status code alone decides the error kind for
/// non-200 responses (the body is kept verbatim but never interpreted), and
/// headers are never consulted.
pub(super) fn decode<T: DeserializeOwned>(raw: RawResponse) -> Result<T, ApiError> {
    let raw = ensure_success(raw)?;

    match serde_json::from_str::<T>(&raw.body) {
        Ok(value) => Ok(value),
        Err(err) => {
            tracing::debug!(
                target: "marzban_client::client::util",
                type_name = std::any::type_name::<T>(),
                error = %err,
                "failed to deserialize response body"
            );
            Err(ApiError::Decode {
                message: err.to_string(),
                response: raw,
            })
        }
    }
}

/// Status-only classification, for endpoints whose body we do not parse.
pub(super) fn ensure_success(raw: RawResponse) -> Result<RawResponse, ApiError> {
    match raw.status {
        STATUS_OK => Ok(raw),
        401 => Err(ApiError::Unauthorized(raw)),
        403 => Err(ApiError::Forbidden(raw)),
        404 => Err(ApiError::NotFound(raw)),
        422 => Err(ApiError::Validation(raw)),
        _ => Err(ApiError::Server(raw)),
    }
}

/// Timestamp format the panel expects in query strings, e.g.
/// `2023-11-03T20:30:00`.
pub(super) fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.format("%Y-%m-%dT%H:%M:%S").to_string()
}
