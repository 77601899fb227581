//! Shared HTTP plumbing for the provider clients

use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;

use super::traits::{ProviderError, ProviderResult};

pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Build an HTTP client with a request timeout
pub(crate) fn build_client(timeout_ms: u64) -> Client {
    Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!("Falling back to default HTTP client: {}", e);
            Client::new()
        })
}

/// Turn a non-success response into a provider error.
///
/// `message_of` pulls the human-readable message out of the provider's error body.
pub(crate) async fn error_for_status(
    response: Response,
    message_of: fn(&str) -> Option<String>,
) -> ProviderError {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        return ProviderError::RateLimited {
            retry_after_ms: retry_after_ms(response.headers()),
        };
    }

    let body = response.text().await.unwrap_or_default();
    classify_error(status, &body, message_of)
}

pub(crate) fn classify_error(
    status: StatusCode,
    body: &str,
    message_of: fn(&str) -> Option<String>,
) -> ProviderError {
    let message =
        message_of(body).unwrap_or_else(|| format!("HTTP {}: {}", status.as_u16(), body.trim()));

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Auth {
            status: status.as_u16(),
            message,
        },
        _ => ProviderError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

fn retry_after_ms(headers: &HeaderMap) -> u64 {
    headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(60)
        .saturating_mul(1000)
}

/// Deserialize a response body
pub(crate) fn parse_body<T: DeserializeOwned>(body: &str) -> ProviderResult<T> {
    serde_json::from_str(body).map_err(|e| ProviderError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn no_message(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_auth_statuses_map_to_auth_error() {
        let err = classify_error(StatusCode::UNAUTHORIZED, "nope", no_message);
        assert!(matches!(err, ProviderError::Auth { status: 401, .. }));

        let err = classify_error(StatusCode::FORBIDDEN, "nope", no_message);
        assert!(matches!(err, ProviderError::Auth { status: 403, .. }));
    }

    #[test]
    fn test_other_statuses_map_to_api_error() {
        let err = classify_error(StatusCode::INTERNAL_SERVER_ERROR, " boom \n", no_message);
        match err {
            ProviderError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "HTTP 500: boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_retry_after_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after_ms(&headers), 60_000);

        headers.insert("retry-after", HeaderValue::from_static("7"));
        assert_eq!(retry_after_ms(&headers), 7_000);

        headers.insert("retry-after", HeaderValue::from_static("18446744073709551615"));
        assert_eq!(retry_after_ms(&headers), u64::MAX);
    }

    #[test]
    fn test_parse_body_error() {
        let result: ProviderResult<serde_json::Value> = parse_body("not json");
        assert!(matches!(result, Err(ProviderError::Parse(_))));
    }
}
