use std::future::Future;
use std::time::Duration;

use futures::StreamExt;
use reqwest::header::HeaderValue;
use reqwest::redirect::Policy;
use reqwest::StatusCode;
use url::Url;

use super::{Credential, StoreError};
use crate::util::{validate_store_url, UrlValidationError};

/// Largest response body accepted from the store (1 MiB).
pub const MAX_RESPONSE_SIZE: usize = 1024 * 1024;

/// Redirects are followed only within the same host: the password travels in a
/// custom header that reqwest does not strip on cross-origin hops.
fn same_host_redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= 3 {
            return attempt.error("Too many redirects (max 3)");
        }

        let url = attempt.url();
        let origin_host = attempt.previous().first().and_then(|u| u.host_str());
        if origin_host != url.host_str() {
            tracing::warn!(to = %url, "Refusing cross-host redirect from store");
            return attempt.stop();
        }

        for prev in attempt.previous() {
            if prev.as_str() == url.as_str() {
                return attempt.error("Redirect loop detected");
            }
        }

        tracing::debug!(
            to = %url,
            hop = attempt.previous().len(),
            "Following redirect"
        );
        attempt.follow()
    })
}

pub(crate) fn build_client() -> Result<reqwest::Client, StoreError> {
    let client = reqwest::Client::builder()
        .redirect(same_host_redirect_policy())
        .pool_max_idle_per_host(2)
        .pool_idle_timeout(Duration::from_secs(30))
        .tcp_keepalive(Duration::from_secs(60))
        .build()?;
    Ok(client)
}

pub(crate) fn parse_store_url(url: &str) -> Result<Url, StoreError> {
    validate_store_url(url).map_err(|e| match e {
        UrlValidationError::Insecure => StoreError::InsecureUrl,
        other => StoreError::InvalidUrl(other.to_string()),
    })
}

/// The password as a header value, flagged sensitive so it never shows up
/// in reqwest's debug output.
pub(crate) fn secret_header(credential: &Credential) -> Result<HeaderValue, StoreError> {
    let mut value = HeaderValue::from_str(credential.expose()).map_err(|_| {
        StoreError::Rejected("the password contains characters that cannot be sent".to_string())
    })?;
    value.set_sensitive(true);
    Ok(value)
}

/// Run a whole request (send and body) under the configured timeout.
pub(crate) async fn with_timeout<T, F>(timeout: Option<Duration>, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| StoreError::Timeout(limit.as_secs()))?,
        None => fut.await,
    }
}

/// 401/403 mean the password was refused; anything else outside 2xx is a
/// plain status error.
pub(crate) fn check_status(status: StatusCode) -> Result<(), StoreError> {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(StoreError::Rejected(format!("store answered {}", status)));
    }
    if !status.is_success() {
        return Err(StoreError::HttpStatus(status.as_u16()));
    }
    Ok(())
}

/// Read the body as JSON, refusing anything over [`MAX_RESPONSE_SIZE`].
/// An empty body reads as `Value::Null`.
pub(crate) async fn read_limited_json(
    response: reqwest::Response,
) -> Result<serde_json::Value, StoreError> {
    if let Some(len) = response.content_length() {
        if len as usize > MAX_RESPONSE_SIZE {
            return Err(StoreError::ResponseTooLarge(MAX_RESPONSE_SIZE));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > MAX_RESPONSE_SIZE {
            return Err(StoreError::ResponseTooLarge(MAX_RESPONSE_SIZE));
        }
        bytes.extend_from_slice(&chunk);
    }

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::Value::Null);
    }

    serde_json::from_slice(&bytes).map_err(|e| StoreError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_check_status_classes() {
        assert!(check_status(StatusCode::OK).is_ok());
        assert!(matches!(
            check_status(StatusCode::UNAUTHORIZED),
            Err(StoreError::Rejected(_))
        ));
        assert!(matches!(
            check_status(StatusCode::FORBIDDEN),
            Err(StoreError::Rejected(_))
        ));
        assert!(matches!(
            check_status(StatusCode::BAD_GATEWAY),
            Err(StoreError::HttpStatus(502))
        ));
    }

    #[test]
    fn test_secret_header_is_sensitive() {
        let value = secret_header(&Credential::new("abc123")).unwrap();
        assert!(value.is_sensitive());
        assert!(secret_header(&Credential::new("bad\nvalue")).is_err());
    }

    #[tokio::test]
    async fn test_read_limited_json_rejects_oversized_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(MAX_RESPONSE_SIZE + 1)))
            .mount(&server)
            .await;

        let response = reqwest::get(server.uri()).await.unwrap();
        assert!(matches!(
            read_limited_json(response).await,
            Err(StoreError::ResponseTooLarge(_))
        ));
    }

    #[tokio::test]
    async fn test_read_limited_json_empty_body_is_null() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let response = reqwest::get(server.uri()).await.unwrap();
        assert_eq!(read_limited_json(response).await.unwrap(), serde_json::Value::Null);
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_timeout_expires() {
        let result: Result<(), StoreError> = with_timeout(Some(Duration::from_secs(2)), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(StoreError::Timeout(2))));
    }
}
