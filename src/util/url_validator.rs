use thiserror::Error;
use url::Url;

/// Errors from validating a configured or generated URL.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// Plain HTTP to a non-local host would send the password in the clear.
    #[error("Insecure store URL: HTTPS required (except localhost for testing)")]
    Insecure,
}

/// Validates the remote store URL.
///
/// Every request carries the shared password as a header, so the store must be
/// reached over HTTPS. Plain HTTP is accepted only for `localhost` and
/// `127.0.0.1`, which is where test servers live.
///
/// ```
/// use shoplist::util::validate_store_url;
///
/// assert!(validate_store_url("https://api.jsonbin.io/b/abc").is_ok());
/// assert!(validate_store_url("http://127.0.0.1:8080/b/abc").is_ok());
/// assert!(validate_store_url("http://bins.example.com/b/abc").is_err());
/// ```
pub fn validate_store_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str)?;

    match url.scheme() {
        "https" => Ok(url),
        "http" => {
            let local = matches!(url.host_str(), Some("localhost") | Some("127.0.0.1"));
            if local {
                tracing::warn!(url = %url, "Using non-HTTPS store URL (localhost only)");
                Ok(url)
            } else {
                Err(UrlValidationError::Insecure)
            }
        }
        scheme => Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }
}

/// Validates a URL before handing it to the system browser via `open::that`.
///
/// Only http(s) URLs with a host are opened; anything else could be
/// interpreted by the platform opener as a local file or a custom handler.
pub fn validate_url_for_open(url_str: &str) -> Result<Url, String> {
    let url = Url::parse(url_str).map_err(|e| format!("Refusing to open invalid URL: {}", e))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("Refusing to open {} URL", url.scheme()));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err("Refusing to open URL without a host".to_string());
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_https_store_accepted() {
        let url = validate_store_url("https://api.jsonbin.io/b/5eb6b361a47fdd6af16043d4").unwrap();
        assert_eq!(url.host_str(), Some("api.jsonbin.io"));
    }

    #[test]
    fn test_local_http_store_accepted() {
        assert!(validate_store_url("http://localhost:3000/bin").is_ok());
        assert!(validate_store_url("http://127.0.0.1:41234/bin").is_ok());
    }

    #[test]
    fn test_remote_http_store_rejected() {
        let err = validate_store_url("http://evil.example.com/bin").unwrap_err();
        assert!(matches!(err, UrlValidationError::Insecure));
    }

    #[test]
    fn test_other_schemes_rejected() {
        assert!(matches!(
            validate_store_url("ftp://example.com/bin"),
            Err(UrlValidationError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            validate_store_url("not a url"),
            Err(UrlValidationError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_open_accepts_cat_links() {
        assert!(validate_url_for_open("https://cataas.com/cat/gif?catIndex=12").is_ok());
    }

    #[test]
    fn test_open_rejects_file_and_custom_schemes() {
        assert!(validate_url_for_open("file:///etc/passwd").is_err());
        assert!(validate_url_for_open("javascript:alert(1)").is_err());
        assert!(validate_url_for_open("").is_err());
    }
}
