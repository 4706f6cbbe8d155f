//! Clients for the hosted JSON bin that holds the list.
//!
//! Two API shapes are supported behind [`RemoteStore`]:
//! - [`DocumentStore`]: the whole list lives under `data` and every change
//!   replaces it with a PUT.
//! - [`KeyedStore`]: the bin is a `name -> entry` mapping and each change is a
//!   JSON merge-PATCH of one key; removal sets `obtained`.
//!
//! [`Backend`] picks one from the config. There is no version token on writes,
//! so concurrent edits from the two users are last-writer-wins.
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::config::{Config, StoreShape};
use crate::list::{Mutation, ShoppingList};

mod document;
mod http;
mod keyed;

pub use document::DocumentStore;
pub use http::MAX_RESPONSE_SIZE;
pub use keyed::KeyedStore;

// ============================================================================
// Credential
// ============================================================================

/// The shared password for the bin. Debug output is redacted.
#[derive(Clone)]
pub struct Credential(Arc<SecretString>);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(Arc::new(SecretString::from(secret.into())))
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn is_blank(&self) -> bool {
        self.expose().trim().is_empty()
    }
}

impl Default for Credential {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Request timed out after {0}s")]
    Timeout(u64),
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("Wrong password: {0}")]
    Rejected(String),
    #[error("The store did not return a shopping list")]
    MissingPayload,
    #[error("Malformed store response: {0}")]
    Malformed(String),
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    #[error("Invalid store URL: {0}")]
    InvalidUrl(String),
    #[error("Insecure store URL: HTTPS required (except localhost for testing)")]
    InsecureUrl,
    #[error("Request interrupted: {0}")]
    Interrupted(String),
}

impl StoreError {
    /// Whether the remembered password should be forgotten.
    ///
    /// A response without a list is how the document store answers a bad
    /// password, so it counts as a rejection too.
    pub fn is_credential_rejection(&self) -> bool {
        matches!(self, StoreError::Rejected(_) | StoreError::MissingPayload)
    }
}

// ============================================================================
// RemoteStore
// ============================================================================

/// Fetch the list and write one change to it.
pub trait RemoteStore: Send + Sync {
    /// The current list. An empty-but-present list is `Ok`; a response with no
    /// list at all is [`StoreError::MissingPayload`].
    fn fetch_list(
        &self,
        credential: &Credential,
    ) -> impl Future<Output = Result<ShoppingList, StoreError>> + Send;

    /// Persist `mutation`. `base` is the last confirmed list, which the
    /// document store needs to compute the replacement.
    fn write(
        &self,
        credential: &Credential,
        base: &ShoppingList,
        mutation: &Mutation,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// The configured store.
#[derive(Debug, Clone)]
pub enum Backend {
    Document(DocumentStore),
    Keyed(KeyedStore),
}

impl Backend {
    pub fn from_config(config: &Config) -> Result<Self, StoreError> {
        let client = http::build_client()?;
        let timeout = match config.request_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        Ok(match config.backend {
            StoreShape::Document => Backend::Document(DocumentStore::with_client(
                client,
                &config.store_url,
                timeout,
            )?),
            StoreShape::Keyed => {
                Backend::Keyed(KeyedStore::with_client(client, &config.store_url, timeout)?)
            }
        })
    }
}

impl RemoteStore for Backend {
    async fn fetch_list(&self, credential: &Credential) -> Result<ShoppingList, StoreError> {
        match self {
            Backend::Document(store) => store.fetch_list(credential).await,
            Backend::Keyed(store) => store.fetch_list(credential).await,
        }
    }

    async fn write(
        &self,
        credential: &Credential,
        base: &ShoppingList,
        mutation: &Mutation,
    ) -> Result<(), StoreError> {
        match self {
            Backend::Document(store) => store.write(credential, base, mutation).await,
            Backend::Keyed(store) => store.write(credential, base, mutation).await,
        }
    }
}
