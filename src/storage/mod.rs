//! Local key-value state: the remembered password, item suggestions and the
//! cat widget preferences.
//!
//! [`Database`] persists to SQLite under the config directory; [`MemoryStore`]
//! backs tests. Both implement [`KeyValueStore`], which is all the list and
//! cat logic depends on.
use std::future::Future;

use anyhow::Result;

mod local_state;
mod memory;
mod schema;
mod types;

pub use memory::MemoryStore;
pub use schema::Database;
pub use types::DatabaseError;

/// Keys under which state is stored.
pub mod keys {
    /// The shared password for the remote bin.
    pub const CREDENTIAL: &str = "list.credential";
    /// JSON array of item names entered before.
    pub const SUGGESTIONS: &str = "list.suggestions";
    /// "true"/"false": whether the cat picture is shown.
    pub const CAT_OPTED_IN: &str = "cat.opted_in";
    /// "true"/"false": animated or still cat.
    pub const CAT_ANIMATED: &str = "cat.animated";
}

/// String key-value persistence.
///
/// Absent keys read as `None`; removing an absent key is not an error.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<()>> + Send;

    fn remove(&self, key: &str) -> impl Future<Output = Result<()>> + Send;
}

/// Read a "true"/"false" flag, treating anything unparseable as absent.
pub async fn get_flag<S: KeyValueStore>(store: &S, key: &str) -> Result<Option<bool>> {
    let raw = store.get(key).await?;
    Ok(raw.and_then(|v| match v.as_str() {
        "true" => Some(true),
        "false" => Some(false),
        other => {
            tracing::warn!(key = %key, value = %other, "Ignoring malformed flag");
            None
        }
    }))
}

/// Write a "true"/"false" flag.
pub async fn set_flag<S: KeyValueStore>(store: &S, key: &str, value: bool) -> Result<()> {
    store.set(key, if value { "true" } else { "false" }).await
}
