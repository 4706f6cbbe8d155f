use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use url::Url;

use super::http::{
    build_client, check_status, parse_store_url, read_limited_json, secret_header, with_timeout,
};
use super::{Credential, RemoteStore, StoreError};
use crate::list::{KeyedEntry, Mutation, ShoppingList};

const SECURITY_HEADER: &str = "security-key";
const MERGE_PATCH: &str = "application/merge-patch+json";

/// A bin holding a `name -> entry` mapping, updated one key at a time with
/// JSON merge-PATCH. Removal marks the entry `obtained` rather than deleting it.
#[derive(Debug, Clone)]
pub struct KeyedStore {
    client: reqwest::Client,
    url: Url,
    timeout: Option<Duration>,
}

impl KeyedStore {
    pub fn new(url: &str, timeout: Option<Duration>) -> Result<Self, StoreError> {
        Self::with_client(build_client()?, url, timeout)
    }

    pub fn with_client(
        client: reqwest::Client,
        url: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, StoreError> {
        Ok(Self {
            client,
            url: parse_store_url(url)?,
            timeout,
        })
    }

    /// Merge `{ key: entry }` into the stored mapping.
    pub async fn patch_item(
        &self,
        credential: &Credential,
        key: &str,
        entry: &KeyedEntry,
    ) -> Result<(), StoreError> {
        let mut patch = serde_json::Map::new();
        patch.insert(
            key.to_string(),
            serde_json::to_value(entry).map_err(|e| StoreError::Malformed(e.to_string()))?,
        );
        let body = serde_json::to_vec(&patch).map_err(|e| StoreError::Malformed(e.to_string()))?;

        tracing::debug!(url = %self.url, item = %key, obtained = entry.obtained, "Patching item");

        let request = self
            .client
            .patch(self.url.clone())
            .header(SECURITY_HEADER, secret_header(credential)?)
            .header(CONTENT_TYPE, MERGE_PATCH)
            .body(body);

        let value = with_timeout(self.timeout, async {
            let response = request.send().await?;
            check_status(response.status())?;
            read_limited_json(response).await
        })
        .await?;

        match error_envelope(&value) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// The keyed store reports failures in-band as `{"status": 1, "message": ".."}`.
/// A message mentioning "wrong" means the key was refused.
fn error_envelope(value: &Value) -> Option<StoreError> {
    let map = value.as_object()?;
    let status = map.get("status")?.as_i64()?;
    if status == 0 {
        return None;
    }
    let message = map
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("unknown error")
        .to_string();

    if message.to_lowercase().contains("wrong") {
        Some(StoreError::Rejected(message))
    } else {
        Some(StoreError::Malformed(format!("store error: {}", message)))
    }
}

fn parse_mapping(value: Value) -> Result<ShoppingList, StoreError> {
    if let Some(err) = error_envelope(&value) {
        return Err(err);
    }
    match value {
        Value::Null => Err(StoreError::MissingPayload),
        map @ Value::Object(_) => serde_json::from_value::<BTreeMap<String, KeyedEntry>>(map)
            .map(ShoppingList::from_keyed)
            .map_err(|e| StoreError::Malformed(e.to_string())),
        _ => Err(StoreError::Malformed(
            "expected an object of items".to_string(),
        )),
    }
}

impl RemoteStore for KeyedStore {
    async fn fetch_list(&self, credential: &Credential) -> Result<ShoppingList, StoreError> {
        tracing::debug!(url = %self.url, "Fetching keyed shopping list");

        let request = self
            .client
            .get(self.url.clone())
            .header(SECURITY_HEADER, secret_header(credential)?);

        let value = with_timeout(self.timeout, async {
            let response = request.send().await?;
            check_status(response.status())?;
            read_limited_json(response).await
        })
        .await?;

        let list = parse_mapping(value)?;
        tracing::info!(
            items = list.active_len(),
            obtained = list.items().len() - list.active_len(),
            "Fetched keyed shopping list"
        );
        Ok(list)
    }

    async fn write(
        &self,
        credential: &Credential,
        base: &ShoppingList,
        mutation: &Mutation,
    ) -> Result<(), StoreError> {
        match mutation {
            Mutation::Add(item) => {
                let entry = KeyedEntry {
                    obtained: false,
                    ..KeyedEntry::from(item)
                };
                self.patch_item(credential, &item.name, &entry).await
            }
            Mutation::Remove(name) => {
                let Some(existing) = base.get_active(name) else {
                    tracing::debug!(item = %name, "Remove of absent item, nothing to patch");
                    return Ok(());
                };
                let entry = KeyedEntry {
                    obtained: true,
                    ..KeyedEntry::from(existing)
                };
                self.patch_item(credential, name, &entry).await
            }
        }
    }
}
