use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use super::http::{
    build_client, check_status, parse_store_url, read_limited_json, secret_header, with_timeout,
};
use super::{Credential, RemoteStore, StoreError};
use crate::list::{Mutation, ShoppingItem, ShoppingList};

const SECRET_HEADER: &str = "secret-key";

#[derive(Serialize)]
struct DocumentBody<'a> {
    data: &'a [ShoppingItem],
}

/// A bin holding `{ "data": [ShoppingItem] }`, replaced wholesale on write.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    client: reqwest::Client,
    url: Url,
    timeout: Option<Duration>,
}

impl DocumentStore {
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

    /// Replace the stored list with `items`, returning what the store says it
    /// now holds (or `items` when the response does not echo the document).
    pub async fn replace_list(
        &self,
        credential: &Credential,
        items: &[ShoppingItem],
    ) -> Result<ShoppingList, StoreError> {
        let body = serde_json::to_vec(&DocumentBody { data: items })
            .map_err(|e| StoreError::Malformed(e.to_string()))?;

        tracing::debug!(url = %self.url, items = items.len(), "Replacing shopping list");

        let request = self
            .client
            .put(self.url.clone())
            .header(SECRET_HEADER, secret_header(credential)?)
            .header(CONTENT_TYPE, "application/json")
            .header("versioning", "false")
            .body(body);

        let value = with_timeout(self.timeout, async {
            let response = request.send().await?;
            check_status(response.status())?;
            read_limited_json(response).await
        })
        .await?;

        match echoed_list(&value)? {
            Some(list) => Ok(list),
            None => Ok(ShoppingList::new(items.to_vec())),
        }
    }
}

/// `{"data": [...]}` is the list. A null or absent `data` is a missing payload.
fn parse_document(value: Value) -> Result<ShoppingList, StoreError> {
    let data = match value {
        Value::Object(mut map) => map.remove("data"),
        Value::Null => None,
        other => {
            return Err(StoreError::Malformed(format!(
                "expected an object, got {}",
                json_kind(&other)
            )))
        }
    };

    match data {
        None | Some(Value::Null) => Err(StoreError::MissingPayload),
        Some(data @ Value::Array(_)) => serde_json::from_value::<Vec<ShoppingItem>>(data)
            .map(ShoppingList::new)
            .map_err(|e| StoreError::Malformed(e.to_string())),
        Some(other) => Err(StoreError::Malformed(format!(
            "expected data to be a list, got {}",
            json_kind(&other)
        ))),
    }
}

/// The PUT response may wrap the document once (`data: [...]`) or twice
/// (`data: {data: [...]}`), or not echo it at all.
fn echoed_list(value: &Value) -> Result<Option<ShoppingList>, StoreError> {
    let Some(data) = value.get("data") else {
        return Ok(None);
    };
    let list = match data {
        Value::Array(_) => data,
        Value::Object(inner) => match inner.get("data") {
            Some(list @ Value::Array(_)) => list,
            _ => return Ok(None),
        },
        _ => return Ok(None),
    };
    serde_json::from_value::<Vec<ShoppingItem>>(list.clone())
        .map(|items| Some(ShoppingList::new(items)))
        .map_err(|e| StoreError::Malformed(e.to_string()))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

impl RemoteStore for DocumentStore {
    async fn fetch_list(&self, credential: &Credential) -> Result<ShoppingList, StoreError> {
        tracing::debug!(url = %self.url, "Fetching shopping list");

        let request = self
            .client
            .get(self.url.clone())
            .header(SECRET_HEADER, secret_header(credential)?);

        let value = with_timeout(self.timeout, async {
            let response = request.send().await?;
            check_status(response.status())?;
            read_limited_json(response).await
        })
        .await?;

        let list = parse_document(value)?;
        tracing::info!(items = list.active_len(), "Fetched shopping list");
        Ok(list)
    }

    async fn write(
        &self,
        credential: &Credential,
        base: &ShoppingList,
        mutation: &Mutation,
    ) -> Result<(), StoreError> {
        let next = base.apply(mutation);
        let stored = self.replace_list(credential, next.items()).await?;
        tracing::info!(
            item = %mutation.name(),
            items = stored.active_len(),
            "Wrote shopping list"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::Shopper;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store(server: &MockServer) -> DocumentStore {
        DocumentStore::new(&format!("{}/b/list", server.uri()), Some(Duration::from_secs(5)))
            .unwrap()
    }

    fn milk() -> ShoppingItem {
        ShoppingItem::new(
            "Milk",
            Shopper::UserA,
            Utc.with_ymd_and_hms(2024, 5, 9, 8, 0, 0).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_fetch_sends_secret_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/b/list"))
            .and(header("secret-key", "abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"name": "Milk", "orderedBy": "UserA", "orderedOn": "2024-05-09T08:00:00Z"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let list = store(&server)
            .fetch_list(&Credential::new("abc123"))
            .await
            .unwrap();
        assert_eq!(list.items(), &[milk()]);
    }

    #[tokio::test]
    async fn test_fetch_empty_list_is_ok() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .mount(&server)
            .await;

        let list = store(&server).fetch_list(&Credential::new("k")).await.unwrap();
        assert!(list.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_missing_data_is_missing_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"message": "Invalid secret key"})),
            )
            .mount(&server)
            .await;

        let err = store(&server).fetch_list(&Credential::new("k")).await.unwrap_err();
        assert!(matches!(err, StoreError::MissingPayload));
        assert!(err.is_credential_rejection());
    }

    #[tokio::test]
    async fn test_fetch_401_is_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = store(&server).fetch_list(&Credential::new("k")).await.unwrap_err();
        assert!(matches!(err, StoreError::Rejected(_)));
    }

    #[tokio::test]
    async fn test_fetch_malformed_item() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": [{"name": "Milk"}]})),
            )
            .mount(&server)
            .await;

        let err = store(&server).fetch_list(&Credential::new("k")).await.unwrap_err();
        assert!(matches!(err, StoreError::Malformed(_)));
        assert!(!err.is_credential_rejection());
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"data": []}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let store = DocumentStore::new(
            &format!("{}/b/list", server.uri()),
            Some(Duration::from_millis(200)),
        )
        .unwrap();
        let err = store.fetch_list(&Credential::new("k")).await.unwrap_err();
        assert!(matches!(err, StoreError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_write_puts_whole_document() {
        let server = MockServer::start().await;
        let bread = ShoppingItem::new(
            "Bread",
            Shopper::UserB,
            Utc.with_ymd_and_hms(2024, 5, 9, 9, 0, 0).unwrap(),
        );

        Mock::given(method("PUT"))
            .and(path("/b/list"))
            .and(header("secret-key", "abc123"))
            .and(header("versioning", "false"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({
                "data": [
                    {"name": "Bread", "orderedBy": "UserB", "orderedOn": "2024-05-09T09:00:00Z"},
                    {"name": "Milk", "orderedBy": "UserA", "orderedOn": "2024-05-09T08:00:00Z"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        let base = ShoppingList::new(vec![milk()]);
        store(&server)
            .write(&Credential::new("abc123"), &base, &Mutation::Add(bread))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_replace_list_reads_nested_echo() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"data": [{"name": "Milk", "orderedBy": "UserA", "orderedOn": "2024-05-09T08:00:00Z"}]}
            })))
            .mount(&server)
            .await;

        let stored = store(&server)
            .replace_list(&Credential::new("k"), &[])
            .await
            .unwrap();
        assert_eq!(stored.items(), &[milk()]);
    }

    #[tokio::test]
    async fn test_write_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = store(&server)
            .write(
                &Credential::new("k"),
                &ShoppingList::default(),
                &Mutation::Remove("Milk".into()),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::HttpStatus(500)));
    }

    #[test]
    fn test_parse_document_shapes() {
        assert!(matches!(
            parse_document(json!({"data": null})),
            Err(StoreError::MissingPayload)
        ));
        assert!(matches!(
            parse_document(Value::Null),
            Err(StoreError::MissingPayload)
        ));
        assert!(matches!(
            parse_document(json!([1, 2])),
            Err(StoreError::Malformed(_))
        ));
        assert!(matches!(
            parse_document(json!({"data": {"data": []}})),
            Err(StoreError::Malformed(_))
        ));
    }
}
