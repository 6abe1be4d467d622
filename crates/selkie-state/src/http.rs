//! HTTP state backend
//!
//! Production implementation of [`StateBackend`], speaking the sidecar's
//! state API over local loopback:
//!
//! - `GET  /v1.0/state/{store}/{key}` - single-key read (200 found, 204 not found)
//! - `POST /v1.0/state/{store}` - batched conditional writes
//! - `POST /v1.0/state/{store}/bulk` - bulk read with fan-out hint
//! - `DELETE /v1.0/state/{store}/{key}` - hard delete
//!
//! Request metadata travels as `metadata.{key}` query parameters.

use crate::backend::{BulkEntry, KeyResponse, Metadata, StateBackend, WriteEntry};
use async_trait::async_trait;
use selkie_core::{Error, Result, STATE_BATCH_ENTRIES_COUNT_MAX};
use tracing::{debug, instrument};

/// State backend speaking HTTP to the sidecar
#[derive(Debug, Clone)]
pub struct HttpStateBackend {
    base_url: String,
    client: reqwest::Client,
}

impl HttpStateBackend {
    /// Create a backend pointed at the sidecar's base URL
    /// (e.g. `http://127.0.0.1:3500`)
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    fn store_url(&self, store: &str) -> String {
        format!("{}/v1.0/state/{}", self.base_url, store)
    }

    fn metadata_query(metadata: &Metadata) -> Vec<(String, String)> {
        metadata
            .iter()
            .map(|(k, v)| (format!("metadata.{}", k), v.clone()))
            .collect()
    }

    fn etag_header(response: &reqwest::Response) -> Option<String> {
        response
            .headers()
            .get(reqwest::header::ETAG)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.trim_matches('"').to_string())
    }
}

#[async_trait]
impl StateBackend for HttpStateBackend {
    #[instrument(skip(self, metadata), level = "debug")]
    async fn get_key(&self, store: &str, key: &str, metadata: &Metadata) -> Result<KeyResponse> {
        let response = self
            .client
            .get(format!("{}/{}", self.store_url(store), key))
            .query(&Self::metadata_query(metadata))
            .send()
            .await
            .map_err(|e| Error::BackendUnavailable {
                reason: e.to_string(),
            })?;

        match response.status().as_u16() {
            200 => {
                let etag = Self::etag_header(&response);
                let value =
                    response
                        .json()
                        .await
                        .map_err(|e| Error::DeserializationFailed {
                            reason: format!("key {}: {}", key, e),
                        })?;
                Ok(KeyResponse::Found { value, etag })
            }
            204 => Ok(KeyResponse::NotFound),
            code => Err(Error::state_retrieval_failed(
                store,
                format!("key {}: unexpected status {}", key, code),
            )),
        }
    }

    #[instrument(skip(self, entries), fields(entry_count = entries.len()), level = "debug")]
    async fn save_bulk(&self, store: &str, entries: Vec<WriteEntry>) -> Result<()> {
        assert!(!entries.is_empty(), "batch must not be empty");
        assert!(
            entries.len() <= STATE_BATCH_ENTRIES_COUNT_MAX,
            "batch exceeds entry limit"
        );

        let response = self
            .client
            .post(self.store_url(store))
            .json(&entries)
            .send()
            .await
            .map_err(|e| Error::BackendUnavailable {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            debug!(store, entry_count = entries.len(), "state batch committed");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(Error::commit_failed(
            store,
            format!("status {}: {}", status.as_u16(), body),
        ))
    }

    #[instrument(skip(self, keys, metadata), fields(key_count = keys.len()), level = "debug")]
    async fn get_bulk(
        &self,
        store: &str,
        keys: &[String],
        parallelism: u32,
        metadata: &Metadata,
    ) -> Result<Vec<BulkEntry>> {
        let request = serde_json::json!({
            "keys": keys,
            "parallelism": parallelism,
        });

        let response = self
            .client
            .post(format!("{}/bulk", self.store_url(store)))
            .query(&Self::metadata_query(metadata))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::BackendUnavailable {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::state_retrieval_failed(
                store,
                format!("bulk read: unexpected status {}", status.as_u16()),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| Error::DeserializationFailed {
                reason: format!("bulk read: {}", e),
            })
    }

    #[instrument(skip(self, metadata), level = "debug")]
    async fn delete_key(&self, store: &str, key: &str, metadata: &Metadata) -> Result<()> {
        let response = self
            .client
            .delete(format!("{}/{}", self.store_url(store), key))
            .query(&Self::metadata_query(metadata))
            .send()
            .await
            .map_err(|e| Error::BackendUnavailable {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(Error::commit_failed(
            store,
            format!("delete {}: status {}: {}", key, status.as_u16(), body),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::ConsistencyPolicy;

    #[tokio::test]
    async fn test_get_key_found() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1.0/state/statestore/count")
            .with_status(200)
            .with_header("ETag", "\"3\"")
            .with_body("41")
            .create_async()
            .await;

        let backend = HttpStateBackend::new(server.url());
        let response = backend
            .get_key("statestore", "count", &Metadata::new())
            .await
            .unwrap();

        assert_eq!(
            response,
            KeyResponse::Found {
                value: serde_json::json!(41),
                etag: Some("3".into()),
            }
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_key_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v1.0/state/statestore/missing")
            .with_status(204)
            .create_async()
            .await;

        let backend = HttpStateBackend::new(server.url());
        let response = backend
            .get_key("statestore", "missing", &Metadata::new())
            .await
            .unwrap();

        assert_eq!(response, KeyResponse::NotFound);
    }

    #[tokio::test]
    async fn test_get_key_unexpected_status_is_retrieval_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v1.0/state/statestore/count")
            .with_status(500)
            .create_async()
            .await;

        let backend = HttpStateBackend::new(server.url());
        let result = backend
            .get_key("statestore", "count", &Metadata::new())
            .await;

        assert!(matches!(
            result,
            Err(Error::StateRetrievalFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_get_key_forwards_metadata() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1.0/state/statestore/count")
            .match_query(mockito::Matcher::UrlEncoded(
                "metadata.partitionKey".into(),
                "p1".into(),
            ))
            .with_status(204)
            .create_async()
            .await;

        let backend = HttpStateBackend::new(server.url());
        let metadata = Metadata::from([("partitionKey".to_string(), "p1".to_string())]);
        backend
            .get_key("statestore", "count", &metadata)
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_save_bulk_serializes_conditional_entries() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1.0/state/statestore")
            .match_body(mockito::Matcher::Json(serde_json::json!([
                {
                    "key": "Counter||c-1||count",
                    "value": 2,
                    "etag": "1",
                    "options": { "consistency": "eventual", "concurrency": "first-write" }
                }
            ])))
            .with_status(204)
            .create_async()
            .await;

        let backend = HttpStateBackend::new(server.url());
        let entries = vec![WriteEntry::conditional(
            "Counter||c-1||count",
            serde_json::json!(2),
            "1",
            ConsistencyPolicy::eventual_first_write(),
        )];
        backend.save_bulk("statestore", entries).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_save_bulk_rejection_is_commit_failed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1.0/state/statestore")
            .with_status(409)
            .with_body("etag mismatch")
            .create_async()
            .await;

        let backend = HttpStateBackend::new(server.url());
        let entries = vec![WriteEntry::unconditional("k", serde_json::json!(1))];
        let result = backend.save_bulk("statestore", entries).await;

        match result {
            Err(Error::CommitFailed { reason, .. }) => assert!(reason.contains("etag mismatch")),
            other => panic!("expected CommitFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_get_bulk_parses_entries() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1.0/state/statestore/bulk")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "keys": ["Counter||c-1||count"],
                "parallelism": 10,
            })))
            .with_status(200)
            .with_body(r#"[{"key": "Counter||c-1||count", "data": 2, "etag": "1"}]"#)
            .create_async()
            .await;

        let backend = HttpStateBackend::new(server.url());
        let entries = backend
            .get_bulk(
                "statestore",
                &["Counter||c-1||count".to_string()],
                10,
                &Metadata::new(),
            )
            .await
            .unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].data, Some(serde_json::json!(2)));
        assert_eq!(entries[0].etag.as_deref(), Some("1"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_key() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/v1.0/state/statestore/stale")
            .with_status(204)
            .create_async()
            .await;

        let backend = HttpStateBackend::new(server.url());
        backend
            .delete_key("statestore", "stale", &Metadata::new())
            .await
            .unwrap();

        mock.assert_async().await;
    }
}
