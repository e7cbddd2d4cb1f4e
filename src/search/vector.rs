use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::VectorIndexConfig;

const API_VERSION: &str = "2024-07";

/// A nearest-neighbor match returned by the hosted index.
#[derive(Debug, Clone)]
pub struct VectorMatch {
    pub id: String,
    pub score: f32,
    /// Chunk text read from the configured metadata key, if present
    pub text: Option<String>,
}

/// Client for a hosted vector index (Pinecone data-plane API).
pub struct VectorIndex {
    client: reqwest::Client,
    config: VectorIndexConfig,
    /// Data-plane base URL, filled from config or resolved once from the control plane
    host: RwLock<Option<String>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Deserialize)]
struct DescribeIndexResponse {
    host: String,
}

impl VectorIndex {
    pub fn new(client: reqwest::Client, config: VectorIndexConfig) -> Self {
        let host = config.index_host.as_deref().map(normalize_host);
        Self {
            client,
            config,
            host: RwLock::new(host),
        }
    }

    pub fn top_k(&self) -> usize {
        self.config.top_k
    }

    /// Return the `top_k` entries nearest to `vector`, best first.
    pub async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<VectorMatch>> {
        let host = self.host().await?;
        let url = format!("{host}/query");

        let req = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
            include_values: false,
            namespace: self.config.namespace.as_deref(),
        };

        let resp = self
            .client
            .post(&url)
            .header("Api-Key", self.api_key())
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(&req)
            .send()
            .await
            .context("Failed to call vector index query API")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Vector index query returned {status}: {body}");
        }

        let body: QueryResponse = resp
            .json()
            .await
            .context("Failed to parse vector index query response")?;

        let text_key = self.config.text_key.as_str();
        Ok(body
            .matches
            .into_iter()
            .map(|m| VectorMatch {
                text: m
                    .metadata
                    .as_ref()
                    .and_then(|meta| meta.get(text_key))
                    .and_then(|v| v.as_str())
                    .map(str::to_string),
                id: m.id,
                score: m.score,
            })
            .collect())
    }

    async fn host(&self) -> Result<String> {
        let cached = self.host.read().clone();
        if let Some(host) = cached {
            return Ok(host);
        }

        let host = self.describe_index_host().await?;
        tracing::info!(index = %self.config.index_name, %host, "Resolved vector index host");
        *self.host.write() = Some(host.clone());
        Ok(host)
    }

    async fn describe_index_host(&self) -> Result<String> {
        let url = format!(
            "{}/indexes/{}",
            self.config.control_plane_url, self.config.index_name
        );

        let resp = self
            .client
            .get(&url)
            .header("Api-Key", self.api_key())
            .header("X-Pinecone-API-Version", API_VERSION)
            .send()
            .await
            .context("Failed to call vector index describe API")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!(
                "Describing index '{}' returned {status}: {body}",
                self.config.index_name
            );
        }

        let body: DescribeIndexResponse = resp
            .json()
            .await
            .context("Failed to parse vector index describe response")?;
        Ok(normalize_host(&body.host))
    }

    fn api_key(&self) -> &str {
        self.config.api_key.as_deref().unwrap_or_default()
    }
}

/// The control plane reports bare hostnames; configs may carry full URLs.
fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn config(host: Option<String>, control_plane_url: String) -> VectorIndexConfig {
        VectorIndexConfig {
            api_key: Some("pc-key".to_string()),
            index_name: "medicalbot".to_string(),
            index_host: host,
            control_plane_url,
            namespace: None,
            text_key: "text".to_string(),
            top_k: 3,
        }
    }

    const QUERY_BODY: &str = r#"{
        "matches": [
            {"id": "c1", "score": 0.92, "metadata": {"text": "Acne is a skin condition.", "source": "book.pdf"}},
            {"id": "c2", "score": 0.81, "metadata": {"source": "book.pdf"}},
            {"id": "c3", "score": 0.77}
        ],
        "namespace": ""
    }"#;

    #[test]
    fn test_normalize_host() {
        assert_eq!(normalize_host("idx-abc.svc.pinecone.io"), "https://idx-abc.svc.pinecone.io");
        assert_eq!(normalize_host("http://localhost:5080/"), "http://localhost:5080");
    }

    #[tokio::test]
    async fn test_query_with_configured_host() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/query")
            .match_header("api-key", "pc-key")
            .match_body(Matcher::Json(serde_json::json!({
                "vector": [0.5, 0.25],
                "topK": 3,
                "includeMetadata": true,
                "includeValues": false,
            })))
            .with_status(200)
            .with_body(QUERY_BODY)
            .create_async()
            .await;

        let index = VectorIndex::new(
            reqwest::Client::new(),
            config(Some(server.url()), "http://unused".into()),
        );
        let matches = index.query(&[0.5, 0.25], 3).await.unwrap();

        assert_eq!(matches.len(), 3);
        assert_eq!(matches[0].id, "c1");
        assert_eq!(matches[0].text.as_deref(), Some("Acne is a skin condition."));
        assert!(matches[1].text.is_none());
        assert!(matches[2].text.is_none());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_query_sends_namespace() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/query")
            .match_body(Matcher::PartialJson(serde_json::json!({ "namespace": "books" })))
            .with_status(200)
            .with_body(r#"{"matches": []}"#)
            .create_async()
            .await;

        let mut cfg = config(Some(server.url()), "http://unused".into());
        cfg.namespace = Some("books".into());
        let index = VectorIndex::new(reqwest::Client::new(), cfg);
        assert!(index.query(&[1.0], 3).await.unwrap().is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_host_resolved_once_from_control_plane() {
        let mut server = mockito::Server::new_async().await;
        let describe = server
            .mock("GET", "/indexes/medicalbot")
            .match_header("api-key", "pc-key")
            .with_status(200)
            .with_body(format!(r#"{{"name": "medicalbot", "host": "{}"}}"#, server.url()))
            .expect(1)
            .create_async()
            .await;
        let query = server
            .mock("POST", "/query")
            .with_status(200)
            .with_body(QUERY_BODY)
            .expect(2)
            .create_async()
            .await;

        let index = VectorIndex::new(reqwest::Client::new(), config(None, server.url()));
        index.query(&[0.1], 3).await.unwrap();
        index.query(&[0.2], 3).await.unwrap();

        describe.assert_async().await;
        query.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_index_is_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/indexes/medicalbot")
            .with_status(404)
            .with_body(r#"{"error": {"code": "NOT_FOUND"}}"#)
            .create_async()
            .await;

        let index = VectorIndex::new(reqwest::Client::new(), config(None, server.url()));
        let err = index.query(&[0.1], 3).await.unwrap_err();
        assert!(err.to_string().contains("medicalbot"));
        assert!(err.to_string().contains("404"));
    }
}
