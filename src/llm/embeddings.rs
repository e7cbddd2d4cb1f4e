use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::EmbeddingConfig;

/// Maximum characters sent to the embedding API. Questions are short; this
/// only guards against pasted walls of text overflowing the model context.
const MAX_EMBED_CHARS: usize = 3_000;

/// Truncate `text` to at most `MAX_EMBED_CHARS`, splitting on a UTF-8 char boundary.
fn truncate_for_embedding(text: &str) -> &str {
    if text.len() <= MAX_EMBED_CHARS {
        return text;
    }
    let mut end = MAX_EMBED_CHARS;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Generate the embedding for a single text with the configured provider.
pub async fn embed_single(
    client: &reqwest::Client,
    config: &EmbeddingConfig,
    text: &str,
) -> Result<Vec<f32>> {
    let input = vec![truncate_for_embedding(text).to_string()];

    let results = match config.provider.as_str() {
        "ollama" => embed_ollama(client, config, input).await?,
        "openai" => embed_openai(client, config, input).await?,
        other => anyhow::bail!("Unknown embedding provider: {other}"),
    };

    results
        .into_iter()
        .next()
        .context("No embedding returned")
}

// ─── Ollama ──────────────────────────────────────────────

#[derive(Serialize)]
struct OllamaEmbedRequest {
    model: String,
    input: Vec<String>,
    truncate: bool,
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

async fn embed_ollama(
    client: &reqwest::Client,
    config: &EmbeddingConfig,
    input: Vec<String>,
) -> Result<Vec<Vec<f32>>> {
    let url = format!("{}/api/embed", config.base_url);

    let req = OllamaEmbedRequest {
        model: config.model.clone(),
        input,
        truncate: true,
    };

    let resp = client
        .post(&url)
        .json(&req)
        .send()
        .await
        .context("Failed to call Ollama embed API")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("Ollama embed API returned {status}: {body}");
    }

    let body: OllamaEmbedResponse = resp
        .json()
        .await
        .context("Failed to parse Ollama embed response")?;

    Ok(body.embeddings)
}

// ─── OpenAI-compatible ───────────────────────────────────

#[derive(Serialize)]
struct OpenAiEmbedRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct OpenAiEmbedResponse {
    data: Vec<OpenAiEmbedData>,
}

#[derive(Deserialize)]
struct OpenAiEmbedData {
    embedding: Vec<f32>,
}

async fn embed_openai(
    client: &reqwest::Client,
    config: &EmbeddingConfig,
    input: Vec<String>,
) -> Result<Vec<Vec<f32>>> {
    let url = format!("{}/embeddings", config.base_url);
    let api_key = config.api_key.as_deref().unwrap_or_default();

    let req = OpenAiEmbedRequest {
        model: config.model.clone(),
        input,
    };

    let resp = client
        .post(&url)
        .header("Authorization", format!("Bearer {api_key}"))
        .json(&req)
        .send()
        .await
        .context("Failed to call OpenAI embed API")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("OpenAI embed API returned {status}: {body}");
    }

    let body: OpenAiEmbedResponse = resp
        .json()
        .await
        .context("Failed to parse OpenAI embed response")?;

    Ok(body.data.into_iter().map(|d| d.embedding).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(provider: &str, base_url: String) -> EmbeddingConfig {
        EmbeddingConfig {
            provider: provider.to_string(),
            base_url,
            model: "all-minilm".to_string(),
            api_key: Some("emb-key".to_string()),
        }
    }

    #[test]
    fn test_truncate_keeps_short_text() {
        assert_eq!(truncate_for_embedding("fever and chills"), "fever and chills");
    }

    #[test]
    fn test_truncate_respects_char_boundary() {
        let text = "é".repeat(MAX_EMBED_CHARS);
        let out = truncate_for_embedding(&text);
        assert!(out.len() <= MAX_EMBED_CHARS);
        assert!(text.is_char_boundary(out.len()));
    }

    #[tokio::test]
    async fn test_ollama_embed() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/embed")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "model": "all-minilm",
                "input": ["what is acne"],
            })))
            .with_status(200)
            .with_body(r#"{"embeddings": [[0.1, 0.2, 0.3]]}"#)
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let v = embed_single(&client, &config("ollama", server.url()), "what is acne")
            .await
            .unwrap();
        assert_eq!(v, vec![0.1, 0.2, 0.3]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_openai_embed_sends_bearer() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/embeddings")
            .match_header("authorization", "Bearer emb-key")
            .with_status(200)
            .with_body(r#"{"data": [{"embedding": [1.0, 0.0]}]}"#)
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let v = embed_single(&client, &config("openai", server.url()), "q")
            .await
            .unwrap();
        assert_eq!(v, vec![1.0, 0.0]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/embed")
            .with_status(500)
            .with_body("model not loaded")
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let err = embed_single(&client, &config("ollama", server.url()), "q")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("model not loaded"));
    }

    #[tokio::test]
    async fn test_empty_result_is_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/embed")
            .with_status(200)
            .with_body(r#"{"embeddings": []}"#)
            .create_async()
            .await;

        let client = reqwest::Client::new();
        assert!(embed_single(&client, &config("ollama", server.url()), "q")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_unknown_provider() {
        let client = reqwest::Client::new();
        let err = embed_single(&client, &config("hf", "http://unused".into()), "q")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Unknown embedding provider"));
    }
}
