use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::config::EmbeddingConfig;
use crate::llm::embeddings::embed_single;
use crate::models::Document;
use crate::search::vector::VectorIndex;

/// Finds the document chunks most relevant to a question.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, question: &str) -> Result<Vec<Document>>;
}

/// Embeds the question and asks the hosted index for its nearest chunks.
pub struct IndexRetriever {
    client: reqwest::Client,
    embedding: EmbeddingConfig,
    index: VectorIndex,
}

impl IndexRetriever {
    pub fn new(client: reqwest::Client, embedding: EmbeddingConfig, index: VectorIndex) -> Self {
        Self {
            client,
            embedding,
            index,
        }
    }
}

#[async_trait]
impl Retriever for IndexRetriever {
    async fn retrieve(&self, question: &str) -> Result<Vec<Document>> {
        let vector = embed_single(&self.client, &self.embedding, question)
            .await
            .context("Failed to embed question")?;

        let matches = self
            .index
            .query(&vector, self.index.top_k())
            .await
            .context("Vector search failed")?;

        let total = matches.len();
        let docs: Vec<Document> = matches
            .into_iter()
            .filter_map(|m| {
                m.text.map(|content| Document {
                    id: m.id,
                    content,
                    score: m.score,
                })
            })
            .collect();

        if docs.len() < total {
            tracing::warn!(
                "{} of {total} matches had no text metadata and were skipped",
                total - docs.len()
            );
        }
        tracing::debug!("Retrieved {} chunks", docs.len());
        Ok(docs)
    }
}
