use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use password_hash::rand_core::{OsRng, RngCore};
use std::sync::Arc;

use crate::auth::session;
use crate::auth::token::ResetTokens;
use crate::config::Config;
use crate::db::Database;
use crate::llm::completion::{ChatModel, CompletionClient};
use crate::mail::{self, Mailer};
use crate::search::retriever::{IndexRetriever, Retriever};
use crate::search::vector::VectorIndex;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Database,
    pub retriever: Arc<dyn Retriever>,
    pub chat_model: Arc<dyn ChatModel>,
    pub mailer: Arc<dyn Mailer>,
    pub cookie_key: Key,
    pub reset_tokens: ResetTokens,
    pub ask_semaphore: Arc<tokio::sync::Semaphore>,
}

impl AppState {
    /// Build the production state: SQLite on disk, hosted index, hosted LLM, SMTP.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let db = Database::connect(&config.db_path()).await?;

        let http_client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .timeout(std::time::Duration::from_secs(config.http_timeout_secs))
            .build()?;

        if config.vector_index.api_key.is_none() {
            tracing::warn!("PINECONE_API_KEY is not set; vector index queries will fail");
        }
        if config.llm.api_key.is_none() && config.llm.provider == "openai" {
            tracing::warn!("OPENROUTER_API_KEY / LLM_API_KEY is not set; completions will fail");
        }

        let index = VectorIndex::new(http_client.clone(), config.vector_index.clone());
        let retriever = IndexRetriever::new(http_client.clone(), config.embedding.clone(), index);
        let chat_model = CompletionClient::new(http_client, config.llm.clone());
        let mailer = mail::from_config(&config.mail)?;

        Ok(Self::with_services(
            config,
            db,
            Arc::new(retriever),
            Arc::new(chat_model),
            Arc::from(mailer),
        ))
    }

    /// Assemble state from already-built collaborators.
    pub fn with_services(
        config: Config,
        db: Database,
        retriever: Arc<dyn Retriever>,
        chat_model: Arc<dyn ChatModel>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let secret = match &config.secret_key {
            Some(secret) => secret.as_bytes().to_vec(),
            None => {
                tracing::warn!("SECRET_KEY is not set; sessions and reset links will not survive a restart");
                let mut bytes = vec![0u8; 64];
                OsRng.fill_bytes(&mut bytes);
                bytes
            }
        };

        Self {
            cookie_key: session::derive_key(&secret),
            reset_tokens: ResetTokens::new(&secret, config.reset_token_max_age_secs),
            ask_semaphore: Arc::new(tokio::sync::Semaphore::new(config.max_concurrent_asks)),
            config: Arc::new(config),
            db,
            retriever,
            chat_model,
            mailer,
        }
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}
