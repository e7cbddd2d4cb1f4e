use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where the SQLite database lives
    pub data_dir: PathBuf,
    /// Server bind address
    pub bind_addr: String,
    /// Externally reachable base URL, used to build password-reset links
    pub public_url: Option<String>,
    /// Secret used to sign session cookies and reset tokens
    #[serde(skip_serializing)]
    pub secret_key: Option<String>,
    /// Whether answered questions are written to `chat_history`
    pub record_history: bool,
    /// Maximum number of `/get` requests served at once
    pub max_concurrent_asks: usize,
    /// Lifetime of a password-reset link in seconds
    pub reset_token_max_age_secs: u64,
    /// Timeout for outbound HTTP calls in seconds
    pub http_timeout_secs: u64,
    /// Chat-completion provider configuration
    pub llm: LlmConfig,
    /// Embedding provider configuration
    pub embedding: EmbeddingConfig,
    /// Hosted vector index configuration
    pub vector_index: VectorIndexConfig,
    /// Outgoing mail configuration
    pub mail: MailConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "openai" (any OpenAI-compatible API, e.g. OpenRouter) or "ollama"
    pub provider: String,
    /// Base URL for the chat API, including any version prefix
    pub base_url: String,
    /// Model name for chat completions
    pub chat_model: String,
    /// API key (only needed for cloud providers)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Sent as `HTTP-Referer` for OpenRouter app attribution
    pub referer: Option<String>,
    /// Sent as `X-Title` for OpenRouter app attribution
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// "ollama" or "openai"
    pub provider: String,
    /// Base URL for the embedding API
    pub base_url: String,
    /// Model name; must match the model the index was built with
    pub model: String,
    /// API key (only needed for cloud providers)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

/// Configuration for the hosted vector index (Pinecone data plane).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIndexConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub index_name: String,
    /// Data-plane host. If None, it is looked up from the control plane on first use.
    pub index_host: Option<String>,
    pub control_plane_url: String,
    pub namespace: Option<String>,
    /// Metadata key holding the chunk text
    pub text_key: String,
    /// Number of chunks fed into the prompt
    pub top_k: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    /// Sender address; falls back to `username`
    pub default_sender: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            bind_addr: "0.0.0.0:5000".to_string(),
            public_url: None,
            secret_key: None,
            record_history: true,
            max_concurrent_asks: 4,
            reset_token_max_age_secs: 3600,
            http_timeout_secs: 120,
            llm: LlmConfig::default(),
            embedding: EmbeddingConfig::default(),
            vector_index: VectorIndexConfig::default(),
            mail: MailConfig::default(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            base_url: "https://openrouter.ai/api/v1".to_string(),
            chat_model: "gpt-3.5-turbo".to_string(),
            api_key: None,
            referer: None,
            title: None,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            base_url: "http://localhost:11434".to_string(),
            model: "all-minilm".to_string(),
            api_key: None,
        }
    }
}

impl Default for VectorIndexConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            index_name: "medicalbot".to_string(),
            index_host: None,
            control_plane_url: "https://api.pinecone.io".to_string(),
            namespace: None,
            text_key: "text".to_string(),
            top_k: 3,
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            username: None,
            password: None,
            default_sender: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("MEDIBOT_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(addr) = std::env::var("MEDIBOT_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(url) = std::env::var("MEDIBOT_PUBLIC_URL") {
            config.public_url = Some(url.trim_end_matches('/').to_string());
        }
        if let Ok(secret) = std::env::var("SECRET_KEY") {
            if !secret.is_empty() {
                config.secret_key = Some(secret);
            }
        }
        if let Ok(val) = std::env::var("MEDIBOT_RECORD_HISTORY") {
            if let Some(v) = parse_bool(&val) {
                config.record_history = v;
            }
        }
        if let Ok(val) = std::env::var("MEDIBOT_MAX_CONCURRENT_ASKS") {
            if let Ok(v) = val.parse::<usize>() {
                config.max_concurrent_asks = v.max(1);
            }
        }
        if let Ok(val) = std::env::var("MEDIBOT_RESET_TOKEN_MAX_AGE_SECS") {
            if let Ok(v) = val.parse() {
                config.reset_token_max_age_secs = v;
            }
        }
        if let Ok(val) = std::env::var("MEDIBOT_HTTP_TIMEOUT_SECS") {
            if let Ok(v) = val.parse() {
                config.http_timeout_secs = v;
            }
        }

        // Chat model
        if let Ok(provider) = std::env::var("LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Ok(url) = std::env::var("LLM_BASE_URL") {
            config.llm.base_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(model) = std::env::var("LLM_CHAT_MODEL") {
            config.llm.chat_model = model;
        }
        if let Ok(key) = std::env::var("OPENROUTER_API_KEY") {
            config.llm.api_key = Some(key);
        }
        if let Ok(key) = std::env::var("LLM_API_KEY") {
            config.llm.api_key = Some(key);
        }
        if let Ok(referer) = std::env::var("LLM_HTTP_REFERER") {
            config.llm.referer = Some(referer);
        }
        if let Ok(title) = std::env::var("LLM_APP_TITLE") {
            config.llm.title = Some(title);
        }

        // Embeddings
        if let Ok(provider) = std::env::var("EMBEDDING_PROVIDER") {
            config.embedding.provider = provider;
        }
        if let Ok(url) = std::env::var("EMBEDDING_BASE_URL") {
            config.embedding.base_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(model) = std::env::var("EMBEDDING_MODEL") {
            config.embedding.model = model;
        }
        if let Ok(key) = std::env::var("EMBEDDING_API_KEY") {
            config.embedding.api_key = Some(key);
        }

        // Vector index
        if let Ok(key) = std::env::var("PINECONE_API_KEY") {
            config.vector_index.api_key = Some(key);
        }
        if let Ok(name) = std::env::var("PINECONE_INDEX_NAME") {
            config.vector_index.index_name = name;
        }
        if let Ok(host) = std::env::var("PINECONE_INDEX_HOST") {
            config.vector_index.index_host = Some(host);
        }
        if let Ok(url) = std::env::var("PINECONE_CONTROL_PLANE_URL") {
            config.vector_index.control_plane_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(ns) = std::env::var("PINECONE_NAMESPACE") {
            config.vector_index.namespace = Some(ns);
        }
        if let Ok(key) = std::env::var("PINECONE_TEXT_KEY") {
            config.vector_index.text_key = key;
        }
        if let Ok(val) = std::env::var("RETRIEVAL_TOP_K") {
            if let Ok(v) = val.parse::<usize>() {
                config.vector_index.top_k = v.clamp(1, 20);
            }
        }

        // Mail
        if let Ok(host) = std::env::var("MAIL_SERVER") {
            config.mail.smtp_host = host;
        }
        if let Ok(val) = std::env::var("MAIL_PORT") {
            if let Ok(v) = val.parse() {
                config.mail.smtp_port = v;
            }
        }
        if let Ok(user) = std::env::var("EMAIL_USER") {
            config.mail.username = Some(user);
        }
        if let Ok(pass) = std::env::var("EMAIL_PASS") {
            config.mail.password = Some(pass);
        }
        if let Ok(sender) = std::env::var("MAIL_DEFAULT_SENDER") {
            config.mail.default_sender = Some(sender);
        }

        config
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("users.db")
    }

    /// Base URL used when building absolute links sent by email.
    pub fn public_base_url(&self) -> String {
        match &self.public_url {
            Some(url) => url.clone(),
            None => format!("http://{}", self.bind_addr),
        }
    }
}

impl MailConfig {
    /// SMTP is only used when both credentials are present.
    pub fn smtp_enabled(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }

    pub fn sender(&self) -> Option<&str> {
        self.default_sender
            .as_deref()
            .or(self.username.as_deref())
    }
}

fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
