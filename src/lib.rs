//! # medibot
//!
//! A small web application that answers questions from a hosted document
//! index. Users register and log in against a local SQLite table; logged-in
//! users get a chat page whose questions go through a retrieval-augmented
//! generation step:
//!
//! ```text
//!   question ──► embedding API ──► vector index (top-k) ──► chunk texts
//!                                                              │
//!                     system prompt + "\n\n"-joined context ◄──┘
//!                                     │
//!                                     ▼
//!                       chat completion API ──► plain-text answer
//!                                     │
//!                                     └──► chat_history (optional)
//! ```
//!
//! Embedding, similarity search and generation are external services; this
//! crate only routes, authenticates and assembles prompts.
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for server, providers, index and mail
//! - [`models`] - Shared data types: `User`, `ChatRecord`, `Document`, form payloads
//! - [`db`] - SQLite store for users and chat history
//! - [`auth`] - Argon2 password hashing, signed session cookies, reset tokens
//! - [`llm::embeddings`] - Query embeddings via Ollama or OpenAI-compatible APIs
//! - [`llm::completion`] - Chat completions via OpenAI-compatible APIs (OpenRouter) or Ollama
//! - [`search::vector`] - Hosted vector index client
//! - [`search::retriever`] - Question → top-k document chunks
//! - [`mail`] - SMTP delivery of password-reset links
//! - [`api`] - Axum routes and handlers
//! - [`state`] - Shared application state

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod mail;
pub mod models;
pub mod search;
pub mod state;
