use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::Form;
use axum_extra::extract::cookie::SignedCookieJar;

use crate::auth::session;
use crate::error::AppError;
use crate::llm::prompt::{sanitize_for_prompt, truncate_to_char_boundary};
use crate::models::{AskForm, ChatMessage, Document};
use crate::state::AppState;

const MAX_QUESTION_LEN: usize = 2000;

const SYSTEM_PROMPT: &str = "You are an assistant for question-answering tasks. \
     Use the following pieces of retrieved context to answer \
     the question. If you don't know the answer, say that you \
     don't know. Use three sentences maximum and keep the \
     answer concise.\n\n";

/// POST /get - answer one question from retrieved context. Returns plain text.
pub async fn ask(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    form: Result<Form<AskForm>, FormRejection>,
) -> Result<String, AppError> {
    // ── Step 1: Require a session ─────────────────────────
    let username = session::current_user(&jar).ok_or(AppError::Unauthorized)?;

    // ── Step 2: Validate and sanitize input ───────────────
    let Form(form) = form.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let question = normalize_question(&form.msg)
        .ok_or_else(|| AppError::BadRequest("Message is required".to_string()))?;

    // ── Step 3: Acquire semaphore ─────────────────────────
    let _permit = state
        .ask_semaphore
        .clone()
        .acquire_owned()
        .await
        .map_err(|_| AppError::Busy)?;

    // ── Step 4: Retrieve context ──────────────────────────
    let docs = state
        .retriever
        .retrieve(&question)
        .await
        .map_err(AppError::Upstream)?;
    tracing::info!("Retrieved {} chunks for question from '{username}'", docs.len());

    // ── Step 5: Build prompt and ask the model ────────────
    let messages = build_messages(&build_context(&docs), &question);
    let answer = state
        .chat_model
        .complete(messages)
        .await
        .map_err(AppError::Upstream)?;

    // ── Step 6: Record the exchange ───────────────────────
    if state.config.record_history {
        if let Err(e) = state.db.record_exchange(&username, &question, &answer).await {
            tracing::warn!("Failed to record chat history for '{username}': {e}");
        }
    }

    Ok(answer)
}

// ─── Helper functions ────────────────────────────────────

/// Truncate, strip control tokens and trim. `None` when nothing is left.
fn normalize_question(raw: &str) -> Option<String> {
    let cleaned = sanitize_for_prompt(truncate_to_char_boundary(raw.trim(), MAX_QUESTION_LEN));
    let question = cleaned.trim();
    (!question.is_empty()).then(|| question.to_string())
}

fn build_context(docs: &[Document]) -> String {
    docs.iter()
        .map(|d| sanitize_for_prompt(&d.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn build_system_prompt(context: &str) -> String {
    format!("{SYSTEM_PROMPT}{context}")
}

fn build_messages(context: &str, question: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(build_system_prompt(context)),
        ChatMessage::user(question),
    ]
}
