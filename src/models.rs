use serde::{Deserialize, Serialize};

/// A registered user
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Argon2 PHC string
    #[sqlx(rename = "password")]
    pub password_hash: String,
}

/// One answered question from `chat_history`
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ChatRecord {
    pub question: String,
    pub answer: String,
    pub timestamp: String,
}

/// A chunk returned by the retriever
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub id: String,
    pub content: String,
    pub score: f32,
}

/// A single role-tagged message sent to the chat model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Login and registration form
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsForm {
    pub username: String,
    pub password: String,
}

/// Forgot-password form
#[derive(Debug, Clone, Deserialize)]
pub struct ForgotForm {
    pub email: String,
}

/// Reset-password form
#[derive(Debug, Clone, Deserialize)]
pub struct ResetForm {
    pub password: String,
}

/// Question form posted by the chat page
#[derive(Debug, Clone, Deserialize)]
pub struct AskForm {
    pub msg: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_message_constructors_set_role() {
        assert_eq!(ChatMessage::system("rules").role, "system");
        assert_eq!(ChatMessage::user("hi").role, "user");
    }

    #[test]
    fn test_chat_message_serializes_as_role_content() {
        let json = serde_json::to_value(ChatMessage::user("hello")).unwrap();
        assert_eq!(json, serde_json::json!({ "role": "user", "content": "hello" }));
    }
}
