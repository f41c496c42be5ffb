//! Wire types of the remote API.
//!
//! All bodies are JSON with snake_case field names.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A knowledge point owned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgePoint {
    /// Server-assigned id, always positive
    pub id: i64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub correct_phrase: Option<String>,
    #[serde(default)]
    pub incorrect_phrase_in_context: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub key_point_summary: Option<String>,
    #[serde(default)]
    pub user_context_sentence: Option<String>,
    #[serde(default)]
    pub mastery_level: f64,
    #[serde(default)]
    pub is_archived: bool,
    /// Review schedule and other fields this client does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl KnowledgePoint {
    /// Minimal point with only an id, mostly useful for fakes.
    pub fn new(id: i64) -> Self {
        Self {
            id,
            category: None,
            subcategory: None,
            correct_phrase: None,
            incorrect_phrase_in_context: None,
            explanation: None,
            key_point_summary: None,
            user_context_sentence: None,
            mastery_level: 0.0,
            is_archived: false,
            extra: Map::new(),
        }
    }
}

/// Response of the dashboard endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    #[serde(default)]
    pub knowledge_points: Vec<KnowledgePoint>,
}

/// Response of the archived endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgePointList {
    #[serde(default)]
    pub knowledge_points: Vec<KnowledgePoint>,
}

/// Partial update of a knowledge point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgePointUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mastery_level: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_point_summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl KnowledgePointUpdate {
    pub fn mastery_level(level: f64) -> Self {
        Self {
            mastery_level: Some(level),
            ..Self::default()
        }
    }
}

/// Response of the finalize endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizeResponse {
    /// Number of knowledge points the server created
    #[serde(default, alias = "count")]
    pub saved_count: usize,
}

/// Login request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Register request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Refresh request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Access and refresh token pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// An account on the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub username: Option<String>,
}

/// Response of login and register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(flatten)]
    pub tokens: AuthTokens,
    pub user: User,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn knowledge_point_keeps_unknown_fields() {
        let point: KnowledgePoint = serde_json::from_value(json!({
            "id": 12,
            "category": "grammar",
            "mastery_level": 0.75,
            "next_review_date": "2024-02-03"
        }))
        .unwrap();

        assert_eq!(point.id, 12);
        assert_eq!(point.mastery_level, 0.75);
        assert!(!point.is_archived);
        assert_eq!(point.extra["next_review_date"], json!("2024-02-03"));
    }

    #[test]
    fn auth_response_flattens_tokens() {
        let response: AuthResponse = serde_json::from_value(json!({
            "access_token": "a",
            "refresh_token": "r",
            "user": {"id": 1, "email": "learner@example.com"}
        }))
        .unwrap();

        assert_eq!(response.tokens.access_token, "a");
        assert_eq!(response.user.username, None);
    }

    #[test]
    fn finalize_response_accepts_count_alias() {
        let response: FinalizeResponse = serde_json::from_str(r#"{"count": 2}"#).unwrap();
        assert_eq!(response.saved_count, 2);
        let response: FinalizeResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(response.saved_count, 0);
    }

    #[test]
    fn update_skips_unset_fields() {
        let body = serde_json::to_value(KnowledgePointUpdate::mastery_level(0.9)).unwrap();
        assert_eq!(body, json!({"mastery_level": 0.9}));
    }
}
