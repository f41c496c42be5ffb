//! Server payloads for turning local knowledge points into permanent ones.
//!
//! The remote "finalize" operation takes a list of error analyses plus the
//! question they came from. A local knowledge point is pushed as a batch of
//! one.

use crate::{LocalKnowledgePoint, PointContent};
use serde::{Deserialize, Serialize};

/// Error category code used when a record does not carry one.
pub const DEFAULT_ERROR_TYPE_CODE: &str = "B";

/// Mastery level used when a record does not carry one.
pub const DEFAULT_MASTERY_LEVEL: f64 = 0.0;

/// One analysed mistake, in the shape the server expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorAnalysis {
    pub error_type_code: String,
    pub key_point_summary: String,
    pub original_phrase: String,
    pub correction: String,
    pub explanation: String,
    pub category: String,
    pub subcategory: String,
}

/// The question an analysis belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionData {
    pub new_sentence: String,
    pub mastery_level: f64,
}

/// Body of a finalize call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizeRequest {
    pub errors: Vec<ErrorAnalysis>,
    pub question_data: QuestionData,
    pub user_answer: String,
}

fn or_empty(field: &Option<String>) -> String {
    field.clone().unwrap_or_default()
}

impl ErrorAnalysis {
    /// Build an analysis from record content, with server defaults for
    /// missing fields.
    pub fn from_content(content: &PointContent) -> Self {
        Self {
            error_type_code: PointContent::text(&content.error_type_code)
                .unwrap_or(DEFAULT_ERROR_TYPE_CODE)
                .to_string(),
            key_point_summary: or_empty(&content.key_point_summary),
            original_phrase: or_empty(&content.incorrect_phrase_in_context),
            correction: or_empty(&content.correct_phrase),
            explanation: or_empty(&content.explanation),
            category: or_empty(&content.category),
            subcategory: or_empty(&content.subcategory),
        }
    }
}

impl FinalizeRequest {
    /// Build the request for pushing a single local knowledge point.
    ///
    /// Only the content is used; the local id, original id and sync flags
    /// never reach the server.
    pub fn from_local(point: &LocalKnowledgePoint) -> Self {
        let content = &point.content;
        Self {
            errors: vec![ErrorAnalysis::from_content(content)],
            question_data: QuestionData {
                new_sentence: or_empty(&content.original_sentence),
                mastery_level: content.mastery_level.unwrap_or(DEFAULT_MASTERY_LEVEL),
            },
            user_answer: or_empty(&content.user_context_sentence),
        }
    }
}
