//! Knowledge point record types.
//!
//! A knowledge point is one recorded language-learning mistake together with
//! its correction. While a guest has no account the points live on the device
//! as [`LocalKnowledgePoint`]s carrying a negative placeholder id.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Identifier of a knowledge point.
///
/// On disk this is either a JSON number or, for records written by old
/// clients, a JSON string (the UUID used to be stored as the id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointId {
    /// Negative for locally created points, positive for server points
    Numeric(i64),
    /// Legacy UUID-as-id format, replaced during migration
    Legacy(String),
}

impl PointId {
    /// The numeric id, if this is not a legacy string id.
    pub fn as_numeric(&self) -> Option<i64> {
        match self {
            PointId::Numeric(id) => Some(*id),
            PointId::Legacy(_) => None,
        }
    }

    /// The id if it is a locally assigned (negative) one.
    pub fn local(&self) -> Option<i64> {
        self.as_numeric().filter(|id| *id < 0)
    }

    /// Check if this is a locally assigned id.
    pub fn is_local(&self) -> bool {
        self.local().is_some()
    }

    /// Check if this is a legacy string id.
    pub fn is_legacy(&self) -> bool {
        matches!(self, PointId::Legacy(_))
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointId::Numeric(id) => write!(f, "{}", id),
            PointId::Legacy(id) => write!(f, "{}", id),
        }
    }
}

impl From<i64> for PointId {
    fn from(id: i64) -> Self {
        PointId::Numeric(id)
    }
}

/// Sync state of a local record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// Waiting for the next sync run
    #[default]
    Pending,
    /// Currently being pushed
    Syncing,
    /// Accepted by the server (the record is removed right after)
    Synced,
    /// Last push attempt failed, will be retried
    Failed,
}

/// The learning content of a knowledge point.
///
/// All fields are optional because guest records were historically written
/// as free-form dictionaries. Keys this type does not know about are kept in
/// `extra` so nothing is lost when the list is rewritten.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    /// Server-side error category code ("A", "B", ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_phrase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incorrect_phrase_in_context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_point_summary: Option<String>,
    /// The sentence the learner submitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_context_sentence: Option<String>,
    /// The sentence the learner was asked to translate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_sentence: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mastery_level: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

const STRING_FIELDS: &[&str] = &[
    "category",
    "subcategory",
    "error_type_code",
    "correct_phrase",
    "incorrect_phrase_in_context",
    "explanation",
    "key_point_summary",
    "user_context_sentence",
    "original_sentence",
];

const NUMBER_FIELDS: &[&str] = &["mastery_level"];

/// Keys that belong to local bookkeeping rather than content.
pub(crate) const BOOKKEEPING_FIELDS: &[&str] = &["id", "localId", "local_id", "isLocal", "syncStatus"];

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl PointContent {
    /// Build content from a JSON object, checking the types of known fields.
    ///
    /// Bookkeeping keys are dropped; unknown keys end up in `extra`.
    pub fn from_map(mut map: Map<String, Value>) -> Result<Self> {
        for key in BOOKKEEPING_FIELDS {
            map.remove(*key);
        }

        for (field, expected, ok) in STRING_FIELDS
            .iter()
            .map(|f| (*f, "string", map.get(*f).map(|v| v.is_string() || v.is_null())))
            .chain(
                NUMBER_FIELDS
                    .iter()
                    .map(|f| (*f, "number", map.get(*f).map(|v| v.is_number() || v.is_null()))),
            )
        {
            if ok == Some(false) {
                return Err(Error::TypeMismatch {
                    field: field.to_string(),
                    expected: expected.to_string(),
                    got: json_type_name(&map[field]).to_string(),
                });
            }
        }

        serde_json::from_value(Value::Object(map)).map_err(|e| Error::InvalidPayload(e.to_string()))
    }

    /// Non-empty value of an optional text field.
    pub(crate) fn text(field: &Option<String>) -> Option<&str> {
        field.as_deref().filter(|s| !s.trim().is_empty())
    }
}

/// A knowledge point as handed to the store by the UI, before it gets an id.
#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgePointDraft {
    /// Client-generated opaque identifier (usually a UUID)
    pub local_id: String,
    pub content: PointContent,
}

impl KnowledgePointDraft {
    /// Create a draft from already typed content.
    pub fn new(local_id: impl Into<String>, content: PointContent) -> Self {
        Self {
            local_id: local_id.into(),
            content,
        }
    }

    /// Validate a free-form JSON record and turn it into a draft.
    ///
    /// The original identifier is read from `local_id`, `localId` or `id`
    /// (in that order) and must be a non-empty string.
    pub fn from_value(value: Value) -> Result<Self> {
        let map = match value {
            Value::Object(map) => map,
            other => {
                return Err(Error::InvalidPayload(format!(
                    "expected object, got {}",
                    json_type_name(&other)
                )))
            }
        };

        let raw_id = ["local_id", "localId", "id"]
            .iter()
            .find_map(|key| map.get(*key))
            .ok_or_else(|| Error::MissingRequiredField("id".to_string()))?;

        let local_id = match raw_id {
            Value::String(s) if !s.trim().is_empty() => s.clone(),
            Value::String(_) => return Err(Error::MissingRequiredField("id".to_string())),
            other => {
                return Err(Error::TypeMismatch {
                    field: "id".to_string(),
                    expected: "string".to_string(),
                    got: json_type_name(other).to_string(),
                })
            }
        };

        Ok(Self {
            local_id,
            content: PointContent::from_map(map)?,
        })
    }
}

/// A knowledge point stored on the device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalKnowledgePoint {
    /// Negative while the point only exists locally
    pub id: PointId,
    /// Original client-generated identifier, kept across id reassignment
    #[serde(rename = "localId", default)]
    pub local_id: String,
    #[serde(rename = "isLocal", default)]
    pub is_local: bool,
    #[serde(rename = "syncStatus", default)]
    pub sync_status: SyncStatus,
    #[serde(flatten)]
    pub content: PointContent,
}

impl LocalKnowledgePoint {
    /// Create a local record from a draft and a freshly allocated id.
    pub fn from_draft(draft: KnowledgePointDraft, id: i64) -> Self {
        Self {
            id: PointId::Numeric(id),
            local_id: draft.local_id,
            is_local: true,
            sync_status: SyncStatus::Pending,
            content: draft.content,
        }
    }

    /// The negative id if this point still needs to be synced.
    pub fn pending_id(&self) -> Option<i64> {
        self.id.local()
    }

    /// Check if this point still needs to be pushed to the server.
    pub fn is_pending_sync(&self) -> bool {
        self.id.is_local()
    }
}
