use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::fetch::FeedItem;

/// A record from any list endpoint.
///
/// The id is normalised to a string (some endpoints send numeric ids); the
/// remaining fields are kept verbatim for the screen to interpret.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiRecord {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ApiRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// A string field, if present.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Best-effort one-line description for listings.
    ///
    /// Tries the fields the different record kinds use for their headline.
    pub fn summary(&self) -> String {
        const HEADLINE_FIELDS: &[&str] = &["title", "name", "content", "text", "message"];

        HEADLINE_FIELDS
            .iter()
            .find_map(|key| self.str_field(key))
            .map(|s| s.lines().next().unwrap_or(s).to_string())
            .unwrap_or_default()
    }
}

impl FeedItem for ApiRecord {
    fn id(&self) -> &str {
        &self.id
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

/// Error body the API sends with non-success statuses.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ApiErrorBody {
    /// The human-readable message, when the body carries one.
    ///
    /// `message` may be a string or a list of validation messages.
    pub fn into_message(self) -> Option<String> {
        match self.message {
            Some(Value::String(s)) => Some(s),
            Some(Value::Array(items)) => {
                let parts: Vec<String> = items
                    .into_iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect();
                (!parts.is_empty()).then(|| parts.join("; "))
            }
            _ => self.error,
        }
    }
}
