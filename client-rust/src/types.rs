use crate::{GenerationError, GenerationResult};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/generate-cheatsheet`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct GenerateRequest {
    pub topic: String,
}

impl GenerateRequest {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
        }
    }
}

/// Response of `POST /api/generate-cheatsheet`.
/// Every field is optional on the wire; `validate` decides whether the
/// response is usable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub programming_language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_topics: Option<Vec<String>>,
    /// Failure description some backends attach when `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerateResponse {
    /// Shorthand for a successful response carrying only HTML.
    pub fn html(html: impl Into<String>) -> Self {
        Self {
            success: true,
            html: Some(html.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_related_topics<I, S>(mut self, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.related_topics = Some(topics.into_iter().map(Into::into).collect());
        self
    }

    /// Accept the response only when the backend reports success and
    /// returned non-empty HTML.
    pub fn validate(self) -> GenerationResult<Self> {
        if !self.success {
            return Err(GenerationError::Backend(
                self.error
                    .unwrap_or_else(|| "Failed to generate cheat sheet".to_string()),
            ));
        }
        match &self.html {
            Some(html) if !html.trim().is_empty() => Ok(self),
            _ => Err(GenerationError::Backend(
                "response does not contain html".to_string(),
            )),
        }
    }
}
