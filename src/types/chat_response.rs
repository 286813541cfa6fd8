use serde::{Deserialize, Serialize};

use crate::types::Source;

/// Body of a successful reply from the assistant service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The answer text.
    pub response: String,

    /// Citations backing the answer; absent and `null` both mean none.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub sources: Vec<Source>,

    /// Language the service answered in.
    #[serde(default)]
    pub language: Option<String>,

    /// Service-side timestamp of the answer.
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl ChatResponse {
    /// Creates a reply with no citations.
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            sources: Vec::new(),
            language: None,
            timestamp: None,
        }
    }

    /// Attaches citations.
    pub fn with_sources(mut self, sources: Vec<Source>) -> Self {
        self.sources = sources;
        self
    }

    /// Sets the reported language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Sets the reported timestamp.
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Source>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<Source>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_full_reply() {
        let json = r#"{
            "response": "Visit the portal.",
            "sources": [
                {"url": "https://a.example/1", "product": "IremboGov", "title": "Passports"},
                {"url": "https://a.example/2", "product": "OSC", "title": "Permits"}
            ],
            "language": "en",
            "timestamp": "2025-03-01T09:30:00"
        }"#;
        let reply: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(reply.response, "Visit the portal.");
        assert_eq!(reply.sources.len(), 2);
        assert_eq!(reply.sources[1].title, "Permits");
        assert_eq!(reply.language.as_deref(), Some("en"));
    }

    #[test]
    fn missing_or_null_sources_are_empty() {
        let reply: ChatResponse = serde_json::from_str(r#"{"response": "hi"}"#).unwrap();
        assert!(reply.sources.is_empty());
        assert!(reply.timestamp.is_none());

        let reply: ChatResponse =
            serde_json::from_str(r#"{"response": "hi", "sources": null}"#).unwrap();
        assert!(reply.sources.is_empty());
    }

    #[test]
    fn missing_response_is_an_error() {
        assert!(serde_json::from_str::<ChatResponse>(r#"{"sources": []}"#).is_err());
    }
}
