use serde::{Deserialize, Serialize};

use crate::types::Source;

/// Leading JSON object of a streamed reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamMetadata {
    /// Citations for the answer that follows.
    #[serde(default)]
    pub sources: Vec<Source>,

    /// Language the service will answer in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Trailing footer of a streamed reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEnd {
    /// Interaction id usable for feedback.
    #[serde(default)]
    pub request_id: Option<String>,

    /// Footer discriminator; the service sends `"end_event"`.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// One parsed piece of a streamed reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Sources and language, always first.
    Metadata(StreamMetadata),

    /// A run of answer text.
    Token(String),

    /// The footer, always last when present.
    End(StreamEnd),
}
