use std::fmt;

use time::OffsetDateTime;

use crate::types::{ChatResponse, Language, Source};
use crate::utils::time::parse_service_timestamp;

/// Text of the bot message appended when a turn fails.
pub const APOLOGY_TEXT: &str = "Sorry, I encountered an error. Please try again.";

/// Identifier of a message within a session; strictly increasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// The person typing.
    User,

    /// The assistant, including welcome and apology messages.
    Bot,
}

/// One entry in the conversation.
///
/// Messages are built complete and never modified after they are appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Session-unique id.
    pub id: MessageId,

    /// Author.
    pub role: Role,

    /// Body text, verbatim.
    pub text: String,

    /// Citations, in the order the service gave them.
    pub sources: Vec<Source>,

    /// When the message was created (for replies, when the service answered).
    pub created_at: OffsetDateTime,

    /// Set on the apology message of a failed turn.
    pub is_error: bool,

    /// Language the reply was written in, when the service reported one.
    pub language: Option<Language>,

    /// Service interaction id, used to send feedback.
    pub request_id: Option<String>,
}

impl Message {
    fn bot(id: MessageId, text: impl Into<String>) -> Self {
        Self {
            id,
            role: Role::Bot,
            text: text.into(),
            sources: Vec::new(),
            created_at: OffsetDateTime::now_utc(),
            is_error: false,
            language: None,
            request_id: None,
        }
    }

    /// A message typed by the user.
    pub fn user(id: MessageId, text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            ..Self::bot(id, text)
        }
    }

    /// The greeting for `language`.
    pub fn welcome(id: MessageId, language: Language) -> Self {
        Self {
            language: Some(language),
            ..Self::bot(id, language.welcome())
        }
    }

    /// The fixed apology for a failed turn.
    pub fn apology(id: MessageId) -> Self {
        Self {
            is_error: true,
            ..Self::bot(id, APOLOGY_TEXT)
        }
    }

    /// A bot reply decoded from the service's answer.
    ///
    /// An unparseable or missing timestamp falls back to the local clock.
    pub fn from_response(id: MessageId, response: ChatResponse) -> Self {
        let created_at = response
            .timestamp
            .as_deref()
            .and_then(parse_service_timestamp)
            .unwrap_or_else(OffsetDateTime::now_utc);
        let language = response.language.as_deref().and_then(|l| l.parse().ok());
        Self {
            sources: response.sources,
            created_at,
            language,
            ..Self::bot(id, response.response)
        }
    }

    /// Attaches the service interaction id.
    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        self.request_id = request_id;
        self
    }

    /// True for messages written by the user.
    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}
