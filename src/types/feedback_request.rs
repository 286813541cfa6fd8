use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Lowest accepted feedback score.
pub const MIN_SCORE: u8 = 1;

/// Highest accepted feedback score.
pub const MAX_SCORE: u8 = 5;

/// A rating for one answered interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRequest {
    /// Interaction id handed out by the service at the end of a streamed reply.
    pub request_id: String,

    /// Score from 1 to 5.
    pub score: u8,
}

impl FeedbackRequest {
    /// Creates a feedback request, rejecting scores outside 1..=5.
    pub fn new(request_id: impl Into<String>, score: u8) -> Result<Self> {
        if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
            return Err(Error::validation(
                format!("score must be between {MIN_SCORE} and {MAX_SCORE}"),
                Some("score".to_string()),
            ));
        }
        Ok(Self {
            request_id: request_id.into(),
            score,
        })
    }
}
