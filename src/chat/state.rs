//! The chat state container.
//!
//! [`ChatState`] owns everything the view is drawn from: the conversation,
//! the selection, the pending input, the turn state and the open menu.  All
//! transitions here are synchronous; the network half of a turn lives in
//! [`ChatSession`](crate::chat::ChatSession).

use crate::error::Error;
use crate::observability::{SESSION_LANGUAGE_RESETS, SESSION_SENDS_REJECTED};
use crate::types::{ChatRequest, ChatResponse, Language, Message, MessageId, Product};

/// Current product filter and display language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Product filter; `None` means all products.
    pub product: Option<Product>,
    /// Display language.
    pub language: Language,
}

/// Where a turn stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// Ready to send.
    Idle,
    /// A request is in flight; sending is disabled.
    AwaitingResponse,
}

/// Which selection menu is open.  At most one is open at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Overlay {
    /// No menu open.
    #[default]
    None,
    /// Product menu open.
    Product,
    /// Language menu open.
    Language,
}

/// Why a send did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The input was empty or whitespace.
    EmptyInput,
    /// Another turn is still awaiting its response.
    Busy,
}

/// A turn that has been started and still needs its reply.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a pending turn must be completed to return the session to idle"]
pub struct PendingTurn {
    /// The request to send to the assistant.
    pub request: ChatRequest,
    /// Id of the user message that opened the turn.
    pub user_message: MessageId,
}

/// How a turn ended.
#[derive(Debug, Clone)]
pub enum TurnOutcome {
    /// The assistant answered and the reply was appended.
    Answered,
    /// The exchange failed and the apology was appended.
    Failed {
        /// What went wrong, for logging.
        cause: Error,
    },
    /// The send was a no-op.
    Rejected(RejectReason),
}

impl TurnOutcome {
    /// True when the reply was appended successfully.
    pub fn is_answered(&self) -> bool {
        matches!(self, TurnOutcome::Answered)
    }

    /// True when the turn ended with the apology message.
    pub fn is_failed(&self) -> bool {
        matches!(self, TurnOutcome::Failed { .. })
    }

    /// True when nothing was sent.
    pub fn is_rejected(&self) -> bool {
        matches!(self, TurnOutcome::Rejected(_))
    }

    /// Why the send was rejected, if it was.
    pub fn rejection(&self) -> Option<RejectReason> {
        match self {
            TurnOutcome::Rejected(reason) => Some(*reason),
            _ => None,
        }
    }
}

/// Counters kept across the life of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurnCounts {
    /// Turns that ended with a reply.
    pub answered: u64,
    /// Turns that ended with the apology.
    pub failed: u64,
    /// Sends that were no-ops.
    pub rejected: u64,
}

/// All UI state of one chat.
#[derive(Debug, Clone)]
pub struct ChatState {
    conversation: Vec<Message>,
    selection: Selection,
    input: String,
    turn: TurnState,
    overlay: Overlay,
    generation: u64,
    next_id: u64,
    counts: TurnCounts,
}

impl ChatState {
    /// Creates a state seeded with the welcome message for `language`.
    pub fn new(language: Language, product: Option<Product>) -> Self {
        let mut state = Self {
            conversation: Vec::new(),
            selection: Selection { product, language },
            input: String::new(),
            turn: TurnState::Idle,
            overlay: Overlay::None,
            generation: 0,
            next_id: 0,
            counts: TurnCounts::default(),
        };
        state.reset_conversation();
        state
    }

    fn allocate_id(&mut self) -> MessageId {
        let id = MessageId(self.next_id);
        self.next_id += 1;
        id
    }

    fn reset_conversation(&mut self) {
        let welcome = Message::welcome(self.allocate_id(), self.selection.language);
        self.conversation = vec![welcome];
    }

    /// Replaces the conversation with a fresh welcome for `language`.
    ///
    /// Calling this again with the same language yields an equivalent
    /// conversation with a new id and timestamp.
    pub fn change_language(&mut self, language: Language) {
        self.selection.language = language;
        self.generation += 1;
        SESSION_LANGUAGE_RESETS.click();
        self.reset_conversation();
    }

    /// Selects a language from the menu and restarts the conversation.
    pub fn select_language(&mut self, language: Language) {
        self.overlay = Overlay::None;
        self.change_language(language);
    }

    /// Selects the product the next question is about.
    pub fn select_product(&mut self, product: Option<Product>) {
        self.overlay = Overlay::None;
        self.selection.product = product;
    }

    /// Opens the product menu, or closes it if it is already open.
    pub fn toggle_product_menu(&mut self) {
        self.overlay = match self.overlay {
            Overlay::Product => Overlay::None,
            _ => Overlay::Product,
        };
    }

    /// Opens the language menu, or closes it if it is already open.
    pub fn toggle_language_menu(&mut self) {
        self.overlay = match self.overlay {
            Overlay::Language => Overlay::None,
            _ => Overlay::Language,
        };
    }

    /// Closes any open menu.
    pub fn close_overlay(&mut self) {
        self.overlay = Overlay::None;
    }

    /// Replaces the pending input text.
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// The pending input text.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Whether the send action is enabled.
    pub fn can_send(&self) -> bool {
        self.turn == TurnState::Idle && !self.input.trim().is_empty()
    }

    /// Starts a turn from the pending input.
    ///
    /// On success the user message is appended, the input is cleared and the
    /// state is AwaitingResponse until [`ChatState::complete_turn`].
    pub fn begin_turn(&mut self) -> Result<PendingTurn, RejectReason> {
        let reason = if self.turn != TurnState::Idle {
            Some(RejectReason::Busy)
        } else if self.input.trim().is_empty() {
            Some(RejectReason::EmptyInput)
        } else {
            None
        };
        if let Some(reason) = reason {
            self.counts.rejected += 1;
            SESSION_SENDS_REJECTED.click();
            return Err(reason);
        }

        let text = std::mem::take(&mut self.input);
        let user_message = self.allocate_id();
        self.conversation
            .push(Message::user(user_message, text.clone()));
        self.turn = TurnState::AwaitingResponse;
        Ok(PendingTurn {
            request: ChatRequest::new(text, self.selection.product, self.selection.language),
            user_message,
        })
    }

    /// Finishes a turn with the service's answer or the reason it failed.
    ///
    /// Exactly one bot message is appended either way, and the state returns
    /// to Idle.
    pub fn complete_turn(
        &mut self,
        pending: PendingTurn,
        result: Result<(ChatResponse, Option<String>), Error>,
    ) -> TurnOutcome {
        tracing::trace!(user_message = %pending.user_message, "completing turn");
        self.turn = TurnState::Idle;
        let id = self.allocate_id();
        match result {
            Ok((response, request_id)) => {
                self.conversation
                    .push(Message::from_response(id, response).with_request_id(request_id));
                self.counts.answered += 1;
                TurnOutcome::Answered
            }
            Err(cause) => {
                self.conversation.push(Message::apology(id));
                self.counts.failed += 1;
                TurnOutcome::Failed { cause }
            }
        }
    }

    /// The conversation, oldest first.
    pub fn conversation(&self) -> &[Message] {
        &self.conversation
    }

    /// The current selection.
    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Where the current turn stands.
    pub fn turn_state(&self) -> TurnState {
        self.turn
    }

    /// True while a request is in flight.
    pub fn is_awaiting(&self) -> bool {
        self.turn == TurnState::AwaitingResponse
    }

    /// The open menu, if any.
    pub fn overlay(&self) -> Overlay {
        self.overlay
    }

    /// Bumped each time the conversation is replaced.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Turn counters.
    pub fn counts(&self) -> TurnCounts {
        self.counts
    }

    /// Most recent bot message carrying a service interaction id.
    pub fn last_rateable(&self) -> Option<&Message> {
        self.conversation
            .iter()
            .rev()
            .find(|m| !m.is_user() && m.request_id.is_some())
    }
}
