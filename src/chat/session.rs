//! Core chat session management.
//!
//! This module provides the `ChatSession` struct which owns the chat state
//! and drives turns against an [`Assistant`].

use std::time::{Duration, Instant};

use futures::StreamExt;

use crate::Error;
use crate::chat::config::ChatConfig;
use crate::chat::render::Renderer;
use crate::chat::state::{ChatState, PendingTurn, Selection, TurnOutcome};
use crate::chat::view::{View, view};
use crate::client::{Assistant, AssistantClient};
use crate::error::Result;
use crate::observability::{
    SESSION_TURN_FAILURES, SESSION_TURNS, STREAM_ERRORS, STREAM_TOKENS, STREAM_TTFT,
};
use crate::types::{
    ChatRequest, ChatResponse, FeedbackRequest, Language, Message, Product, StreamEvent,
    selection_label,
};

/// A chat session that manages conversation state and service interactions.
pub struct ChatSession<A: Assistant = AssistantClient> {
    assistant: A,
    config: ChatConfig,
    state: ChatState,
    streaming: bool,
}

/// Aggregated stats for a chat session.
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// The service base URL.
    pub api_url: String,
    /// The per-request timeout.
    pub timeout: Duration,
    /// The current language.
    pub language: Language,
    /// The current product label.
    pub product: &'static str,
    /// Whether replies are streamed.
    pub streaming: bool,
    /// The number of messages in the conversation.
    pub message_count: usize,
    /// Turns answered by the service.
    pub answered_turns: u64,
    /// Turns that ended in the apology.
    pub failed_turns: u64,
    /// Sends that did nothing.
    pub rejected_sends: u64,
}

impl ChatSession<AssistantClient> {
    /// Creates a new chat session talking HTTP to the configured service.
    pub fn new(config: ChatConfig) -> Result<Self> {
        let client =
            AssistantClient::with_options(Some(config.api_url.clone()), Some(config.timeout))?;
        Ok(Self::with_assistant(client, config))
    }
}

impl<A: Assistant> ChatSession<A> {
    /// Creates a new chat session with a custom assistant.
    pub fn with_assistant(assistant: A, config: ChatConfig) -> Self {
        let state = ChatState::new(config.language, config.product);
        let streaming = config.streaming;
        Self {
            assistant,
            config,
            state,
            streaming,
        }
    }

    /// The chat state.
    pub fn state(&self) -> &ChatState {
        &self.state
    }

    /// The chat state, for driving menus and turns by hand.
    pub fn state_mut(&mut self) -> &mut ChatState {
        &mut self.state
    }

    /// The current view.
    pub fn view(&self) -> View {
        view(&self.state)
    }

    /// The conversation, oldest first.
    pub fn conversation(&self) -> &[Message] {
        self.state.conversation()
    }

    /// The current product and language.
    pub fn selection(&self) -> Selection {
        self.state.selection()
    }

    /// Restarts the conversation in `language`.
    pub fn change_language(&mut self, language: Language) {
        self.state.change_language(language);
    }

    /// Picks a language from the menu.
    pub fn select_language(&mut self, language: Language) {
        self.state.select_language(language);
    }

    /// Picks a product from the menu; `None` means all products.
    pub fn select_product(&mut self, product: Option<Product>) {
        self.state.select_product(product);
    }

    /// Whether replies are streamed.
    pub fn streaming(&self) -> bool {
        self.streaming
    }

    /// Switches between streamed and one-shot replies.
    pub fn set_streaming(&mut self, streaming: bool) {
        self.streaming = streaming;
    }

    /// The configuration the session was created with.
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Sends `text` as a question and waits for the one-shot answer.
    pub async fn send(&mut self, text: impl Into<String>) -> TurnOutcome {
        self.state.set_input(text);
        self.send_input().await
    }

    /// Sends the pending input and waits for the one-shot answer.
    ///
    /// Empty input and sends while another turn is awaiting are no-ops.
    /// Every other path appends exactly one bot message.
    pub async fn send_input(&mut self) -> TurnOutcome {
        let pending = match self.state.begin_turn() {
            Ok(pending) => pending,
            Err(reason) => return TurnOutcome::Rejected(reason),
        };
        let result = self.assistant.chat(&pending.request).await.map(|r| (r, None));
        self.finish(pending, result)
    }

    /// Sends the pending input, drawing each step with `renderer`.
    ///
    /// Streams the reply token by token when streaming is on.
    pub async fn send_rendered(&mut self, renderer: &mut dyn Renderer) -> TurnOutcome {
        let pending = match self.state.begin_turn() {
            Ok(pending) => pending,
            Err(reason) => return TurnOutcome::Rejected(reason),
        };
        renderer.render(&self.view());

        let result = if self.streaming {
            renderer.begin_stream();
            self.stream_reply(&pending.request, renderer).await
        } else {
            self.assistant.chat(&pending.request).await.map(|r| (r, None))
        };
        let outcome = self.finish(pending, result);
        renderer.render(&self.view());
        outcome
    }

    async fn stream_reply(
        &self,
        request: &ChatRequest,
        renderer: &mut dyn Renderer,
    ) -> Result<(ChatResponse, Option<String>)> {
        let start = Instant::now();
        let mut events = self.assistant.chat_stream(request).await?;
        let mut reply = ChatResponse::new(String::new());
        let mut request_id = None;
        let mut first_token = true;

        while let Some(event) = events.next().await {
            let event = event.inspect_err(|_| STREAM_ERRORS.click())?;
            match event {
                StreamEvent::Metadata(metadata) => {
                    reply.sources = metadata.sources;
                    reply.language = metadata.language;
                }
                StreamEvent::Token(token) => {
                    if first_token {
                        STREAM_TTFT.add(start.elapsed().as_secs_f64());
                        first_token = false;
                    }
                    STREAM_TOKENS.click();
                    renderer.print_token(&token);
                    reply.response.push_str(&token);
                }
                StreamEvent::End(end) => request_id = end.request_id,
            }
        }
        Ok((reply, request_id))
    }

    fn finish(
        &mut self,
        pending: PendingTurn,
        result: Result<(ChatResponse, Option<String>)>,
    ) -> TurnOutcome {
        SESSION_TURNS.click();
        if let Err(err) = &result {
            SESSION_TURN_FAILURES.click();
            tracing::warn!(error = %err, kind = err.kind(), "chat turn failed");
        }
        self.state.complete_turn(pending, result)
    }

    /// Rates the most recent answer that carries a service interaction id.
    ///
    /// Returns the id that was rated.
    pub async fn send_feedback(&self, score: u8) -> Result<String> {
        let request_id = self
            .state
            .last_rateable()
            .and_then(|m| m.request_id.clone())
            .ok_or_else(|| {
                Error::validation(
                    "no answer to rate yet; only streamed answers can be rated",
                    Some("request_id".to_string()),
                )
            })?;
        let feedback = FeedbackRequest::new(request_id.clone(), score)?;
        self.assistant.feedback(&feedback).await?;
        tracing::debug!(%request_id, score, "feedback sent");
        Ok(request_id)
    }

    /// Returns the current session statistics snapshot.
    pub fn stats(&self) -> SessionStats {
        let selection = self.state.selection();
        let counts = self.state.counts();
        SessionStats {
            api_url: self.config.api_url.clone(),
            timeout: self.config.timeout,
            language: selection.language,
            product: selection_label(selection.product),
            streaming: self.streaming,
            message_count: self.state.conversation().len(),
            answered_turns: counts.answered,
            failed_turns: counts.failed,
            rejected_sends: counts.rejected,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use futures::stream;

    use super::*;
    use crate::chat::render::PlainTextRenderer;
    use crate::chat::state::RejectReason;
    use crate::client::EventStream;
    use crate::types::{APOLOGY_TEXT, Role, Source, StreamEnd, StreamMetadata};

    #[derive(Default)]
    struct FakeAssistant {
        replies: Mutex<VecDeque<Result<ChatResponse>>>,
        requests: Mutex<Vec<ChatRequest>>,
        feedback: Mutex<Vec<FeedbackRequest>>,
        stream: Mutex<Option<Vec<Result<StreamEvent>>>>,
    }

    impl FakeAssistant {
        fn replying(replies: Vec<Result<ChatResponse>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                ..Self::default()
            }
        }

        fn streaming(events: Vec<Result<StreamEvent>>) -> Self {
            Self {
                stream: Mutex::new(Some(events)),
                ..Self::default()
            }
        }

        fn requests(&self) -> Vec<ChatRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl Assistant for FakeAssistant {
        async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
            self.requests.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(Error::connection("no reply queued", None)))
        }

        async fn chat_stream(&self, request: &ChatRequest) -> Result<EventStream> {
            let events = self.stream.lock().unwrap().take();
            match events {
                Some(events) => {
                    self.requests.lock().unwrap().push(request.clone());
                    Ok(Box::pin(stream::iter(events)))
                }
                None => {
                    let reply = self.chat(request).await?;
                    Ok(Box::pin(stream::iter(vec![
                        Ok(StreamEvent::Metadata(StreamMetadata {
                            sources: reply.sources,
                            language: reply.language,
                        })),
                        Ok(StreamEvent::Token(reply.response)),
                        Ok(StreamEvent::End(StreamEnd::default())),
                    ])))
                }
            }
        }

        async fn feedback(&self, feedback: &FeedbackRequest) -> Result<()> {
            self.feedback.lock().unwrap().push(feedback.clone());
            Ok(())
        }
    }

    fn session(assistant: FakeAssistant) -> ChatSession<FakeAssistant> {
        ChatSession::with_assistant(assistant, ChatConfig::new())
    }

    #[test]
    fn new_session_has_welcome() {
        let session = session(FakeAssistant::default());
        assert_eq!(session.conversation().len(), 1);
        assert_eq!(session.conversation()[0].text, Language::En.welcome());
        assert_eq!(session.selection().product, None);
    }

    #[test]
    fn session_starts_from_config() {
        let config = ChatConfig::new()
            .with_language(Language::Rw)
            .with_product(Some(Product::Osc))
            .with_streaming(true);
        let session = ChatSession::with_assistant(FakeAssistant::default(), config);
        assert_eq!(session.conversation()[0].text, Language::Rw.welcome());
        assert_eq!(session.selection().product, Some(Product::Osc));
        assert!(session.streaming());
    }

    #[tokio::test]
    async fn french_question_round_trip() {
        let reply = ChatResponse::new("Voici les étapes...")
            .with_sources(vec![Source::new("https://a/1", "IremboGov", "Permis")])
            .with_language("fr");
        let mut session = session(FakeAssistant::replying(vec![Ok(reply)]));
        session.select_language(Language::Fr);
        session.select_product(Some(Product::IremboGov));

        let outcome = session.send("Comment obtenir un permis?").await;
        assert!(outcome.is_answered());

        let requests = session.assistant.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].query, "Comment obtenir un permis?");
        assert_eq!(requests[0].language, Language::Fr);
        assert_eq!(requests[0].product, Some(Product::IremboGov));

        let conversation = session.conversation();
        assert_eq!(conversation.len(), 3);
        assert_eq!(conversation[0].text, Language::Fr.welcome());
        assert_eq!(conversation[1].role, Role::User);
        assert_eq!(conversation[2].text, "Voici les étapes...");
        assert_eq!(conversation[2].sources.len(), 1);
        assert_eq!(conversation[2].language, Some(Language::Fr));
    }

    #[tokio::test]
    async fn french_question_for_all_products_without_sources() {
        let reply = ChatResponse::new("Pour renouveler votre permis...").with_language("fr");
        let mut session = session(FakeAssistant::replying(vec![Ok(reply)]));
        session.select_language(Language::Fr);
        session.state_mut().set_input("Comment renouveler mon permis?");

        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), false);
        assert!(session.send_rendered(&mut renderer).await.is_answered());

        let requests = session.assistant.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            serde_json::to_value(&requests[0]).unwrap(),
            serde_json::json!({
                "query": "Comment renouveler mon permis?",
                "product": null,
                "language": "fr"
            })
        );

        assert_eq!(session.conversation().len(), 3);
        let view = session.view();
        let reply = view.bubbles.last().unwrap();
        assert_eq!(reply.text, "Pour renouveler votre permis...");
        assert!(reply.links.is_empty());

        let out = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(out.contains("Pour renouveler votre permis..."));
        assert!(!out.contains("Sources:"));
    }

    #[tokio::test]
    async fn two_sources_render_two_links() {
        let reply = ChatResponse::new("answer").with_sources(vec![
            Source::new("https://a/1", "IremboGov", "Passport"),
            Source::new("https://a/2", "OSC", "Business"),
        ]);
        let mut session = session(FakeAssistant::replying(vec![Ok(reply)]));
        assert!(session.send("q").await.is_answered());

        let view = session.view();
        let links = &view.bubbles.last().unwrap().links;
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].label, "IremboGov: Passport");
        assert_eq!(links[1].label, "OSC: Business");
    }

    #[tokio::test]
    async fn empty_input_makes_no_request() {
        let mut session = session(FakeAssistant::default());
        let outcome = session.send("   ").await;
        assert_eq!(outcome.rejection(), Some(RejectReason::EmptyInput));
        assert!(session.assistant.requests().is_empty());
        assert_eq!(session.conversation().len(), 1);
    }

    #[tokio::test]
    async fn send_while_awaiting_is_rejected() {
        let mut session = session(FakeAssistant::replying(vec![Ok(ChatResponse::new("late"))]));
        session.state_mut().set_input("first");
        let pending = session.state_mut().begin_turn().unwrap();

        let outcome = session.send("second").await;
        assert_eq!(outcome.rejection(), Some(RejectReason::Busy));
        assert!(session.assistant.requests().is_empty());

        let _ = session
            .state_mut()
            .complete_turn(pending, Ok((ChatResponse::new("late"), None)));
        assert_eq!(session.conversation().len(), 3);
        assert_eq!(session.stats().rejected_sends, 1);
    }

    #[tokio::test]
    async fn failure_appends_apology_and_keeps_selection() {
        let mut session = session(FakeAssistant::replying(vec![Err(Error::api(
            500,
            "internal error",
        ))]));
        session.select_product(Some(Product::IremboPlus));
        session.select_language(Language::Rw);

        let outcome = session.send("Muraho").await;
        match outcome {
            TurnOutcome::Failed { cause } => assert_eq!(cause.status_code(), Some(500)),
            other => panic!("expected failure, got {other:?}"),
        }
        let last = session.conversation().last().unwrap();
        assert_eq!(last.text, APOLOGY_TEXT);
        assert!(last.is_error);
        assert_eq!(session.selection().product, Some(Product::IremboPlus));
        assert_eq!(session.selection().language, Language::Rw);
        assert!(!session.state().is_awaiting());

        let stats = session.stats();
        assert_eq!(stats.failed_turns, 1);
        assert_eq!(stats.answered_turns, 0);
        assert_eq!(stats.product, "IremboPlus");
    }

    #[tokio::test]
    async fn streamed_reply_collects_tokens_and_request_id() {
        let events = vec![
            Ok(StreamEvent::Metadata(StreamMetadata {
                sources: vec![Source::new("https://a/1", "OSC", "Company")],
                language: Some("en".to_string()),
            })),
            Ok(StreamEvent::Token("Register ".to_string())),
            Ok(StreamEvent::Token("online.".to_string())),
            Ok(StreamEvent::End(StreamEnd {
                request_id: Some("req-1".to_string()),
                kind: Some("end_event".to_string()),
            })),
        ];
        let mut session = session(FakeAssistant::streaming(events));
        session.set_streaming(true);
        session.state_mut().set_input("How do I register a company?");

        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), false);
        let outcome = session.send_rendered(&mut renderer).await;
        assert!(outcome.is_answered());

        let last = session.conversation().last().unwrap();
        assert_eq!(last.text, "Register online.");
        assert_eq!(last.sources.len(), 1);
        assert_eq!(last.request_id.as_deref(), Some("req-1"));

        let out = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(out.contains("Register online."));
        assert!(out.contains("OSC: Company <https://a/1>"));

        assert_eq!(session.send_feedback(4).await.unwrap(), "req-1");
        let sent = session.assistant.feedback.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].request_id, "req-1");
        assert_eq!(sent[0].score, 4);
    }

    #[tokio::test]
    async fn broken_stream_ends_in_apology() {
        let events = vec![
            Ok(StreamEvent::Metadata(StreamMetadata::default())),
            Ok(StreamEvent::Token("partial".to_string())),
            Err(Error::streaming("connection reset", None)),
        ];
        let mut session = session(FakeAssistant::streaming(events));
        session.set_streaming(true);
        session.state_mut().set_input("q");

        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), false);
        let outcome = session.send_rendered(&mut renderer).await;
        assert!(outcome.is_failed());
        assert_eq!(session.conversation().last().unwrap().text, APOLOGY_TEXT);
        assert_eq!(session.conversation().len(), 3);
    }

    #[tokio::test]
    async fn rendered_one_shot_send() {
        let mut session = session(FakeAssistant::replying(vec![Ok(ChatResponse::new("hi"))]));
        session.state_mut().set_input("hello");
        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), false);
        renderer.render(&session.view());
        assert!(session.send_rendered(&mut renderer).await.is_answered());

        let out = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(out.contains("Typing..."));
        assert!(out.contains("hello"));
        assert!(out.lines().any(|l| l == "hi"));
    }

    #[tokio::test]
    async fn feedback_needs_rateable_answer() {
        let mut session = session(FakeAssistant::replying(vec![Ok(ChatResponse::new("a"))]));
        let err = session.send_feedback(5).await.unwrap_err();
        assert!(err.is_validation());

        assert!(session.send("q").await.is_answered());
        assert!(session.send_feedback(5).await.unwrap_err().is_validation());
        assert!(session.assistant.feedback.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn language_change_discards_history() {
        let mut session = session(FakeAssistant::replying(vec![Ok(ChatResponse::new("a"))]));
        assert!(session.send("q").await.is_answered());
        assert_eq!(session.conversation().len(), 3);

        session.change_language(Language::Fr);
        assert_eq!(session.conversation().len(), 1);
        assert_eq!(session.conversation()[0].text, Language::Fr.welcome());
    }
}
