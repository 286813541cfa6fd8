use std::env;
use std::pin::Pin;
use std::time::{Duration, Instant};

use futures::Stream;
use futures::stream::{self, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, header};
use url::Url;

use crate::error::{Error, Result};
use crate::observability::{CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS};
use crate::stream::process_stream;
use crate::types::{
    ChatRequest, ChatResponse, FeedbackRequest, StreamEnd, StreamEvent, StreamMetadata,
};

/// Base URL used when neither a flag nor the environment names one.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Environment variable holding the assistant service base URL.
pub const API_URL_ENV: &str = "IREMBO_API_URL";

/// Upper bound on a single request, including reading a streamed body.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const CHAT_PATH: &str = "api/chat";
const STREAM_PATH: &str = "chat";
const FEEDBACK_PATH: &str = "feedback";

/// A boxed stream of reply events.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>;

/// The assistant service as seen by a chat session.
///
/// [`AssistantClient`] talks HTTP; tests and embedders can supply their own.
#[async_trait::async_trait]
pub trait Assistant: Send + Sync {
    /// Sends one question and waits for the whole answer.
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse>;

    /// Sends one question and yields the answer as it is produced.
    ///
    /// The default adapts [`Assistant::chat`] into a single-token stream.
    async fn chat_stream(&self, request: &ChatRequest) -> Result<EventStream> {
        let reply = self.chat(request).await?;
        let mut events = vec![Ok(StreamEvent::Metadata(StreamMetadata {
            sources: reply.sources,
            language: reply.language,
        }))];
        if !reply.response.is_empty() {
            events.push(Ok(StreamEvent::Token(reply.response)));
        }
        events.push(Ok(StreamEvent::End(StreamEnd::default())));
        Ok(Box::pin(stream::iter(events)))
    }

    /// Rates an earlier answer.
    async fn feedback(&self, feedback: &FeedbackRequest) -> Result<()>;
}

/// HTTP client for the assistant service.
#[derive(Debug, Clone)]
pub struct AssistantClient {
    client: ReqwestClient,
    base_url: Url,
    timeout: Duration,
}

impl AssistantClient {
    /// Create a new client.
    ///
    /// The base URL is read from the IREMBO_API_URL environment variable and
    /// falls back to [`DEFAULT_API_URL`].
    pub fn new() -> Result<Self> {
        Self::with_options(None, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(base_url: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let base_url = base_url
            .or_else(|| env::var(API_URL_ENV).ok().filter(|s| !s.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let base_url = parse_base_url(&base_url)?;

        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    /// The service base URL, always ending in `/`.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn default_headers(accept: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static(accept));
        headers
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {}", e),
                    Some(Box::new(e)),
                );
            }
        };

        // FastAPI reports {"detail": "..."}; validation failures carry a list.
        let message = serde_json::from_str::<serde_json::Value>(&error_body)
            .ok()
            .and_then(|v| v.get("detail").cloned())
            .map(|detail| match detail {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .unwrap_or(error_body);

        Error::api(status_code, message)
    }

    async fn post<T: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
        accept: &'static str,
    ) -> Result<Response> {
        let url = self.endpoint(path)?;
        tracing::debug!(%url, "posting to assistant service");
        CLIENT_REQUESTS.click();
        let start = Instant::now();

        let result = self
            .client
            .post(url)
            .headers(Self::default_headers(accept))
            .json(body)
            .send()
            .await
            .map_err(|e| Error::from_reqwest(e, Some(self.timeout.as_secs_f64())));
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());

        let response = match result {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                CLIENT_REQUEST_ERRORS.click();
                return Err(Self::process_error_response(response).await);
            }
            Err(err) => {
                CLIENT_REQUEST_ERRORS.click();
                return Err(err);
            }
        };
        Ok(response)
    }

    /// Send a question and decode the complete JSON answer.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let response = self.post(CHAT_PATH, request, "application/json").await?;
        response.json::<ChatResponse>().await.map_err(|e| {
            CLIENT_REQUEST_ERRORS.click();
            Error::from_reqwest(e, Some(self.timeout.as_secs_f64()))
        })
    }

    /// Send a question to the streaming endpoint.
    pub async fn chat_stream(&self, request: &ChatRequest) -> Result<EventStream> {
        let response = self.post(STREAM_PATH, request, "text/plain").await?;
        let bytes = Box::pin(response.bytes_stream().map(|result| {
            result.map_err(|e| {
                Error::streaming(format!("Error in HTTP stream: {}", e), Some(Box::new(e)))
            })
        }));
        Ok(Box::pin(process_stream(bytes)))
    }

    /// Send a feedback score for an earlier answer.
    pub async fn feedback(&self, feedback: &FeedbackRequest) -> Result<()> {
        self.post(FEEDBACK_PATH, feedback, "application/json")
            .await
            .map(|_| ())
    }
}

#[async_trait::async_trait]
impl Assistant for AssistantClient {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        AssistantClient::chat(self, request).await
    }

    async fn chat_stream(&self, request: &ChatRequest) -> Result<EventStream> {
        AssistantClient::chat_stream(self, request).await
    }

    async fn feedback(&self, feedback: &FeedbackRequest) -> Result<()> {
        AssistantClient::feedback(self, feedback).await
    }
}

/// Parse a base URL, making sure relative joins append rather than replace.
pub fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw.trim())?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(Error::validation(
            format!("{raw} is not an http(s) base URL"),
            Some("api_url".to_string()),
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
