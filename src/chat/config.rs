//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and configuration
//! structures for controlling chat behavior.  Values resolve in order:
//! command-line flag, environment variable, built-in default.

use std::env;
use std::time::Duration;

use arrrg_derive::CommandLine;

use crate::client::{API_URL_ENV, DEFAULT_API_URL, DEFAULT_TIMEOUT};
use crate::types::{Language, Product};

/// Environment variable overriding the request timeout, in seconds.
pub const TIMEOUT_ENV: &str = "IREMBO_TIMEOUT_SECS";

/// Terminal width assumed when none is configured.
const DEFAULT_WIDTH: usize = 80;

/// Narrowest width bubbles can be laid out in.
const MIN_WIDTH: usize = 20;

/// Command-line arguments for the irembo-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Base URL of the assistant service.
    #[arrrg(optional, "Assistant service URL (default: $IREMBO_API_URL or http://localhost:8000)", "URL")]
    pub api_url: Option<String>,

    /// Initial display language.
    #[arrrg(optional, "Language: en, fr, rw (default: en)", "LANG")]
    pub language: Option<String>,

    /// Initial product filter.
    #[arrrg(optional, "Product: IremboGov, OSC, IremboPlus (default: all)", "PRODUCT")]
    pub product: Option<String>,

    /// Request timeout in seconds.
    #[arrrg(optional, "Request timeout in seconds (default: 60)", "SECS")]
    pub timeout_secs: Option<u64>,

    /// Width used to lay out message bubbles.
    #[arrrg(optional, "Terminal width for message layout (default: 80)", "COLUMNS")]
    pub width: Option<usize>,

    /// Use the streaming endpoint.
    #[arrrg(flag, "Stream replies token by token")]
    pub stream: bool,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// Base URL of the assistant service.
    pub api_url: String,

    /// Language the conversation starts in.
    pub language: Language,

    /// Product filter the conversation starts with.
    pub product: Option<Product>,

    /// Upper bound on each request.
    pub timeout: Duration,

    /// Whether replies are streamed.
    pub streaming: bool,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// Layout width for message bubbles.
    pub width: usize,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - API URL: http://localhost:8000
    /// - Language: English, all products
    /// - Timeout: 60 seconds
    /// - Streaming: off
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            language: Language::En,
            product: None,
            timeout: DEFAULT_TIMEOUT,
            streaming: false,
            use_color: true,
            width: DEFAULT_WIDTH,
        }
    }

    /// Reads the environment on top of the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::new();
        if let Some(url) = env::var(API_URL_ENV).ok().filter(|s| !s.trim().is_empty()) {
            config.api_url = url;
        }
        if let Some(secs) = env::var(TIMEOUT_ENV)
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
        {
            config.timeout = Duration::from_secs(secs.max(1));
        }
        config
    }

    /// Sets the service base URL.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Sets the starting language.
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Sets the starting product filter.
    pub fn with_product(mut self, product: Option<Product>) -> Self {
        self.product = product;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enables or disables streaming replies.
    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Sets the layout width, clamped to a usable minimum.
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width.max(MIN_WIDTH);
        self
    }

    /// Applies command-line arguments over this configuration.
    ///
    /// # Errors
    ///
    /// Returns a message naming the offending flag when a language or
    /// product value is not recognized.
    pub fn apply_args(mut self, args: ChatArgs) -> Result<Self, String> {
        if let Some(url) = args.api_url {
            self.api_url = url;
        }
        if let Some(language) = args.language {
            self.language = language.parse().map_err(|e| format!("--language: {e}"))?;
        }
        if let Some(product) = args.product {
            self.product = parse_product_selection(&product)
                .map_err(|e| format!("--product: {e}"))?;
        }
        if let Some(secs) = args.timeout_secs {
            self.timeout = Duration::from_secs(secs.max(1));
        }
        if let Some(width) = args.width {
            self = self.with_width(width);
        }
        self.streaming |= args.stream;
        if args.no_color {
            self.use_color = false;
        }
        Ok(self)
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses a product selection where `all` (or `none`) clears the filter.
pub fn parse_product_selection(s: &str) -> Result<Option<Product>, String> {
    match s.trim().to_lowercase().as_str() {
        "all" | "none" | "any" => Ok(None),
        _ => s.parse().map(Some),
    }
}
