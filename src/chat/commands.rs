//! Slash command parsing for the chat application.
//!
//! This module handles parsing of special commands that start with `/`,
//! allowing users to change the product or language, open menus, and control
//! the session without sending a question to the service.

use crate::chat::config::parse_product_selection;
use crate::types::feedback_request::{MAX_SCORE, MIN_SCORE};
use crate::types::{Language, Product};

/// A parsed chat command.
///
/// These commands control the chat session and are not sent to the service.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Start over with a fresh welcome message.
    Clear,

    /// Open or close the product menu.
    ProductMenu,

    /// Select a product; `None` selects all products.
    SelectProduct(Option<Product>),

    /// Open or close the language menu.
    LanguageMenu,

    /// Select a language, resetting the conversation.
    SelectLanguage(Language),

    /// Close whichever menu is open.
    CloseMenu,

    /// Switch between streamed and one-shot replies.
    Stream(bool),

    /// Rate the most recent rateable answer.
    Feedback(u8),

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Display session statistics.
    Stats,

    /// Show the current configuration.
    ShowConfig,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command, or `None` if it
/// should be sent to the assistant as a question.
///
/// # Examples
///
/// ```
/// # use irembo_chat::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/language fr").is_some());
/// assert!(parse_command("How do I renew my passport?").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    if !input.starts_with('/') {
        return None;
    }

    let (command, argument) = match input[1..].split_once(char::is_whitespace) {
        Some((command, rest)) => (command, Some(rest.trim()).filter(|s| !s.is_empty())),
        None => (&input[1..], None),
    };
    let command = command.to_lowercase();

    let result = match command.as_str() {
        "clear" | "reset" => ChatCommand::Clear,
        "product" | "p" => match argument {
            None => ChatCommand::ProductMenu,
            Some(arg) => parse_product_argument(arg),
        },
        "language" | "lang" | "l" => match argument {
            None => ChatCommand::LanguageMenu,
            Some(arg) => parse_language_argument(arg),
        },
        "close" => ChatCommand::CloseMenu,
        "stream" => match argument.and_then(parse_on_off) {
            Some(value) => ChatCommand::Stream(value),
            None => ChatCommand::Invalid("/stream expects 'on' or 'off'".to_string()),
        },
        "feedback" | "rate" => match argument {
            Some(arg) => match arg.parse::<u8>() {
                Ok(score) if (MIN_SCORE..=MAX_SCORE).contains(&score) => {
                    ChatCommand::Feedback(score)
                }
                _ => ChatCommand::Invalid(format!(
                    "/feedback expects a score from {MIN_SCORE} to {MAX_SCORE}"
                )),
            },
            None => ChatCommand::Invalid("/feedback requires a score".to_string()),
        },
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        "stats" | "status" => ChatCommand::Stats,
        "config" => ChatCommand::ShowConfig,
        _ => ChatCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

/// Product by id, name, `all`, or menu number (0 is all products).
fn parse_product_argument(arg: &str) -> ChatCommand {
    if let Ok(index) = arg.parse::<usize>() {
        return match index {
            0 => ChatCommand::SelectProduct(None),
            n => match Product::ALL.get(n - 1) {
                Some(product) => ChatCommand::SelectProduct(Some(*product)),
                None => ChatCommand::Invalid(format!(
                    "/product expects a number from 0 to {}",
                    Product::ALL.len()
                )),
            },
        };
    }
    match parse_product_selection(arg) {
        Ok(product) => ChatCommand::SelectProduct(product),
        Err(err) => ChatCommand::Invalid(err),
    }
}

/// Language by code, name, or menu number (starting at 1).
fn parse_language_argument(arg: &str) -> ChatCommand {
    if let Ok(index) = arg.parse::<usize>() {
        return match index.checked_sub(1).and_then(|i| Language::ALL.get(i)) {
            Some(language) => ChatCommand::SelectLanguage(*language),
            None => ChatCommand::Invalid(format!(
                "/language expects a number from 1 to {}",
                Language::ALL.len()
            )),
        };
    }
    match arg.parse::<Language>() {
        Ok(language) => ChatCommand::SelectLanguage(language),
        Err(err) => ChatCommand::Invalid(err),
    }
}

fn parse_on_off(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "on" | "true" | "yes" => Some(true),
        "off" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /product               Open or close the product menu
  /product <id|n|all>    Select a product (e.g., /product OSC, /product 0 for all)
  /language              Open or close the language menu
  /language <code|n>     Select a language (en, fr, rw); restarts the conversation
  /close                 Close the open menu
  /stream on|off         Stream replies token by token
  /feedback <1-5>        Rate the last answer that carries an interaction id
  /clear                 Start over with a fresh welcome message
  /stats                 Show session statistics
  /config                Show current configuration
  /help                  Show this help message
  /quit                  Exit the chat

End a line with \ to continue typing on the next line."#
}
