//! Chat application module for talking to the Irembo assistant.
//!
//! This module provides the conversation model and a terminal REPL built on
//! top of the client library. It supports:
//!
//! - Product and language selection, with a fresh welcome per language
//! - One-shot or streamed replies with source links
//! - Slash commands for session control
//!
//! # Architecture
//!
//! The module is organized into several components:
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`state`]: the chat state container and its transitions
//! - [`view`]: the pure mapping from state to what is drawn
//! - [`render`]: drawing views into a terminal
//! - [`session`]: turns against the assistant service
//! - [`commands`]: slash command parsing

pub mod commands;
pub mod config;
pub mod render;
pub mod session;
pub mod state;
pub mod view;

pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig, parse_product_selection};
pub use render::{PlainTextRenderer, Renderer};
pub use session::{ChatSession, SessionStats};
pub use state::{
    ChatState, Overlay, PendingTurn, RejectReason, Selection, TurnCounts, TurnOutcome, TurnState,
};
pub use view::{Alignment, Bubble, Link, Menu, MenuItem, View, view};
