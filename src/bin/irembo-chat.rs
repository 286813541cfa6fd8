//! Interactive chat application for the Irembo assistant.
//!
//! This binary provides a REPL interface for asking questions about
//! IremboGov, One Stop Center and IremboPlus services.
//!
//! # Usage
//!
//! ```bash
//! # Talk to a local service on http://localhost:8000
//! irembo-chat
//!
//! # Start in French, filtered to One Stop Center, with streamed replies
//! irembo-chat --language fr --product OSC --stream
//!
//! # Point at another deployment and disable colors
//! irembo-chat --api-url https://assistant.example.com --no-color
//! ```
//!
//! A `.env` file in the working directory is read at startup, so
//! `IREMBO_API_URL` and `IREMBO_TIMEOUT_SECS` can live there.  Diagnostics
//! go to stderr and are controlled with `RUST_LOG`.
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/product [id]` - Open the product menu or pick a product
//! - `/language [code]` - Open the language menu or switch language
//! - `/stream on|off` - Toggle streamed replies
//! - `/feedback <1-5>` - Rate the last answer
//! - `/stats` - Show session statistics
//! - `/quit` - Exit the application

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::EnvFilter;

use irembo_chat::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatSession, Overlay, PlainTextRenderer, Renderer,
    TurnOutcome, help_text, parse_command,
};
use irembo_chat::{Language, Product};

/// Main entry point for the irembo-chat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let (args, _) = ChatArgs::from_command_line_relaxed("irembo-chat [OPTIONS]");
    let config = match ChatConfig::from_env().apply_args(args) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("{message}");
            std::process::exit(2);
        }
    };
    let (use_color, width) = (config.use_color, config.width);

    let mut session = ChatSession::new(config)?;
    let mut renderer = PlainTextRenderer::with_color(use_color).with_width(width);
    let mut rl = DefaultEditor::new()?;

    println!("Irembo Assistant ({})", session.config().api_url);
    println!("Type /help for commands, /quit to exit\n");
    renderer.render(&session.view());

    let mut buffer = String::new();
    loop {
        let prompt = if buffer.is_empty() { "You: " } else { "...: " };
        match rl.readline(prompt) {
            Ok(line) => {
                if let Some(head) = line.strip_suffix('\\') {
                    buffer.push_str(head);
                    buffer.push('\n');
                    continue;
                }
                buffer.push_str(&line);
                let input = std::mem::take(&mut buffer);
                if input.trim().is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(input.as_str());

                let command = parse_command(&input).or_else(|| menu_choice(&session, &input));
                if let Some(command) = command {
                    if !dispatch(command, &mut session, &mut renderer).await {
                        break;
                    }
                    continue;
                }

                session.state_mut().set_input(input);
                if let TurnOutcome::Failed { cause } = session.send_rendered(&mut renderer).await
                {
                    tracing::debug!(error = ?cause, "turn failed");
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt drops any continued lines
                buffer.clear();
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D - exit
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

/// A bare number picks from the open menu.
fn menu_choice(session: &ChatSession, input: &str) -> Option<ChatCommand> {
    let index: usize = input.trim().parse().ok()?;
    match session.state().overlay() {
        Overlay::None => None,
        Overlay::Product => Some(match index {
            0 => ChatCommand::SelectProduct(None),
            n => match Product::ALL.get(n - 1) {
                Some(product) => ChatCommand::SelectProduct(Some(*product)),
                None => ChatCommand::Invalid(format!("Pick 0 to {}", Product::ALL.len())),
            },
        }),
        Overlay::Language => Some(
            match index.checked_sub(1).and_then(|i| Language::ALL.get(i)) {
                Some(language) => ChatCommand::SelectLanguage(*language),
                None => ChatCommand::Invalid(format!("Pick 1 to {}", Language::ALL.len())),
            },
        ),
    }
}

/// Runs one command; returns false to exit.
async fn dispatch(
    command: ChatCommand,
    session: &mut ChatSession,
    renderer: &mut PlainTextRenderer,
) -> bool {
    match command {
        ChatCommand::Quit => {
            println!("Goodbye!");
            return false;
        }
        ChatCommand::Clear => {
            let language = session.selection().language;
            session.change_language(language);
        }
        ChatCommand::ProductMenu => session.state_mut().toggle_product_menu(),
        ChatCommand::SelectProduct(product) => session.select_product(product),
        ChatCommand::LanguageMenu => session.state_mut().toggle_language_menu(),
        ChatCommand::SelectLanguage(language) => session.select_language(language),
        ChatCommand::CloseMenu => session.state_mut().close_overlay(),
        ChatCommand::Stream(on) => {
            session.set_streaming(on);
            renderer.print_info(if on {
                "Streaming enabled."
            } else {
                "Streaming disabled."
            });
        }
        ChatCommand::Feedback(score) => match session.send_feedback(score).await {
            Ok(request_id) => renderer.print_info(&format!("Thanks! Rated {request_id} {score}/5.")),
            Err(err) => renderer.print_error(&err.to_string()),
        },
        ChatCommand::Help => {
            for line in help_text().lines() {
                println!("    {}", line);
            }
        }
        ChatCommand::Stats => print_stats(session),
        ChatCommand::ShowConfig => print_config(session),
        ChatCommand::Invalid(message) => renderer.print_error(&message),
    }
    renderer.render(&session.view());
    true
}

fn print_stats(session: &ChatSession) {
    let stats = session.stats();
    println!("    Session Statistics:");
    println!("      Messages: {}", stats.message_count);
    println!("      Answered turns: {}", stats.answered_turns);
    println!("      Failed turns: {}", stats.failed_turns);
    println!("      Rejected sends: {}", stats.rejected_sends);
    println!("      Product: {}", stats.product);
    println!("      Language: {} ({})", stats.language.name(), stats.language);
}

fn print_config(session: &ChatSession) {
    let stats = session.stats();
    println!("    Current Configuration:");
    println!("      API URL: {}", stats.api_url);
    println!("      Timeout: {}s", stats.timeout.as_secs());
    println!("      Product: {}", stats.product);
    println!("      Language: {} ({})", stats.language.name(), stats.language);
    println!(
        "      Replies: {}",
        if stats.streaming {
            "streamed"
        } else {
            "one-shot"
        }
    );
}
