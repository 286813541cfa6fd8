//! Output rendering for the chat application.
//!
//! This module provides a trait-based rendering abstraction over [`View`].
//! The default implementation paints the conversation into a terminal as
//! aligned bubbles, using ANSI escape codes for styling and OSC 8 for links.

use std::io::{self, Stdout, Write};

use crate::chat::view::{Alignment, Bubble, Menu, View};
use crate::types::{Language, MessageId};

/// ANSI escape code for dim text (timestamps, typing indicator).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for underlined text (links).
const ANSI_UNDERLINE: &str = "\x1b[4m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (user bubbles).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for green text (assistant bubbles).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for red text (errors).
const ANSI_RED: &str = "\x1b[31m";

/// ANSI escape code for yellow text (menus and the status line).
const ANSI_YELLOW: &str = "\x1b[33m";

/// Return to column zero and erase the line.
const ERASE_LINE: &str = "\r\x1b[2K";

const TYPING_TEXT: &str = "Typing...";

/// Trait for rendering chat output.
///
/// A renderer is handed the whole [`View`] after every state change and is
/// responsible for drawing only what changed since the previous call.
pub trait Renderer: Send {
    /// Draws the view.
    fn render(&mut self, view: &View);

    /// Called before the first token of a streamed reply.
    ///
    /// The bubble that completes the reply is rendered later without its
    /// text, which has already been printed token by token.
    fn begin_stream(&mut self);

    /// Print a chunk of a streamed reply.
    fn print_token(&mut self, token: &str);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer<W: Write + Send = Stdout> {
    out: W,
    use_color: bool,
    width: usize,
    last_bubble: Option<MessageId>,
    generation: Option<u64>,
    status: Option<(&'static str, Language)>,
    menu: Option<Menu>,
    typing_shown: bool,
    stream_open: bool,
}

impl PlainTextRenderer<Stdout> {
    /// Creates a renderer on stdout with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a renderer on stdout with the specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self::with_writer(io::stdout(), use_color)
    }
}

impl<W: Write + Send> PlainTextRenderer<W> {
    /// Creates a renderer over any writer.
    pub fn with_writer(out: W, use_color: bool) -> Self {
        Self {
            out,
            use_color,
            width: 80,
            last_bubble: None,
            generation: None,
            status: None,
            menu: None,
            typing_shown: false,
            stream_open: false,
        }
    }

    /// Sets the layout width.
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    /// Consumes the renderer, returning its writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn flush(&mut self) {
        let _ = self.out.flush();
    }

    fn style(&self, code: &'static str) -> &'static str {
        if self.use_color { code } else { "" }
    }

    fn reset(&self) -> &'static str {
        self.style(ANSI_RESET)
    }

    fn bubble_width(&self) -> usize {
        (self.width * 3 / 4).max(10)
    }

    fn line(&mut self, alignment: Alignment, visible: usize, text: &str) {
        let pad = match alignment {
            Alignment::Left => 0,
            Alignment::Right => self.width.saturating_sub(visible),
        };
        let _ = writeln!(self.out, "{:pad$}{text}", "");
    }

    fn clear_typing(&mut self) {
        if self.typing_shown {
            if self.use_color {
                let _ = write!(self.out, "{ERASE_LINE}");
            } else {
                let _ = writeln!(self.out);
            }
            self.typing_shown = false;
        }
    }

    fn paint_status(&mut self, label: &'static str, language: Language) {
        let (yellow, reset) = (self.style(ANSI_YELLOW), self.reset());
        let _ = writeln!(
            self.out,
            "{yellow}[{label} | {} {}]{reset}",
            language.flag(),
            language.name()
        );
    }

    fn paint_header(&mut self, bubble: &Bubble) {
        let (who, color) = match bubble.alignment {
            Alignment::Left => ("Assistant", ANSI_GREEN),
            Alignment::Right => ("You", ANSI_CYAN),
        };
        let text = format!("{}{who}{}", self.style(color), self.reset());
        self.line(bubble.alignment, who.len(), &text);
    }

    fn paint_body(&mut self, bubble: &Bubble) {
        let color = if bubble.is_error { self.style(ANSI_RED) } else { "" };
        let reset = if bubble.is_error { self.reset() } else { "" };
        for line in wrap(&bubble.text, self.bubble_width()) {
            let visible = line.chars().count();
            self.line(bubble.alignment, visible, &format!("{color}{line}{reset}"));
        }
    }

    fn paint_footer(&mut self, bubble: &Bubble) {
        if !bubble.links.is_empty() {
            let _ = writeln!(self.out, "  Sources:");
            for link in &bubble.links {
                let text = if self.use_color {
                    format!(
                        "  - \x1b]8;;{url}\x1b\\{ANSI_UNDERLINE}{label}{ANSI_RESET}\x1b]8;;\x1b\\",
                        url = link.url,
                        label = link.label,
                    )
                } else {
                    format!("  - {} <{}>", link.label, link.url)
                };
                let _ = writeln!(self.out, "{text}");
            }
        }
        let time = format!("{}{}{}", self.style(ANSI_DIM), bubble.time, self.reset());
        self.line(bubble.alignment, bubble.time.len(), &time);
        let _ = writeln!(self.out);
    }

    fn paint_bubble(&mut self, bubble: &Bubble) {
        if self.stream_open && bubble.alignment == Alignment::Left {
            self.stream_open = false;
            let _ = writeln!(self.out);
            if !bubble.is_error {
                self.paint_footer(bubble);
                return;
            }
        }
        self.paint_header(bubble);
        self.paint_body(bubble);
        self.paint_footer(bubble);
    }

    fn paint_menu(&mut self, menu: &Menu) {
        let (yellow, reset) = (self.style(ANSI_YELLOW), self.reset());
        let _ = writeln!(self.out, "{yellow}{}{reset}", menu.title);
        for item in &menu.items {
            let marker = if item.selected { '*' } else { ' ' };
            let _ = writeln!(self.out, " {marker} {}) {}", item.key, item.label);
        }
        let _ = writeln!(self.out, "Type a number to choose, or /close.");
    }
}

impl Default for PlainTextRenderer<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write + Send> Renderer for PlainTextRenderer<W> {
    fn render(&mut self, view: &View) {
        let status = (view.product_label, view.language);
        if self.status != Some(status) {
            self.clear_typing();
            self.paint_status(status.0, status.1);
            self.status = Some(status);
        }

        if self.generation != Some(view.generation) {
            if self.generation.is_some() {
                self.clear_typing();
                let _ = writeln!(self.out, "--- new conversation ---");
            }
            self.generation = Some(view.generation);
            self.last_bubble = None;
        }

        let fresh: Vec<&Bubble> = view
            .bubbles
            .iter()
            .filter(|b| self.last_bubble.is_none_or(|last| b.id > last))
            .collect();
        if !fresh.is_empty() {
            self.clear_typing();
        }
        for bubble in fresh {
            self.paint_bubble(bubble);
        }
        self.last_bubble = view.scroll_to.or(self.last_bubble);

        if view.menu != self.menu {
            if let Some(menu) = &view.menu {
                self.clear_typing();
                self.paint_menu(menu);
            }
            self.menu = view.menu.clone();
        }

        if view.typing && !self.typing_shown && !self.stream_open {
            let text = format!("{}{TYPING_TEXT}{}", self.style(ANSI_DIM), self.reset());
            let _ = write!(self.out, "{text}");
            self.typing_shown = true;
        } else if !view.typing {
            self.clear_typing();
        }
        self.flush();
    }

    fn begin_stream(&mut self) {
        self.clear_typing();
        let (green, reset) = (self.style(ANSI_GREEN), self.reset());
        let _ = writeln!(self.out, "{green}Assistant{reset}");
        self.stream_open = true;
        self.flush();
    }

    fn print_token(&mut self, token: &str) {
        let _ = write!(self.out, "{token}");
        self.flush();
    }

    fn print_error(&mut self, error: &str) {
        self.clear_typing();
        let (red, reset) = (self.style(ANSI_RED), self.reset());
        let _ = writeln!(self.out, "{red}Error: {error}{reset}");
        self.flush();
    }

    fn print_info(&mut self, info: &str) {
        self.clear_typing();
        let _ = writeln!(self.out, "{info}");
        self.flush();
    }
}

/// Greedy word wrap that keeps explicit line breaks.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_len = 0;
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > width {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let rest = word.split_off(width);
                lines.push(word.into_iter().collect());
                word = rest;
            }
            let needed = if current_len == 0 { word.len() } else { current_len + 1 + word.len() };
            if needed > width && current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.extend(word.iter());
            current_len += word.len();
        }
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::state::ChatState;
    use crate::chat::view::view;
    use crate::types::{ChatResponse, Source};

    fn output(renderer: PlainTextRenderer<Vec<u8>>) -> String {
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    #[test]
    fn renderer_default_has_color() {
        let renderer = PlainTextRenderer::new();
        assert!(renderer.use_color);
    }

    #[test]
    fn renderer_without_color() {
        let renderer = PlainTextRenderer::with_color(false);
        assert!(!renderer.use_color);
    }

    #[test]
    fn wrap_breaks_on_words() {
        assert_eq!(wrap("one two three", 7), vec!["one two", "three"]);
        assert_eq!(wrap("a\n\nb", 10), vec!["a", "", "b"]);
        assert_eq!(wrap("abcdefgh", 3), vec!["abc", "def", "gh"]);
        assert_eq!(wrap("", 5), vec![""]);
    }

    #[test]
    fn paints_only_new_bubbles() {
        let mut state = ChatState::new(Language::En, None);
        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), false).with_width(40);
        renderer.render(&view(&state));
        renderer.render(&view(&state));

        state.set_input("hi");
        let pending = state.begin_turn().unwrap();
        renderer.render(&view(&state));
        let _ = state.complete_turn(pending, Ok((ChatResponse::new("hello there"), None)));
        renderer.render(&view(&state));

        let out = output(renderer);
        assert_eq!(out.matches("Hello!").count(), 1);
        assert_eq!(out.matches("[All Products | ").count(), 1);
        assert!(out.contains(TYPING_TEXT));
        assert!(out.contains("hello there"));
    }

    #[test]
    fn user_bubbles_are_right_aligned() {
        let mut state = ChatState::new(Language::En, None);
        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), false).with_width(40);
        renderer.render(&view(&state));
        state.set_input("hi");
        let _pending = state.begin_turn().unwrap();
        renderer.render(&view(&state));

        let out = output(renderer);
        let line = out.lines().find(|l| l.trim() == "hi").unwrap();
        assert_eq!(line.len(), 40);
        assert!(line.ends_with("hi"));
    }

    #[test]
    fn sources_render_as_links() {
        let mut state = ChatState::new(Language::En, None);
        state.set_input("q");
        let pending = state.begin_turn().unwrap();
        let response = ChatResponse::new("answer").with_sources(vec![
            Source::new("https://a.example/1", "IremboGov", "Passport"),
            Source::new("https://a.example/2", "OSC", "Fees"),
        ]);
        let _ = state.complete_turn(pending, Ok((response, None)));

        let mut plain = PlainTextRenderer::with_writer(Vec::new(), false);
        plain.render(&view(&state));
        let out = output(plain);
        assert!(out.contains("  - IremboGov: Passport <https://a.example/1>"));
        assert!(out.contains("  - OSC: Fees <https://a.example/2>"));

        let mut color = PlainTextRenderer::with_writer(Vec::new(), true);
        color.render(&view(&state));
        let out = output(color);
        assert!(out.contains("\x1b]8;;https://a.example/1\x1b\\"));
        assert!(out.contains("IremboGov: Passport"));
    }

    #[test]
    fn streamed_reply_is_not_repeated() {
        let mut state = ChatState::new(Language::En, None);
        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), false);
        renderer.render(&view(&state));
        state.set_input("q");
        let pending = state.begin_turn().unwrap();
        renderer.render(&view(&state));
        renderer.begin_stream();
        renderer.print_token("streamed ");
        renderer.print_token("words");
        let _ = state.complete_turn(pending, Ok((ChatResponse::new("streamed words"), None)));
        renderer.render(&view(&state));

        let out = output(renderer);
        assert_eq!(out.matches("streamed").count(), 1);
        assert!(out.contains("streamed words"));
    }

    #[test]
    fn language_change_announces_new_conversation() {
        let mut state = ChatState::new(Language::En, None);
        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), false);
        renderer.render(&view(&state));
        state.select_language(Language::Fr);
        renderer.render(&view(&state));

        let out = output(renderer);
        assert!(out.contains("--- new conversation ---"));
        assert!(out.contains("Bonjour!"));
        assert!(out.contains("Français"));
    }

    #[test]
    fn menu_drawn_once() {
        let mut state = ChatState::new(Language::En, None);
        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), false);
        state.toggle_product_menu();
        renderer.render(&view(&state));
        renderer.render(&view(&state));

        let out = output(renderer);
        assert_eq!(out.matches("Select product").count(), 1);
        assert!(out.contains(" * 0) All Products"));
        assert!(out.contains("   2) One Stop Center"));
    }
}
