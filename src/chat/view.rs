//! What the chat looks like, derived from state alone.
//!
//! [`view`] is a pure function: the same [`ChatState`] always yields the same
//! [`View`].  Renderers draw a `View`; they never read the state directly.

use crate::chat::state::{ChatState, Overlay};
use crate::types::{Language, Message, MessageId, Product, Role, selection_label};
use crate::utils::time::clock_label;

/// Horizontal placement of a bubble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    /// Bot messages.
    Left,
    /// User messages.
    Right,
}

/// A labeled hyperlink under a bot bubble.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// `"{product}: {title}"`.
    pub label: String,
    /// Where the link points.
    pub url: String,
}

/// One message as drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bubble {
    pub id: MessageId,
    pub alignment: Alignment,
    /// Message text, verbatim.
    pub text: String,
    /// Source links; empty for user messages.
    pub links: Vec<Link>,
    /// `HH:MM:SS` of the message's creation time.
    pub time: String,
    /// Drawn in the error style.
    pub is_error: bool,
}

/// One entry of an open menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    /// What to type to pick this entry.
    pub key: String,
    pub label: String,
    /// Marks the current selection.
    pub selected: bool,
}

/// The open selection menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu {
    pub title: &'static str,
    pub items: Vec<MenuItem>,
}

/// Everything a renderer needs to draw the chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    /// Label of the product control; "All Products" when none is selected.
    pub product_label: &'static str,
    /// The language control.
    pub language: Language,
    /// One bubble per message, in conversation order.
    pub bubbles: Vec<Bubble>,
    /// Shown after the last bubble while a reply is pending.
    pub typing: bool,
    /// Whether the send action is enabled.
    pub can_send: bool,
    /// The open menu, if any.
    pub menu: Option<Menu>,
    /// The bubble to keep in view; always the newest.
    pub scroll_to: Option<MessageId>,
    /// Changes whenever the conversation is replaced.
    pub generation: u64,
}

/// Derives the view of `state`.
pub fn view(state: &ChatState) -> View {
    let selection = state.selection();
    let bubbles: Vec<Bubble> = state.conversation().iter().map(bubble).collect();
    let menu = match state.overlay() {
        Overlay::None => None,
        Overlay::Product => Some(product_menu(selection.product)),
        Overlay::Language => Some(language_menu(selection.language)),
    };
    View {
        product_label: selection_label(selection.product),
        language: selection.language,
        scroll_to: bubbles.last().map(|b| b.id),
        bubbles,
        typing: state.is_awaiting(),
        can_send: state.can_send(),
        menu,
        generation: state.generation(),
    }
}

fn bubble(message: &Message) -> Bubble {
    let (alignment, links) = match message.role {
        Role::User => (Alignment::Right, Vec::new()),
        Role::Bot => (
            Alignment::Left,
            message
                .sources
                .iter()
                .map(|source| Link {
                    label: source.label(),
                    url: source.url.clone(),
                })
                .collect(),
        ),
    };
    Bubble {
        id: message.id,
        alignment,
        text: message.text.clone(),
        links,
        time: clock_label(&message.created_at),
        is_error: message.is_error,
    }
}

fn product_menu(current: Option<Product>) -> Menu {
    let mut items = vec![MenuItem {
        key: "0".to_string(),
        label: selection_label(None).to_string(),
        selected: current.is_none(),
    }];
    items.extend(Product::ALL.iter().enumerate().map(|(i, product)| MenuItem {
        key: (i + 1).to_string(),
        label: product.name().to_string(),
        selected: current == Some(*product),
    }));
    Menu {
        title: "Select product",
        items,
    }
}

fn language_menu(current: Language) -> Menu {
    let items = Language::ALL
        .iter()
        .enumerate()
        .map(|(i, language)| MenuItem {
            key: (i + 1).to_string(),
            label: format!("{} {}", language.flag(), language.name()),
            selected: current == *language,
        })
        .collect();
    Menu {
        title: "Select language",
        items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChatResponse, Source};

    #[test]
    fn fresh_view() {
        let state = ChatState::new(Language::En, None);
        let v = view(&state);
        assert_eq!(v.product_label, "All Products");
        assert_eq!(v.language, Language::En);
        assert_eq!(v.bubbles.len(), 1);
        assert_eq!(v.bubbles[0].alignment, Alignment::Left);
        assert_eq!(v.scroll_to, Some(v.bubbles[0].id));
        assert!(!v.typing);
        assert!(!v.can_send);
        assert!(v.menu.is_none());
    }

    #[test]
    fn typing_while_awaiting() {
        let mut state = ChatState::new(Language::En, None);
        state.set_input("hello");
        assert!(view(&state).can_send);
        let pending = state.begin_turn().unwrap();

        let v = view(&state);
        assert!(v.typing);
        assert!(!v.can_send);
        assert_eq!(v.bubbles[1].alignment, Alignment::Right);
        assert_eq!(v.scroll_to, Some(v.bubbles[1].id));

        let _ = state.complete_turn(pending, Ok((ChatResponse::new("hi"), None)));
        assert!(!view(&state).typing);
    }

    #[test]
    fn two_sources_become_two_links() {
        let mut state = ChatState::new(Language::En, Some(Product::IremboGov));
        state.set_input("How do I renew my passport?");
        let pending = state.begin_turn().unwrap();
        let response = ChatResponse::new("Visit the portal.").with_sources(vec![
            Source::new("https://a.example/1", "IremboGov", "Passport renewal"),
            Source::new("https://a.example/2", "IremboGov", "Fees"),
        ]);
        let _ = state.complete_turn(pending, Ok((response, None)));

        let v = view(&state);
        let reply = v.bubbles.last().unwrap();
        assert_eq!(reply.links.len(), 2);
        assert_eq!(reply.links[0].label, "IremboGov: Passport renewal");
        assert_eq!(reply.links[0].url, "https://a.example/1");
        assert_eq!(reply.links[1].label, "IremboGov: Fees");
        assert!(v.bubbles[1].links.is_empty());
        assert_eq!(v.product_label, "IremboGov");
    }

    #[test]
    fn menus_mark_selection() {
        let mut state = ChatState::new(Language::Fr, Some(Product::Osc));
        state.toggle_product_menu();
        let menu = view(&state).menu.unwrap();
        assert_eq!(menu.items.len(), 4);
        assert_eq!(menu.items[0].label, "All Products");
        let selected: Vec<_> = menu.items.iter().filter(|i| i.selected).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].label, "One Stop Center");
        assert_eq!(selected[0].key, "2");

        state.toggle_language_menu();
        let menu = view(&state).menu.unwrap();
        assert_eq!(menu.items.len(), 3);
        assert!(menu.items[1].selected);
        assert!(menu.items[1].label.ends_with("Français"));
    }

    #[test]
    fn error_bubble_flagged() {
        let mut state = ChatState::new(Language::En, None);
        state.set_input("q");
        let pending = state.begin_turn().unwrap();
        let _ = state.complete_turn(pending, Err(crate::Error::timeout("slow", None)));
        let v = view(&state);
        assert!(v.bubbles.last().unwrap().is_error);
        assert!(!v.bubbles[0].is_error);
    }

    #[test]
    fn view_is_deterministic() {
        let state = ChatState::new(Language::Rw, None);
        assert_eq!(view(&state), view(&state));
    }
}
