use serde::{Deserialize, Serialize};

use crate::types::{Language, Product};

/// Body of a chat request to the assistant service.
///
/// `product` is always serialized, as `null` when every product is in scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user's question, exactly as typed.
    pub query: String,

    /// Product filter, or `None` for all products.
    pub product: Option<Product>,

    /// Language the answer should be written in.
    pub language: Language,
}

impl ChatRequest {
    /// Creates a new chat request.
    pub fn new(query: impl Into<String>, product: Option<Product>, language: Language) -> Self {
        Self {
            query: query.into(),
            product,
            language,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_product_is_serialized() {
        let request = ChatRequest::new("Comment renouveler mon permis?", None, Language::Fr);
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(
            json,
            r#"{"query":"Comment renouveler mon permis?","product":null,"language":"fr"}"#
        );
    }

    #[test]
    fn product_uses_wire_id() {
        let request = ChatRequest::new("opening hours", Some(Product::Osc), Language::En);
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(
            json,
            r#"{"query":"opening hours","product":"OSC","language":"en"}"#
        );
    }
}
