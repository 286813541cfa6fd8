use serde::{Deserialize, Serialize};

/// A citation attached to a bot reply.
///
/// `product` is whatever label the service attached to the document; it is
/// not restricted to the selectable [`Product`](crate::Product) set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Link to the supporting document.
    pub url: String,

    /// Product the document belongs to.
    pub product: String,

    /// Document title.
    pub title: String,
}

impl Source {
    /// Creates a new source.
    pub fn new(
        url: impl Into<String>,
        product: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            product: product.into(),
            title: title.into(),
        }
    }

    /// The link label, `"{product}: {title}"`.
    pub fn label(&self) -> String {
        format!("{}: {}", self.product, self.title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_joins_product_and_title() {
        let source = Source::new(
            "https://support.irembo.gov.rw/en/articles/1",
            "IremboGov",
            "Apply for a driving license",
        );
        assert_eq!(source.label(), "IremboGov: Apply for a driving license");
    }

    #[test]
    fn deserializes_service_shape() {
        let json = r##"{"title":"Unknown","url":"#","product":"Irembo"}"##;
        let source: Source = serde_json::from_str(json).unwrap();
        assert_eq!(source, Source::new("#", "Irembo", "Unknown"));
    }
}
