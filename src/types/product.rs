use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A product the assistant can narrow its answers to.
///
/// `None` in a selection means "all products"; there is no variant for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Product {
    /// Government services portal.
    #[serde(rename = "IremboGov")]
    IremboGov,

    /// One Stop Center.
    #[serde(rename = "OSC")]
    Osc,

    /// IremboPlus.
    #[serde(rename = "IremboPlus")]
    IremboPlus,
}

impl Product {
    /// Every product, in menu order.
    pub const ALL: [Product; 3] = [Product::IremboGov, Product::Osc, Product::IremboPlus];

    /// Identifier sent to the service.
    pub fn id(self) -> &'static str {
        match self {
            Product::IremboGov => "IremboGov",
            Product::Osc => "OSC",
            Product::IremboPlus => "IremboPlus",
        }
    }

    /// Human-facing name.
    pub fn name(self) -> &'static str {
        match self {
            Product::IremboGov => "IremboGov",
            Product::Osc => "One Stop Center",
            Product::IremboPlus => "IremboPlus",
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Product {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Product::ALL
            .into_iter()
            .find(|p| p.id().eq_ignore_ascii_case(wanted) || p.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                format!("Unknown product: {s}. Valid options: IremboGov, OSC, IremboPlus")
            })
    }
}

/// Human-facing label for a product selection.
pub fn selection_label(product: Option<Product>) -> &'static str {
    product.map(Product::name).unwrap_or("All Products")
}
