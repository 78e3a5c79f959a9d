//! Cart state and view types.

use orchard_core::{CartId, Price, ProductId, ProductSnapshot};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One line of a device-local cart or basket.
///
/// Carries a full [`ProductSnapshot`] because there is no authenticated
/// round-trip available to resolve a bare ID into display data later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuestLine {
    /// Captured product display data.
    pub product: ProductSnapshot,
    /// Units of this product. Always at least 1; a zero removes the line.
    pub quantity: u32,
}

/// The server's canonical view of an authenticated cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerCart {
    /// Server-issued cart identifier.
    pub id: CartId,
    /// Canonical lines, as the server computed them.
    #[serde(default)]
    pub lines: Vec<ServerLine>,
}

/// One line of the server cart view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerLine {
    /// Product identifier.
    pub product_id: ProductId,
    /// Display title, resolved by the server.
    pub title: String,
    /// Units of this product.
    pub quantity: u32,
    /// Unit price, as the server currently prices it.
    pub unit_price: Option<Price>,
}

/// Cart state as a tagged variant.
///
/// Guest carts hold denormalized snapshots; authenticated carts hold the
/// server view and nothing else. Mixing the two is unrepresentable.
#[derive(Debug, Clone)]
pub enum CartState {
    /// Device-local cart, the only source of truth while signed out.
    Guest {
        /// Local lines.
        items: Vec<GuestLine>,
    },
    /// Server-synced cart; the server is the only source of truth.
    Authenticated {
        /// Last fetched canonical view.
        cart: ServerCart,
    },
}

/// Read-only line view, uniform across modes.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLineView {
    /// Product identifier.
    pub product_id: ProductId,
    /// Display title.
    pub title: String,
    /// Units of this product.
    pub quantity: u32,
    /// Unit price, when resolvable.
    pub unit_price: Option<Price>,
}

impl From<&GuestLine> for CartLineView {
    fn from(line: &GuestLine) -> Self {
        Self {
            product_id: line.product.id.clone(),
            title: line.product.title.clone(),
            quantity: line.quantity,
            unit_price: line.product.unit_price,
        }
    }
}

impl From<&ServerLine> for CartLineView {
    fn from(line: &ServerLine) -> Self {
        Self {
            product_id: line.product_id.clone(),
            title: line.title.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
        }
    }
}

/// Derived cart aggregates.
///
/// Always recomputed fresh from the current lines rather than maintained
/// incrementally, so no mutation sequence can make them drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CartSummary {
    /// Sum of all line quantities.
    pub count: u32,
    /// Sum of `unit_price * quantity` over lines with a resolvable price.
    /// Unpriced lines contribute zero.
    pub total: Decimal,
}

/// Compute aggregates for a set of line views.
#[must_use]
pub fn summarize(lines: &[CartLineView]) -> CartSummary {
    let count = lines.iter().map(|line| line.quantity).sum();
    let total = lines
        .iter()
        .filter_map(|line| {
            line.unit_price
                .map(|price| price.line_total(line.quantity))
        })
        .sum();
    CartSummary { count, total }
}

impl CartState {
    /// Read-only views of the current lines.
    #[must_use]
    pub fn lines(&self) -> Vec<CartLineView> {
        match self {
            Self::Guest { items } => items.iter().map(CartLineView::from).collect(),
            Self::Authenticated { cart } => cart.lines.iter().map(CartLineView::from).collect(),
        }
    }

    /// Aggregates for the current lines.
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        summarize(&self.lines())
    }

    /// Quantity of one product, or 0 if absent.
    #[must_use]
    pub fn item_count(&self, product_id: &ProductId) -> u32 {
        self.lines()
            .iter()
            .find(|line| &line.product_id == product_id)
            .map_or(0, |line| line.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orchard_core::CurrencyCode;

    fn priced_view(id: &str, quantity: u32, rupees: i64) -> CartLineView {
        CartLineView {
            product_id: ProductId::new(id),
            title: id.to_string(),
            quantity,
            unit_price: Some(Price::new(Decimal::from(rupees), CurrencyCode::INR)),
        }
    }

    #[test]
    fn test_summarize_counts_and_totals() {
        let lines = vec![priced_view("a", 2, 100), priced_view("b", 1, 50)];
        let summary = summarize(&lines);
        assert_eq!(summary.count, 3);
        assert_eq!(summary.total, Decimal::from(250));
    }

    #[test]
    fn test_unpriced_lines_contribute_zero_to_total() {
        let mut unpriced = priced_view("c", 4, 0);
        unpriced.unit_price = None;

        let lines = vec![priced_view("a", 1, 100), unpriced];
        let summary = summarize(&lines);
        assert_eq!(summary.count, 5);
        assert_eq!(summary.total, Decimal::from(100));
    }

    #[test]
    fn test_empty_summary_is_zero() {
        let summary = summarize(&[]);
        assert_eq!(summary, CartSummary::default());
    }
}
