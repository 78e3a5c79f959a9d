//! CLI command implementations.

pub mod auth;
pub mod cart;
pub mod products;
pub mod search;

use orchard_client::cart::CartLineView;

/// Render one cart line for terminal output.
pub(crate) fn format_line(line: &CartLineView) -> String {
    let price = line
        .unit_price
        .map_or_else(|| "-".to_string(), |price| price.display());
    format!(
        "{:<16} {:<32} x{:<4} {}",
        line.product_id, line.title, line.quantity, price
    )
}
