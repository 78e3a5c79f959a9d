//! Denormalized product data carried by device-local carts.

use serde::{Deserialize, Serialize};

use super::id::{CategoryId, ProductId};
use super::price::Price;

/// Display data for a product, captured at the moment it entered a local
/// cart or basket.
///
/// A guest cart has no authenticated round-trip available to resolve a bare
/// product ID into title/price/image later, so it stores this snapshot
/// instead. Server-backed carts store only the ID; the server is the source
/// of truth there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    /// Product identifier.
    pub id: ProductId,
    /// Display title.
    pub title: String,
    /// Unit price at capture time, if the listing had one.
    pub unit_price: Option<Price>,
    /// Category the product belongs to.
    pub category: CategoryId,
    /// Primary image URL, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_snapshot_serde_round_trip() {
        let snapshot = ProductSnapshot {
            id: ProductId::new("p-1"),
            title: "Alphonso Mango".to_string(),
            unit_price: Some(Price::new(
                Decimal::new(12000, 2),
                crate::types::price::CurrencyCode::INR,
            )),
            category: CategoryId::new("fruit"),
            image_url: None,
        };

        let json = serde_json::to_string(&snapshot).unwrap();
        let back: ProductSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn test_snapshot_tolerates_missing_price_and_image() {
        let json = r#"{"id":"p-2","title":"Basket Liner","category":"supplies"}"#;
        let snapshot: ProductSnapshot = serde_json::from_str(json).unwrap();
        assert!(snapshot.unit_price.is_none());
        assert!(snapshot.image_url.is_none());
    }
}
