//! Line mechanics shared by the guest cart and baskets.
//!
//! Invariant: a product identifier appears at most once in a line list.
//! Duplicate adds increment quantity, never append a second line.

use orchard_core::{ProductId, ProductSnapshot};

use super::types::GuestLine;

/// Add `quantity` units of `product`, merging into an existing line.
pub(crate) fn merge_add(items: &mut Vec<GuestLine>, product: &ProductSnapshot, quantity: u32) {
    if let Some(line) = items.iter_mut().find(|line| line.product.id == product.id) {
        line.quantity += quantity;
        return;
    }
    items.push(GuestLine {
        product: product.clone(),
        quantity,
    });
}

/// Drop the line for `product_id`. Absent lines are a no-op.
pub(crate) fn remove(items: &mut Vec<GuestLine>, product_id: &ProductId) {
    items.retain(|line| &line.product.id != product_id);
}

/// Replace the stored quantity for `product_id`; zero removes the line.
///
/// Setting a quantity for a product that is not in the list is a no-op -
/// the UI only shows a stepper for lines that exist.
pub(crate) fn set_quantity(items: &mut Vec<GuestLine>, product_id: &ProductId, quantity: u32) {
    if quantity == 0 {
        remove(items, product_id);
        return;
    }
    if let Some(line) = items.iter_mut().find(|line| &line.product.id == product_id) {
        line.quantity = quantity;
    }
}

/// Quantity stored for `product_id`, or 0.
pub(crate) fn quantity_of(items: &[GuestLine], product_id: &ProductId) -> u32 {
    items
        .iter()
        .find(|line| &line.product.id == product_id)
        .map_or(0, |line| line.quantity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use orchard_core::CategoryId;

    fn product(id: &str) -> ProductSnapshot {
        ProductSnapshot {
            id: ProductId::new(id),
            title: id.to_string(),
            unit_price: None,
            category: CategoryId::new("fruit"),
            image_url: None,
        }
    }

    #[test]
    fn test_duplicate_add_merges_into_one_line() {
        let mut items = Vec::new();
        let apple = product("apple");

        merge_add(&mut items, &apple, 2);
        merge_add(&mut items, &apple, 3);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 5);
    }

    #[test]
    fn test_distinct_products_get_distinct_lines() {
        let mut items = Vec::new();
        merge_add(&mut items, &product("apple"), 1);
        merge_add(&mut items, &product("pear"), 1);
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_set_quantity_zero_equals_remove() {
        let apple = product("apple");

        let mut via_zero = Vec::new();
        merge_add(&mut via_zero, &apple, 4);
        set_quantity(&mut via_zero, &apple.id, 0);

        let mut via_remove = Vec::new();
        merge_add(&mut via_remove, &apple, 4);
        remove(&mut via_remove, &apple.id);

        assert_eq!(via_zero, via_remove);
        assert!(via_zero.is_empty());
    }

    #[test]
    fn test_set_quantity_replaces() {
        let apple = product("apple");
        let mut items = Vec::new();
        merge_add(&mut items, &apple, 4);

        set_quantity(&mut items, &apple.id, 9);
        assert_eq!(quantity_of(&items, &apple.id), 9);
    }

    #[test]
    fn test_absent_product_is_noop() {
        let mut items = Vec::new();
        merge_add(&mut items, &product("apple"), 1);

        remove(&mut items, &ProductId::new("ghost"));
        set_quantity(&mut items, &ProductId::new("ghost"), 5);

        assert_eq!(items.len(), 1);
        assert_eq!(quantity_of(&items, &ProductId::new("ghost")), 0);
    }
}
