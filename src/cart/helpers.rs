//! Shopping Cart Business Logic Helpers
//!
//! Pure functions over cart items: totals, merging, formatting and id
//! generation. The engine composes these around persistence.

use super::models::{CartItem, CartTotals, ProductRef};
use crate::error::CartError;
use uuid::Uuid;

/// Returns the provided `cart_id` or creates a new UUID string when `None`.
///
/// This guarantees that every cart operation works with a non-empty identifier.
pub fn get_or_create_cart_id(cart_id: Option<String>) -> String {
    cart_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().simple().to_string())
}

/// Generates the identifier of a new cart line.
pub fn new_item_id() -> String {
    Uuid::new_v4().to_string()
}

/// Computes the derived totals of `items`.
///
/// * `total_items` – sum of quantities
/// * `subtotal` – sum of `price × quantity`
/// * `discount` – sum of `price × discount% × quantity` over discounted lines
/// * `total` – `subtotal − discount`
///
/// No rounding is applied.
pub fn compute_totals(items: &[CartItem]) -> CartTotals {
    let mut totals = CartTotals::default();
    for item in items {
        let quantity = f64::from(item.quantity);
        totals.total_items += u64::from(item.quantity);
        totals.subtotal += item.price * quantity;
        if let Some(percent) = item.discount {
            totals.discount += item.price * (percent / 100.0) * quantity;
        }
    }
    totals.total = totals.subtotal - totals.discount;
    totals
}

/// Rejects products a cart cannot hold.
pub fn validate_addition(product: &ProductRef, quantity: u32) -> Result<(), CartError> {
    if quantity == 0 {
        return Err(CartError::InvalidQuantity);
    }
    if let Some(percent) = product.discount {
        if !(0.0..=100.0).contains(&percent) {
            return Err(CartError::InvalidDiscount(percent));
        }
    }
    Ok(())
}

/// Merges `quantity` units of `product` into `cart_items`.
///
/// If a line for the same product already exists its quantity is increased;
/// other fields keep the values captured when the line was created.
/// Otherwise a new line with a fresh identifier is appended.
pub fn merge_product(cart_items: &mut Vec<CartItem>, product: &ProductRef, quantity: u32) {
    if let Some(existing) = cart_items.iter_mut().find(|i| i.product_id == product.id) {
        existing.quantity = existing.quantity.saturating_add(quantity);
    } else {
        cart_items.push(CartItem {
            id: new_item_id(),
            product_id: product.id.clone(),
            name: product.name.clone(),
            brand: product.brand.clone(),
            price: product.price,
            quantity,
            image: product.image.clone(),
            currency: product.currency.clone(),
            discount: product.discount,
        });
    }
}

/// Produces a human-readable one-line summary for a list of cart items.
///
/// Example output: `"2x Classic Watch, 1x Leather Strap"`.
pub fn format_item_summary(items: &[CartItem]) -> String {
    items
        .iter()
        .map(|i| format!("{}x {}", i.quantity, i.name))
        .collect::<Vec<_>>()
        .join(", ")
}
