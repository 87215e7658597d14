//! Shopping Cart Domain Models
//!
//! This module contains all data structures related to the shopping cart
//! business domain. Field names serialize in camelCase, which is also the
//! shape of the persisted cart record.

use serde::{Deserialize, Serialize};

// =============================================================================
// Cart Domain Models
// =============================================================================

/// Returns the default quantity (1) for cart additions
fn default_quantity() -> u32 {
    1
}

/// The product snapshot a cart needs in order to hold an item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductRef {
    /// Catalog identifier of the product
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub brand: String,
    /// Unit price in `currency`
    pub price: f64,
    #[serde(default)]
    pub image: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Percentage discount in `[0, 100]`
    #[serde(default)]
    pub discount: Option<f64>,
}

pub(crate) fn default_currency() -> String {
    "OMR".to_string()
}

/// Represents an item in the shopping cart
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Unique identifier of this cart line
    pub id: String,

    /// Catalog identifier of the product this line refers to
    pub product_id: String,

    pub name: String,
    pub brand: String,

    /// Unit price
    pub price: f64,

    /// Always positive; a line driven to zero is removed
    pub quantity: u32,

    pub image: String,
    pub currency: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<f64>,
}

/// A cart with its derived totals.
///
/// `total_items`, `subtotal`, `discount` and `total` are a function of
/// `items` and are rebuilt by [`Cart::from_items`]; persisted values are
/// never trusted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub total_items: u64,
    #[serde(default)]
    pub subtotal: f64,
    #[serde(default)]
    pub discount: f64,
    #[serde(default)]
    pub total: f64,
}

impl Cart {
    /// Builds a cart from its items, computing every derived field.
    pub fn from_items(items: Vec<CartItem>) -> Self {
        let totals = super::helpers::compute_totals(&items);
        Self {
            items,
            total_items: totals.total_items,
            subtotal: totals.subtotal,
            discount: totals.discount,
            total: totals.total,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Derived monetary values of a set of cart items.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CartTotals {
    pub total_items: u64,
    pub subtotal: f64,
    pub discount: f64,
    pub total: f64,
}

// =============================================================================
// Request / Response Models
// =============================================================================

/// Body of `POST /cart/items`
#[derive(Debug, Deserialize)]
pub struct AddItemInput {
    pub product: ProductRef,

    /// Quantity to add (defaults to 1)
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

/// Body of `PATCH /cart/items/{id}`
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityInput {
    /// Zero or negative removes the line
    pub quantity: i64,
}

/// Response for a completed checkout
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSummary {
    /// Status of the operation
    pub status: String,

    /// Cart identifier
    pub cart_id: String,

    /// Currency of the order, taken from the first line
    pub currency: String,

    /// The cart as it was when checked out
    pub order: Cart,
}
