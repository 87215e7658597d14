//! Shopping Cart Domain Module
//!
//! This module contains all shopping cart business logic, including:
//! - Domain models (CartItem, Cart, inputs, responses)
//! - Business logic helpers (totals, merging, formatting)
//! - Persistence backends for the serialized cart record
//! - The cart engine with its change subscriptions
//! - REST API handlers

pub mod engine;
pub mod handlers;
pub mod helpers;
pub mod models;
pub mod storage;

// Re-export commonly used types for convenience
pub use engine::{CartEngine, CartListener, SubscriptionId};
pub use handlers::routes;
pub use models::{Cart, CartItem, ProductRef};
pub use storage::{CartStorage, FileStorage, MemoryStorage, CART_STORAGE_KEY};
