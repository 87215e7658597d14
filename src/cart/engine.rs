//! Cart Engine
//!
//! Owns one persisted cart record. Every read rebuilds the derived totals
//! from the stored items, and every mutation runs load → mutate → recompute
//! → persist under a per-engine lock. Listeners are notified after the lock
//! is released, so they may call back into the engine.

use super::{
    helpers::{merge_product, validate_addition},
    models::{Cart, CartItem, ProductRef},
    storage::CartStorage,
};
use crate::error::CartError;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, PoisonError,
};
use tracing::{debug, warn};

/// Callback invoked with the cart after each change.
pub type CartListener = Arc<dyn Fn(&Cart) + Send + Sync>;

/// Handle returned by [`CartEngine::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub struct CartEngine {
    storage: Arc<dyn CartStorage>,
    key: String,
    write_lock: Mutex<()>,
    listeners: Mutex<Vec<(SubscriptionId, CartListener)>>,
    next_subscription: AtomicU64,
}

impl CartEngine {
    /// Creates an engine over the record stored under `key`.
    pub fn new(storage: Arc<dyn CartStorage>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
            write_lock: Mutex::new(()),
            listeners: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
        }
    }

    /// Returns the current cart with freshly computed totals.
    pub fn get_cart(&self) -> Cart {
        Cart::from_items(self.load_items())
    }

    /// Adds `quantity` units of `product`, merging into an existing line for
    /// the same product.
    pub fn add_item(&self, product: &ProductRef, quantity: u32) -> Result<Cart, CartError> {
        validate_addition(product, quantity)?;
        self.mutate(|items| {
            merge_product(items, product, quantity);
            Ok(())
        })
    }

    /// Removes the line identified by `item_id`.
    ///
    /// Fails with [`CartError::ItemNotFound`] when no line has that id; the
    /// stored record is left untouched and listeners are not notified.
    pub fn remove_item(&self, item_id: &str) -> Result<Cart, CartError> {
        self.mutate(|items| {
            let before = items.len();
            items.retain(|i| i.id != item_id);
            if items.len() == before {
                return Err(CartError::ItemNotFound(item_id.to_string()));
            }
            Ok(())
        })
    }

    /// Sets the quantity of a line. Zero or less removes it.
    pub fn update_quantity(&self, item_id: &str, quantity: i64) -> Result<Cart, CartError> {
        if quantity <= 0 {
            return self.remove_item(item_id);
        }
        let quantity = u32::try_from(quantity).map_err(|_| CartError::InvalidQuantity)?;
        self.mutate(|items| {
            let item = items
                .iter_mut()
                .find(|i| i.id == item_id)
                .ok_or_else(|| CartError::ItemNotFound(item_id.to_string()))?;
            item.quantity = quantity;
            Ok(())
        })
    }

    /// Empties the cart.
    pub fn clear_cart(&self) -> Cart {
        let cart = {
            let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
            let cart = Cart::default();
            self.persist(&cart);
            cart
        };
        self.notify(&cart);
        cart
    }

    /// Registers a listener called after every change to this cart.
    pub fn subscribe(&self, listener: CartListener) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, listener));
        id
    }

    /// Removes a listener. Returns `false` when it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(sid, _)| *sid != id);
        listeners.len() != before
    }

    /// Re-reads the persisted record after an external writer touched it and
    /// notifies listeners.
    pub fn notify_storage_changed(&self) -> Cart {
        let cart = self.get_cart();
        self.notify(&cart);
        cart
    }

    fn mutate<F>(&self, apply: F) -> Result<Cart, CartError>
    where
        F: FnOnce(&mut Vec<CartItem>) -> Result<(), CartError>,
    {
        let cart = {
            let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
            let mut items = self.load_items();
            apply(&mut items)?;
            let cart = Cart::from_items(items);
            self.persist(&cart);
            cart
        };
        self.notify(&cart);
        Ok(cart)
    }

    fn load_items(&self) -> Vec<CartItem> {
        let Some(raw) = self.storage.load(&self.key) else {
            return Vec::new();
        };
        match serde_json::from_str::<Cart>(&raw) {
            Ok(cart) => cart.items,
            Err(e) => {
                debug!(key = %self.key, error = %e, "discarding unreadable cart record");
                Vec::new()
            }
        }
    }

    fn persist(&self, cart: &Cart) {
        let result = serde_json::to_string(cart)
            .map_err(std::io::Error::other)
            .and_then(|raw| self.storage.save(&self.key, &raw));
        if let Err(e) = result {
            warn!(key = %self.key, error = %e, "failed to persist cart");
        }
    }

    fn notify(&self, cart: &Cart) {
        let listeners: Vec<CartListener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener(cart);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::storage::{MemoryStorage, CART_STORAGE_KEY};
    use std::sync::atomic::AtomicUsize;

    fn product(id: &str, price: f64, discount: Option<f64>) -> ProductRef {
        ProductRef {
            id: id.into(),
            name: format!("Product {id}"),
            brand: "Acme".into(),
            price,
            image: format!("/images/{id}.jpg"),
            currency: "OMR".into(),
            discount,
        }
    }

    fn engine() -> (Arc<MemoryStorage>, CartEngine) {
        let storage = Arc::new(MemoryStorage::new());
        let engine = CartEngine::new(storage.clone(), CART_STORAGE_KEY);
        (storage, engine)
    }

    fn assert_consistent(cart: &Cart) {
        let subtotal: f64 = cart.items.iter().map(|i| i.price * f64::from(i.quantity)).sum();
        let discount: f64 = cart
            .items
            .iter()
            .filter_map(|i| i.discount.map(|d| i.price * d / 100.0 * f64::from(i.quantity)))
            .sum();
        assert!((cart.subtotal - subtotal).abs() < 1e-9);
        assert!((cart.discount - discount).abs() < 1e-9);
        assert!((cart.total - (cart.subtotal - cart.discount)).abs() < 1e-9);
        assert_eq!(
            cart.total_items,
            cart.items.iter().map(|i| u64::from(i.quantity)).sum::<u64>()
        );
    }

    #[test]
    fn empty_cart_on_first_access() {
        let (_, engine) = engine();
        let cart = engine.get_cart();
        assert!(cart.is_empty());
        assert_eq!(cart.total, 0.0);
    }

    #[test]
    fn discounted_line_totals() {
        let (_, engine) = engine();
        let cart = engine.add_item(&product("w1", 100.0, Some(10.0)), 2).unwrap();
        assert_eq!(cart.subtotal, 200.0);
        assert_eq!(cart.discount, 20.0);
        assert_eq!(cart.total, 180.0);
    }

    #[test]
    fn same_product_merges_into_one_line() {
        let (_, engine) = engine();
        engine.add_item(&product("w1", 10.0, None), 2).unwrap();
        let cart = engine.add_item(&product("w1", 10.0, None), 3).unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 5);
    }

    #[test]
    fn lines_keep_insertion_order() {
        let (_, engine) = engine();
        engine.add_item(&product("b", 1.0, None), 1).unwrap();
        engine.add_item(&product("a", 1.0, None), 1).unwrap();
        let cart = engine.add_item(&product("b", 1.0, None), 1).unwrap();
        let ids: Vec<_> = cart.items.iter().map(|i| i.product_id.as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
    }

    #[test]
    fn update_to_zero_equals_remove() {
        let (_, left) = engine();
        let (_, right) = engine();
        for e in [&left, &right] {
            e.add_item(&product("w1", 10.0, None), 1).unwrap();
            e.add_item(&product("w2", 20.0, Some(5.0)), 2).unwrap();
        }
        let left_id = left.get_cart().items[0].id.clone();
        let right_id = right.get_cart().items[0].id.clone();

        let updated = left.update_quantity(&left_id, 0).unwrap();
        let removed = right.remove_item(&right_id).unwrap();

        assert_eq!(updated.items.len(), 1);
        assert_eq!(updated.items[0].product_id, removed.items[0].product_id);
        assert_eq!(updated.total, removed.total);
        assert_eq!(updated.total_items, removed.total_items);
    }

    #[test]
    fn invariants_hold_across_mutations() {
        let (_, engine) = engine();
        let cart = engine.add_item(&product("a", 12.5, Some(20.0)), 3).unwrap();
        assert_consistent(&cart);
        let cart = engine.add_item(&product("b", 99.9, None), 1).unwrap();
        assert_consistent(&cart);
        let id = cart.items[0].id.clone();
        let cart = engine.update_quantity(&id, 7).unwrap();
        assert_consistent(&cart);
        let cart = engine.update_quantity(&id, -3).unwrap();
        assert_consistent(&cart);
        assert_eq!(cart.items.len(), 1);
    }

    #[test]
    fn get_cart_is_idempotent() {
        let (_, engine) = engine();
        engine.add_item(&product("a", 3.3, Some(33.0)), 3).unwrap();
        assert_eq!(engine.get_cart(), engine.get_cart());
    }

    #[test]
    fn stale_persisted_totals_are_ignored() {
        let (storage, engine) = engine();
        engine.add_item(&product("a", 10.0, None), 2).unwrap();
        let mut raw: serde_json::Value =
            serde_json::from_str(&storage.load(CART_STORAGE_KEY).unwrap()).unwrap();
        raw["total"] = serde_json::json!(9999);
        raw["totalItems"] = serde_json::json!(42);
        storage.save(CART_STORAGE_KEY, &raw.to_string()).unwrap();

        let cart = engine.get_cart();
        assert_eq!(cart.total, 20.0);
        assert_eq!(cart.total_items, 2);
    }

    #[test]
    fn unreadable_record_means_empty_cart() {
        let (storage, engine) = engine();
        storage.save(CART_STORAGE_KEY, "{not json").unwrap();
        assert!(engine.get_cart().is_empty());
        let cart = engine.add_item(&product("a", 1.0, None), 1).unwrap();
        assert_eq!(cart.items.len(), 1);
    }

    #[test]
    fn clear_persists_empty_cart() {
        let (storage, engine) = engine();
        engine.add_item(&product("a", 10.0, Some(10.0)), 4).unwrap();
        let cart = engine.clear_cart();
        assert_eq!(cart.total_items, 0);
        assert_eq!(cart.subtotal, 0.0);
        assert_eq!(cart.discount, 0.0);
        assert_eq!(cart.total, 0.0);

        let persisted: Cart =
            serde_json::from_str(&storage.load(CART_STORAGE_KEY).unwrap()).unwrap();
        assert!(persisted.items.is_empty());
        assert_eq!(persisted.total, 0.0);
    }

    #[test]
    fn unknown_item_is_reported() {
        let (_, engine) = engine();
        assert_eq!(
            engine.remove_item("missing"),
            Err(CartError::ItemNotFound("missing".into()))
        );
        assert_eq!(
            engine.update_quantity("missing", 2),
            Err(CartError::ItemNotFound("missing".into()))
        );
    }

    #[test]
    fn listeners_see_changes_until_unsubscribed() {
        let (_, engine) = engine();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let id = engine.subscribe(Arc::new(move |_cart: &Cart| {
            seen.fetch_add(1, Ordering::SeqCst);
        }));

        engine.add_item(&product("a", 1.0, None), 1).unwrap();
        engine.clear_cart();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        assert!(engine.unsubscribe(id));
        assert!(!engine.unsubscribe(id));
        engine.add_item(&product("a", 1.0, None), 1).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn external_writes_reach_listeners() {
        let storage = Arc::new(MemoryStorage::new());
        let writer = CartEngine::new(storage.clone(), CART_STORAGE_KEY);
        let reader = CartEngine::new(storage, CART_STORAGE_KEY);
        let last_total = Arc::new(Mutex::new(0.0));
        let sink = last_total.clone();
        reader.subscribe(Arc::new(move |cart: &Cart| {
            *sink.lock().unwrap() = cart.total;
        }));

        writer.add_item(&product("a", 7.0, None), 3).unwrap();
        reader.notify_storage_changed();
        assert_eq!(*last_total.lock().unwrap(), 21.0);
    }

    #[test]
    fn listener_may_mutate_the_cart() {
        let (_, engine) = engine();
        let engine = Arc::new(engine);
        let handle = Arc::downgrade(&engine);
        engine.subscribe(Arc::new(move |cart: &Cart| {
            let Some(engine) = handle.upgrade() else { return };
            for item in cart.items.iter().filter(|i| i.quantity > 3) {
                engine.update_quantity(&item.id, 3).unwrap();
            }
        }));

        let (done_tx, done_rx) = std::sync::mpsc::channel();
        let worker = engine.clone();
        std::thread::spawn(move || {
            let cart = worker.add_item(&product("a", 2.0, None), 5).unwrap();
            done_tx.send(cart).unwrap();
        });

        let added = done_rx
            .recv_timeout(std::time::Duration::from_secs(3))
            .expect("add_item blocked on a re-entrant listener");
        assert_eq!(added.items[0].quantity, 5);
        let capped = engine.get_cart();
        assert_eq!(capped.items[0].quantity, 3);
        assert_eq!(capped.total, 6.0);
    }
}
