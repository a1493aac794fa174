//! Cart consolidator
//!
//! Merges variable-priced product variants into quantity-bearing line
//! items. Line identity is the `(name, price, size)` triple; the cart never
//! holds two lines with the same identity.
//!
//! # Merge policy
//!
//! - Zero-variant add: an existing line's quantity is *summed* (+1).
//! - Variant batch add: an existing line's quantity is *replaced* by the
//!   incoming quantity, so re-saving the same selection is idempotent per
//!   triple. This asymmetry matches the capture screen's behavior and is
//!   deliberate.
//!
//! Every mutation writes a snapshot of the cart to the state store; a
//! failed snapshot write degrades persistence only, the in-memory cart
//! stays authoritative.

pub mod selector;

pub use selector::VariantSelector;

use crate::models::{LineItem, Product, SelectionEntry};
use crate::tickets::storage::StateStore;
use parking_lot::RwLock;
use rust_decimal::Decimal;

/// State key for the active-cart snapshot
const CART_KEY: &str = "productsToSend";

/// In-memory cart with a persisted write-through snapshot
pub struct Cart {
    store: StateStore,
    items: RwLock<Vec<LineItem>>,
}

impl Cart {
    /// Create an empty cart bound to the given state store
    pub fn new(store: StateStore) -> Self {
        Self {
            store,
            items: RwLock::new(Vec::new()),
        }
    }

    /// Restore the cart snapshot from the state store
    ///
    /// Missing or corrupt snapshots load as an empty cart.
    pub fn load(&self) {
        let restored: Vec<LineItem> = match self.store.get_json(CART_KEY) {
            Ok(items) => items.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load cart snapshot, starting empty");
                Vec::new()
            }
        };
        *self.items.write() = restored;
    }

    /// Zero-variant add: existing identity sums quantity, else append with 1
    ///
    /// Products without a base price cannot be direct-added (the caller
    /// routes those through the variant selector); the call is a no-op.
    pub fn add(&self, product: &Product) {
        let Some(price) = product.price else {
            tracing::debug!(product = %product.name, "Direct add without base price ignored");
            return;
        };

        {
            let mut items = self.items.write();
            if let Some(existing) = items
                .iter_mut()
                .find(|i| i.name == product.name && i.price == price && i.size.is_none())
            {
                existing.quantity += 1;
            } else {
                items.push(LineItem {
                    name: product.name.clone(),
                    price,
                    size: None,
                    product_id: product.id.clone(),
                    category: product.category.clone(),
                    quantity: 1,
                });
            }
        }
        self.persist();
    }

    /// Variant batch add: existing identity gets its quantity replaced
    pub fn add_selections(&self, product: &Product, selections: &[SelectionEntry]) {
        if selections.is_empty() {
            return;
        }

        {
            let mut items = self.items.write();
            for entry in selections {
                let size = Some(entry.key.size.clone());
                if let Some(existing) = items.iter_mut().find(|i| {
                    i.name == product.name && i.price == entry.key.price && i.size == size
                }) {
                    existing.quantity = entry.quantity;
                } else {
                    items.push(LineItem {
                        name: product.name.clone(),
                        price: entry.key.price,
                        size,
                        product_id: product.id.clone(),
                        category: product.category.clone(),
                        quantity: entry.quantity,
                    });
                }
            }
        }
        self.persist();
    }

    /// Change a line's quantity by `delta`, matching on (name, price)
    ///
    /// A resulting quantity below 1 removes the line. A missing identity is
    /// a no-op, never an error.
    pub fn adjust_quantity(&self, name: &str, price: Decimal, delta: i32) {
        {
            let mut items = self.items.write();
            items.retain_mut(|item| {
                if item.name != name || item.price != price {
                    return true;
                }
                let next = item.quantity as i64 + delta as i64;
                if next < 1 {
                    false
                } else {
                    item.quantity = next as u32;
                    true
                }
            });
        }
        self.persist();
    }

    /// Drop every line matching (name, price); used when a product is removed
    pub fn remove_matching(&self, name: &str, price: Decimal) {
        {
            let mut items = self.items.write();
            items.retain(|i| !(i.name == name && i.price == price));
        }
        self.persist();
    }

    /// Sum of price × quantity over all lines; the single source of truth
    /// for money display
    pub fn total_price(&self) -> Decimal {
        self.items.read().iter().map(LineItem::line_total).sum()
    }

    /// Cloned snapshot of the current lines (commit deep-copies from this)
    pub fn items(&self) -> Vec<LineItem> {
        self.items.read().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// Replace the cart contents (ticket edit restores through here)
    pub fn replace(&self, items: Vec<LineItem>) {
        *self.items.write() = items;
        self.persist();
    }

    /// Empty the cart; accompanies every successful ticket commit
    pub fn clear(&self) {
        self.items.write().clear();
        self.persist();
    }

    fn persist(&self) {
        let items = self.items.read();
        if let Err(e) = self.store.put_json(CART_KEY, &*items) {
            tracing::warn!(error = %e, "Failed to persist cart snapshot");
        }
    }
}
