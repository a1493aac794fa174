//! Variant selector
//!
//! Transient per-product sub-session for picking one or more priced sizes
//! before committing them to the cart. Entry identity is the
//! `(size, price, product_id)` triple.
//!
//! The set persists across a popup reopen (an unfinished selection
//! survives), but is wiped on engine start, matching the capture screen's
//! refresh semantics.

use crate::models::{Product, SelectionEntry, SelectionKey, Variant};
use crate::tickets::storage::StateStore;
use parking_lot::RwLock;

/// State key for the in-progress selection set
const SELECTION_KEY: &str = "selectedVariety";

/// Transient variant-selection set with a persisted mirror
pub struct VariantSelector {
    store: StateStore,
    entries: RwLock<Vec<SelectionEntry>>,
}

impl VariantSelector {
    pub fn new(store: StateStore) -> Self {
        Self {
            store,
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Wipe any selection left over from a previous session
    pub fn reset(&self) {
        self.entries.write().clear();
        if let Err(e) = self.store.remove(SELECTION_KEY) {
            tracing::warn!(error = %e, "Failed to clear stored variant selection");
        }
    }

    /// Open a selection session for a product
    ///
    /// Zero-variant products are a no-op (the caller direct-adds those).
    /// Otherwise the session is seeded with previously-saved entries
    /// belonging to this product, so reopening resumes where it left off.
    pub fn open(&self, product: &Product) {
        if !product.has_variants() {
            return;
        }

        let saved: Vec<SelectionEntry> = match self.store.get_json(SELECTION_KEY) {
            Ok(entries) => entries.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load stored variant selection");
                Vec::new()
            }
        };

        *self.entries.write() = saved
            .into_iter()
            .filter(|e| e.key.product_id == product.id)
            .collect();
    }

    /// Include or exclude a variant
    ///
    /// Including adds the triple with quantity 1; excluding removes the
    /// matching triple.
    pub fn toggle(&self, variant: &Variant, included: bool, product_id: &str) {
        let key = SelectionKey {
            size: variant.size.clone(),
            price: variant.price,
            product_id: product_id.to_string(),
        };

        {
            let mut entries = self.entries.write();
            if included {
                if !entries.iter().any(|e| e.key == key) {
                    entries.push(SelectionEntry { key, quantity: 1 });
                }
            } else {
                entries.retain(|e| e.key != key);
            }
        }
        self.persist();
    }

    /// Apply a quantity delta to the matching entry, dropping it at zero or below
    pub fn adjust_quantity(&self, variant: &Variant, delta: i32, product_id: &str) {
        {
            let mut entries = self.entries.write();
            for entry in entries.iter_mut() {
                if entry.key.size == variant.size
                    && entry.key.price == variant.price
                    && entry.key.product_id == product_id
                {
                    entry.quantity = (entry.quantity as i64 + delta as i64).max(0) as u32;
                }
            }
            entries.retain(|e| e.quantity > 0);
        }
        self.persist();
    }

    /// Hand the selection set over and clear the session
    ///
    /// An empty set commits as a no-op; the caller's save button guards
    /// against it at the UI level, not here.
    pub fn commit(&self) -> Vec<SelectionEntry> {
        let taken = std::mem::take(&mut *self.entries.write());
        if let Err(e) = self.store.remove(SELECTION_KEY) {
            tracing::warn!(error = %e, "Failed to clear stored variant selection");
        }
        taken
    }

    /// Current entries (cloned)
    pub fn entries(&self) -> Vec<SelectionEntry> {
        self.entries.read().clone()
    }

    fn persist(&self) {
        let entries = self.entries.read();
        if let Err(e) = self.store.put_json(SELECTION_KEY, &*entries) {
            tracing::warn!(error = %e, "Failed to persist variant selection");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn store() -> StateStore {
        StateStore::open_in_memory().unwrap()
    }

    fn product_with_sizes() -> Product {
        Product {
            id: "p1".into(),
            name: "Pizza".into(),
            category: "Veg Pizza".into(),
            price: None,
            variants: vec![
                Variant { size: "S".into(), price: Decimal::from(150) },
                Variant { size: "L".into(), price: Decimal::from(350) },
            ],
        }
    }

    #[test]
    fn test_open_zero_variant_product_is_noop() {
        let selector = VariantSelector::new(store());
        let plain = Product {
            id: "p2".into(),
            name: "Coke".into(),
            category: "Drinks".into(),
            price: Some(Decimal::from(40)),
            variants: vec![],
        };

        selector.open(&plain);
        assert!(selector.entries().is_empty());
    }

    #[test]
    fn test_toggle_on_adds_with_quantity_one() {
        let selector = VariantSelector::new(store());
        let product = product_with_sizes();
        selector.open(&product);

        selector.toggle(&product.variants[0], true, &product.id);

        let entries = selector.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].quantity, 1);
        assert_eq!(entries[0].key.size, "S");
    }

    #[test]
    fn test_toggle_off_removes_matching_triple() {
        let selector = VariantSelector::new(store());
        let product = product_with_sizes();
        selector.open(&product);

        selector.toggle(&product.variants[0], true, &product.id);
        selector.toggle(&product.variants[1], true, &product.id);
        selector.toggle(&product.variants[0], false, &product.id);

        let entries = selector.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key.size, "L");
    }

    #[test]
    fn test_adjust_quantity_drops_at_zero() {
        let selector = VariantSelector::new(store());
        let product = product_with_sizes();
        selector.open(&product);

        selector.toggle(&product.variants[0], true, &product.id);
        selector.adjust_quantity(&product.variants[0], 2, &product.id);
        assert_eq!(selector.entries()[0].quantity, 3);

        selector.adjust_quantity(&product.variants[0], -3, &product.id);
        assert!(selector.entries().is_empty());
    }

    #[test]
    fn test_reopen_restores_unfinished_selection_for_product() {
        let store = store();
        let product = product_with_sizes();
        let other = Product { id: "p9".into(), ..product_with_sizes() };

        {
            let selector = VariantSelector::new(store.clone());
            selector.open(&product);
            selector.toggle(&product.variants[0], true, &product.id);
            selector.toggle(&other.variants[1], true, &other.id);
        }

        let selector = VariantSelector::new(store);
        selector.open(&product);

        // Only this product's entries are seeded back
        let entries = selector.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key.product_id, "p1");
    }

    #[test]
    fn test_commit_clears_session_and_store() {
        let store = store();
        let selector = VariantSelector::new(store.clone());
        let product = product_with_sizes();
        selector.open(&product);
        selector.toggle(&product.variants[1], true, &product.id);

        let committed = selector.commit();
        assert_eq!(committed.len(), 1);
        assert!(selector.entries().is_empty());

        let stored: Option<Vec<SelectionEntry>> = store.get_json("selectedVariety").unwrap();
        assert!(stored.is_none());
    }

    #[test]
    fn test_commit_empty_set_is_noop() {
        let selector = VariantSelector::new(store());
        assert!(selector.commit().is_empty());
    }

    #[test]
    fn test_reset_wipes_stored_selection() {
        let store = store();
        let product = product_with_sizes();
        {
            let selector = VariantSelector::new(store.clone());
            selector.open(&product);
            selector.toggle(&product.variants[0], true, &product.id);
        }

        let selector = VariantSelector::new(store.clone());
        selector.reset();
        selector.open(&product);
        assert!(selector.entries().is_empty());
    }
}
