//! Catalog Service - cached product list with offline-first hydration
//!
//! The product list lives in an in-memory cell backed by the state store;
//! the network is only touched by `refresh` and `remove_product`. Startup
//! is hydrate-then-refresh: the cached copy renders immediately, a single
//! background fetch overwrites it when it lands.

pub mod source;

pub use source::{CatalogError, CatalogResult, CatalogSource, HttpCatalogSource};

use crate::cart::Cart;
use crate::models::Product;
use crate::tickets::storage::StateStore;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// State key for the durable product list
const PRODUCTS_KEY: &str = "products";

pub struct CatalogService {
    store: StateStore,
    source: Arc<dyn CatalogSource>,
    cart: Arc<Cart>,
    products: RwLock<Vec<Product>>,
    /// Bumped by `invalidate`; a refresh that captured an older value
    /// discards its result instead of publishing stale data
    generation: AtomicU64,
}

impl CatalogService {
    pub fn new(store: StateStore, source: Arc<dyn CatalogSource>, cart: Arc<Cart>) -> Self {
        Self {
            store,
            source,
            cart,
            products: RwLock::new(Vec::new()),
            generation: AtomicU64::new(0),
        }
    }

    // ========== Hydration and refresh ==========

    /// Publish the durable product list into the in-memory cell
    ///
    /// Synchronous and offline: first run or a corrupt value hydrates
    /// empty, never an error.
    pub fn hydrate(&self) {
        let cached: Vec<Product> = match self.store.get_json(PRODUCTS_KEY) {
            Ok(products) => products.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to hydrate catalog, starting empty");
                Vec::new()
            }
        };
        tracing::info!(products = cached.len(), "Catalog hydrated from local store");
        *self.products.write() = cached;
    }

    /// Single fetch against the source; overwrites memory and store in full
    ///
    /// Failures are logged and leave both copies untouched. A result that
    /// arrives after `invalidate` was called is dropped.
    pub async fn refresh(&self) {
        let generation = self.generation.load(Ordering::Acquire);

        let fetched = match self.source.fetch_all().await {
            Ok(products) => products,
            Err(e) => {
                tracing::warn!(error = %e, "Catalog refresh failed, keeping cached list");
                return;
            }
        };

        if self.generation.load(Ordering::Acquire) != generation {
            tracing::debug!("Discarding stale catalog refresh result");
            return;
        }

        if let Err(e) = self.store.put_json(PRODUCTS_KEY, &fetched) {
            tracing::warn!(error = %e, "Failed to persist refreshed catalog");
        }
        tracing::info!(products = fetched.len(), "Catalog refreshed from source");
        *self.products.write() = fetched;
    }

    /// Drop interest in any in-flight refresh
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    // ========== Reads ==========

    pub fn products(&self) -> Vec<Product> {
        self.products.read().clone()
    }

    pub fn len(&self) -> usize {
        self.products.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.read().is_empty()
    }

    /// Products grouped by category, categories sorted by name and
    /// products within each sorted by display price ascending
    pub fn products_by_category(&self) -> Vec<(String, Vec<Product>)> {
        let products = self.products.read();
        let mut groups: BTreeMap<String, Vec<Product>> = BTreeMap::new();
        for product in products.iter() {
            groups
                .entry(product.category.clone())
                .or_default()
                .push(product.clone());
        }
        groups
            .into_iter()
            .map(|(category, mut items)| {
                items.sort_by(|a, b| a.display_price().cmp(&b.display_price()));
                (category, items)
            })
            .collect()
    }

    /// Case-insensitive substring match on product name
    pub fn search(&self, query: &str) -> Vec<Product> {
        let needle = query.to_lowercase();
        self.products
            .read()
            .iter()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    pub async fn is_online(&self) -> bool {
        self.source.is_online().await
    }

    // ========== Removal ==========

    /// Delete a product at the source, then locally
    ///
    /// Local state (memory, store, matching cart lines) mutates only once
    /// the source confirms. On error nothing changes.
    pub async fn remove_product(&self, name: &str, price: Decimal) -> CatalogResult<()> {
        self.source.remove_one(name, price).await?;

        {
            let mut products = self.products.write();
            products.retain(|p| !(p.name == name && p.display_price() == Some(price)));
            self.store.put_json(PRODUCTS_KEY, &*products)?;
        }
        self.cart.remove_matching(name, price);

        tracing::info!(%name, %price, "Product removed from catalog");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Variant;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use tokio::sync::Notify;

    struct MockSource {
        products: Mutex<Vec<Product>>,
        fail: bool,
        gate: Option<Arc<Notify>>,
    }

    impl MockSource {
        fn with_products(products: Vec<Product>) -> Self {
            Self {
                products: Mutex::new(products),
                fail: false,
                gate: None,
            }
        }

        fn failing() -> Self {
            Self {
                products: Mutex::new(Vec::new()),
                fail: true,
                gate: None,
            }
        }
    }

    #[async_trait]
    impl CatalogSource for MockSource {
        async fn fetch_all(&self) -> CatalogResult<Vec<Product>> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.fail {
                return Err(CatalogError::Unavailable("mock source down".to_string()));
            }
            Ok(self.products.lock().clone())
        }

        async fn remove_one(&self, _name: &str, _price: Decimal) -> CatalogResult<()> {
            if self.fail {
                return Err(CatalogError::Unavailable("mock source down".to_string()));
            }
            Ok(())
        }

        async fn is_online(&self) -> bool {
            !self.fail
        }
    }

    fn margherita() -> Product {
        Product {
            id: "p1".into(),
            name: "Margherita".into(),
            category: "Veg Pizza".into(),
            price: Some(Decimal::from(200)),
            variants: vec![],
        }
    }

    fn cold_coffee() -> Product {
        Product {
            id: "p2".into(),
            name: "Cold Coffee".into(),
            category: "Beverages".into(),
            price: None,
            variants: vec![
                Variant {
                    size: "Small".into(),
                    price: Decimal::from(80),
                },
                Variant {
                    size: "Large".into(),
                    price: Decimal::from(120),
                },
            ],
        }
    }

    fn service_with(source: MockSource) -> (StateStore, Arc<Cart>, CatalogService) {
        let store = StateStore::open_in_memory().unwrap();
        let cart = Arc::new(Cart::new(store.clone()));
        let service = CatalogService::new(store.clone(), Arc::new(source), cart.clone());
        (store, cart, service)
    }

    #[test]
    fn test_hydrate_empty_on_first_run() {
        let (_store, _cart, service) = service_with(MockSource::with_products(vec![]));
        service.hydrate();
        assert!(service.is_empty());
    }

    #[test]
    fn test_hydrate_reads_durable_copy() {
        let (store, _cart, service) = service_with(MockSource::with_products(vec![]));
        store.put_json(PRODUCTS_KEY, &vec![margherita()]).unwrap();

        service.hydrate();
        assert_eq!(service.len(), 1);
        assert_eq!(service.products()[0].name, "Margherita");
    }

    #[tokio::test]
    async fn test_refresh_overwrites_memory_and_store() {
        let (store, _cart, service) =
            service_with(MockSource::with_products(vec![margherita(), cold_coffee()]));
        store.put_json(PRODUCTS_KEY, &vec![margherita()]).unwrap();
        service.hydrate();
        assert_eq!(service.len(), 1);

        service.refresh().await;
        assert_eq!(service.len(), 2);

        let durable: Option<Vec<Product>> = store.get_json(PRODUCTS_KEY).unwrap();
        assert_eq!(durable.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_cached_list() {
        let (store, _cart, service) = service_with(MockSource::failing());
        store.put_json(PRODUCTS_KEY, &vec![margherita()]).unwrap();
        service.hydrate();

        service.refresh().await;

        assert_eq!(service.len(), 1);
        let durable: Option<Vec<Product>> = store.get_json(PRODUCTS_KEY).unwrap();
        assert_eq!(durable.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_discards_in_flight_refresh() {
        let gate = Arc::new(Notify::new());
        let mut source = MockSource::with_products(vec![margherita()]);
        source.gate = Some(gate.clone());

        let store = StateStore::open_in_memory().unwrap();
        let cart = Arc::new(Cart::new(store.clone()));
        let service = Arc::new(CatalogService::new(store, Arc::new(source), cart));

        let in_flight = {
            let service = service.clone();
            tokio::spawn(async move { service.refresh().await })
        };
        tokio::task::yield_now().await;

        // Navigate away while the fetch is suspended
        service.invalidate();
        gate.notify_one();
        in_flight.await.unwrap();

        assert!(service.is_empty());
    }

    #[tokio::test]
    async fn test_remove_product_mutates_only_on_source_success() {
        let (_store, cart, service) = service_with(MockSource::failing());
        {
            *service.products.write() = vec![margherita()];
        }
        cart.add(&margherita());

        let result = service
            .remove_product("Margherita", Decimal::from(200))
            .await;

        assert!(result.is_err());
        assert_eq!(service.len(), 1);
        assert_eq!(cart.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_product_drops_cart_lines_too() {
        let (store, cart, service) =
            service_with(MockSource::with_products(vec![margherita(), cold_coffee()]));
        service.refresh().await;
        cart.add(&margherita());

        service
            .remove_product("Margherita", Decimal::from(200))
            .await
            .unwrap();

        assert_eq!(service.len(), 1);
        assert!(cart.is_empty());
        let durable: Option<Vec<Product>> = store.get_json(PRODUCTS_KEY).unwrap();
        assert_eq!(durable.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_products_by_category_sorted_by_price() {
        let cheap = Product {
            id: "p3".into(),
            name: "Garlic Bread".into(),
            category: "Veg Pizza".into(),
            price: Some(Decimal::from(90)),
            variants: vec![],
        };
        let (_store, _cart, service) =
            service_with(MockSource::with_products(vec![margherita(), cheap, cold_coffee()]));
        service.refresh().await;

        let grouped = service.products_by_category();
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].0, "Beverages");
        assert_eq!(grouped[1].0, "Veg Pizza");
        let pizzas: Vec<&str> = grouped[1].1.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(pizzas, vec!["Garlic Bread", "Margherita"]);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let (_store, _cart, service) =
            service_with(MockSource::with_products(vec![margherita(), cold_coffee()]));
        service.refresh().await;

        let hits = service.search("cold");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Cold Coffee");
        assert!(service.search("xyz").is_empty());
    }
}
