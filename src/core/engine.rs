//! Engine bootstrap and background-task lifecycle
//!
//! Wires the state store, cart, selector, catalog and ledger together and
//! owns the background tasks (catalog refresh warmup, ticket sweeper).
//! Tasks are wrapped to catch panics so one crashing worker never takes
//! the terminal down silently.

use crate::cart::{Cart, VariantSelector};
use crate::catalog::{CatalogService, CatalogSource, HttpCatalogSource};
use crate::core::Config;
use crate::tickets::{StateStore, TicketLedger, TicketSweeper};
use anyhow::Context;
use futures::FutureExt;
use parking_lot::Mutex;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct Engine {
    config: Config,
    cart: Arc<Cart>,
    selector: Arc<VariantSelector>,
    catalog: Arc<CatalogService>,
    ledger: Arc<TicketLedger>,
    shutdown: CancellationToken,
    tasks: Mutex<Vec<(&'static str, JoinHandle<()>)>>,
}

impl Engine {
    /// Open the store and assemble all components
    ///
    /// Restores the cart snapshot, wipes any stale variant selection and
    /// hydrates the catalog from the local copy. Network and background
    /// tasks start separately via [`Engine::spawn_background_tasks`].
    pub fn start(config: Config) -> anyhow::Result<Self> {
        let source = Arc::new(HttpCatalogSource::new(&config.catalog_url));
        Self::start_with_source(config, source)
    }

    /// Assemble against a caller-provided catalog source
    pub fn start_with_source(
        config: Config,
        source: Arc<dyn CatalogSource>,
    ) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.work_dir)
            .with_context(|| format!("Failed to create work dir {}", config.work_dir))?;
        let store = StateStore::open(Path::new(&config.work_dir).join("state.redb"))
            .context("Failed to open state store")?;

        let cart = Arc::new(Cart::new(store.clone()));
        cart.load();

        let selector = Arc::new(VariantSelector::new(store.clone()));
        selector.reset();

        let catalog = Arc::new(CatalogService::new(store.clone(), source, cart.clone()));
        catalog.hydrate();

        let ledger = Arc::new(TicketLedger::new(
            store,
            cart.clone(),
            config.timezone,
            config.ticket_ttl_ms,
        ));

        tracing::info!(work_dir = %config.work_dir, "Engine started");
        Ok(Self {
            config,
            cart,
            selector,
            catalog,
            ledger,
            shutdown: CancellationToken::new(),
            tasks: Mutex::new(Vec::new()),
        })
    }

    pub fn cart(&self) -> &Arc<Cart> {
        &self.cart
    }

    pub fn selector(&self) -> &Arc<VariantSelector> {
        &self.selector
    }

    pub fn catalog(&self) -> &Arc<CatalogService> {
        &self.catalog
    }

    pub fn ledger(&self) -> &Arc<TicketLedger> {
        &self.ledger
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Start the background tasks: one catalog refresh, the sweeper loop
    pub fn spawn_background_tasks(&self) {
        let catalog = self.catalog.clone();
        self.spawn("catalog_refresh", async move {
            catalog.refresh().await;
        });

        let sweeper = TicketSweeper::new(
            self.ledger.clone(),
            self.config.sweep_interval_ms,
            self.shutdown.clone(),
        );
        self.spawn("ticket_sweeper", sweeper.run());
    }

    fn spawn<F>(&self, name: &'static str, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let wrapped = async move {
            if let Err(panic_info) = AssertUnwindSafe(future).catch_unwind().await {
                let panic_msg: String = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    (*s).to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                tracing::error!(task = %name, panic = %panic_msg, "Background task panicked");
            }
        };

        let handle = tokio::spawn(wrapped);
        tracing::debug!(task = %name, "Registered background task");
        self.tasks.lock().push((name, handle));
    }

    /// Graceful shutdown: cancel every task and wait for it to finish
    pub async fn shutdown(self) {
        self.shutdown.cancel();

        let tasks = std::mem::take(&mut *self.tasks.lock());
        for (name, handle) in tasks {
            match handle.await {
                Ok(()) => tracing::debug!(task = %name, "Task completed"),
                Err(e) if e.is_cancelled() => tracing::debug!(task = %name, "Task cancelled"),
                Err(e) => tracing::error!(task = %name, error = ?e, "Task panicked"),
            }
        }
        tracing::info!("Engine stopped");
    }
}
