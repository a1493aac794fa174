//! Catalog source port and its HTTP implementation
//!
//! The engine only ever talks to the menu backend through this trait, so
//! tests swap in an in-process source and the service logic stays offline.

use crate::models::Product;
use crate::tickets::storage::StorageError;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog request failed: {0}")]
    Source(#[from] reqwest::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Catalog source unavailable: {0}")]
    Unavailable(String),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Remote menu backend
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Full product list; the service replaces its state wholesale
    async fn fetch_all(&self) -> CatalogResult<Vec<Product>>;

    /// Delete one product, identified by name and price
    async fn remove_one(&self, name: &str, price: Decimal) -> CatalogResult<()>;

    /// Connectivity probe, used to gate product-management navigation
    async fn is_online(&self) -> bool;
}

/// HTTP catalog backend
pub struct HttpCatalogSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCatalogSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    async fn fetch_all(&self) -> CatalogResult<Vec<Product>> {
        let url = format!("{}/api/products", self.base_url);
        let products = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<Product>>()
            .await?;
        Ok(products)
    }

    async fn remove_one(&self, name: &str, price: Decimal) -> CatalogResult<()> {
        let url = format!("{}/api/products/delete", self.base_url);
        self.client
            .post(&url)
            .json(&serde_json::json!({ "name": name, "price": price }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn is_online(&self) -> bool {
        let url = format!("{}/api/health", self.base_url);
        match self.client.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }
}
