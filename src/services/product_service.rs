use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;
use tokio::sync::watch;
use tracing::info;

use crate::domain::Product;

/// Read side of the product catalogue plus its reset operation.
#[automock]
#[async_trait]
pub trait ProductSource: Send + Sync {
    /// Live product list. The receiver replays the current list on subscribe.
    fn products(&self) -> watch::Receiver<Vec<Product>>;

    /// Reload the catalogue from its seed data.
    async fn reset_list(&self) -> Result<()>;
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalogue file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse catalogue file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Product source holding the whole catalogue in memory.
#[derive(Debug)]
pub struct InMemoryProductService {
    seed: Vec<Product>,
    products: watch::Sender<Vec<Product>>,
}

impl InMemoryProductService {
    pub fn new(seed: Vec<Product>) -> Self {
        let (products, _) = watch::channel(seed.clone());
        Self { seed, products }
    }

    pub fn with_demo_catalog() -> Self {
        Self::new(demo_catalog())
    }

    /// Load the seed catalogue from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        let seed: Vec<Product> = serde_json::from_str(&raw)?;
        Ok(Self::new(seed))
    }

    /// Publish a new product list to every subscriber.
    pub fn publish(&self, products: Vec<Product>) {
        self.products.send_replace(products);
    }
}

#[async_trait]
impl ProductSource for InMemoryProductService {
    fn products(&self) -> watch::Receiver<Vec<Product>> {
        self.products.subscribe()
    }

    async fn reset_list(&self) -> Result<()> {
        info!(products = self.seed.len(), "resetting product list");
        self.products.send_replace(self.seed.clone());
        Ok(())
    }
}

fn demo_catalog() -> Vec<Product> {
    [
        (1, "Apple", 1.20),
        (2, "Banana", 0.80),
        (3, "Cherry", 3.50),
        (4, "Date", 4.10),
        (5, "Elderberry", 5.00),
        (6, "Fig", 2.30),
        (7, "Grape", 2.10),
        (8, "Kiwi", 1.60),
        (9, "Lemon", 0.90),
        (10, "Mango", 2.80),
        (11, "Orange", 1.10),
        (12, "Papaya", 3.20),
    ]
    .into_iter()
    .map(|(id, name, price)| Product {
        id,
        name: name.to_string(),
        price,
        description: String::new(),
    })
    .collect()
}
