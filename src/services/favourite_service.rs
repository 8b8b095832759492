use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::debug;

use crate::domain::Product;

/// A product marked as favourite, with the moment it was added.
#[derive(Debug, Clone, PartialEq)]
pub struct Favourite {
    pub product: Product,
    pub added_at: DateTime<Utc>,
}

pub trait FavouriteStore: Send + Sync {
    /// Notification stream, one message per favourite added.
    fn favourite_added(&self) -> broadcast::Receiver<Product>;

    /// Number of favourites currently recorded.
    fn favourites_count(&self) -> usize;
}

pub struct InMemoryFavouriteStore {
    favourites: RwLock<Vec<Favourite>>,
    added: broadcast::Sender<Product>,
}

impl InMemoryFavouriteStore {
    pub fn new() -> Self {
        let (added, _) = broadcast::channel(16);
        Self {
            favourites: RwLock::new(Vec::new()),
            added,
        }
    }

    /// Record `product` as favourite and notify subscribers. Adding the same
    /// product twice keeps a single entry but still notifies.
    pub fn add_favourite(&self, product: Product) {
        {
            let mut favourites = self.favourites.write();
            if !favourites.iter().any(|f| f.product.id == product.id) {
                favourites.push(Favourite {
                    product: product.clone(),
                    added_at: Utc::now(),
                });
            }
        }
        debug!(product = %product.name, "favourite added");
        let _ = self.added.send(product);
    }

    pub fn favourites(&self) -> Vec<Favourite> {
        self.favourites.read().clone()
    }
}

impl Default for InMemoryFavouriteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FavouriteStore for InMemoryFavouriteStore {
    fn favourite_added(&self) -> broadcast::Receiver<Product> {
        self.added.subscribe()
    }

    fn favourites_count(&self) -> usize {
        self.favourites.read().len()
    }
}
