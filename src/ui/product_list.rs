use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use parking_lot::RwLock;
use tokio::sync::{broadcast, watch};
use tracing::debug;

use crate::config::ViewConfig;
use crate::domain::Product;
use crate::services::{FavouriteStore, Navigator, ProductSource};
use crate::ui::filter::FilterPipeline;
use crate::ui::pagination::Pagination;
use crate::ui::subscription::Subscription;

/// Everything the rendering layer would read, as one cloneable value.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSnapshot {
    pub title: String,
    pub products: Vec<Product>,
    pub filtered_products: Vec<Product>,
    pub products_number: usize,
    pub filter: String,
    pub filtered: bool,
    pub pagination: Pagination,
    pub selected_product: Option<Product>,
    pub favourite_added: Option<Product>,
}

/// The product list view: filter pipeline, derived list, pagination,
/// selection and the favourite-added subscription, wired over the three
/// collaborators.
pub struct ProductListView {
    state: Arc<RwLock<ViewSnapshot>>,
    filter: FilterPipeline,
    product_source: Arc<dyn ProductSource>,
    favourite_store: Arc<dyn FavouriteStore>,
    navigator: Arc<dyn Navigator>,
    subscription: Subscription,
}

impl ProductListView {
    pub fn new(
        product_source: Arc<dyn ProductSource>,
        favourite_store: Arc<dyn FavouriteStore>,
        navigator: Arc<dyn Navigator>,
        config: &ViewConfig,
    ) -> Self {
        let state = Arc::new(RwLock::new(ViewSnapshot {
            title: "Products".to_string(),
            products: Vec::new(),
            filtered_products: Vec::new(),
            products_number: 0,
            filter: String::new(),
            filtered: false,
            pagination: Pagination::new(config.page_size),
            selected_product: None,
            favourite_added: None,
        }));

        let filter = FilterPipeline::spawn(Duration::from_millis(config.debounce_ms));

        let mut subscription = Subscription::new();
        subscription.add(tokio::spawn(event_loop(
            Arc::clone(&state),
            product_source.products(),
            filter.terms(),
            favourite_store.favourite_added(),
        )));

        Self {
            state,
            filter,
            product_source,
            favourite_store,
            navigator,
            subscription,
        }
    }

    /// Feed raw filter text, exactly as typed.
    pub fn type_filter(&self, raw: &str) {
        self.filter.push(raw);
    }

    pub fn previous_page(&self) {
        let mut state = self.state.write();
        state.pagination.previous_page();
        state.selected_product = None;
    }

    pub fn next_page(&self) {
        let mut state = self.state.write();
        state.pagination.next_page();
        state.selected_product = None;
    }

    pub fn reset_pagination(&self) {
        self.state.write().pagination.reset();
    }

    /// Record the selection and navigate to the product's detail route.
    pub fn select(&self, product: &Product) {
        self.state.write().selected_product = Some(product.clone());
        self.navigator
            .navigate_to(&format!("/products/{}", product.id));
    }

    /// Reload the catalogue, then return to the list route to force a
    /// refresh.
    pub async fn reset(&self) -> Result<()> {
        self.product_source.reset_list().await?;
        self.navigator.navigate_to("/products");
        Ok(())
    }

    /// Total favourites, queried on demand from the store.
    pub fn favourites(&self) -> usize {
        self.favourite_store.favourites_count()
    }

    /// Filtered products on the current page.
    pub fn page(&self) -> Vec<Product> {
        let state = self.state.read();
        state.pagination.slice(&state.filtered_products).to_vec()
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        self.state.read().clone()
    }

    /// Stop every pipeline attached to this view. Notifications arriving
    /// afterwards are ignored. Idempotent; also runs on drop.
    pub fn unsubscribe(&mut self) {
        self.filter.abort();
        self.subscription.unsubscribe();
    }
}

async fn event_loop(
    state: Arc<RwLock<ViewSnapshot>>,
    mut products: watch::Receiver<Vec<Product>>,
    mut terms: watch::Receiver<String>,
    mut favourites: broadcast::Receiver<Product>,
) {
    // Replay the current catalogue before reacting to changes, so the first
    // derivation does not wait for a new publish.
    {
        let list = products.borrow_and_update().clone();
        let mut state = state.write();
        state.products = list;
        recompute(&mut state);
    }

    loop {
        tokio::select! {
            changed = products.changed() => {
                if changed.is_err() {
                    break;
                }
                let list = products.borrow_and_update().clone();
                let mut state = state.write();
                state.products = list;
                recompute(&mut state);
            }
            changed = terms.changed() => {
                if changed.is_err() {
                    break;
                }
                let term = terms.borrow_and_update().clone();
                debug!(term = %term, "applying filter");
                let mut state = state.write();
                state.filtered = !term.is_empty();
                state.filter = term;
                state.pagination.reset();
                recompute(&mut state);
            }
            added = favourites.recv() => {
                match added {
                    Ok(product) => {
                        debug!(product = %product.name, "favourite notification");
                        state.write().favourite_added = Some(product);
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }
}

fn recompute(state: &mut ViewSnapshot) {
    state.filtered_products = state
        .products
        .iter()
        .filter(|product| product.matches(&state.filter))
        .cloned()
        .collect();
    state.products_number = state.filtered_products.len();
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;

    use crate::services::{InMemoryFavouriteStore, InMemoryProductService, MockNavigator};

    use super::*;

    fn demo_view(navigator: MockNavigator) -> ProductListView {
        ProductListView::new(
            Arc::new(InMemoryProductService::with_demo_catalog()),
            Arc::new(InMemoryFavouriteStore::new()),
            Arc::new(navigator),
            &ViewConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_initial_snapshot() {
        let view = demo_view(MockNavigator::new());
        let snapshot = view.snapshot();

        assert_eq!(snapshot.title, "Products");
        assert_eq!(snapshot.filter, "");
        assert!(!snapshot.filtered);
        assert_eq!(snapshot.pagination, Pagination::new(5));
        assert!(snapshot.selected_product.is_none());
        assert!(snapshot.favourite_added.is_none());
    }

    #[tokio::test]
    async fn test_select_records_product_and_navigates_to_detail_route() {
        let mut navigator = MockNavigator::new();
        navigator
            .expect_navigate_to()
            .with(eq("/products/2"))
            .times(1)
            .return_const(());
        let view = demo_view(navigator);

        let banana = Product::new(2, "Banana".to_string());
        view.select(&banana);

        assert_eq!(view.snapshot().selected_product, Some(banana));
    }

    #[tokio::test]
    async fn test_page_changes_clear_the_selection() {
        let mut navigator = MockNavigator::new();
        navigator.expect_navigate_to().return_const(());
        let view = demo_view(navigator);

        view.select(&Product::new(1, "Apple".to_string()));
        view.next_page();
        assert!(view.snapshot().selected_product.is_none());

        view.select(&Product::new(1, "Apple".to_string()));
        view.previous_page();
        assert!(view.snapshot().selected_product.is_none());
    }

    #[tokio::test]
    async fn test_reset_pagination_keeps_the_selection() {
        let mut navigator = MockNavigator::new();
        navigator.expect_navigate_to().return_const(());
        let view = demo_view(navigator);

        view.select(&Product::new(1, "Apple".to_string()));
        view.reset_pagination();
        assert!(view.snapshot().selected_product.is_some());
    }
}
