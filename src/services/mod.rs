mod favourite_service;
mod navigation;
mod product_service;

pub use favourite_service::{Favourite, FavouriteStore, InMemoryFavouriteStore};
pub use navigation::{MockNavigator, Navigator, TracingNavigator};
pub use product_service::{
    CatalogError, InMemoryProductService, MockProductSource, ProductSource,
};
