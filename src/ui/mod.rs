pub mod filter;
pub mod pagination;
pub mod product_list;
pub mod subscription;

pub use filter::FilterPipeline;
pub use pagination::Pagination;
pub use product_list::{ProductListView, ViewSnapshot};
pub use subscription::Subscription;
