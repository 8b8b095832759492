use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub description: String,
}

impl Product {
    pub fn new(id: u32, name: String) -> Self {
        Self {
            id,
            name,
            price: 0.0,
            description: String::new(),
        }
    }

    /// Case-insensitive substring match against the product name. An empty
    /// term matches every product.
    pub fn matches(&self, term: &str) -> bool {
        self.name.to_lowercase().contains(&term.to_lowercase())
    }
}
