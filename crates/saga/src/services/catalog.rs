//! Product catalog contract and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{Money, ProductId};

use crate::error::SagaError;

/// A sellable product as the saga sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    /// The product SKU.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Current unit price.
    pub unit_price: Money,
    /// False once the product is deactivated or deleted; inactive products
    /// cannot be ordered.
    pub active: bool,
}

/// Trait for product catalog lookups.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Looks up a product by SKU.
    async fn find(&self, product_id: &ProductId) -> Result<Option<Product>, SagaError>;
}

/// In-memory product catalog for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProductCatalog {
    products: Arc<RwLock<HashMap<ProductId, Product>>>,
}

impl InMemoryProductCatalog {
    /// Creates a new empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a product.
    pub fn insert(&self, product: Product) {
        self.products
            .write()
            .unwrap()
            .insert(product.id.clone(), product);
    }

    /// Activates or deactivates a product.
    pub fn set_active(&self, product_id: &ProductId, active: bool) {
        if let Some(product) = self.products.write().unwrap().get_mut(product_id) {
            product.active = active;
        }
    }
}

#[async_trait]
impl ProductCatalog for InMemoryProductCatalog {
    async fn find(&self, product_id: &ProductId) -> Result<Option<Product>, SagaError> {
        Ok(self.products.read().unwrap().get(product_id).cloned())
    }
}
