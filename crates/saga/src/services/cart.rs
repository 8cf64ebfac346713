//! Cart contract and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{ProductId, UserId};

use crate::error::SagaError;

/// One line of a user's cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItem {
    /// The carted product.
    pub product_id: ProductId,
    /// Carted quantity.
    pub quantity: u32,
}

/// Trait for cart storage operations.
#[async_trait]
pub trait CartService: Send + Sync {
    /// Returns the user's current cart items.
    async fn items_for(&self, user_id: UserId) -> Result<Vec<CartItem>, SagaError>;

    /// Empties the user's cart.
    async fn clear(&self, user_id: UserId) -> Result<(), SagaError>;
}

#[derive(Debug, Default)]
struct InMemoryCartState {
    carts: HashMap<UserId, Vec<CartItem>>,
    fail_on_clear: bool,
}

/// In-memory cart service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCartService {
    state: Arc<RwLock<InMemoryCartState>>,
}

impl InMemoryCartService {
    /// Creates a new empty cart service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces a user's cart contents.
    pub fn put(&self, user_id: UserId, items: Vec<CartItem>) {
        self.state.write().unwrap().carts.insert(user_id, items);
    }

    /// Configures the service to fail clear calls.
    pub fn set_fail_on_clear(&self, fail: bool) {
        self.state.write().unwrap().fail_on_clear = fail;
    }

    /// Returns true if the user's cart has items.
    pub fn has_items(&self, user_id: UserId) -> bool {
        self.state
            .read()
            .unwrap()
            .carts
            .get(&user_id)
            .is_some_and(|items| !items.is_empty())
    }
}

#[async_trait]
impl CartService for InMemoryCartService {
    async fn items_for(&self, user_id: UserId) -> Result<Vec<CartItem>, SagaError> {
        Ok(self
            .state
            .read()
            .unwrap()
            .carts
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn clear(&self, user_id: UserId) -> Result<(), SagaError> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_clear {
            return Err(SagaError::CartService(
                "cart backend unavailable".to_string(),
            ));
        }
        state.carts.remove(&user_id);
        Ok(())
    }
}
