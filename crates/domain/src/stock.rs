//! Stock aggregate.

use common::{ProductId, Version};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by stock mutations. Business-rule violations, never
/// retried; distinct from version conflicts.
#[derive(Debug, Error)]
pub enum StockError {
    /// Mutation quantities must be strictly positive.
    #[error("stock quantity must be positive for product {product_id}")]
    ZeroQuantity { product_id: ProductId },

    /// Not enough units on hand to cover the decrease.
    #[error("insufficient stock for product {product_id}: {available} available, {requested} requested")]
    InsufficientStock {
        product_id: ProductId,
        available: u32,
        requested: u32,
    },
}

/// On-hand quantity for one product, guarded by an optimistic version check.
///
/// Follows the same discipline as [`crate::Wallet`]: mutations validate and
/// update the quantity, the store owns the version bump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    product_id: ProductId,
    quantity: u32,
    version: Version,
}

impl Stock {
    /// Creates a stock row with an initial quantity.
    pub fn new(product_id: ProductId, quantity: u32) -> Self {
        Self {
            product_id,
            quantity,
            version: Version::initial(),
        }
    }

    /// Returns the product this row tracks.
    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    /// Returns the on-hand quantity.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Returns the version this state was read at.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Sets the version. Called by the store after a successful write.
    pub fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    /// Adds units, e.g. on restock or compensation.
    pub fn increase(&mut self, amount: u32) -> Result<(), StockError> {
        self.require_positive(amount)?;
        self.quantity += amount;
        Ok(())
    }

    /// Removes units. Fails if fewer than `amount` are on hand; the
    /// quantity never goes negative.
    pub fn decrease(&mut self, amount: u32) -> Result<(), StockError> {
        self.require_positive(amount)?;
        if self.quantity < amount {
            return Err(StockError::InsufficientStock {
                product_id: self.product_id.clone(),
                available: self.quantity,
                requested: amount,
            });
        }
        self.quantity -= amount;
        Ok(())
    }

    fn require_positive(&self, amount: u32) -> Result<(), StockError> {
        if amount == 0 {
            return Err(StockError::ZeroQuantity {
                product_id: self.product_id.clone(),
            });
        }
        Ok(())
    }
}
