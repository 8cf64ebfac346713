//! Shipping address contract and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::UserId;

use crate::error::SagaError;

/// A user's shipping address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingAddress {
    /// The address owner.
    pub user_id: UserId,
    /// Recipient name.
    pub recipient: String,
    /// Street line.
    pub line1: String,
    /// Postal code.
    pub postal_code: String,
}

/// Trait for shipping address lookups.
#[async_trait]
pub trait AddressBook: Send + Sync {
    /// Returns the user's default shipping address, if one is set.
    async fn default_for(&self, user_id: UserId) -> Result<Option<ShippingAddress>, SagaError>;
}

/// In-memory address book for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAddressBook {
    defaults: Arc<RwLock<HashMap<UserId, ShippingAddress>>>,
}

impl InMemoryAddressBook {
    /// Creates a new empty address book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a user's default address.
    pub fn set_default(&self, address: ShippingAddress) {
        self.defaults
            .write()
            .unwrap()
            .insert(address.user_id, address);
    }

    /// Removes a user's default address.
    pub fn remove_default(&self, user_id: UserId) {
        self.defaults.write().unwrap().remove(&user_id);
    }
}

#[async_trait]
impl AddressBook for InMemoryAddressBook {
    async fn default_for(&self, user_id: UserId) -> Result<Option<ShippingAddress>, SagaError> {
        Ok(self.defaults.read().unwrap().get(&user_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get_default() {
        let book = InMemoryAddressBook::new();
        let user_id = UserId::new();
        book.set_default(ShippingAddress {
            user_id,
            recipient: "Jamie Doe".to_string(),
            line1: "1 Main St".to_string(),
            postal_code: "00001".to_string(),
        });

        let address = book.default_for(user_id).await.unwrap().unwrap();
        assert_eq!(address.recipient, "Jamie Doe");
    }

    #[tokio::test]
    async fn test_missing_default_is_none() {
        let book = InMemoryAddressBook::new();
        assert!(book.default_for(UserId::new()).await.unwrap().is_none());
    }
}
