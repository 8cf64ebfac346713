//! Saga error types.

use common::{CouponId, OrderId, ProductId, UserId};
use domain::{CouponError, OrderError, PricingError, StockError, WalletError};
use lock::LockError;
use store::{ConflictKind, StoreError};
use thiserror::Error;

/// Errors that can occur during order saga execution.
#[derive(Debug, Error)]
pub enum SagaError {
    /// A referenced product does not exist in the catalog.
    #[error("product not found: {product_id}")]
    ProductNotFound { product_id: ProductId },

    /// The product exists but is inactive or deleted.
    #[error("product {product_id} is not available for ordering")]
    ProductUnavailable { product_id: ProductId },

    /// The user has no default shipping address.
    #[error("user {user_id} has no default shipping address")]
    NoDefaultAddress { user_id: UserId },

    /// The user has no wallet.
    #[error("wallet not found for user {user_id}")]
    WalletNotFound { user_id: UserId },

    /// No stock row exists for a product.
    #[error("stock not found for product {product_id}")]
    StockNotFound { product_id: ProductId },

    /// The referenced coupon does not exist.
    #[error("coupon not found: {coupon_id}")]
    CouponNotFound { coupon_id: CouponId },

    /// The referenced order does not exist.
    #[error("order not found: {order_id}")]
    OrderNotFound { order_id: OrderId },

    /// The order belongs to a different user.
    #[error("order {order_id} does not belong to user {user_id}")]
    NotOrderOwner { order_id: OrderId, user_id: UserId },

    /// Pricing/discount distribution failed.
    #[error("pricing error: {0}")]
    Pricing(#[from] PricingError),

    /// Wallet business rule violated.
    #[error("wallet error: {0}")]
    Wallet(#[from] WalletError),

    /// Stock business rule violated.
    #[error("stock error: {0}")]
    Stock(#[from] StockError),

    /// Coupon state rule violated.
    #[error("coupon error: {0}")]
    Coupon(#[from] CouponError),

    /// Order state machine rule violated.
    #[error("order error: {0}")]
    Order(#[from] OrderError),

    /// Repository error (conflict, not-found, backend).
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Distributed lock error.
    #[error("lock error: {0}")]
    Lock(#[from] LockError),

    /// Product catalog collaborator failed.
    #[error("catalog service error: {0}")]
    CatalogService(String),

    /// Address book collaborator failed.
    #[error("address service error: {0}")]
    AddressService(String),

    /// Cart collaborator failed.
    #[error("cart service error: {0}")]
    CartService(String),

    /// A compensating action itself failed after a step failure. Critical:
    /// the system may hold un-restored stock or wallet state and requires
    /// manual reconciliation.
    #[error("compensation for step '{step}' failed: {reason}")]
    CompensationFailed { step: String, reason: String },
}

impl ConflictKind for SagaError {
    fn is_version_conflict(&self) -> bool {
        matches!(self, SagaError::Store(e) if e.is_version_conflict())
    }
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
