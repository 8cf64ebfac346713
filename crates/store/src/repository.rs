//! Repository trait contracts.
//!
//! All calls are atomic at the single-row level. `update` implements the
//! optimistic-concurrency contract: the write succeeds only if the stored
//! version still equals the version the caller read, and the store bumps
//! the version on success. Implementations must be thread-safe.

use async_trait::async_trait;
use common::{CouponId, OrderId, ProductId, UserId};
use domain::{Coupon, Order, Stock, Wallet, WalletEntry};

use crate::error::Result;

/// Persistence contract for wallets and their ledger.
#[async_trait]
pub trait WalletStore: Send + Sync {
    /// Loads a wallet by its owner.
    async fn find_by_owner(&self, owner_id: UserId) -> Result<Option<Wallet>>;

    /// Creates a wallet. Fails if the owner already has one.
    async fn create(&self, wallet: Wallet) -> Result<Wallet>;

    /// Conditionally writes a mutated wallet; returns the stored state with
    /// its bumped version.
    async fn update(&self, wallet: &Wallet) -> Result<Wallet>;

    /// Appends a ledger entry. Append-only; entries are never updated.
    async fn record_entry(&self, entry: WalletEntry) -> Result<()>;

    /// Returns all ledger entries for an owner, in append order.
    async fn entries_for(&self, owner_id: UserId) -> Result<Vec<WalletEntry>>;
}

/// Persistence contract for per-product stock rows.
#[async_trait]
pub trait StockStore: Send + Sync {
    /// Loads the stock row for a product.
    async fn find(&self, product_id: &ProductId) -> Result<Option<Stock>>;

    /// Creates a stock row. Fails if the product already has one.
    async fn create(&self, stock: Stock) -> Result<Stock>;

    /// Conditionally writes a mutated stock row; returns the stored state
    /// with its bumped version.
    async fn update(&self, stock: &Stock) -> Result<Stock>;
}

/// Persistence contract for orders (with their items).
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Loads an order by ID.
    async fn find(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Persists a new order together with its items.
    async fn create(&self, order: Order) -> Result<Order>;

    /// Conditionally writes a mutated order; returns the stored state with
    /// its bumped version.
    async fn update(&self, order: &Order) -> Result<Order>;

    /// Deletes an order and its items. Fails with NotFound if absent.
    async fn delete(&self, order_id: OrderId) -> Result<()>;
}

/// Persistence contract for issued coupons.
#[async_trait]
pub trait CouponStore: Send + Sync {
    /// Loads a coupon by ID.
    async fn find(&self, coupon_id: CouponId) -> Result<Option<Coupon>>;

    /// Creates a coupon. Fails if the ID already exists.
    async fn create(&self, coupon: Coupon) -> Result<Coupon>;

    /// Conditionally writes a mutated coupon; returns the stored state with
    /// its bumped version.
    async fn update(&self, coupon: &Coupon) -> Result<Coupon>;
}
